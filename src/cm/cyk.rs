//! Banded CYK: maximum-likelihood structural parse of an envelope.
//!
//! A dynamic program over (guide-tree node, end position j, span d)
//! triples, restricted to each node's length band. Pair nodes emit two
//! residues simultaneously, the defining step beyond a linear profile.
//! The traceback re-derives the argmax choice at each cell from the
//! children's tables, so no backpointers are stored.
//!
//! Reference: infernal/src/cm_dpsearch.c (FastCYKScan),
//! infernal/src/cm_dpalign.c (cm_CYKAlign + ParsetreeFromDp).

use super::align::ParsedAlignment;
use super::band::{BandedTable, DpBands};
use super::trunc::TruncMode;
use crate::filter::NEG_INF;
use crate::model::{emit1, CovarianceModel, NodeKind};
use crate::sequence::decode;

/// Fill all node tables bottom-up for `res` (the envelope residues).
pub(crate) fn cyk_fill(
    cm: &CovarianceModel,
    res: &[u8],
    bands: &DpBands,
    mode: TruncMode,
) -> Vec<BandedTable> {
    let l = res.len();
    let mut tables: Vec<BandedTable> = Vec::with_capacity(cm.nodes.len());

    for (v, node) in cm.nodes.iter().enumerate() {
        let mut t = BandedTable::new(l, bands.dmin[v], bands.dmax[v]);
        let (dlo, dhi) = (t.dmin(), t.dmax());

        for j in 0..=l {
            for d in dlo..=dhi.min(j) {
                let i = j - d;
                let score = match node.kind {
                    NodeKind::End => d as f32 * cm.ins,

                    NodeKind::Left { pos, child } => {
                        let child = &tables[child];
                        let del = if mode.allow5() && node.spine5 {
                            0.0
                        } else {
                            cm.del_single
                        };
                        let mut best = del + child.get(j, d);
                        if d >= 1 {
                            let emit = emit1(&cm.single_scores[pos], res[i]);
                            best = best.max(emit + child.get(j, d - 1));
                            best = best.max(cm.ins + t.get(j, d - 1));
                        }
                        best
                    }

                    NodeKind::Right { pos, child } => {
                        let child = &tables[child];
                        let del = if mode.allow3() && node.spine3 {
                            0.0
                        } else {
                            cm.del_single
                        };
                        let mut best = del + child.get(j, d);
                        if d >= 1 {
                            let emit = emit1(&cm.single_scores[pos], res[j - 1]);
                            best = best.max(emit + child.get(j - 1, d - 1));
                            best = best.max(cm.ins + t.get(j - 1, d - 1));
                        }
                        best
                    }

                    NodeKind::Pair { child, .. } => {
                        let child = &tables[child];
                        let ps = &cm.pair_scores[&v];
                        let del = if mode.allow5()
                            && node.spine5
                            && mode.allow3()
                            && node.spine3
                        {
                            0.0
                        } else {
                            cm.del_pair
                        };
                        let mut best = del + child.get(j, d);
                        if d >= 2 {
                            best = best
                                .max(cm.pair_emit(v, res[i], res[j - 1]) + child.get(j - 1, d - 2));
                        }
                        if d >= 1 {
                            if mode.allow5() && node.spine5 {
                                best = best
                                    .max(emit1(&ps.marg_right, res[j - 1]) + child.get(j - 1, d - 1));
                            }
                            if mode.allow3() && node.spine3 {
                                best = best.max(emit1(&ps.marg_left, res[i]) + child.get(j, d - 1));
                            }
                            best = best.max(cm.ins + t.get(j, d - 1));
                            best = best.max(cm.ins + t.get(j - 1, d - 1));
                        }
                        best
                    }

                    NodeKind::Bifurc { left, right } => {
                        let lc = &tables[left];
                        let rc = &tables[right];
                        let mut best = NEG_INF;
                        let dl_lo = lc.dmin().max(d.saturating_sub(rc.dmax()));
                        let dl_hi = lc.dmax().min(d.saturating_sub(rc.dmin()));
                        for dl in dl_lo..=dl_hi.min(d) {
                            let s = lc.get(i + dl, dl) + rc.get(j, d - dl);
                            if s > best {
                                best = s;
                            }
                        }
                        if mode.allow5() && node.spine5 {
                            best = best.max(rc.get(j, d)); // left subtree truncated away
                        }
                        if mode.allow3() && node.spine3 {
                            best = best.max(lc.get(j, d)); // right subtree truncated away
                        }
                        best
                    }
                };
                t.set(j, d, score);
            }
        }
        tables.push(t);
    }
    tables
}

/// Best banded parse score of the envelope in bits, -inf if no parse
/// fits the bands.
pub fn cyk_score(cm: &CovarianceModel, res: &[u8], bands: &DpBands, mode: TruncMode) -> f32 {
    let tables = cyk_fill(cm, res, bands, mode);
    tables[cm.root].get(res.len(), res.len())
}

/// Optimal parse score plus the materialized alignment, or `None` when
/// no parse fits the bands.
pub fn cyk_align(
    cm: &CovarianceModel,
    res: &[u8],
    bands: &DpBands,
    mode: TruncMode,
) -> Option<(f32, ParsedAlignment)> {
    let tables = cyk_fill(cm, res, bands, mode);
    let l = res.len();
    let score = tables[cm.root].get(l, l);
    if score == NEG_INF {
        return None;
    }
    let (ss, model, target) = trace(cm, res, &tables, mode, cm.root, l, l);
    Some((
        score,
        ParsedAlignment {
            ss_line: ss,
            model_line: model,
            target_line: target,
        },
    ))
}

/// Structure annotation character for a consensus position.
fn ss_char(cm: &CovarianceModel, pos: usize) -> char {
    match cm.pair_partner[pos] {
        Some(p) if p > pos => '<',
        Some(_) => '>',
        None => ':',
    }
}

fn model_char(cm: &CovarianceModel, pos: usize) -> char {
    decode(cm.consensus[pos])
}

/// Re-derive the argmax choice at (v, j, d) from the children's tables
/// and build the three alignment lines recursively.
fn trace(
    cm: &CovarianceModel,
    res: &[u8],
    tables: &[BandedTable],
    mode: TruncMode,
    v: usize,
    j: usize,
    d: usize,
) -> (String, String, String) {
    let node = &cm.nodes[v];
    let i = j - d;

    match node.kind {
        NodeKind::End => {
            let ss: String = ".".repeat(d);
            let model: String = ".".repeat(d);
            let target: String = res[i..j]
                .iter()
                .map(|&r| decode(r).to_ascii_lowercase())
                .collect();
            (ss, model, target)
        }

        NodeKind::Left { pos, child: c } => {
            let child = &tables[c];
            let del = if mode.allow5() && node.spine5 {
                0.0
            } else {
                cm.del_single
            };
            let mut best = del + child.get(j, d);
            let mut choice = 0u8; // 0 = delete, 1 = emit, 2 = insert
            if d >= 1 {
                let emit = emit1(&cm.single_scores[pos], res[i]) + child.get(j, d - 1);
                if emit > best {
                    best = emit;
                    choice = 1;
                }
                let ins = cm.ins + tables[v].get(j, d - 1);
                if ins > best {
                    choice = 2;
                }
            }
            match choice {
                1 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j, d - 1);
                    (
                        format!("{}{}", ss_char(cm, pos), ss),
                        format!("{}{}", model_char(cm, pos), m),
                        format!("{}{}", decode(res[i]), t),
                    )
                }
                2 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, v, j, d - 1);
                    (
                        format!(".{}", ss),
                        format!(".{}", m),
                        format!("{}{}", decode(res[i]).to_ascii_lowercase(), t),
                    )
                }
                _ => {
                    let gap = if mode.allow5() && node.spine5 { '~' } else { '-' };
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j, d);
                    (
                        format!("{}{}", ss_char(cm, pos), ss),
                        format!("{}{}", model_char(cm, pos), m),
                        format!("{}{}", gap, t),
                    )
                }
            }
        }

        NodeKind::Right { pos, child: c } => {
            let child = &tables[c];
            let del = if mode.allow3() && node.spine3 {
                0.0
            } else {
                cm.del_single
            };
            let mut best = del + child.get(j, d);
            let mut choice = 0u8;
            if d >= 1 {
                let emit = emit1(&cm.single_scores[pos], res[j - 1]) + child.get(j - 1, d - 1);
                if emit > best {
                    best = emit;
                    choice = 1;
                }
                let ins = cm.ins + tables[v].get(j - 1, d - 1);
                if ins > best {
                    choice = 2;
                }
            }
            match choice {
                1 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j - 1, d - 1);
                    (
                        format!("{}{}", ss, ss_char(cm, pos)),
                        format!("{}{}", m, model_char(cm, pos)),
                        format!("{}{}", t, decode(res[j - 1])),
                    )
                }
                2 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, v, j - 1, d - 1);
                    (
                        format!("{}.", ss),
                        format!("{}.", m),
                        format!("{}{}", t, decode(res[j - 1]).to_ascii_lowercase()),
                    )
                }
                _ => {
                    let gap = if mode.allow3() && node.spine3 { '~' } else { '-' };
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j, d);
                    (
                        format!("{}{}", ss, ss_char(cm, pos)),
                        format!("{}{}", m, model_char(cm, pos)),
                        format!("{}{}", t, gap),
                    )
                }
            }
        }

        NodeKind::Pair { left, right, child: c } => {
            let child = &tables[c];
            let ps = &cm.pair_scores[&v];
            let del = if mode.allow5() && node.spine5 && mode.allow3() && node.spine3 {
                0.0
            } else {
                cm.del_pair
            };
            // 0 = delete, 1 = emit pair, 2 = right marginal, 3 = left
            // marginal, 4 = left insert, 5 = right insert
            let mut best = del + child.get(j, d);
            let mut choice = 0u8;
            if d >= 2 {
                let emit = cm.pair_emit(v, res[i], res[j - 1]) + child.get(j - 1, d - 2);
                if emit > best {
                    best = emit;
                    choice = 1;
                }
            }
            if d >= 1 {
                if mode.allow5() && node.spine5 {
                    let s = emit1(&ps.marg_right, res[j - 1]) + child.get(j - 1, d - 1);
                    if s > best {
                        best = s;
                        choice = 2;
                    }
                }
                if mode.allow3() && node.spine3 {
                    let s = emit1(&ps.marg_left, res[i]) + child.get(j, d - 1);
                    if s > best {
                        best = s;
                        choice = 3;
                    }
                }
                let ins = cm.ins + tables[v].get(j, d - 1);
                if ins > best {
                    best = ins;
                    choice = 4;
                }
                let ins_r = cm.ins + tables[v].get(j - 1, d - 1);
                if ins_r > best {
                    choice = 5;
                }
            }
            let lc_ss = ss_char(cm, left);
            let rc_ss = ss_char(cm, right);
            let lc_m = model_char(cm, left);
            let rc_m = model_char(cm, right);
            match choice {
                1 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j - 1, d - 2);
                    (
                        format!("{}{}{}", lc_ss, ss, rc_ss),
                        format!("{}{}{}", lc_m, m, rc_m),
                        format!("{}{}{}", decode(res[i]), t, decode(res[j - 1])),
                    )
                }
                2 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j - 1, d - 1);
                    (
                        format!("{}{}{}", lc_ss, ss, rc_ss),
                        format!("{}{}{}", lc_m, m, rc_m),
                        format!("~{}{}", t, decode(res[j - 1])),
                    )
                }
                3 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j, d - 1);
                    (
                        format!("{}{}{}", lc_ss, ss, rc_ss),
                        format!("{}{}{}", lc_m, m, rc_m),
                        format!("{}{}~", decode(res[i]), t),
                    )
                }
                4 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, v, j, d - 1);
                    (
                        format!(".{}", ss),
                        format!(".{}", m),
                        format!("{}{}", decode(res[i]).to_ascii_lowercase(), t),
                    )
                }
                5 => {
                    let (ss, m, t) = trace(cm, res, tables, mode, v, j - 1, d - 1);
                    (
                        format!("{}.", ss),
                        format!("{}.", m),
                        format!("{}{}", t, decode(res[j - 1]).to_ascii_lowercase()),
                    )
                }
                _ => {
                    let gap = if del == 0.0 { '~' } else { '-' };
                    let (ss, m, t) = trace(cm, res, tables, mode, c, j, d);
                    (
                        format!("{}{}{}", lc_ss, ss, rc_ss),
                        format!("{}{}{}", lc_m, m, rc_m),
                        format!("{}{}{}", gap, t, gap),
                    )
                }
            }
        }

        NodeKind::Bifurc { left, right } => {
            let lc = &tables[left];
            let rc = &tables[right];
            let mut best = NEG_INF;
            let mut best_dl: Option<usize> = None;
            let dl_lo = lc.dmin().max(d.saturating_sub(rc.dmax()));
            let dl_hi = lc.dmax().min(d.saturating_sub(rc.dmin()));
            for dl in dl_lo..=dl_hi.min(d) {
                let s = lc.get(i + dl, dl) + rc.get(j, d - dl);
                if s > best {
                    best = s;
                    best_dl = Some(dl);
                }
            }
            let mut skip: Option<bool> = None; // Some(true) = skip left
            if mode.allow5() && node.spine5 && rc.get(j, d) > best {
                best = rc.get(j, d);
                skip = Some(true);
            }
            if mode.allow3() && node.spine3 && lc.get(j, d) > best {
                skip = Some(false);
            }
            match skip {
                Some(true) => trace(cm, res, tables, mode, right, j, d),
                Some(false) => trace(cm, res, tables, mode, left, j, d),
                None => {
                    let dl = best_dl.unwrap_or(0);
                    let (lss, lm, lt) = trace(cm, res, tables, mode, left, i + dl, dl);
                    let (rss, rm, rt) = trace(cm, res, tables, mode, right, j, d - dl);
                    (
                        format!("{}{}", lss, rss),
                        format!("{}{}", lm, rm),
                        format!("{}{}", lt, rt),
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Calibration;
    use crate::sequence::encode;

    const NULL: [f64; 4] = [0.25; 4];

    fn hairpin() -> CovarianceModel {
        CovarianceModel::from_consensus(
            "hp",
            b"GGGCAAAAGCCC",
            "((((....))))",
            None,
            NULL,
            Calibration::default(),
        )
        .unwrap()
    }

    fn score(cm: &CovarianceModel, seq: &[u8], mode: TruncMode) -> f32 {
        let res = encode(seq);
        let bands = DpBands::for_region(cm, res.len(), 8, 4);
        cyk_score(cm, &res, &bands, mode)
    }

    #[test]
    fn consensus_sequence_parses_with_high_score() {
        let cm = hairpin();
        let s = score(&cm, b"GGGCAAAAGCCC", TruncMode::None);
        // Four consensus pairs plus four loop residues, all strongly
        // positive in log-odds.
        assert!(s > 15.0);
    }

    #[test]
    fn flanking_residues_cost_only_insert_penalties() {
        let cm = hairpin();
        let exact = score(&cm, b"GGGCAAAAGCCC", TruncMode::None);
        // Two extra residues on each side, as a padded envelope hands
        // us: each one is absorbed as an insert at the root pair, not
        // by mispairing the stem.
        let padded = score(&cm, b"UAGGGCAAAAGCCCAU", TruncMode::None);
        assert!(padded >= exact + 4.0 * cm.ins - 1e-4);
        assert!(padded > 15.0);
    }

    #[test]
    fn structure_signal_beats_sequence_signal() {
        let cm = hairpin();
        // Same stem with compensatory changes (different but still
        // canonical pairs) versus the consensus primary sequence with
        // the stem broken.
        let compensatory = score(&cm, b"CGGCAAAAGCCG", TruncMode::None);
        let broken_stem = score(&cm, b"GGGCAAAAGGGC", TruncMode::None);
        assert!(compensatory > broken_stem);
    }

    #[test]
    fn random_sequence_scores_low() {
        let cm = hairpin();
        let hit = score(&cm, b"GGGCAAAAGCCC", TruncMode::None);
        let junk = score(&cm, b"AUCAUGAUCGAU", TruncMode::None);
        assert!(hit > junk + 10.0);
    }

    #[test]
    fn truncated_mode_rescues_a_cut_hit() {
        let cm = hairpin();
        // 5' half of the hairpin missing: the plain parse pays delete
        // penalties, the 5'-truncated parse does not.
        let cut = b"AAGCCC";
        let plain = score(&cm, cut, TruncMode::None);
        let trunc = score(&cm, cut, TruncMode::Five);
        assert!(trunc > plain);
    }

    #[test]
    fn truncated_score_never_drops_below_plain() {
        let cm = hairpin();
        for seq in [&b"GGGCAAAAGCCC"[..], b"AAGCCC", b"GGGCAA", b"ACGU"] {
            let plain = score(&cm, seq, TruncMode::None);
            assert!(score(&cm, seq, TruncMode::Five) >= plain - 1e-4);
            assert!(score(&cm, seq, TruncMode::Three) >= plain - 1e-4);
            assert!(score(&cm, seq, TruncMode::Both) >= plain - 1e-4);
        }
    }

    #[test]
    fn alignment_lines_are_consistent() {
        let cm = hairpin();
        let res = encode(b"GGGCAAUAAGCCC"); // one inserted residue
        let bands = DpBands::for_region(&cm, res.len(), 8, 4);
        let (s, ali) = cyk_align(&cm, &res, &bands, TruncMode::None).unwrap();
        assert!(s > 10.0);
        assert_eq!(ali.ss_line.len(), ali.model_line.len());
        assert_eq!(ali.model_line.len(), ali.target_line.len());
        // Every envelope residue appears in the target line.
        let emitted: usize = ali
            .target_line
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .count();
        assert_eq!(emitted, res.len());
        // The insertion shows up as a lowercase residue.
        assert!(ali.target_line.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn alignment_score_matches_cyk_score() {
        let cm = hairpin();
        let res = encode(b"GGGCAAAAGCC"); // one deleted residue
        let bands = DpBands::for_region(&cm, res.len(), 8, 4);
        let plain = cyk_score(&cm, &res, &bands, TruncMode::None);
        let (s, ali) = cyk_align(&cm, &res, &bands, TruncMode::None).unwrap();
        assert_eq!(s, plain);
        assert!(ali.target_line.contains('-'));
    }
}
