//! Banded Inside: summed probability mass over all parses.
//!
//! Identical band structure and recursion to the CYK fill, with max
//! replaced by log-space summation, so the envelope's final bit score
//! credits alternative secondary-structure parses instead of only the
//! single best one.
//!
//! Reference: infernal/src/cm_dpsearch.c (FastIInsideScan).

use super::band::{BandedTable, DpBands};
use super::trunc::TruncMode;
use crate::filter::{log2_sum_exp, NEG_INF};
use crate::model::{emit1, CovarianceModel, NodeKind};

/// Total banded parse mass of the envelope in bits, -inf if no parse
/// fits the bands.
pub fn inside_score(cm: &CovarianceModel, res: &[u8], bands: &DpBands, mode: TruncMode) -> f32 {
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
                        let mut sum = del + child.get(j, d);
                        if d >= 1 {
                            let emit = emit1(&cm.single_scores[pos], res[i]);
                            sum = log2_sum_exp(sum, emit + child.get(j, d - 1));
                            sum = log2_sum_exp(sum, cm.ins + t.get(j, d - 1));
                        }
                        sum
                    }

                    NodeKind::Right { pos, child } => {
                        let child = &tables[child];
                        let del = if mode.allow3() && node.spine3 {
                            0.0
                        } else {
                            cm.del_single
                        };
                        let mut sum = del + child.get(j, d);
                        if d >= 1 {
                            let emit = emit1(&cm.single_scores[pos], res[j - 1]);
                            sum = log2_sum_exp(sum, emit + child.get(j - 1, d - 1));
                            sum = log2_sum_exp(sum, cm.ins + t.get(j - 1, d - 1));
                        }
                        sum
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
                        let mut sum = del + child.get(j, d);
                        if d >= 2 {
                            sum = log2_sum_exp(
                                sum,
                                cm.pair_emit(v, res[i], res[j - 1]) + child.get(j - 1, d - 2),
                            );
                        }
                        if d >= 1 {
                            if mode.allow5() && node.spine5 {
                                sum = log2_sum_exp(
                                    sum,
                                    emit1(&ps.marg_right, res[j - 1]) + child.get(j - 1, d - 1),
                                );
                            }
                            if mode.allow3() && node.spine3 {
                                sum = log2_sum_exp(
                                    sum,
                                    emit1(&ps.marg_left, res[i]) + child.get(j, d - 1),
                                );
                            }
                            sum = log2_sum_exp(sum, cm.ins + t.get(j, d - 1));
                            sum = log2_sum_exp(sum, cm.ins + t.get(j - 1, d - 1));
                        }
                        sum
                    }

                    NodeKind::Bifurc { left, right } => {
                        let lc = &tables[left];
                        let rc = &tables[right];
                        let mut sum = NEG_INF;
                        let dl_lo = lc.dmin().max(d.saturating_sub(rc.dmax()));
                        let dl_hi = lc.dmax().min(d.saturating_sub(rc.dmin()));
                        for dl in dl_lo..=dl_hi.min(d) {
                            sum = log2_sum_exp(sum, lc.get(i + dl, dl) + rc.get(j, d - dl));
                        }
                        if mode.allow5() && node.spine5 {
                            sum = log2_sum_exp(sum, rc.get(j, d));
                        }
                        if mode.allow3() && node.spine3 {
                            sum = log2_sum_exp(sum, lc.get(j, d));
                        }
                        sum
                    }
                };
                t.set(j, d, score);
            }
        }
        tables.push(t);
    }

    tables[cm.root].get(l, l)
}
