//! The query covariance model.
//!
//! A [`CovarianceModel`] carries both representations of an RNA family
//! used by the pipeline: the structural one (a guide tree of nodes over
//! consensus positions, with base-pair emissions spanning two positions
//! at once) scored by the banded CYK/Inside stages, and a derived linear
//! profile ([`profile::FilterProfile`]) scored by the acceleration
//! filters.
//!
//! This is a miniaturized model: emission log-odds are derived from the
//! consensus sequence (a match/mismatch distribution per position, a
//! joint distribution favoring the consensus pair and canonical pairs
//! per pair node) rather than read from full trained emission tables.
//! Calibration constants for the score tails are read from the model
//! file and treated as read-only; this crate never recalibrates.
//!
//! Reference: infernal/src/cm_modelmaker.c (HandModelmaker guide tree
//! construction), infernal/src/cm.c (node taxonomy).

pub mod file;
pub mod profile;

use anyhow::{bail, Result};
use rustc_hash::FxHashMap;

use crate::sequence::{self, NUM_CODES};
use crate::stats::ExpTailParams;

/// Emission score charged when the residue is the ambiguity sentinel.
pub const AMBIG_SCORE: f32 = -1.0;

/// Score a single-residue emission table against a possibly-ambiguous
/// residue code.
#[inline]
pub fn emit1(scores: &[f32; 4], res: u8) -> f32 {
    if (res as usize) < NUM_CODES {
        scores[res as usize]
    } else {
        AMBIG_SCORE
    }
}

/// Guide tree node kinds. `pos` fields are 0-based consensus positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Emits one residue on the left edge of its region.
    Left { pos: usize, child: usize },
    /// Emits one residue on the right edge of its region.
    Right { pos: usize, child: usize },
    /// Emits two residues simultaneously (a base pair).
    Pair {
        left: usize,
        right: usize,
        child: usize,
    },
    /// Splits its region into two independent subtrees.
    Bifurc { left: usize, right: usize },
    /// Terminates a branch; absorbs leftover inserted residues.
    End,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Consensus residues emitted by this node's subtree.
    pub espan: usize,
    /// On the 5' edge spine: eligible for free 5'-truncation options.
    pub spine5: bool,
    /// On the 3' edge spine.
    pub spine3: bool,
}

/// Joint and marginal emission scores for one pair node, in bits.
#[derive(Debug, Clone)]
pub struct PairScores {
    /// Joint log-odds against the independent background, indexed
    /// [left][right].
    pub joint: [[f32; 4]; 4],
    /// Left-residue marginal log-odds (right residue missing).
    pub marg_left: [f32; 4],
    /// Right-residue marginal log-odds (left residue missing).
    pub marg_right: [f32; 4],
}

/// Calibrated exponential-tail constants, one per scoring pass.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub ssv: ExpTailParams,
    pub vit: ExpTailParams,
    pub fwd: ExpTailParams,
    pub gfwd: ExpTailParams,
    pub cyk: ExpTailParams,
    pub inside: ExpTailParams,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            ssv: ExpTailParams::new(0.60, -2.0),
            vit: ExpTailParams::new(0.60, -1.5),
            fwd: ExpTailParams::new(0.55, -0.5),
            gfwd: ExpTailParams::new(0.55, 0.0),
            cyk: ExpTailParams::new(0.80, 1.0),
            inside: ExpTailParams::new(0.70, 2.0),
        }
    }
}

/// A pre-calibrated query model, immutable once loaded and shared
/// read-only across all workers.
#[derive(Debug, Clone)]
pub struct CovarianceModel {
    pub name: String,
    /// Consensus length: number of consensus positions.
    pub clen: usize,
    /// Window size W: expected maximum hit span in residues.
    pub window: usize,
    /// Encoded consensus residues, one per consensus position.
    pub consensus: Vec<u8>,
    /// Pairing partner per consensus position.
    pub pair_partner: Vec<Option<usize>>,
    /// Guide tree; children always precede parents, root is last.
    pub nodes: Vec<Node>,
    pub root: usize,
    /// Background residue frequencies of the null model.
    pub null: [f64; 4],
    /// Single-residue emission log-odds per consensus position (pair
    /// positions hold their marginal, used by the linear profile).
    pub single_scores: Vec<[f32; 4]>,
    /// Pair emission tables keyed by pair-node index.
    pub pair_scores: FxHashMap<usize, PairScores>,
    /// Deletion score for a single-emitting node, bits.
    pub del_single: f32,
    /// Deletion score for a pair node, bits.
    pub del_pair: f32,
    /// Per-residue insertion score, bits.
    pub ins: f32,
    pub cal: Calibration,
}

impl CovarianceModel {
    /// Build a model from an ASCII consensus sequence and a dot-bracket
    /// structure string. `window` of `None` picks a default from the
    /// consensus length.
    pub fn from_consensus(
        name: &str,
        consensus: &[u8],
        structure: &str,
        window: Option<usize>,
        null: [f64; 4],
        cal: Calibration,
    ) -> Result<Self> {
        let cons = sequence::encode(consensus);
        if cons.is_empty() {
            bail!("model '{}' has an empty consensus", name);
        }
        if let Some(bad) = cons.iter().position(|&c| c as usize >= NUM_CODES) {
            bail!(
                "model '{}' consensus has a non-ACGU residue at position {}",
                name,
                bad + 1
            );
        }
        let pair_partner = parse_dot_bracket(structure)?;
        if pair_partner.len() != cons.len() {
            bail!(
                "model '{}': structure length {} does not match consensus length {}",
                name,
                pair_partner.len(),
                cons.len()
            );
        }

        let clen = cons.len();
        let mut nodes = Vec::with_capacity(2 * clen);
        let root = build_guide_tree(&pair_partner, 0, clen, &mut nodes);
        mark_edge_spines(&mut nodes, root);

        let mut cm = Self {
            name: name.to_string(),
            clen,
            window: window.unwrap_or(clen + (clen / 10).max(10)),
            consensus: cons,
            pair_partner,
            nodes,
            root,
            null,
            single_scores: Vec::new(),
            pair_scores: FxHashMap::default(),
            del_single: -2.5,
            del_pair: -4.0,
            ins: -1.2,
            cal,
        };
        cm.fill_emissions();
        Ok(cm)
    }

    /// Derive the linear filter profile (pair positions marginalized).
    pub fn filter_profile(&self) -> profile::FilterProfile {
        profile::FilterProfile::from_model(self)
    }

    /// Sequences shorter than this are skipped with a note rather than
    /// scanned.
    pub fn min_hit_span(&self) -> usize {
        (self.clen / 2).max(1)
    }

    /// Pair emission score for pair node `node_idx`, ambiguity-safe.
    #[inline]
    pub fn pair_emit(&self, node_idx: usize, left: u8, right: u8) -> f32 {
        let ps = &self.pair_scores[&node_idx];
        if (left as usize) < NUM_CODES && (right as usize) < NUM_CODES {
            ps.joint[left as usize][right as usize]
        } else if (left as usize) < NUM_CODES {
            ps.marg_left[left as usize] + AMBIG_SCORE
        } else if (right as usize) < NUM_CODES {
            ps.marg_right[right as usize] + AMBIG_SCORE
        } else {
            2.0 * AMBIG_SCORE
        }
    }

    fn fill_emissions(&mut self) {
        // Per-position match distribution: consensus residue gets the
        // bulk of the mass, the rest is spread evenly.
        const P_CONS: f64 = 0.85;
        const P_OFF: f64 = 0.05;

        self.single_scores = vec![[0.0; 4]; self.clen];
        for pos in 0..self.clen {
            if self.pair_partner[pos].is_some() {
                continue; // filled from the pair marginal below
            }
            let cons = self.consensus[pos] as usize;
            for x in 0..NUM_CODES {
                let p = if x == cons { P_CONS } else { P_OFF };
                self.single_scores[pos][x] = (p / self.null[x]).log2() as f32;
            }
        }

        // Pair tables: consensus pair heavily favored, other canonical
        // pairs (Watson-Crick + GU) next, everything else low. Weights
        // are normalized so each table is a proper distribution.
        const W_CONS: f64 = 0.60;
        const W_CANON: f64 = 0.05;
        const W_OTHER: f64 = 0.015;

        let pair_nodes: Vec<(usize, usize, usize)> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n.kind {
                NodeKind::Pair { left, right, .. } => Some((i, left, right)),
                _ => None,
            })
            .collect();

        for (node_idx, lpos, rpos) in pair_nodes {
            let cl = self.consensus[lpos] as usize;
            let cr = self.consensus[rpos] as usize;

            let mut p = [[0.0f64; 4]; 4];
            let mut total = 0.0;
            for l in 0..NUM_CODES {
                for r in 0..NUM_CODES {
                    let w = if l == cl && r == cr {
                        W_CONS
                    } else if is_canonical_pair(l as u8, r as u8) {
                        W_CANON
                    } else {
                        W_OTHER
                    };
                    p[l][r] = w;
                    total += w;
                }
            }

            let mut ps = PairScores {
                joint: [[0.0; 4]; 4],
                marg_left: [0.0; 4],
                marg_right: [0.0; 4],
            };
            let mut ml = [0.0f64; 4];
            let mut mr = [0.0f64; 4];
            for l in 0..NUM_CODES {
                for r in 0..NUM_CODES {
                    let prob = p[l][r] / total;
                    ps.joint[l][r] = (prob / (self.null[l] * self.null[r])).log2() as f32;
                    ml[l] += prob;
                    mr[r] += prob;
                }
            }
            for x in 0..NUM_CODES {
                ps.marg_left[x] = (ml[x] / self.null[x]).log2() as f32;
                ps.marg_right[x] = (mr[x] / self.null[x]).log2() as f32;
            }

            self.single_scores[lpos] = ps.marg_left;
            self.single_scores[rpos] = ps.marg_right;
            self.pair_scores.insert(node_idx, ps);
        }
    }
}

/// True for the six pairs a CM treats as structurally compatible
/// (Watson-Crick plus the GU wobble).
pub fn is_canonical_pair(l: u8, r: u8) -> bool {
    matches!(
        (l, r),
        (0, 3) | (3, 0) | (1, 2) | (2, 1) | (2, 3) | (3, 2)
    )
}

/// Parse a dot-bracket structure string into a pairing table. Any of
/// `(<[{` opens a pair, the matching closer closes it; `.,:_-~` are
/// unpaired. Pseudoknots (crossing pairs) are rejected: every closer
/// must match the innermost open bracket regardless of bracket type.
pub fn parse_dot_bracket(ss: &str) -> Result<Vec<Option<usize>>> {
    let mut partner = vec![None; ss.len()];
    let mut stack: Vec<(usize, char)> = Vec::new();
    for (i, ch) in ss.chars().enumerate() {
        match ch {
            '(' | '<' | '[' | '{' => stack.push((i, ch)),
            ')' | '>' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    '>' => '<',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((j, open)) if open == expected => {
                        partner[i] = Some(j);
                        partner[j] = Some(i);
                    }
                    Some((_, open)) => bail!(
                        "structure column {}: closer '{}' crosses open '{}'",
                        i + 1,
                        ch,
                        open
                    ),
                    None => bail!("structure column {}: unmatched closer '{}'", i + 1, ch),
                }
            }
            '.' | ',' | ':' | '_' | '-' | '~' => {}
            other => bail!("structure column {}: unrecognized character '{}'", i + 1, other),
        }
    }
    if let Some((j, open)) = stack.pop() {
        bail!("structure column {}: unmatched opener '{}'", j + 1, open);
    }
    Ok(partner)
}

/// Recursively build the guide tree over consensus positions [lo, hi).
/// Children are appended before their parent, so ascending node index is
/// a valid bottom-up evaluation order. Returns the subtree root index.
fn build_guide_tree(
    partner: &[Option<usize>],
    lo: usize,
    hi: usize,
    nodes: &mut Vec<Node>,
) -> usize {
    if lo >= hi {
        nodes.push(Node {
            kind: NodeKind::End,
            espan: 0,
            spine5: false,
            spine3: false,
        });
        return nodes.len() - 1;
    }

    let p = match partner[lo] {
        None => {
            let child = build_guide_tree(partner, lo + 1, hi, nodes);
            let espan = nodes[child].espan + 1;
            nodes.push(Node {
                kind: NodeKind::Left { pos: lo, child },
                espan,
                spine5: false,
                spine3: false,
            });
            return nodes.len() - 1;
        }
        Some(p) => p,
    };

    if partner[hi - 1].is_none() {
        let child = build_guide_tree(partner, lo, hi - 1, nodes);
        let espan = nodes[child].espan + 1;
        nodes.push(Node {
            kind: NodeKind::Right { pos: hi - 1, child },
            espan,
            spine5: false,
            spine3: false,
        });
        return nodes.len() - 1;
    }

    // lo is paired; its partner is inside [lo, hi) because pairs nest.
    if p == hi - 1 {
        let child = build_guide_tree(partner, lo + 1, hi - 1, nodes);
        let espan = nodes[child].espan + 2;
        nodes.push(Node {
            kind: NodeKind::Pair {
                left: lo,
                right: hi - 1,
                child,
            },
            espan,
            spine5: false,
            spine3: false,
        });
        return nodes.len() - 1;
    }

    let left = build_guide_tree(partner, lo, p + 1, nodes);
    let right = build_guide_tree(partner, p + 1, hi, nodes);
    let espan = nodes[left].espan + nodes[right].espan;
    nodes.push(Node {
        kind: NodeKind::Bifurc { left, right },
        espan,
        spine5: false,
        spine3: false,
    });
    nodes.len() - 1
}

/// Mark the 5' and 3' edge spines: the node chains along the model's
/// left and right boundaries where truncated parses may enter or leave
/// without penalty. Parents have larger indices than children, so a
/// reverse sweep propagates the flags top-down.
fn mark_edge_spines(nodes: &mut [Node], root: usize) {
    nodes[root].spine5 = true;
    nodes[root].spine3 = true;
    for v in (0..nodes.len()).rev() {
        let (s5, s3) = (nodes[v].spine5, nodes[v].spine3);
        if !s5 && !s3 {
            continue;
        }
        match nodes[v].kind {
            NodeKind::Bifurc { left, right } => {
                if s5 {
                    nodes[left].spine5 = true;
                }
                if s3 {
                    nodes[right].spine3 = true;
                }
            }
            NodeKind::Left { child, .. }
            | NodeKind::Right { child, .. }
            | NodeKind::Pair { child, .. } => {
                if s5 {
                    nodes[child].spine5 = true;
                }
                if s3 {
                    nodes[child].spine3 = true;
                }
            }
            NodeKind::End => {}
        }
    }
}
