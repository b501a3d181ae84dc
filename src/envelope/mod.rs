//! Envelope definition: tightening a surviving window into refined match
//! boundaries before the structural stages.
//!
//! A window that passed every local filter is re-scored glocally
//! (global-in-model, local-in-sequence): the glocal Viterbi boundaries
//! become the envelope, and a glocal Forward + bias gate decides whether
//! the envelope is kept at all: a window may pass the local filters yet
//! fail here. Envelopes from adjacent windows of the same sequence and
//! strand are merged when they overlap, so one structural hit is never
//! reported twice.
//!
//! Reference: infernal/src/cm_pipeline.c (pli_p7_env_def).

use crate::filter::{glocal_forward_score, glocal_viterbi_bounds, null_bias};
use crate::model::profile::FilterProfile;
use crate::sequence::Window;

/// A refined candidate region in strand-local coordinates (0-based,
/// half-open). At most one final hit can come from one envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub start: usize,
    pub end: usize,
    /// Bias-corrected glocal Forward score of the defining window, bits.
    pub gfwd_bits: f32,
    /// Envelope abuts the 5' end of the strand.
    pub touches_5p: bool,
    /// Envelope abuts the 3' end of the strand.
    pub touches_3p: bool,
}

impl Envelope {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    fn overlaps(&self, other: &Envelope) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Run the glocal gate on a surviving window and, if it passes, return
/// the padded envelope in strand-local coordinates. `None` is funnel
/// attrition, not an error.
pub fn define_envelope(
    prof: &FilterProfile,
    window_res: &[u8],
    window: &Window,
    seq_len: usize,
    threshold: f32,
    null: &[f64; 4],
    pad: usize,
) -> Option<Envelope> {
    let (vstart, vend, _) = glocal_viterbi_bounds(prof, window_res)?;

    let gfwd = glocal_forward_score(prof, window_res);
    let bias = null_bias(&window_res[vstart..vend], null);
    let corrected = gfwd - bias;
    if corrected < threshold {
        return None;
    }

    let start = window.start + vstart.saturating_sub(pad);
    let end = (window.start + vend + pad).min(window.end);
    Some(Envelope {
        start,
        end,
        gfwd_bits: corrected,
        touches_5p: start == 0,
        touches_3p: end == seq_len,
    })
}

/// Merge overlapping envelopes on one (sequence, strand). Input order is
/// irrelevant; output is sorted by start and pairwise disjoint. The
/// merged envelope keeps the best gate score and the union of the
/// boundary-contact flags.
pub fn merge_envelopes(mut envs: Vec<Envelope>) -> Vec<Envelope> {
    envs.sort_by_key(|e| (e.start, e.end));
    let mut merged: Vec<Envelope> = Vec::with_capacity(envs.len());
    for env in envs {
        match merged.last_mut() {
            Some(last) if last.overlaps(&env) => {
                last.end = last.end.max(env.end);
                last.gfwd_bits = last.gfwd_bits.max(env.gfwd_bits);
                last.touches_5p |= env.touches_5p;
                last.touches_3p |= env.touches_3p;
            }
            _ => merged.push(env),
        }
    }
    merged
}
