//! Composition bias correction.
//!
//! Down-weights scores attributable to generic sequence composition
//! rather than true model match: a region whose residue frequencies
//! diverge from the null background gets a correction equal to the
//! log-odds of the region under its own composition versus the null,
//! tempered by a fixed prior on the biased-composition hypothesis. The
//! KL term is non-negative, so a corrected score never exceeds the raw
//! score.
//!
//! Reference: infernal null3 correction (infernal/src/cm_parsetree.c,
//! ScoreCorrectionNull3); omega prior as in hmmer/src/null2.c.

use crate::sequence::NUM_CODES;

/// log2 prior weight of the biased-composition null hypothesis.
const LOG2_OMEGA: f64 = -7.0;

/// Bias correction in bits for a scored region, always >= 0. Ambiguous
/// residues are excluded from the composition estimate.
pub fn null_bias(region: &[u8], null: &[f64; 4]) -> f32 {
    let mut counts = [0u64; NUM_CODES];
    let mut n = 0u64;
    for &r in region {
        if (r as usize) < NUM_CODES {
            counts[r as usize] += 1;
            n += 1;
        }
    }
    if n == 0 {
        return 0.0;
    }

    // One pseudocount per residue keeps the estimate defined for short
    // or skewed regions.
    let denom = (n + NUM_CODES as u64) as f64;
    let mut kl = 0.0f64;
    for x in 0..NUM_CODES {
        let f = (counts[x] + 1) as f64 / denom;
        kl += f * (f / null[x]).log2();
    }

    (n as f64 * kl + LOG2_OMEGA).max(0.0) as f32
}
