//! The linear-model filter engine: three escalating passes over the
//! derived filter profile (SSV, Viterbi, Forward), the glocal variants
//! used for envelope definition, and the composition bias correction
//! applied after each probabilistic pass.
//!
//! Every pass is a pure function from (profile, window residues) to a
//! bit score; pass/fail decisions against calibrated thresholds live in
//! the pipeline driver. A window failing a filter is funnel attrition,
//! never an error.
//!
//! Reference: infernal/src/cm_pipeline.c (pli_p7_filter);
//! hmmer/src/generic_msv.c, generic_viterbi.c, generic_fwdback.c.

pub mod bias;
pub mod forward;
pub mod glocal;
pub mod ssv;
pub mod viterbi;

pub use bias::null_bias;
pub use forward::forward_score;
pub use glocal::{glocal_forward_score, glocal_viterbi_bounds};
pub use ssv::ssv_score;
pub use viterbi::viterbi_score;

pub(crate) const NEG_INF: f32 = f32::NEG_INFINITY;

/// log2(2^a + 2^b), safe for -inf operands.
#[inline]
pub(crate) fn log2_sum_exp(a: f32, b: f32) -> f32 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if hi == NEG_INF {
        return NEG_INF;
    }
    if lo == NEG_INF {
        return hi;
    }
    hi + (1.0 + (lo - hi).exp2()).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log2_sum_exp_basics() {
        assert!((log2_sum_exp(0.0, 0.0) - 1.0).abs() < 1e-6);
        assert_eq!(log2_sum_exp(NEG_INF, NEG_INF), NEG_INF);
        assert_eq!(log2_sum_exp(3.5, NEG_INF), 3.5);
        // Dominated term barely moves the result.
        assert!((log2_sum_exp(0.0, -30.0) - 0.0).abs() < 1e-6);
        // Commutative.
        assert_eq!(log2_sum_exp(1.25, -0.5), log2_sum_exp(-0.5, 1.25));
    }
}
