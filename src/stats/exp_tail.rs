//! Exponential-tail score statistics.
//!
//! Each scoring pass (SSV, Viterbi, Forward, glocal Forward, CYK, Inside)
//! carries its own calibrated tail: the probability that a random window
//! scores at least `s` bits is modeled as
//!
//! ```text
//! P(S >= s) = min(1, exp(-lambda * (s - tau)))
//! ```
//!
//! Filter thresholds are the inverse of this survival function: a stage
//! configured to pass an expected fraction F of random windows uses the
//! score at which P(S >= s) = F. E-values scale the survival probability
//! by the effective number of independent windows in the database.
//!
//! Reference: easel/esl_exponential.c (esl_exp_surv, esl_exp_invsurv);
//! infernal/src/cm_pipeline.c threshold setup in cm_pli_NewModel.

/// Calibrated exponential-tail parameters for one scoring pass.
#[derive(Debug, Clone, Copy)]
pub struct ExpTailParams {
    /// Tail decay rate, per bit.
    pub lambda: f64,
    /// Tail offset: the score at which survival probability reaches 1.
    pub tau: f64,
}

impl ExpTailParams {
    pub fn new(lambda: f64, tau: f64) -> Self {
        Self { lambda, tau }
    }

    /// Survival probability P(S >= s) for a single random window.
    pub fn surv(&self, s: f64) -> f64 {
        if s <= self.tau {
            1.0
        } else {
            (-self.lambda * (s - self.tau)).exp()
        }
    }

    /// Score threshold at which the expected fraction of random windows
    /// passing equals `frac`. Inverse of [`surv`](Self::surv).
    pub fn score_for_surv(&self, frac: f64) -> f64 {
        debug_assert!(frac > 0.0 && frac <= 1.0);
        self.tau - frac.ln() / self.lambda
    }

    /// E-value: expected number of windows scoring >= `s` among
    /// `eff_windows` independent random windows.
    pub fn evalue(&self, s: f64, eff_windows: f64) -> f64 {
        self.surv(s) * eff_windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surv_is_one_at_and_below_tau() {
        let t = ExpTailParams::new(0.8, 2.0);
        assert_eq!(t.surv(2.0), 1.0);
        assert_eq!(t.surv(-10.0), 1.0);
        assert!(t.surv(2.1) < 1.0);
    }

    #[test]
    fn surv_decreases_monotonically() {
        let t = ExpTailParams::new(0.8, 0.0);
        let mut prev = 2.0;
        for i in 0..50 {
            let p = t.surv(i as f64 * 0.5);
            assert!(p <= prev);
            prev = p;
        }
    }

    #[test]
    fn threshold_inverts_survival() {
        let t = ExpTailParams::new(0.693, -3.5);
        for &f in &[0.35, 0.15, 0.0008, 0.0001] {
            let s = t.score_for_surv(f);
            assert!((t.surv(s) - f).abs() / f < 1e-9);
        }
    }

    #[test]
    fn stricter_fraction_means_higher_threshold() {
        let t = ExpTailParams::new(0.7, 0.0);
        assert!(t.score_for_surv(0.0008) > t.score_for_surv(0.35));
    }

    #[test]
    fn evalue_scales_with_database_size() {
        let t = ExpTailParams::new(0.7, 0.0);
        let e1 = t.evalue(20.0, 1e5);
        let e2 = t.evalue(20.0, 2e5);
        assert!((e2 / e1 - 2.0).abs() < 1e-12);
    }
}
