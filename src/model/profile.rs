//! Linear filter profile derived from the covariance model.
//!
//! The acceleration filters ignore secondary structure: each consensus
//! position contributes its single-residue emission (pair positions use
//! the pair's marginal distribution, the standard way a filter HMM is
//! read off a CM), glued together with fixed match/insert/delete
//! transitions. Insert emissions score zero (background).
//!
//! Reference: infernal/src/cm_modelconfig.c (the CM's maximum-likelihood
//! filter HMM is built from marginalized pair emissions);
//! hmmer/src/p7_profile.c for the local entry convention.

use super::CovarianceModel;
use crate::sequence::NUM_CODES;

#[derive(Debug, Clone)]
pub struct FilterProfile {
    /// Number of match positions (= model consensus length).
    pub m: usize,
    /// Match emission log-odds per position.
    pub match_scores: Vec<[f32; 4]>,
    // Transition scores, bits.
    pub t_mm: f32,
    pub t_mi: f32,
    pub t_md: f32,
    pub t_im: f32,
    pub t_ii: f32,
    pub t_dm: f32,
    pub t_dd: f32,
    /// Local-mode entry score into any match position.
    pub entry: f32,
}

impl FilterProfile {
    pub fn from_model(cm: &CovarianceModel) -> Self {
        // Fixed miniaturized transition distribution; the real engine
        // reads these per-position from the trained model.
        const P_MM: f32 = 0.90;
        const P_MI: f32 = 0.05;
        const P_MD: f32 = 0.05;
        const P_IM: f32 = 0.80;
        const P_II: f32 = 0.20;
        const P_DM: f32 = 0.75;
        const P_DD: f32 = 0.25;

        Self {
            m: cm.clen,
            match_scores: cm.single_scores.clone(),
            t_mm: P_MM.log2(),
            t_mi: P_MI.log2(),
            t_md: P_MD.log2(),
            t_im: P_IM.log2(),
            t_ii: P_II.log2(),
            t_dm: P_DM.log2(),
            t_dd: P_DD.log2(),
            entry: -(cm.clen as f32).log2(),
        }
    }

    /// Match emission at `pos` (0-based), ambiguity-safe.
    #[inline]
    pub fn match_score(&self, pos: usize, res: u8) -> f32 {
        if (res as usize) < NUM_CODES {
            self.match_scores[pos][res as usize]
        } else {
            super::AMBIG_SCORE
        }
    }
}
