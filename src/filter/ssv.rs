//! SSV filter: best ungapped diagonal.
//!
//! The cheapest pass: for every diagonal of the (window x model) plane,
//! take the best-scoring contiguous run of match emissions (Kadane's
//! running-maximum, resetting at negative prefixes). No transitions, no
//! gaps; flanking residues score zero because emissions are log-odds
//! against the background.
//!
//! Reference: hmmer/src/impl/ssvfilter.c (the SSV special case of MSV:
//! single ungapped diagonal, no J state).

use crate::model::profile::FilterProfile;

/// Best ungapped diagonal score of `window` against the profile, bits.
/// Returns 0.0 for an empty window (the empty alignment).
pub fn ssv_score(prof: &FilterProfile, window: &[u8]) -> f32 {
    let l = window.len();
    let m = prof.m;
    if l == 0 || m == 0 {
        return 0.0;
    }

    let mut best = 0.0f32;
    // Diagonal d pairs model position k with residue k + d.
    let lo = -(m as isize - 1);
    let hi = l as isize - 1;
    for d in lo..=hi {
        let k_start = if d < 0 { (-d) as usize } else { 0 };
        let i_start = k_start as isize + d;
        let run_len = (m - k_start).min(l - i_start as usize);
        let mut running = 0.0f32;
        let mut i = i_start as usize;
        for k in k_start..k_start + run_len {
            running += prof.match_score(k, window[i]);
            if running < 0.0 {
                running = 0.0;
            } else if running > best {
                best = running;
            }
            i += 1;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Calibration, CovarianceModel};
    use crate::sequence::encode;

    fn prof() -> FilterProfile {
        CovarianceModel::from_consensus(
            "hp",
            b"GGGCAAAAGCCC",
            "((((....))))",
            None,
            [0.25; 4],
            Calibration::default(),
        )
        .unwrap()
        .filter_profile()
    }

    #[test]
    fn consensus_window_scores_high() {
        let p = prof();
        let hit = ssv_score(&p, &encode(b"GGGCAAAAGCCC"));
        let junk = ssv_score(&p, &encode(b"AAAAAAAAAAAA"));
        assert!(hit > junk);
        assert!(hit > 5.0);
    }

    #[test]
    fn score_is_nonnegative_and_zero_for_empty() {
        let p = prof();
        assert_eq!(ssv_score(&p, &[]), 0.0);
        assert!(ssv_score(&p, &encode(b"UUUU")) >= 0.0);
    }

    #[test]
    fn offset_match_found_on_shifted_diagonal() {
        let p = prof();
        let centered = ssv_score(&p, &encode(b"GGGCAAAAGCCC"));
        let shifted = ssv_score(&p, &encode(b"AUAUGGGCAAAAGCCCAUAU"));
        // Flanks score zero on their own diagonal run, so the embedded
        // consensus is found at full strength.
        assert!((centered - shifted).abs() < 1e-4);
    }

    #[test]
    fn ambiguous_residues_do_not_panic() {
        let p = prof();
        let s = ssv_score(&p, &encode(b"GGNNAANNGCCC"));
        assert!(s.is_finite());
    }
}
