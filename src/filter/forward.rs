//! Local profile Forward filter: probability mass over all paths.
//!
//! Identical state graph to the Viterbi filter with max replaced by
//! log-sum-exp, so the score reflects all alignments rather than just
//! the best one. The most discriminating and most expensive of the
//! three linear passes; applied only to Viterbi survivors.
//!
//! Reference: hmmer/src/generic_fwdback.c (p7_GForward).

use super::{log2_sum_exp, NEG_INF};
use crate::model::profile::FilterProfile;

/// Forward score in bits: log2 of the summed odds of every local
/// alignment path (including the empty one, which anchors the score at
/// a minimum of 0).
pub fn forward_score(prof: &FilterProfile, window: &[u8]) -> f32 {
    let l = window.len();
    let m = prof.m;
    if l == 0 || m == 0 {
        return 0.0;
    }

    let mut fm_prev = vec![NEG_INF; m + 1];
    let mut fi_prev = vec![NEG_INF; m + 1];
    let mut fd_prev = vec![NEG_INF; m + 1];
    let mut fm = vec![NEG_INF; m + 1];
    let mut fi = vec![NEG_INF; m + 1];
    let mut fd = vec![NEG_INF; m + 1];
    // Accumulates exits from every M_k at every residue, plus the empty
    // alignment at odds 1.
    let mut total = 0.0f32;

    for &res in window {
        fm[0] = NEG_INF;
        fi[0] = NEG_INF;
        fd[0] = NEG_INF;
        for k in 1..=m {
            let emit = prof.match_score(k - 1, res);
            let mut path = prof.entry;
            path = log2_sum_exp(path, fm_prev[k - 1] + prof.t_mm);
            path = log2_sum_exp(path, fi_prev[k - 1] + prof.t_im);
            path = log2_sum_exp(path, fd_prev[k - 1] + prof.t_dm);
            fm[k] = emit + path;

            fi[k] = log2_sum_exp(fm_prev[k] + prof.t_mi, fi_prev[k] + prof.t_ii);
            fd[k] = log2_sum_exp(fm[k - 1] + prof.t_md, fd[k - 1] + prof.t_dd);

            total = log2_sum_exp(total, fm[k]);
        }
        std::mem::swap(&mut fm, &mut fm_prev);
        std::mem::swap(&mut fi, &mut fi_prev);
        std::mem::swap(&mut fd, &mut fd_prev);
    }
    total
}
