//! Glocal passes: global in the model, local in the sequence.
//!
//! Used by envelope definition. A glocal path must traverse the whole
//! model (entering interior positions only through a penalized delete
//! chain) but may start and end anywhere in the window. The Viterbi
//! variant propagates the start index through the DP so the optimal
//! boundaries come out without a traceback matrix.
//!
//! Reference: hmmer/src/generic_fwdback.c configured for glocal mode
//! (p7_profile.c, p7_ReconfigUnihit); start-index propagation as in
//! banded consensus aligners.

use super::{log2_sum_exp, NEG_INF};
use crate::model::profile::FilterProfile;

/// Score of entering delete state D_k straight from begin: the whole
/// model prefix 1..k deleted.
#[inline]
fn begin_chain(prof: &FilterProfile, k: usize) -> f32 {
    prof.t_md + (k as f32 - 1.0) * prof.t_dd
}

/// Glocal Forward score of `window` in bits: all paths that traverse the
/// entire model, summed over every start/end position in the window.
pub fn glocal_forward_score(prof: &FilterProfile, window: &[u8]) -> f32 {
    let l = window.len();
    let m = prof.m;
    if l == 0 || m == 0 {
        return NEG_INF;
    }

    let mut fm_prev = vec![NEG_INF; m + 1];
    let mut fi_prev = vec![NEG_INF; m + 1];
    let mut fd_prev: Vec<f32> = (0..=m)
        .map(|k| if k >= 1 { begin_chain(prof, k) } else { NEG_INF })
        .collect();
    let mut fm = vec![NEG_INF; m + 1];
    let mut fi = vec![NEG_INF; m + 1];
    let mut fd = vec![NEG_INF; m + 1];
    let mut total = NEG_INF;

    for &res in window {
        fm[0] = NEG_INF;
        fi[0] = NEG_INF;
        fd[0] = NEG_INF;
        for k in 1..=m {
            let emit = prof.match_score(k - 1, res);
            let path = if k == 1 {
                0.0 // glocal begin straight into M_1
            } else {
                let mut p = fm_prev[k - 1] + prof.t_mm;
                p = log2_sum_exp(p, fi_prev[k - 1] + prof.t_im);
                p = log2_sum_exp(p, fd_prev[k - 1] + prof.t_dm);
                p
            };
            fm[k] = emit + path;
            fi[k] = log2_sum_exp(fm_prev[k] + prof.t_mi, fi_prev[k] + prof.t_ii);
            // A fresh begin-delete chain can start after any residue.
            fd[k] = log2_sum_exp(
                begin_chain(prof, k),
                log2_sum_exp(fm[k - 1] + prof.t_md, fd[k - 1] + prof.t_dd),
            );
        }
        // Glocal exit only from the final model position.
        total = log2_sum_exp(total, log2_sum_exp(fm[m], fd[m]));
        std::mem::swap(&mut fm, &mut fm_prev);
        std::mem::swap(&mut fi, &mut fi_prev);
        std::mem::swap(&mut fd, &mut fd_prev);
    }
    total
}

/// Glocal Viterbi with start-index propagation. Returns the optimal
/// (start, end) boundaries (0-based, half-open, window-local) and the
/// glocal Viterbi score. `None` for an empty window.
pub fn glocal_viterbi_bounds(prof: &FilterProfile, window: &[u8]) -> Option<(usize, usize, f32)> {
    let l = window.len();
    let m = prof.m;
    if l == 0 || m == 0 {
        return None;
    }

    // Cell values paired with the window index of the first emitted
    // residue on the best path into the cell (1-based; l+1 = none yet).
    let mut vm_prev = vec![(NEG_INF, 0usize); m + 1];
    let mut vi_prev = vec![(NEG_INF, 0usize); m + 1];
    let mut vd_prev: Vec<(f32, usize)> = (0..=m)
        .map(|k| {
            if k >= 1 {
                (begin_chain(prof, k), 1)
            } else {
                (NEG_INF, 0)
            }
        })
        .collect();
    let mut vm = vec![(NEG_INF, 0usize); m + 1];
    let mut vi = vec![(NEG_INF, 0usize); m + 1];
    let mut vd = vec![(NEG_INF, 0usize); m + 1];

    let mut best = (NEG_INF, 0usize, 0usize); // score, start, end

    for (row, &res) in window.iter().enumerate() {
        let i = row + 1; // 1-based residue index
        vm[0] = (NEG_INF, 0);
        vi[0] = (NEG_INF, 0);
        vd[0] = (NEG_INF, 0);
        for k in 1..=m {
            let emit = prof.match_score(k - 1, res);
            let path = if k == 1 {
                // Fresh glocal begin: this residue starts the envelope.
                (0.0, i)
            } else {
                // Entry through leading deletes is covered by the
                // begin-chain seeds carried in the D row.
                pick3(
                    add(vm_prev[k - 1], prof.t_mm),
                    add(vi_prev[k - 1], prof.t_im),
                    add(vd_prev[k - 1], prof.t_dm),
                )
            };
            vm[k] = (emit + path.0, path.1);

            vi[k] = pick2(add(vm_prev[k], prof.t_mi), add(vi_prev[k], prof.t_ii));
            vd[k] = pick3(
                (begin_chain(prof, k), i + 1),
                add(vm[k - 1], prof.t_md),
                add(vd[k - 1], prof.t_dd),
            );
        }
        // Exit after residue i: end boundary is i (exclusive in 0-based).
        let exit = pick2(vm[m], vd[m]);
        if exit.0 > best.0 && exit.1 <= i {
            best = (exit.0, exit.1, i);
        }
        std::mem::swap(&mut vm, &mut vm_prev);
        std::mem::swap(&mut vi, &mut vi_prev);
        std::mem::swap(&mut vd, &mut vd_prev);
    }

    if best.0 == NEG_INF || best.1 == 0 {
        return None;
    }
    Some((best.1 - 1, best.2, best.0))
}

#[inline]
fn add(cell: (f32, usize), t: f32) -> (f32, usize) {
    (cell.0 + t, cell.1)
}

#[inline]
fn pick2(a: (f32, usize), b: (f32, usize)) -> (f32, usize) {
    if a.0 >= b.0 {
        a
    } else {
        b
    }
}

#[inline]
fn pick3(a: (f32, usize), b: (f32, usize), c: (f32, usize)) -> (f32, usize) {
    pick2(pick2(a, b), c)
}
