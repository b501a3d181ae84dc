//! Local profile Viterbi filter: best gapped alignment path.
//!
//! Strictly more discriminating than SSV: the optimal path may open
//! inserts and deletes. Local in both model and sequence: entry into any
//! match position costs `prof.entry`, exit from any match position is
//! free, unaligned flanking residues score zero.
//!
//! Reference: hmmer/src/generic_viterbi.c (p7_GViterbi), uniform local
//! entry as in p7_profile.c.

use super::NEG_INF;
use crate::model::profile::FilterProfile;

/// Optimal gapped local alignment score in bits, or 0.0 if no positive
/// alignment exists (the empty alignment).
pub fn viterbi_score(prof: &FilterProfile, window: &[u8]) -> f32 {
    let l = window.len();
    let m = prof.m;
    if l == 0 || m == 0 {
        return 0.0;
    }

    // Rolling rows over residues; columns are model positions 1..=m.
    let mut vm_prev = vec![NEG_INF; m + 1];
    let mut vi_prev = vec![NEG_INF; m + 1];
    let mut vd_prev = vec![NEG_INF; m + 1];
    let mut vm = vec![NEG_INF; m + 1];
    let mut vi = vec![NEG_INF; m + 1];
    let mut vd = vec![NEG_INF; m + 1];
    let mut best = 0.0f32;

    for &res in window {
        vm[0] = NEG_INF;
        vi[0] = NEG_INF;
        vd[0] = NEG_INF;
        for k in 1..=m {
            let emit = prof.match_score(k - 1, res);
            let mut path = prof.entry; // local begin into M_k
            path = path
                .max(vm_prev[k - 1] + prof.t_mm)
                .max(vi_prev[k - 1] + prof.t_im)
                .max(vd_prev[k - 1] + prof.t_dm);
            vm[k] = emit + path;

            // Insert emissions score zero against the background.
            vi[k] = (vm_prev[k] + prof.t_mi).max(vi_prev[k] + prof.t_ii);

            vd[k] = (vm[k - 1] + prof.t_md).max(vd[k - 1] + prof.t_dd);

            if vm[k] > best {
                best = vm[k]; // free local exit from M_k
            }
        }
        std::mem::swap(&mut vm, &mut vm_prev);
        std::mem::swap(&mut vi, &mut vi_prev);
        std::mem::swap(&mut vd, &mut vd_prev);
    }
    best
}
