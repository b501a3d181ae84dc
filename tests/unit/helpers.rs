//! Shared fixtures: small hand-built models and planted-hit sequences.

use covsearch::config::{SearchConfig, StrandMode};
use covsearch::model::{Calibration, CovarianceModel};
use covsearch::sequence::{encode, TargetSequence};

pub const UNIFORM_NULL: [f64; 4] = [0.25; 4];

/// Seven-pair hairpin with a four-residue loop, 18 consensus positions.
pub fn hairpin_model() -> CovarianceModel {
    CovarianceModel::from_consensus(
        "hairpin18",
        b"GGGCGGCAAAAGCCGCCC",
        "(((((((....)))))))",
        None,
        UNIFORM_NULL,
        Calibration::default(),
    )
    .unwrap()
}

/// Consensus residues of [`hairpin_model`].
pub const HAIRPIN_SEQ: &[u8] = b"GGGCGGCAAAAGCCGCCC";

/// Two adjacent stem-loops, so the guide tree contains a bifurcation.
pub fn two_stem_model() -> CovarianceModel {
    CovarianceModel::from_consensus(
        "twostem20",
        b"GGGAAAACCCGGCUUUUGCC",
        "(((....)))(((....)))",
        None,
        UNIFORM_NULL,
        Calibration::default(),
    )
    .unwrap()
}

pub const TWO_STEM_SEQ: &[u8] = b"GGGAAAACCCGGCUUUUGCC";

/// Plant `hit` between composition-neutral flanks, so the null-bias
/// correction stays small and window survival reflects the hit itself.
pub fn embed(hit: &[u8], flank5: usize, flank3: usize) -> Vec<u8> {
    const FLANK: &[u8] = b"ACUG";
    let mut v = Vec::with_capacity(flank5 + hit.len() + flank3);
    v.extend(FLANK.iter().cycle().take(flank5));
    v.extend_from_slice(hit);
    v.extend(FLANK.iter().cycle().take(flank3));
    v
}

pub fn target(id: &str, idx: u32, raw: &[u8]) -> TargetSequence {
    TargetSequence::new(id, idx, encode(raw))
}

/// Single-threaded top-strand configuration, the baseline for
/// deterministic scenario tests.
pub fn base_config() -> SearchConfig {
    SearchConfig {
        num_threads: 1,
        strands: StrandMode::TopOnly,
        ..Default::default()
    }
}
