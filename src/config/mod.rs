//! Resolved search configuration.
//!
//! Mirrors the cmsearch acceleration-heuristic surface: each filter stage
//! is controlled by an *expected survivor fraction* under the null model
//! rather than a raw score cutoff, so the funnel adapts to model length
//! and database size. CLI arguments are translated into this struct once,
//! before any worker starts.
//!
//! Reference: infernal/src/cm_pipeline.c (cm_pipeline_Create)

use crate::sequence::Strand;

/// Which strands of the target database are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrandMode {
    Both,
    TopOnly,
    BottomOnly,
}

impl StrandMode {
    /// Number of strands scanned, used to scale the effective search space.
    pub fn count(self) -> u32 {
        match self {
            StrandMode::Both => 2,
            StrandMode::TopOnly | StrandMode::BottomOnly => 1,
        }
    }

    /// Strands scanned, in fixed order (top first) so worker output is
    /// stable.
    pub fn strands(self) -> &'static [Strand] {
        match self {
            StrandMode::Both => &[Strand::Plus, Strand::Minus],
            StrandMode::TopOnly => &[Strand::Plus],
            StrandMode::BottomOnly => &[Strand::Minus],
        }
    }
}

/// Resolved engine parameters for one search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Worker thread count; 0 means one per logical CPU.
    pub num_threads: usize,

    // Expected survivor fractions under the null model, one per stage.
    // Defaults follow the cmsearch default filter schedule.
    /// SSV (single-best-ungapped-diagonal) filter.
    pub f1_ssv: f64,
    /// Local profile Viterbi filter (and its bias-corrected re-test).
    pub f2_vit: f64,
    /// Local profile Forward filter (and its bias-corrected re-test).
    pub f3_fwd: f64,
    /// Glocal Forward envelope gate.
    pub f4_gfwd: f64,
    /// Banded CYK structural filter.
    pub f5_cyk: f64,

    /// E-value reporting threshold; hits above this are dropped entirely.
    pub e_report: f64,
    /// E-value inclusion threshold; at or below is marked `!`, above `?`.
    pub inc_e: f64,

    /// Materialize an optimal parse alignment for each reported hit.
    pub do_alignments: bool,
    pub strands: StrandMode,

    /// Scan window length as a multiple of the model window size W.
    pub window_factor: f64,
    /// Minimum half-width of the CYK/Inside length bands.
    pub min_band: usize,
    /// Extra band slack beyond the envelope-length mismatch.
    pub band_pad: usize,
    /// Residues added on each side of the glocal Viterbi boundaries.
    pub env_pad: usize,

    /// Bypass all filters: every window becomes a whole-window envelope.
    pub skip_filters: bool,
    /// Skip the three local linear passes but keep the glocal gate.
    pub skip_hmm: bool,

    pub verbose: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            f1_ssv: 0.35,
            f2_vit: 0.15,
            f3_fwd: 0.0008,
            f4_gfwd: 0.0008,
            f5_cyk: 0.0001,
            e_report: 10.0,
            inc_e: 0.01,
            do_alignments: true,
            strands: StrandMode::Both,
            window_factor: 2.0,
            min_band: 8,
            band_pad: 4,
            env_pad: 2,
            skip_filters: false,
            skip_hmm: false,
            verbose: false,
        }
    }
}

impl SearchConfig {
    /// Scan window length for a model whose window size is `w`.
    pub fn window_len(&self, w: usize) -> usize {
        ((w as f64 * self.window_factor).ceil() as usize).max(w)
    }

    /// Step between successive window starts. Chosen so that any hit of
    /// span at most W lies wholly inside at least one window.
    pub fn window_step(&self, w: usize) -> usize {
        (self.window_len(w) - w).max(1)
    }
}
