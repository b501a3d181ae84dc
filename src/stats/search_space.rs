//! Effective search space for E-value scaling.
//!
//! The database contributes `total_residues * strands` searchable
//! residues; dividing by the model window size W gives the effective
//! number of independent windows the exponential tail is multiplied by.
//!
//! Reference: infernal/src/cm_pipeline.c (cm_pli_NewModel sets
//! pli->Z from database residues and strand count).

/// Effective database size for one search run.
#[derive(Debug, Clone, Copy)]
pub struct SearchSpace {
    /// Total residues across all target sequences (one strand).
    pub total_residues: u64,
    /// Strands searched (1 or 2).
    pub strands: u32,
    /// Model window size W: the expected maximum hit span.
    pub window: usize,
}

impl SearchSpace {
    pub fn new(total_residues: u64, strands: u32, window: usize) -> Self {
        Self {
            total_residues,
            strands,
            window: window.max(1),
        }
    }

    /// Residues actually scanned (both strands counted separately).
    pub fn effective_residues(&self) -> u64 {
        self.total_residues * self.strands as u64
    }

    /// Effective number of independent windows.
    pub fn eff_windows(&self) -> f64 {
        self.effective_residues() as f64 / self.window as f64
    }
}
