//! Length bands and the banded DP matrix.
//!
//! For each guide-tree node the subsequence lengths d it may cover are
//! restricted to a band around the expected span of its subtree. The
//! band half-width is derived from how far the envelope's length
//! deviates from the model's consensus length (the envelope's estimated
//! alignment bandwidth), so a well-behaved envelope gets a tight band
//! and memory stays bounded.
//!
//! Reference: infernal/src/cm_qdband.c (BandCalculationEngine produces
//! per-state dmin/dmax); matrix layout as in a banded Smith-Waterman.

use crate::filter::NEG_INF;
use crate::model::CovarianceModel;

/// Per-node allowed subsequence-length ranges.
#[derive(Debug, Clone)]
pub struct DpBands {
    pub dmin: Vec<usize>,
    pub dmax: Vec<usize>,
}

impl DpBands {
    /// Bands for scoring a region of `region_len` residues.
    pub fn for_region(
        cm: &CovarianceModel,
        region_len: usize,
        min_band: usize,
        pad: usize,
    ) -> Self {
        let mismatch = region_len.abs_diff(cm.clen);
        let beta = min_band.max(mismatch + pad);
        let mut dmin = Vec::with_capacity(cm.nodes.len());
        let mut dmax = Vec::with_capacity(cm.nodes.len());
        for node in &cm.nodes {
            dmin.push(node.espan.saturating_sub(beta));
            dmax.push((node.espan + beta).min(region_len));
        }
        // The root must be able to cover the whole region exactly.
        debug_assert!(dmin[cm.root] <= region_len && dmax[cm.root] >= region_len);
        Self { dmin, dmax }
    }
}

/// One node's (j, d) score table, stored banded in d. Cells outside the
/// band read as -inf.
#[derive(Debug, Clone)]
pub struct BandedTable {
    region_len: usize,
    dmin: usize,
    dmax: usize,
    width: usize,
    cells: Vec<f32>,
}

impl BandedTable {
    pub fn new(region_len: usize, dmin: usize, dmax: usize) -> Self {
        let dmax = dmax.min(region_len);
        let dmin = dmin.min(dmax);
        let width = dmax - dmin + 1;
        Self {
            region_len,
            dmin,
            dmax,
            width,
            cells: vec![NEG_INF; (region_len + 1) * width],
        }
    }

    #[inline]
    pub fn dmin(&self) -> usize {
        self.dmin
    }

    #[inline]
    pub fn dmax(&self) -> usize {
        self.dmax
    }

    /// Score at (end position j, span d), -inf outside the band or for
    /// impossible spans (d > j).
    #[inline]
    pub fn get(&self, j: usize, d: usize) -> f32 {
        if d < self.dmin || d > self.dmax || d > j || j > self.region_len {
            return NEG_INF;
        }
        self.cells[j * self.width + (d - self.dmin)]
    }

    #[inline]
    pub fn set(&mut self, j: usize, d: usize, val: f32) {
        debug_assert!(self.dmin <= d && d <= self.dmax && d <= j);
        self.cells[j * self.width + (d - self.dmin)] = val;
    }
}
