//! Structural scoring of envelopes against the covariance model: the
//! banded CYK filter, the Inside final score, optimal parse traceback,
//! and the truncated-model variants.
//!
//! All recursions run over the guide tree in ascending node order
//! (children precede parents by construction) with per-node
//! subsequence-length bands, using explicit banded matrices with index
//! arithmetic rather than recursion over subsequences.
//!
//! Reference: infernal/src/cm_dpsearch.c (FastCYKScan),
//! infernal/src/cm_dpalign.c, infernal/src/cm_dpsearch_trunc.c.

pub mod align;
pub mod band;
pub mod cyk;
pub mod inside;
pub mod trunc;

pub use align::ParsedAlignment;
pub use band::DpBands;
pub use cyk::{cyk_align, cyk_score};
pub use inside::inside_score;
pub use trunc::TruncMode;
