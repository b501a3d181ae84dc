use std::cmp::Ordering;

use crate::cm::ParsedAlignment;
use crate::cm::TruncMode;
use crate::sequence::Strand;

/// One reported hit: an envelope that survived the whole filter
/// cascade, scored by Inside and assigned an E-value.
#[derive(Debug, Clone)]
pub struct Hit {
    pub seq_id: String,
    /// Target index in input order, used for deterministic grouping of
    /// output regardless of worker scheduling.
    pub seq_idx: u32,
    /// 1-based coordinates on the input strand. On the minus strand
    /// `start > end`, matching the usual convention for reporting
    /// reverse-complement matches.
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    /// Inside score before bias correction, bits.
    pub raw_score: f32,
    /// Composition bias deducted from the raw score, bits.
    pub bias: f32,
    /// Final reported score: raw minus bias.
    pub bit_score: f32,
    pub e_value: f64,
    pub trunc: TruncMode,
    /// GC fraction of the hit region.
    pub gc: f64,
    pub alignment: Option<ParsedAlignment>,
    /// True when the hit clears the inclusion threshold, not just the
    /// reporting threshold.
    pub included: bool,
}

/// Compare two evalues, treating both as equal if they're close enough
/// to zero. Below the epsilon an E-value carries no ranking
/// information, so such hits fall through to the bit-score tiebreak
/// instead of being ordered by float noise.
#[inline]
pub fn evalue_comp(evalue1: f64, evalue2: f64) -> Ordering {
    const EPSILON: f64 = 1.0e-180;
    if evalue1 < EPSILON && evalue2 < EPSILON {
        Ordering::Equal
    } else if evalue1 < evalue2 {
        Ordering::Less
    } else if evalue1 > evalue2 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Total order for the ranked hit list:
/// E-value ASC → bit score DESC → target index ASC → start ASC.
///
/// Every tiebreak key is deterministic, so the ranked output is
/// byte-identical across runs and thread counts.
pub fn rank_compare(a: &Hit, b: &Hit) -> Ordering {
    match evalue_comp(a.e_value, b.e_value) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match b
        .bit_score
        .partial_cmp(&a.bit_score)
        .unwrap_or(Ordering::Equal)
    {
        Ordering::Equal => {}
        ord => return ord,
    }
    match a.seq_idx.cmp(&b.seq_idx) {
        Ordering::Equal => {}
        ord => return ord,
    }
    a.start.cmp(&b.start)
}
