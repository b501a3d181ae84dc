//! Target sequence handling: residue encoding, strand operations, and the
//! scan window source.
//!
//! Residues are encoded A=0, C=1, G=2, U/T=3; anything else (IUPAC
//! ambiguity codes, gaps) becomes the sentinel [`AMBIG`]. Scoring code
//! treats the sentinel with a fixed mild penalty instead of indexing the
//! emission tables.

use std::fmt;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::fasta;

/// Number of unambiguous residue codes.
pub const NUM_CODES: usize = 4;
/// Sentinel code for ambiguous / non-ACGU input.
pub const AMBIG: u8 = 4;

/// Lookup table for ASCII to residue code (AMBIG = ambiguous).
const ENCODE_LUT: [u8; 256] = {
    let mut lut = [AMBIG; 256];
    lut[b'A' as usize] = 0;
    lut[b'a' as usize] = 0;
    lut[b'C' as usize] = 1;
    lut[b'c' as usize] = 1;
    lut[b'G' as usize] = 2;
    lut[b'g' as usize] = 2;
    lut[b'T' as usize] = 3;
    lut[b't' as usize] = 3;
    lut[b'U' as usize] = 3;
    lut[b'u' as usize] = 3;
    lut
};

/// Encode an ASCII nucleotide sequence into residue codes.
pub fn encode(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| ENCODE_LUT[b as usize]).collect()
}

/// Decode a residue code back to its RNA character.
pub fn decode(code: u8) -> char {
    match code {
        0 => 'A',
        1 => 'C',
        2 => 'G',
        3 => 'U',
        _ => 'N',
    }
}

/// Reverse complement of an encoded sequence. The ambiguity sentinel is
/// its own complement.
pub fn reverse_complement(encoded: &[u8]) -> Vec<u8> {
    encoded
        .iter()
        .rev()
        .map(|&c| if c < AMBIG { 3 - c } else { AMBIG })
        .collect()
}

/// G+C fraction of an encoded region. Ambiguous residues count toward the
/// denominator only. Returns 0.0 for empty input.
pub fn gc_fraction(encoded: &[u8]) -> f64 {
    if encoded.is_empty() {
        return 0.0;
    }
    let gc = encoded.iter().filter(|&&c| c == 1 || c == 2).count();
    gc as f64 / encoded.len() as f64
}

/// Strand of a target sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
        })
    }
}

/// One target database sequence, plus-strand residues only. The minus
/// strand is materialized per worker when scanned.
#[derive(Debug, Clone)]
pub struct TargetSequence {
    pub id: String,
    /// Database input order, used for deterministic tie-breaking.
    pub idx: u32,
    pub residues: Vec<u8>,
}

impl TargetSequence {
    pub fn new(id: impl Into<String>, idx: u32, residues: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            idx,
            residues,
        }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// Load a FASTA target database. A malformed record aborts the load
/// rather than searching a silently partial database.
pub fn read_fasta_db(path: &Path) -> Result<Vec<TargetSequence>> {
    let reader = fasta::Reader::from_file(path)
        .with_context(|| format!("Failed to open target database {:?}", path))?;
    collect_records(reader)
}

fn collect_records<B: BufRead>(reader: fasta::Reader<B>) -> Result<Vec<TargetSequence>> {
    let mut seqs = Vec::new();
    for (i, rec) in reader.records().enumerate() {
        let rec = rec.with_context(|| format!("Malformed FASTA record at index {}", i))?;
        let id = rec.id().split_whitespace().next().unwrap_or("unknown");
        seqs.push(TargetSequence::new(id, i as u32, encode(rec.seq())));
    }
    Ok(seqs)
}

/// A candidate scan window in strand-local coordinates (0-based,
/// half-open). Windows carry no identity beyond a single pipeline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
    /// Window abuts the 5' end of the strand: a hit here is a candidate
    /// for 5'-truncated rescoring.
    pub touches_5p: bool,
    /// Window abuts the 3' end of the strand.
    pub touches_3p: bool,
}

impl Window {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Lazy, finite, restartable generator of overlapping scan windows over
/// one strand of one sequence. Purely an enumerator: no side effects.
///
/// Successive windows advance by `step` and the final window is clipped
/// to the sequence end, so every residue is covered and any hit of span
/// at most (window_len - step) lies wholly inside at least one window.
#[derive(Debug, Clone)]
pub struct WindowSource {
    seq_len: usize,
    window_len: usize,
    step: usize,
    next_start: usize,
    done: bool,
}

impl WindowSource {
    pub fn new(seq_len: usize, window_len: usize, step: usize) -> Self {
        Self {
            seq_len,
            window_len: window_len.max(1),
            step: step.max(1),
            next_start: 0,
            done: seq_len == 0,
        }
    }
}

impl Iterator for WindowSource {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.done {
            return None;
        }
        let start = self.next_start;
        let end = (start + self.window_len).min(self.seq_len);
        if end == self.seq_len {
            self.done = true;
        } else {
            self.next_start = start + self.step;
        }
        Some(Window {
            start,
            end,
            touches_5p: start == 0,
            touches_3p: end == self.seq_len,
        })
    }
}
