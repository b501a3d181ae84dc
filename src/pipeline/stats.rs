/// Per-stage survivor accounting, merged across workers after the
/// parallel scan completes.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Windows examined (both strands counted separately).
    pub windows: u64,
    pub pass_ssv: u64,
    pub pass_vit: u64,
    /// Viterbi survivors that also survived the bias-corrected rescore.
    pub pass_vit_bias: u64,
    pub pass_fwd: u64,
    pub pass_fwd_bias: u64,
    /// Envelopes defined by the glocal stage (after merging).
    pub envelopes: u64,
    pub pass_cyk: u64,
    pub hits: u64,
    pub n_sequences: u64,
    pub residues_searched: u64,
    /// Residues re-scored under truncated interpretations.
    pub residues_research_trunc: u64,
    /// Sequences shorter than the minimum hit span, not scanned.
    pub skipped_short: u64,
}

impl PipelineStats {
    pub fn merge(&mut self, other: &PipelineStats) {
        self.windows += other.windows;
        self.pass_ssv += other.pass_ssv;
        self.pass_vit += other.pass_vit;
        self.pass_vit_bias += other.pass_vit_bias;
        self.pass_fwd += other.pass_fwd;
        self.pass_fwd_bias += other.pass_fwd_bias;
        self.envelopes += other.envelopes;
        self.pass_cyk += other.pass_cyk;
        self.hits += other.hits;
        self.n_sequences += other.n_sequences;
        self.residues_searched += other.residues_searched;
        self.residues_research_trunc += other.residues_research_trunc;
        self.skipped_short += other.skipped_short;
    }

    /// Observed survival fraction of a stage, None before any windows
    /// were seen.
    pub fn frac(&self, passed: u64) -> Option<f64> {
        if self.windows == 0 {
            None
        } else {
            Some(passed as f64 / self.windows as f64)
        }
    }
}
