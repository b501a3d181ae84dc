//! The filter cascade and the parallel scan driver.
//!
//! Each target sequence is an independent unit of work: a worker runs
//! the whole funnel (SSV → Viterbi → Forward → glocal envelope gate →
//! banded CYK → Inside) over both strands of one sequence and returns
//! its hits plus stage counters. Results are merged in input order, so
//! the ranked output is identical for any thread count.
//!
//! Reference: infernal/src/cm_pipeline.c (cm_Pipeline).

pub mod stats;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::cm::{cyk_align, cyk_score, inside_score, DpBands, TruncMode};
use crate::common::{rank_compare, Hit};
use crate::config::SearchConfig;
use crate::envelope::{define_envelope, merge_envelopes, Envelope};
use crate::filter::{forward_score, null_bias, ssv_score, viterbi_score};
use crate::model::{profile::FilterProfile, Calibration, CovarianceModel};
use crate::sequence::{gc_fraction, reverse_complement, Strand, TargetSequence, WindowSource};
use crate::stats::SearchSpace;

pub use stats::PipelineStats;

/// Per-stage bit-score cutoffs, derived once from the model calibration
/// and the configured survival fractions.
#[derive(Debug, Clone, Copy)]
pub struct StageThresholds {
    pub ssv: f32,
    pub vit: f32,
    pub fwd: f32,
    pub gfwd: f32,
    pub cyk: f32,
}

impl StageThresholds {
    pub fn from_calibration(cal: &Calibration, cfg: &SearchConfig) -> Self {
        Self {
            ssv: cal.ssv.score_for_surv(cfg.f1_ssv) as f32,
            vit: cal.vit.score_for_surv(cfg.f2_vit) as f32,
            fwd: cal.fwd.score_for_surv(cfg.f3_fwd) as f32,
            gfwd: cal.gfwd.score_for_surv(cfg.f4_gfwd) as f32,
            cyk: cal.cyk.score_for_surv(cfg.f5_cyk) as f32,
        }
    }
}

/// Everything the search produces besides the rendered report.
#[derive(Debug)]
pub struct SearchResults {
    /// Ranked hits, best first.
    pub hits: Vec<Hit>,
    pub stats: PipelineStats,
    pub search_space: SearchSpace,
    pub elapsed: Duration,
}

/// Run the full cascade over every sequence, in parallel, and rank the
/// merged hits.
pub fn search(
    cm: &CovarianceModel,
    seqs: &[TargetSequence],
    cfg: &SearchConfig,
) -> Result<SearchResults> {
    let started = Instant::now();

    let num_threads = if cfg.num_threads == 0 {
        num_cpus::get()
    } else {
        cfg.num_threads
    };
    // A local pool rather than the global one: the pool size is part of
    // the search configuration and must not leak between searches.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to build thread pool")?;

    let total_residues: u64 = seqs.iter().map(|s| s.len() as u64).sum();
    let search_space = SearchSpace::new(total_residues, cfg.strands.count(), cm.window);
    let prof = cm.filter_profile();
    let thresholds = StageThresholds::from_calibration(&cm.cal, cfg);

    if cfg.verbose {
        eprintln!(
            "[INFO] model {} clen={} W={} threads={}",
            cm.name, cm.clen, cm.window, num_threads
        );
    }

    let bar = ProgressBar::new(seqs.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap(),
    );

    // Indexed collect keeps input order, so the merge below is
    // deterministic without any cross-thread coordination.
    let per_seq: Vec<(Vec<Hit>, PipelineStats)> = pool.install(|| {
        seqs.par_iter()
            .map(|seq| {
                let out = scan_sequence(cm, &prof, cfg, &thresholds, &search_space, seq);
                bar.inc(1);
                out
            })
            .collect()
    });
    bar.finish();

    let mut stats = PipelineStats::default();
    let mut hits = Vec::new();
    for (seq_hits, seq_stats) in per_seq {
        stats.merge(&seq_stats);
        hits.extend(seq_hits);
    }
    hits.sort_by(rank_compare);

    Ok(SearchResults {
        hits,
        stats,
        search_space,
        elapsed: started.elapsed(),
    })
}

/// Run the cascade over one sequence, both strands. This is the worker
/// body; it touches nothing but its arguments.
pub fn scan_sequence(
    cm: &CovarianceModel,
    prof: &FilterProfile,
    cfg: &SearchConfig,
    thresholds: &StageThresholds,
    search_space: &SearchSpace,
    seq: &TargetSequence,
) -> (Vec<Hit>, PipelineStats) {
    let mut stats = PipelineStats {
        n_sequences: 1,
        ..Default::default()
    };
    let mut hits = Vec::new();

    // Too short to contain a plausible hit.
    if seq.len() < cm.min_hit_span() {
        stats.skipped_short = 1;
        return (hits, stats);
    }

    let wlen = cfg.window_len(cm.window);
    let step = cfg.window_step(cm.window);

    for &strand in cfg.strands.strands() {
        let owned_rc;
        let res: &[u8] = match strand {
            Strand::Plus => &seq.residues,
            Strand::Minus => {
                owned_rc = reverse_complement(&seq.residues);
                &owned_rc
            }
        };
        stats.residues_searched += res.len() as u64;

        let mut envs: Vec<Envelope> = Vec::new();
        for window in WindowSource::new(res.len(), wlen, step) {
            stats.windows += 1;
            let wres = &res[window.start..window.end];

            if cfg.skip_filters {
                // Every window becomes a whole-window envelope; keep
                // the funnel counters consistent.
                stats.pass_ssv += 1;
                stats.pass_vit += 1;
                stats.pass_vit_bias += 1;
                stats.pass_fwd += 1;
                stats.pass_fwd_bias += 1;
                envs.push(Envelope {
                    start: window.start,
                    end: window.end,
                    gfwd_bits: 0.0,
                    touches_5p: window.touches_5p,
                    touches_3p: window.touches_3p,
                });
                continue;
            }

            if cfg.skip_hmm {
                stats.pass_ssv += 1;
                stats.pass_vit += 1;
                stats.pass_vit_bias += 1;
                stats.pass_fwd += 1;
                stats.pass_fwd_bias += 1;
            } else {
                if ssv_score(prof, wres) < thresholds.ssv {
                    continue;
                }
                stats.pass_ssv += 1;

                let vit = viterbi_score(prof, wres);
                if vit < thresholds.vit {
                    continue;
                }
                stats.pass_vit += 1;

                let bias = null_bias(wres, &cm.null);
                if vit - bias < thresholds.vit {
                    continue;
                }
                stats.pass_vit_bias += 1;

                let fwd = forward_score(prof, wres);
                if fwd < thresholds.fwd {
                    continue;
                }
                stats.pass_fwd += 1;
                if fwd - bias < thresholds.fwd {
                    continue;
                }
                stats.pass_fwd_bias += 1;
            }

            if let Some(env) = define_envelope(
                prof,
                wres,
                &window,
                res.len(),
                thresholds.gfwd,
                &cm.null,
                cfg.env_pad,
            ) {
                envs.push(env);
            }
        }

        let merged = merge_envelopes(envs);
        stats.envelopes += merged.len() as u64;

        for env in merged {
            let region = &res[env.start..env.end];
            let bands = DpBands::for_region(cm, region.len(), cfg.min_band, cfg.band_pad);
            let bias = null_bias(region, &cm.null);

            // Pick the best truncation interpretation by CYK score.
            // Plain comes first, so ties never flip a hit to truncated.
            let mut best_mode = TruncMode::None;
            let mut best_cyk = f32::NEG_INFINITY;
            for mode in TruncMode::candidates(env.touches_5p, env.touches_3p) {
                if mode != TruncMode::None {
                    stats.residues_research_trunc += region.len() as u64;
                }
                let s = cyk_score(cm, region, &bands, mode);
                if s > best_cyk {
                    best_cyk = s;
                    best_mode = mode;
                }
            }
            if best_cyk - bias < thresholds.cyk {
                continue;
            }
            stats.pass_cyk += 1;

            let raw = inside_score(cm, region, &bands, best_mode);
            let bits = raw - bias;
            let e_value = cm.cal.inside.evalue(bits as f64, search_space.eff_windows());
            if e_value > cfg.e_report {
                continue;
            }

            let alignment = if cfg.do_alignments {
                cyk_align(cm, region, &bands, best_mode).map(|(_, a)| a)
            } else {
                None
            };

            // Map strand-local, 0-based half-open coordinates back to
            // 1-based input-strand coordinates; minus-strand hits are
            // reported with start > end.
            let (start, end) = match strand {
                Strand::Plus => (env.start + 1, env.end),
                Strand::Minus => (res.len() - env.start, res.len() - env.end + 1),
            };

            stats.hits += 1;
            hits.push(Hit {
                seq_id: seq.id.clone(),
                seq_idx: seq.idx,
                start,
                end,
                strand,
                raw_score: raw,
                bias,
                bit_score: bits,
                e_value,
                trunc: best_mode,
                gc: gc_fraction(region),
                alignment,
                included: e_value <= cfg.inc_e,
            });
        }
    }

    (hits, stats)
}
