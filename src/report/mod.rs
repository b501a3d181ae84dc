//! Human-readable search report: ranked hit table, optional alignment
//! blocks, and the pipeline statistics summary.
//!
//! The renderer only consumes already-ranked structured results, so
//! output content is fully decided before any byte is written.
//!
//! Reference: infernal/src/cm_tophits.c (cm_tophits_Targets,
//! cm_tophits_TabularTargets), infernal/src/cm_pipeline.c
//! (cm_pli_Statistics).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;

use crate::config::SearchConfig;
use crate::model::CovarianceModel;
use crate::pipeline::SearchResults;

/// Format an E-value compactly: scientific below 0.001, fixed above.
fn format_evalue(e: f64) -> String {
    if e < 1e-3 {
        format!("{:.1e}", e)
    } else {
        format!("{:.3}", e)
    }
}

/// Write the full report to `out_path`, or stdout when `None`.
pub fn write_report(
    cm: &CovarianceModel,
    cfg: &SearchConfig,
    results: &SearchResults,
    out_path: Option<&PathBuf>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut writer: Box<dyn Write> = if let Some(path) = out_path {
        Box::new(BufWriter::new(File::create(path)?))
    } else {
        Box::new(BufWriter::new(stdout.lock()))
    };
    render_report(cm, cfg, results, &mut writer)
}

/// Render the report into any writer. Split out from [`write_report`]
/// so tests can capture the bytes.
pub fn render_report(
    cm: &CovarianceModel,
    cfg: &SearchConfig,
    results: &SearchResults,
    writer: &mut dyn Write,
) -> Result<()> {
    writeln!(writer, "Query: {} (clen={} W={})", cm.name, cm.clen, cm.window)?;
    writeln!(writer)?;

    if results.hits.is_empty() {
        writeln!(writer, "No hits satisfy the reporting threshold (E <= {})", cfg.e_report)?;
    } else {
        writeln!(
            writer,
            "{:>4} {:>2} {:>9} {:>7} {:>5} {:<20} {:>9} {:>9} {:>3} {:>5} {:>5}",
            "rank", "", "E-value", "score", "bias", "sequence", "start", "end", "str", "trunc", "gc"
        )?;
        writeln!(
            writer,
            "{:>4} {:>2} {:>9} {:>7} {:>5} {:<20} {:>9} {:>9} {:>3} {:>5} {:>5}",
            "----", "--", "---------", "-------", "-----", "--------------------", "---------",
            "---------", "---", "-----", "-----"
        )?;
        for (rank, h) in results.hits.iter().enumerate() {
            let marker = if h.included { "!" } else { "?" };
            writeln!(
                writer,
                "{:>4} {:>2} {:>9} {:>7.1} {:>5.1} {:<20} {:>9} {:>9} {:>3} {:>5} {:>5.2}",
                rank + 1,
                marker,
                format_evalue(h.e_value),
                h.bit_score,
                h.bias,
                h.seq_id,
                h.start,
                h.end,
                h.strand,
                h.trunc,
                h.gc
            )?;
        }

        if cfg.do_alignments {
            writeln!(writer)?;
            for (rank, h) in results.hits.iter().enumerate() {
                if let Some(ali) = &h.alignment {
                    writeln!(
                        writer,
                        ">> {} rank {} {}..{} ({}) score {:.1} bits  E {}",
                        h.seq_id,
                        rank + 1,
                        h.start,
                        h.end,
                        h.strand,
                        h.bit_score,
                        format_evalue(h.e_value)
                    )?;
                    writer.write_all(ali.render(4).as_bytes())?;
                    writeln!(writer)?;
                }
            }
        }
    }

    writeln!(writer)?;
    render_statistics(cfg, results, writer)?;
    Ok(())
}

/// Per-stage survivor accounting, observed fraction against the
/// configured expectation.
fn render_statistics(
    cfg: &SearchConfig,
    results: &SearchResults,
    writer: &mut dyn Write,
) -> Result<()> {
    let s = &results.stats;
    writeln!(writer, "Internal pipeline statistics summary:")?;
    writeln!(
        writer,
        "  target sequences:          {} ({} residues searched, {} skipped as too short)",
        s.n_sequences, s.residues_searched, s.skipped_short
    )?;
    writeln!(writer, "  windows examined:          {}", s.windows)?;

    let stage = |name: &str, passed: u64, expected: f64| -> String {
        match s.frac(passed) {
            Some(obs) => format!(
                "  {:<26} {} ({:.4}); expected ({:.4})",
                name, passed, obs, expected
            ),
            None => format!("  {:<26} {}", name, passed),
        }
    };
    writeln!(writer, "{}", stage("passed SSV filter:", s.pass_ssv, cfg.f1_ssv))?;
    writeln!(writer, "{}", stage("passed Vit filter:", s.pass_vit_bias, cfg.f2_vit))?;
    writeln!(writer, "{}", stage("passed Fwd filter:", s.pass_fwd_bias, cfg.f3_fwd))?;
    writeln!(writer, "{}", stage("passed gFwd envelope gate:", s.envelopes, cfg.f4_gfwd))?;
    writeln!(writer, "{}", stage("passed CYK filter:", s.pass_cyk, cfg.f5_cyk))?;
    writeln!(writer, "  hits reported:             {}", s.hits)?;
    if s.residues_research_trunc > 0 {
        writeln!(
            writer,
            "  residues re-searched for truncated interpretations: {}",
            s.residues_research_trunc
        )?;
    }
    writeln!(
        writer,
        "  effective search space:    {} residues, {} strand(s), ~{:.1} windows",
        results.search_space.effective_residues() / results.search_space.strands as u64,
        results.search_space.strands,
        results.search_space.eff_windows()
    )?;
    writeln!(writer, "  elapsed:                   {:.2?}", results.elapsed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Hit;
    use crate::model::Calibration;
    use crate::pipeline::PipelineStats;
    use crate::sequence::Strand;
    use crate::stats::SearchSpace;
    use std::time::Duration;

    fn model() -> CovarianceModel {
        CovarianceModel::from_consensus(
            "toy",
            b"GGGCAAAAGCCC",
            "((((....))))",
            None,
            [0.25; 4],
            Calibration::default(),
        )
        .unwrap()
    }

    fn results_with(hits: Vec<Hit>) -> SearchResults {
        SearchResults {
            hits,
            stats: PipelineStats {
                windows: 100,
                pass_ssv: 30,
                pass_vit: 10,
                pass_vit_bias: 9,
                pass_fwd: 3,
                pass_fwd_bias: 3,
                envelopes: 2,
                pass_cyk: 1,
                hits: 1,
                n_sequences: 4,
                residues_searched: 40_000,
                ..Default::default()
            },
            search_space: SearchSpace::new(20_000, 2, 100),
            elapsed: Duration::from_millis(120),
        }
    }

    fn one_hit() -> Hit {
        Hit {
            seq_id: "chr1".into(),
            seq_idx: 0,
            start: 101,
            end: 160,
            strand: Strand::Plus,
            raw_score: 42.5,
            bias: 1.5,
            bit_score: 41.0,
            e_value: 3.2e-9,
            trunc: crate::cm::TruncMode::None,
            gc: 0.55,
            alignment: None,
            included: true,
        }
    }

    fn render(results: &SearchResults, cfg: &SearchConfig) -> String {
        let cm = model();
        let mut buf = Vec::new();
        render_report(&cm, cfg, results, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn report_lists_hits_with_inclusion_marker() {
        let mut excluded = one_hit();
        excluded.e_value = 5.0;
        excluded.included = false;
        excluded.seq_id = "chr2".into();
        let out = render(
            &results_with(vec![one_hit(), excluded]),
            &SearchConfig::default(),
        );
        assert!(out.contains("chr1"));
        assert!(out.contains("chr2"));
        let chr1_line = out.lines().find(|l| l.contains("chr1")).unwrap();
        let chr2_line = out.lines().find(|l| l.contains("chr2")).unwrap();
        assert!(chr1_line.contains('!'));
        assert!(chr2_line.contains('?'));
    }

    #[test]
    fn empty_run_says_so_and_still_prints_statistics() {
        let out = render(&results_with(vec![]), &SearchConfig::default());
        assert!(out.contains("No hits satisfy"));
        assert!(out.contains("pipeline statistics"));
        assert!(out.contains("windows examined:          100"));
    }

    #[test]
    fn evalue_formatting_switches_regimes() {
        assert_eq!(format_evalue(0.5), "0.500");
        assert!(format_evalue(3.2e-9).contains("e-9"));
    }
}
