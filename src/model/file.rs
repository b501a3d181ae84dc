//! Thin text reader for pre-calibrated model files.
//!
//! Format, one keyword per line (`#` starts a comment):
//!
//! ```text
//! NAME  5S_rRNA
//! W     230
//! NULL  0.25 0.25 0.25 0.25
//! ECSSV 0.60 -2.00        # lambda tau, one line per scoring pass
//! ECVIT 0.60 -1.50
//! ECFWD 0.55 -0.50
//! ECGFW 0.55  0.00
//! ECCYK 0.80  1.00
//! ECINS 0.70  2.00
//! CONS  GGAUACGGCCAUAC...
//! SS    ((((......))))...
//! ```
//!
//! Repeated `CONS`/`SS` lines are concatenated so long models can wrap.
//! Missing calibration lines fall back to the library defaults; a
//! malformed line is an input error and aborts the run before any worker
//! starts.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::{Calibration, CovarianceModel};
use crate::stats::ExpTailParams;

pub fn read_model(path: &Path) -> Result<CovarianceModel> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read model file {}", path.display()))?;
    parse_model(&text).with_context(|| format!("malformed model file {}", path.display()))
}

pub fn parse_model(text: &str) -> Result<CovarianceModel> {
    let mut name: Option<String> = None;
    let mut window: Option<usize> = None;
    let mut null = [0.25f64; 4];
    let mut cons = String::new();
    let mut ss = String::new();
    let mut cal = Calibration::default();

    for (lineno, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(i) => &raw[..i],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let (key, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };
        let err = |what: &str| format!("line {}: {}", lineno + 1, what);

        match key {
            "NAME" => name = Some(rest.to_string()),
            "W" => {
                window = Some(
                    rest.parse::<usize>()
                        .with_context(|| err("W expects an integer"))?,
                )
            }
            "NULL" => {
                let freqs: Vec<f64> = rest
                    .split_whitespace()
                    .map(|t| t.parse::<f64>())
                    .collect::<Result<_, _>>()
                    .with_context(|| err("NULL expects four frequencies"))?;
                if freqs.len() != 4 {
                    bail!(err("NULL expects four frequencies"));
                }
                let total: f64 = freqs.iter().sum();
                if !(0.99..=1.01).contains(&total) || freqs.iter().any(|&f| f <= 0.0) {
                    bail!(err("NULL frequencies must be positive and sum to 1"));
                }
                null.copy_from_slice(&freqs);
            }
            "ECSSV" | "ECVIT" | "ECFWD" | "ECGFW" | "ECCYK" | "ECINS" => {
                let tail = parse_tail(rest).with_context(|| err("EC line expects: lambda tau"))?;
                match key {
                    "ECSSV" => cal.ssv = tail,
                    "ECVIT" => cal.vit = tail,
                    "ECFWD" => cal.fwd = tail,
                    "ECGFW" => cal.gfwd = tail,
                    "ECCYK" => cal.cyk = tail,
                    _ => cal.inside = tail,
                }
            }
            "CONS" => cons.push_str(rest),
            "SS" => ss.push_str(rest),
            "END" => break,
            other => bail!(err(&format!("unknown keyword '{}'", other))),
        }
    }

    let name = name.ok_or_else(|| anyhow::anyhow!("missing NAME line"))?;
    if cons.is_empty() {
        bail!("model '{}' has no CONS line", name);
    }
    if ss.is_empty() {
        bail!("model '{}' has no SS line", name);
    }
    CovarianceModel::from_consensus(&name, cons.as_bytes(), &ss, window, null, cal)
}

fn parse_tail(rest: &str) -> Result<ExpTailParams> {
    let mut it = rest.split_whitespace();
    let lambda: f64 = it.next().context("missing lambda")?.parse()?;
    let tau: f64 = it.next().context("missing tau")?.parse()?;
    if lambda <= 0.0 {
        bail!("lambda must be positive");
    }
    Ok(ExpTailParams::new(lambda, tau))
}
