//! `docgate gate` commands: run the review gates on a single result.
//!
//! Decisions are printed as JSON on stdout so they can be piped into the
//! calling pipeline.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::answer::parse_confidence;
use crate::config::Config;
use crate::extraction::{review_extraction, ExtractionSchema};
use crate::models::{GateDecision, QaResult};

#[derive(Debug, Serialize)]
struct QaGateOutput<'a> {
    answer: &'a str,
    confidence: Option<f64>,
    num_chunks: usize,
    #[serde(flatten)]
    decision: GateDecision,
}

/// Gate a Q&A answer. Without an explicit `confidence`, a trailing
/// `Confidence: X.XX` line in the answer is used (and stripped).
pub fn run_gate_qa(
    config: &Config,
    answer: &str,
    confidence: Option<f64>,
    num_chunks: usize,
) -> Result<()> {
    let gate = config.review_gate()?;

    let (answer, parsed) = parse_confidence(answer);
    let mut result = QaResult::new("", answer, confidence.or(parsed), Vec::new());
    result.num_chunks = num_chunks;

    let decision = gate.qa(&result);
    if decision.needs_review() {
        warn!(reason = %decision.reason(), "answer needs human review");
    }

    let output = QaGateOutput {
        answer: &result.answer,
        confidence: result.confidence,
        num_chunks,
        decision,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Parse a `--confidence` argument. Values outside [0, 1] (and NaN) are
/// rejected rather than clamped.
pub fn parse_confidence_arg(value: &str) -> std::result::Result<f64, String> {
    let score: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid confidence '{}': {}", value, e))?;
    if !(0.0..=1.0).contains(&score) {
        return Err(format!("confidence must be in [0, 1], got {}", value));
    }
    Ok(score)
}

/// Read a whole input file, or stdin for `-` / `None`.
pub(crate) fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Gate a raw extraction reply read from `input` (`-` or `None` for stdin).
pub fn run_gate_extract(config: &Config, input: Option<&Path>) -> Result<()> {
    let gate = config.review_gate()?;
    let content = read_input(input)?;

    let outcome = review_extraction(&content, &ExtractionSchema::contract(), &gate);
    if outcome.decision.needs_review() {
        warn!(reason = %outcome.decision.reason(), "extraction needs human review");
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
