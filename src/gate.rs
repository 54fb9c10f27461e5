//! Human-review gates for Q&A answers and extraction records.
//!
//! Each gate checks its conditions in a fixed priority order and reports the
//! first one that holds:
//!
//! | Gate | Priority |
//! |------|----------|
//! | Q&A | `low_confidence` → `no_context` → `uncertain_phrasing` → `ok` |
//! | Extraction | `uncertain_fields` → `validation_errors` → `ok` |
//!
//! Gates never fail. A missing confidence score means "unscored" and skips
//! the confidence check.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::models::{ExtractionRecord, GateDecision, QaResult, ReviewReason};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MIN_CHUNKS: usize = 1;

/// Phrases that suggest the model is hedging or refusing to answer.
pub const DEFAULT_HEDGING_PATTERNS: &[&str] = &[
    r"i\s+don'?t\s+know",
    r"i'?m\s+not\s+sure",
    r"not\s+(?:found|mentioned|stated|in\s+the\s+document)",
    r"cannot\s+(?:find|determine|answer)",
    r"no\s+information",
    r"insufficient\s+(?:context|information)",
    r"not\s+in\s+the\s+context",
    r"unclear",
    r"cannot\s+be\s+determined",
];

static DEFAULT_HEDGING: LazyLock<RegexSet> = LazyLock::new(|| {
    compile_patterns(DEFAULT_HEDGING_PATTERNS).expect("built-in hedging patterns compile")
});

/// Gate thresholds, usually read from the `[gate]` config section.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GateConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_min_chunks")]
    pub min_chunks: usize,
    #[serde(default = "default_hedging_patterns")]
    pub hedging_patterns: Vec<String>,
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}
fn default_min_chunks() -> usize {
    DEFAULT_MIN_CHUNKS
}
fn default_hedging_patterns() -> Vec<String> {
    DEFAULT_HEDGING_PATTERNS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_chunks: DEFAULT_MIN_CHUNKS,
            hedging_patterns: default_hedging_patterns(),
        }
    }
}

/// A validated [`GateConfig`] with its hedging patterns compiled.
#[derive(Debug, Clone)]
pub struct ReviewGate {
    confidence_threshold: f64,
    min_chunks: usize,
    hedging: RegexSet,
}

impl ReviewGate {
    pub fn new(config: &GateConfig) -> Result<Self, ConfigurationError> {
        validate_threshold(config.confidence_threshold)?;
        Ok(Self {
            confidence_threshold: config.confidence_threshold,
            min_chunks: config.min_chunks,
            hedging: compile_patterns(&config.hedging_patterns)?,
        })
    }

    pub fn qa(&self, result: &QaResult) -> GateDecision {
        decide_qa(
            result.confidence,
            result.num_chunks,
            &result.answer,
            self.confidence_threshold,
            self.min_chunks,
            &self.hedging,
        )
    }

    pub fn extraction(&self, record: &ExtractionRecord) -> GateDecision {
        extraction_needs_review(&record.uncertain_fields, &record.validation_errors)
    }
}

impl Default for ReviewGate {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_chunks: DEFAULT_MIN_CHUNKS,
            hedging: DEFAULT_HEDGING.clone(),
        }
    }
}

/// Decide whether a Q&A answer needs human review, using the built-in
/// hedging phrases.
pub fn qa_needs_review(
    confidence: Option<f64>,
    num_chunks: usize,
    answer_text: &str,
    confidence_threshold: f64,
    min_chunks: usize,
) -> GateDecision {
    decide_qa(
        confidence,
        num_chunks,
        answer_text,
        confidence_threshold,
        min_chunks,
        &DEFAULT_HEDGING,
    )
}

/// Decide whether an extraction result needs human review.
pub fn extraction_needs_review(
    uncertain_fields: &BTreeSet<String>,
    validation_errors: &[String],
) -> GateDecision {
    if !uncertain_fields.is_empty() {
        return GateDecision::from_reason(ReviewReason::UncertainFields);
    }
    if !validation_errors.is_empty() {
        return GateDecision::from_reason(ReviewReason::ValidationErrors);
    }
    GateDecision::ok()
}

fn decide_qa(
    confidence: Option<f64>,
    num_chunks: usize,
    answer_text: &str,
    confidence_threshold: f64,
    min_chunks: usize,
    hedging: &RegexSet,
) -> GateDecision {
    if confidence.is_some_and(|c| c < confidence_threshold) {
        return GateDecision::from_reason(ReviewReason::LowConfidence);
    }
    if num_chunks < min_chunks {
        return GateDecision::from_reason(ReviewReason::NoContext);
    }
    if hedging.is_match(answer_text.trim()) {
        return GateDecision::from_reason(ReviewReason::UncertainPhrasing);
    }
    GateDecision::ok()
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), ConfigurationError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigurationError::InvalidThreshold(threshold));
    }
    Ok(())
}

fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<RegexSet, ConfigurationError> {
    // Validate one at a time so the error names the offending pattern.
    for pattern in patterns {
        regex::RegexBuilder::new(pattern.as_ref())
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigurationError::InvalidPattern {
                pattern: pattern.as_ref().to_string(),
                message: e.to_string(),
            })?;
    }

    RegexSetBuilder::new(patterns.iter().map(|p| p.as_ref()))
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigurationError::InvalidPattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(" | "),
            message: e.to_string(),
        })
}
