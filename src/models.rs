//! Core data models used throughout docgate.
//!
//! These types represent the documents, chunks, pipeline results and review
//! decisions that flow between ingestion, the Q&A/extraction pipelines and
//! the review gates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw document text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier (the path the document was loaded from). Chunk ids
    /// are derived from it.
    pub id: String,
    /// Display name shown on chunks (usually the file name).
    pub source: String,
    pub text: String,
}

impl Document {
    /// A document whose id is its source.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            id: source.clone(),
            source,
            text: text.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// A chunk of a document's text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub source: String,
    pub chunk_index: usize,
    pub text: String,
    pub hash: String,
}

/// A generated answer together with the retrieval context it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct QaResult {
    pub question: String,
    pub answer: String,
    /// Self-assessed confidence in [0, 1]; `None` means unscored.
    pub confidence: Option<f64>,
    pub num_chunks: usize,
    pub source_chunks: Vec<Chunk>,
}

impl QaResult {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        confidence: Option<f64>,
        source_chunks: Vec<Chunk>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            confidence,
            num_chunks: source_chunks.len(),
            source_chunks,
        }
    }
}

/// Structured fields pulled out of a document by the extraction step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionRecord {
    /// Field name to extracted value; `None` when the model returned null.
    pub fields: BTreeMap<String, Option<String>>,
    pub uncertain_fields: BTreeSet<String>,
    pub validation_errors: Vec<String>,
}

/// Why a result was (or was not) routed to human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    Ok,
    LowConfidence,
    NoContext,
    UncertainPhrasing,
    UncertainFields,
    ValidationErrors,
}

impl ReviewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewReason::Ok => "ok",
            ReviewReason::LowConfidence => "low_confidence",
            ReviewReason::NoContext => "no_context",
            ReviewReason::UncertainPhrasing => "uncertain_phrasing",
            ReviewReason::UncertainFields => "uncertain_fields",
            ReviewReason::ValidationErrors => "validation_errors",
        }
    }
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a review gate. Built only from a [`ReviewReason`], so
/// `reason() == Ok` exactly when `needs_review()` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    needs_review: bool,
    reason: ReviewReason,
}

impl GateDecision {
    pub fn from_reason(reason: ReviewReason) -> Self {
        Self {
            needs_review: reason != ReviewReason::Ok,
            reason,
        }
    }

    pub fn ok() -> Self {
        Self::from_reason(ReviewReason::Ok)
    }

    pub fn needs_review(&self) -> bool {
        self.needs_review
    }

    pub fn reason(&self) -> ReviewReason {
        self.reason
    }
}
