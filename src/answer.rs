//! Q&A prompt building and answer post-processing.
//!
//! The language model itself is an external collaborator. This module owns
//! the text on either side of the call: the prompt sent with the retrieved
//! chunks, and the parsing of the trailing `Confidence: X.XX` line the model
//! is asked to append.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::Chunk;

static CONFIDENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*confidence:\s*([0-9]*\.?[0-9]+)\s*$").expect("confidence regex compiles")
});

pub const QA_SYSTEM: &str = "You answer questions using ONLY the provided context. \
If the answer is not in the context, say \"I don't know\" or that the information is not in the document.\n\
Cite which chunk(s) support your answer (e.g. \"Chunk 1\").\n\
At the end, on a new line, write your confidence as a number from 0.0 to 1.0, e.g. \"Confidence: 0.85\".";

/// A system + user message pair ready for a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Render retrieved chunks as numbered `[Chunk i]` blocks (1-based).
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Chunk {}]\n{}", i + 1, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn qa_prompt(question: &str, chunks: &[Chunk]) -> Prompt {
    Prompt {
        system: QA_SYSTEM.to_string(),
        user: format!(
            "Context (chunks from the document):\n\n{}\n\nQuestion: {}\n\n\
             Answer based only on the context above. End with \"Confidence: X.XX\".",
            format_context(chunks),
            question
        ),
    }
}

/// Split a raw model reply into the answer text and its confidence score.
///
/// The score comes from a trailing `Confidence: <number>` and is clamped to
/// [0, 1]. Without one the reply is returned trimmed and unscored.
pub fn parse_confidence(content: &str) -> (String, Option<f64>) {
    let content = content.trim();

    if let Some(caps) = CONFIDENCE_LINE.captures(content) {
        if let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) {
            if let Ok(score) = value.as_str().parse::<f64>() {
                let answer = content[..whole.start()].trim().to_string();
                return (answer, Some(score.clamp(0.0, 1.0)));
            }
        }
    }

    (content.to_string(), None)
}
