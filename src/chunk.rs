//! Document chunking strategies.
//!
//! Splits document text into segments for embedding. Two strategies exist:
//!
//! - [`ChunkStrategy::FixedOverlap`]: windows of at most `chunk_size` chars
//!   with `chunk_overlap` chars shared between neighbours. Each window is
//!   cut after the coarsest separator it contains (paragraph break, line
//!   break, sentence end, space) and hard-cut when it contains none.
//! - [`ChunkStrategy::ByParagraph`]: paragraphs (split on `\n\n`) merged
//!   greedily up to `chunk_size`. A paragraph is never split, so a single
//!   oversized paragraph becomes its own chunk.
//!
//! Lengths are counted in chars, not bytes. Both strategies are pure and
//! deterministic.
//!
//! # Example
//!
//! ```rust
//! use docgate::chunk::{chunk_document, ChunkParams};
//!
//! let chunks = chunk_document("short text", &ChunkParams::default()).unwrap();
//! assert_eq!(chunks, vec!["short text".to_string()]);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::error::ConfigurationError;
use crate::models::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP: usize = 64;

const PARAGRAPH_BREAK: &str = "\n\n";

/// Separators from coarsest to finest. The trailing empty string means
/// "split anywhere".
pub fn default_separators() -> Vec<String> {
    ["\n\n", "\n", ". ", " ", ""]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    #[default]
    FixedOverlap,
    ByParagraph,
}

impl ChunkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::FixedOverlap => "fixed_overlap",
            ChunkStrategy::ByParagraph => "by_paragraph",
        }
    }
}

impl FromStr for ChunkStrategy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed_overlap" => Ok(ChunkStrategy::FixedOverlap),
            "by_paragraph" => Ok(ChunkStrategy::ByParagraph),
            other => Err(ConfigurationError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a chunking call depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkParams {
    pub strategy: ChunkStrategy,
    /// Maximum chars per chunk (a ceiling, not a target, for `by_paragraph`).
    pub chunk_size: usize,
    /// Chars shared by consecutive chunks. Only used by `fixed_overlap`.
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: default_separators(),
        }
    }
}

impl ChunkParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.chunk_size == 0 {
            return Err(ConfigurationError::ZeroChunkSize);
        }
        if self.strategy == ChunkStrategy::FixedOverlap && self.chunk_overlap >= self.chunk_size {
            return Err(ConfigurationError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
            });
        }
        Ok(())
    }
}

/// Split `text` into ordered chunk strings using `params.strategy`.
///
/// Empty or whitespace-only text yields no chunks under either strategy.
/// Invalid parameters fail before any work is done.
pub fn chunk_document(text: &str, params: &ChunkParams) -> Result<Vec<String>, ConfigurationError> {
    params.validate()?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let chunks: Vec<String> = match params.strategy {
        ChunkStrategy::FixedOverlap => {
            let offsets = char_offsets(text);
            fixed_overlap_spans(
                &offsets,
                text,
                params.chunk_size,
                params.chunk_overlap,
                &params.separators,
            )
            .into_iter()
            .map(|(start, end)| text[offsets[start]..offsets[end]].to_string())
            .collect()
        }
        ChunkStrategy::ByParagraph => chunk_by_paragraph(text, params.chunk_size),
    };

    debug!(
        strategy = %params.strategy,
        chunk_size = params.chunk_size,
        chunk_overlap = params.chunk_overlap,
        chars = text.chars().count(),
        chunks = chunks.len(),
        "chunked document"
    );

    Ok(chunks)
}

/// Chunk a document into [`Chunk`] records with contiguous indices from 0.
pub fn chunk_records(
    document: &Document,
    params: &ChunkParams,
) -> Result<Vec<Chunk>, ConfigurationError> {
    Ok(chunk_document(&document.text, params)?
        .into_iter()
        .enumerate()
        .map(|(index, text)| make_chunk(document, index, text))
        .collect())
}

fn make_chunk(document: &Document, index: usize, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let id = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{}#{}", document.id, index).as_bytes(),
    );

    Chunk {
        id: id.to_string(),
        source: document.source.clone(),
        chunk_index: index,
        text,
        hash,
    }
}

/// Byte offset of every char in `text`, followed by `text.len()`.
fn char_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Char ranges `[start, end)` of the `fixed_overlap` chunks.
///
/// Requires `chunk_overlap < chunk_size`. Every iteration moves `start`
/// forward by at least one char, so there is at most one chunk per char.
/// Hard cuts advance by exactly `chunk_size - chunk_overlap`; an early
/// separator cut advances less, since skipping ahead would drop text.
fn fixed_overlap_spans(
    offsets: &[usize],
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[String],
) -> Vec<(usize, usize)> {
    let total = offsets.len() - 1;
    let mut spans = Vec::new();
    let mut start = 0;

    while start < total {
        let end = start + chunk_size;
        if end >= total {
            spans.push((start, total));
            break;
        }

        let split = separator_split(offsets, text, start, end, separators).unwrap_or(end);
        spans.push((start, split));

        // Step back by the overlap unless that would stall; then drop it.
        let next = split.saturating_sub(chunk_overlap);
        start = if next > start { next } else { split };
    }

    spans
}

/// Char index just past the last occurrence of the first separator (in
/// priority order) found inside the window `[start, end)`.
fn separator_split(
    offsets: &[usize],
    text: &str,
    start: usize,
    end: usize,
    separators: &[String],
) -> Option<usize> {
    let window_start = offsets[start];
    let window = &text[window_start..offsets[end]];

    separators
        .iter()
        .filter(|sep| !sep.is_empty())
        .find_map(|sep| {
            window.rfind(sep.as_str()).map(|pos| {
                let byte = window_start + pos + sep.len();
                offsets.partition_point(|&o| o < byte)
            })
        })
}

fn chunk_by_paragraph(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;

    for para in text
        .split(PARAGRAPH_BREAK)
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let para_len = para.chars().count();

        if !buf.is_empty() && buf_len + 2 + para_len > chunk_size {
            chunks.push(std::mem::take(&mut buf));
            buf_len = 0;
        }

        if !buf.is_empty() {
            buf.push_str(PARAGRAPH_BREAK);
            buf_len += 2;
        }
        buf.push_str(para);
        buf_len += para_len;
    }

    if !buf.is_empty() {
        chunks.push(buf);
    }

    chunks
}
