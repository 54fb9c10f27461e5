//! `docgate prompt` commands: build the chat messages a pipeline sends to
//! its model.
//!
//! Retrieved chunks come in as the JSON array `docgate chunk --json` prints
//! (or the vector store returns in the same shape). Only the first
//! `retrieval.top_k` chunks are used, in the order given.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::answer::{qa_prompt, Prompt};
use crate::config::Config;
use crate::extraction::{extraction_prompt, ExtractionSchema};
use crate::gate_cmd::read_input;
use crate::models::Chunk;

#[derive(Debug, Serialize)]
pub struct PromptOutput {
    /// Query to send to the vector store for these chunks.
    pub query: String,
    pub top_k: usize,
    pub num_chunks: usize,
    #[serde(flatten)]
    pub prompt: Prompt,
}

/// Parse a chunk array and keep the first `top_k` records.
pub fn parse_chunks(content: &str, top_k: usize) -> Result<Vec<Chunk>> {
    let mut chunks: Vec<Chunk> =
        serde_json::from_str(content).context("Expected a JSON array of chunk records")?;
    chunks.truncate(top_k);
    Ok(chunks)
}

pub fn build_qa_prompt(question: &str, chunks: &[Chunk], top_k: usize) -> PromptOutput {
    PromptOutput {
        query: question.to_string(),
        top_k,
        num_chunks: chunks.len(),
        prompt: qa_prompt(question, chunks),
    }
}

pub fn build_extraction_prompt(
    schema: &ExtractionSchema,
    chunks: &[Chunk],
    top_k: usize,
) -> PromptOutput {
    PromptOutput {
        query: schema.retrieval_query(),
        top_k,
        num_chunks: chunks.len(),
        prompt: extraction_prompt(schema, chunks),
    }
}

/// `docgate prompt qa`
pub fn run_prompt_qa(config: &Config, question: &str, chunks: Option<&Path>) -> Result<()> {
    let top_k = config.retrieval.top_k;
    let chunks = parse_chunks(&read_input(chunks)?, top_k)?;
    debug!(top_k, chunks = chunks.len(), "building qa prompt");

    let output = build_qa_prompt(question, &chunks, top_k);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `docgate prompt extract`, using the contract schema.
pub fn run_prompt_extract(config: &Config, chunks: Option<&Path>) -> Result<()> {
    let top_k = config.retrieval.top_k;
    let chunks = parse_chunks(&read_input(chunks)?, top_k)?;
    debug!(top_k, chunks = chunks.len(), "building extraction prompt");

    let output = build_extraction_prompt(&ExtractionSchema::contract(), &chunks, top_k);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
