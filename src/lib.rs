//! # docgate
//!
//! Chunking and human-review gating for retrieval-augmented document review
//! (contracts, agreements, policies).
//!
//! docgate sits on either side of the external services in a RAG pipeline:
//! it turns raw documents into chunks before embedding, and it decides
//! whether a generated answer or extraction must be checked by a person
//! before it is trusted.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────────────┐
//! │  Loader  │──▶│ Chunker  │──▶│ embed + vector store │ (external)
//! │ txt/pdf  │   │          │   └──────────┬───────────┘
//! └──────────┘   └──────────┘              │ retrieve
//!                                          ▼
//!                ┌──────────┐   ┌──────────────────────┐
//!                │   Gate   │◀──│ LLM answer / extract │ (external)
//!                │ decision │   └──────────────────────┘
//!                └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use docgate::chunk::{chunk_document, ChunkParams};
//! use docgate::gate::qa_needs_review;
//! use docgate::models::ReviewReason;
//!
//! let chunks = chunk_document("The fee is $125,000.", &ChunkParams::default()).unwrap();
//! assert_eq!(chunks.len(), 1);
//!
//! let decision = qa_needs_review(Some(0.9), chunks.len(), "The value is $125,000.", 0.7, 1);
//! assert_eq!(decision.reason(), ReviewReason::Ok);
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Core data types |
//! | [`error`] | Configuration and loading errors |
//! | [`chunk`] | `fixed_overlap` and `by_paragraph` chunking |
//! | [`gate`] | Q&A and extraction review gates |
//! | [`answer`] | Q&A prompt and confidence parsing |
//! | [`extraction`] | Extraction schema, parsing and validation |
//! | [`loader`] | Text and PDF loading |
//! | [`ingest`] | Load → chunk pipeline |
//! | [`progress`] | Ingest progress reporting |
//! | [`gate_cmd`] | `docgate gate` commands |
//! | [`prompt_cmd`] | `docgate prompt` commands |

pub mod answer;
pub mod chunk;
pub mod config;
pub mod error;
pub mod extraction;
pub mod gate;
pub mod gate_cmd;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod progress;
pub mod prompt_cmd;
