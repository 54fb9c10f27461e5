//! Ingestion pipeline: load → chunk → tagged chunk records.
//!
//! Embedding and vector-store writes happen downstream; this stage produces
//! the ordered [`Chunk`] records they consume. Files that fail to load are
//! skipped (and counted) when `ingest.skip_unreadable` is set, otherwise the
//! first failure aborts the run.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::chunk::{chunk_records, ChunkParams};
use crate::config::Config;
use crate::loader::{collect_paths, display_name, load_document};
use crate::models::Chunk;
use crate::progress::{IngestEvent, ProgressMode, ProgressReporter};

/// Result of ingesting a batch of files.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub skipped: Vec<SkippedFile>,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub error: String,
}

/// Load and chunk every file in `paths`, in order.
pub fn ingest_paths(
    paths: &[PathBuf],
    params: &ChunkParams,
    skip_unreadable: bool,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    params.validate()?;

    let total = paths.len() as u64;
    let mut report = IngestReport {
        documents: 0,
        skipped: Vec::new(),
        chunks: Vec::new(),
    };

    for (i, path) in paths.iter().enumerate() {
        let n = i as u64 + 1;
        let name = display_name(path);

        progress.report(IngestEvent::Loading {
            name: name.clone(),
            n,
            total,
        });
        let document = match load_document(path) {
            Ok(doc) => doc,
            Err(e) if skip_unreadable => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                report.skipped.push(SkippedFile {
                    path: path.display().to_string(),
                    error: e.to_string(),
                });
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to ingest {}", path.display()))
            }
        };

        progress.report(IngestEvent::Chunking { name, n, total });
        let chunks = chunk_records(&document, params)?;
        info!(source = %document.source, chunks = chunks.len(), "ingested document");

        report.documents += 1;
        report.chunks.extend(chunks);
    }

    if report.chunks.is_empty() {
        bail!("No chunks produced from the given documents.");
    }

    progress.report(IngestEvent::Done {
        chunks: report.chunks.len() as u64,
    });

    Ok(report)
}

/// `docgate ingest`: expand inputs, ingest, print a summary or JSON.
pub fn run_ingest(
    config: &Config,
    inputs: &[PathBuf],
    json: bool,
    progress: ProgressMode,
) -> Result<()> {
    let params = config.chunking.params()?;
    let paths = collect_paths(inputs, &config.ingest.include_globs)?;
    if paths.is_empty() {
        bail!("No matching files found. Supported types: .txt, .pdf");
    }

    let reporter = progress.reporter();
    let report = ingest_paths(
        &paths,
        &params,
        config.ingest.skip_unreadable,
        reporter.as_ref(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("ingest ({})", params.strategy);
    println!("  files: {}", paths.len());
    println!("  documents: {}", report.documents);
    println!("  skipped: {}", report.skipped.len());
    for skipped in &report.skipped {
        println!("    {}: {}", skipped.path, skipped.error);
    }
    println!("  chunks: {}", report.chunks.len());
    println!("ok");

    Ok(())
}

/// `docgate chunk`: chunk one file and print the chunks.
pub fn run_chunk(path: &Path, params: &ChunkParams, json: bool) -> Result<()> {
    let document = load_document(path)?;
    let chunks = chunk_records(&document, params)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    println!(
        "{} ({}, size {}, overlap {})",
        document.source, params.strategy, params.chunk_size, params.chunk_overlap
    );
    println!("  chunks: {}", chunks.len());
    for chunk in &chunks {
        println!();
        println!(
            "--- chunk {} ({} chars) ---",
            chunk.chunk_index,
            chunk.text.chars().count()
        );
        println!("{}", chunk.text);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkStrategy;
    use crate::progress::NoProgress;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Recorder(Mutex<Vec<IngestEvent>>);

    impl ProgressReporter for Recorder {
        fn report(&self, event: IngestEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn params() -> ChunkParams {
        ChunkParams {
            strategy: ChunkStrategy::ByParagraph,
            chunk_size: 40,
            ..ChunkParams::default()
        }
    }

    #[test]
    fn test_ingest_tags_chunks_per_document() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        fs::write(&a, "Party A is Acme Corp.\n\nParty B is Beta LLC.").unwrap();
        fs::write(&b, "Term: 24 months.").unwrap();

        let report = ingest_paths(&[a, b], &params(), true, &NoProgress).unwrap();
        assert_eq!(report.documents, 2);
        let tags: Vec<(String, usize)> = report
            .chunks
            .iter()
            .map(|c| (c.source.clone(), c.chunk_index))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("a.txt".to_string(), 0),
                ("a.txt".to_string(), 1),
                ("b.txt".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_same_file_name_in_different_folders() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("2023")).unwrap();
        fs::create_dir_all(tmp.path().join("2024")).unwrap();
        fs::write(tmp.path().join("2023/contract.txt"), "Rent is $1,000.").unwrap();
        fs::write(tmp.path().join("2024/contract.txt"), "Rent is $2,000.").unwrap();

        let paths = collect_paths(&[tmp.path().to_path_buf()], &["**/*.txt".to_string()]).unwrap();
        let report = ingest_paths(&paths, &params(), true, &NoProgress).unwrap();
        assert_eq!(report.chunks.len(), 2);
        assert_eq!(report.chunks[0].source, "contract.txt");
        assert_eq!(report.chunks[1].source, "contract.txt");
        assert_ne!(report.chunks[0].id, report.chunks[1].id);
    }

    #[test]
    fn test_blank_document_produces_no_chunks() {
        let tmp = TempDir::new().unwrap();
        let blank = tmp.path().join("blank.txt");
        fs::write(&blank, "  \n\n \t\n").unwrap();

        let err = ingest_paths(&[blank], &ChunkParams::default(), true, &NoProgress).unwrap_err();
        assert!(err.to_string().contains("No chunks produced"));
    }

    #[test]
    fn test_progress_events_in_order() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        fs::write(&a, "Some text.").unwrap();

        let recorder = Recorder(Mutex::new(Vec::new()));
        ingest_paths(&[a], &params(), true, &recorder).unwrap();

        let events = recorder.0.into_inner().unwrap();
        let fractions: Vec<f64> = events.iter().map(IngestEvent::fraction).collect();
        assert_eq!(fractions, vec![0.0, 0.5, 1.0]);
        assert_eq!(events[2], IngestEvent::Done { chunks: 1 });
    }

    #[test]
    fn test_unreadable_file_skipped_or_fatal() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("bad.docx");
        let good = tmp.path().join("good.txt");
        fs::write(&bad, "x").unwrap();
        fs::write(&good, "Fine.").unwrap();

        let report =
            ingest_paths(&[bad.clone(), good.clone()], &params(), true, &NoProgress).unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.skipped.len(), 1);

        let err = ingest_paths(&[bad, good], &params(), false, &NoProgress).unwrap_err();
        assert!(err.to_string().contains("Failed to ingest"));
    }

    #[test]
    fn test_no_chunks_is_error() {
        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty.txt");
        fs::write(&empty, "").unwrap();

        let err = ingest_paths(&[empty], &params(), true, &NoProgress).unwrap_err();
        assert!(err.to_string().contains("No chunks produced"));
    }

    #[test]
    fn test_invalid_params_fail_first() {
        let bad = ChunkParams {
            chunk_size: 10,
            chunk_overlap: 10,
            ..ChunkParams::default()
        };
        assert!(ingest_paths(&[], &bad, true, &NoProgress).is_err());
    }
}
