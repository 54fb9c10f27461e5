//! Ingest progress reporting.
//!
//! Reports what `docgate ingest` is doing (loading, chunking, done) together
//! with a completion fraction in [0, 1]. Progress is emitted on **stderr** so
//! stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for ingestion.
#[derive(Clone, Debug, PartialEq)]
pub enum IngestEvent {
    /// Reading file `n` (1-based) of `total`.
    Loading { name: String, n: u64, total: u64 },
    /// Chunking file `n` of `total`.
    Chunking { name: String, n: u64, total: u64 },
    /// All files processed.
    Done { chunks: u64 },
}

impl IngestEvent {
    /// Overall completion: loading file `n` is at `(n-1)/total`, chunking it
    /// is halfway through that file's share.
    pub fn fraction(&self) -> f64 {
        match self {
            IngestEvent::Loading { n, total, .. } => {
                (n.saturating_sub(1)) as f64 / (*total).max(1) as f64
            }
            IngestEvent::Chunking { n, total, .. } => {
                (n.saturating_sub(1) as f64 + 0.5) / (*total).max(1) as f64
            }
            IngestEvent::Done { .. } => 1.0,
        }
    }
}

/// Reports ingest progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: IngestEvent);
}

/// Human-friendly progress on stderr: "[ 50%] chunking lease.txt (1 / 1 files)".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: IngestEvent) {
        let pct = (event.fraction() * 100.0).round() as u64;
        let line = match &event {
            IngestEvent::Loading { name, n, total } => format!(
                "[{:>3}%] loading {} ({} / {} files)\n",
                pct,
                name,
                format_number(*n),
                format_number(*total)
            ),
            IngestEvent::Chunking { name, n, total } => format!(
                "[{:>3}%] chunking {} ({} / {} files)\n",
                pct,
                name,
                format_number(*n),
                format_number(*total)
            ),
            IngestEvent::Done { chunks } => {
                format!("[{:>3}%] done, {} chunks\n", pct, format_number(*chunks))
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: IngestEvent) {
        let fraction = event.fraction();
        let obj = match &event {
            IngestEvent::Loading { name, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "loading",
                "file": name,
                "n": n,
                "total": total,
                "progress": fraction
            }),
            IngestEvent::Chunking { name, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "chunking",
                "file": name,
                "n": n,
                "total": total,
                "progress": fraction
            }),
            IngestEvent::Done { chunks } => serde_json::json!({
                "event": "progress",
                "phase": "done",
                "chunks": chunks,
                "progress": fraction
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: IngestEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn fraction_per_phase() {
        let loading = IngestEvent::Loading {
            name: "a.txt".into(),
            n: 1,
            total: 2,
        };
        let chunking = IngestEvent::Chunking {
            name: "b.txt".into(),
            n: 2,
            total: 2,
        };
        assert_eq!(loading.fraction(), 0.0);
        assert_eq!(chunking.fraction(), 0.75);
        assert_eq!(IngestEvent::Done { chunks: 3 }.fraction(), 1.0);
    }
}
