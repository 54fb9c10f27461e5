//! # docgate CLI
//!
//! The `docgate` binary exposes the chunker and the human-review gates to
//! document-review pipelines and to people tuning them.
//!
//! ## Usage
//!
//! ```bash
//! docgate [--config ./config/docgate.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docgate chunk <file>` | Chunk one `.txt`/`.pdf` file and print the chunks |
//! | `docgate ingest <paths>...` | Load and chunk files or directories |
//! | `docgate gate qa --answer ... --chunks N` | Gate a Q&A answer |
//! | `docgate gate extract [file]` | Parse, validate and gate an extraction reply |
//! | `docgate prompt qa --question ... [chunks]` | Build the Q&A prompt from retrieved chunks |
//! | `docgate prompt extract [chunks]` | Build the extraction prompt from retrieved chunks |
//! | `docgate config` | Print the effective configuration |
//!
//! ## Examples
//!
//! ```bash
//! # Compare strategies on a contract
//! docgate chunk data/contract.txt --strategy by_paragraph --size 800
//!
//! # Gate a model reply that ends with "Confidence: 0.62"
//! docgate gate qa --answer "$REPLY" --chunks 4
//!
//! # Gate an extraction reply from stdin
//! llm-call ... | docgate gate extract -
//! ```
//!
//! Log verbosity is controlled with `DOCGATE_LOG` (e.g. `DOCGATE_LOG=debug`).

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docgate::config::{self, ChunkingConfig, Config};
use docgate::gate_cmd;
use docgate::ingest;
use docgate::prompt_cmd;
use docgate::progress::ProgressMode;

const DEFAULT_CONFIG_PATH: &str = "./config/docgate.toml";

/// docgate: chunking and human-review gating for document Q&A and
/// extraction pipelines.
#[derive(Parser)]
#[command(
    name = "docgate",
    about = "docgate: chunking and human-review gating for document review pipelines",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When omitted, `./config/docgate.toml` is used if it exists and the
    /// built-in defaults otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Chunk a single document and print its chunks.
    Chunk {
        /// A `.txt` or `.pdf` file.
        path: PathBuf,

        #[command(flatten)]
        chunking: ChunkingArgs,

        /// Print chunk records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load and chunk documents.
    ///
    /// Directories are walked recursively and filtered with
    /// `[ingest].include_globs`.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        chunking: ChunkingArgs,

        /// Print the full report, including every chunk, as JSON.
        #[arg(long)]
        json: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Run a human-review gate on a single result.
    Gate {
        #[command(subcommand)]
        action: GateAction,
    },

    /// Build model prompts from retrieved chunks (JSON, as printed by `chunk --json`).
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },

    /// Print the effective configuration (file + environment overrides).
    Config,
}

/// Per-invocation overrides of the `[chunking]` section.
#[derive(clap::Args)]
struct ChunkingArgs {
    /// Chunking strategy: `fixed_overlap` or `by_paragraph`.
    #[arg(long)]
    strategy: Option<String>,

    /// Maximum characters per chunk.
    #[arg(long)]
    size: Option<usize>,

    /// Characters shared by consecutive chunks (`fixed_overlap` only).
    #[arg(long)]
    overlap: Option<usize>,
}

impl ChunkingArgs {
    fn apply(&self, base: &ChunkingConfig) -> ChunkingConfig {
        let mut chunking = base.clone();
        if let Some(strategy) = &self.strategy {
            chunking.strategy = strategy.clone();
        }
        if let Some(size) = self.size {
            chunking.chunk_size = size;
        }
        if let Some(overlap) = self.overlap {
            chunking.chunk_overlap = overlap;
        }
        chunking
    }
}

/// Gate subcommands.
#[derive(Subcommand)]
enum GateAction {
    /// Decide whether a Q&A answer needs human review.
    Qa {
        /// The generated answer. A trailing `Confidence: X.XX` line is parsed.
        #[arg(long)]
        answer: String,

        /// Confidence score in [0, 1]; overrides any parsed from the answer.
        #[arg(long, value_parser = gate_cmd::parse_confidence_arg)]
        confidence: Option<f64>,

        /// Number of chunks retrieved as context.
        #[arg(long)]
        chunks: usize,
    },

    /// Parse, validate and gate a raw extraction reply (JSON object).
    Extract {
        /// File holding the reply; `-` or omitted reads stdin.
        input: Option<PathBuf>,
    },
}

/// Prompt subcommands. At most `[retrieval].top_k` chunks are used.
#[derive(Subcommand)]
enum PromptAction {
    /// Q&A prompt for a question.
    Qa {
        #[arg(long)]
        question: String,

        /// JSON array of chunk records; `-` or omitted reads stdin.
        chunks: Option<PathBuf>,
    },

    /// Extraction prompt for the contract schema.
    Extract {
        /// JSON array of chunk records; `-` or omitted reads stdin.
        chunks: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DOCGATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_config_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };

    match cli.command {
        Commands::Chunk {
            path,
            chunking,
            json,
        } => {
            let params = chunking.apply(&cfg.chunking).params()?;
            ingest::run_chunk(&path, &params, json)?;
        }
        Commands::Ingest {
            paths,
            chunking,
            json,
            progress,
        } => {
            let cfg = Config {
                chunking: chunking.apply(&cfg.chunking),
                ..cfg
            };
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            ingest::run_ingest(&cfg, &paths, json, progress)?;
        }
        Commands::Gate { action } => match action {
            GateAction::Qa {
                answer,
                confidence,
                chunks,
            } => {
                gate_cmd::run_gate_qa(&cfg, &answer, confidence, chunks)?;
            }
            GateAction::Extract { input } => {
                gate_cmd::run_gate_extract(&cfg, input.as_deref())?;
            }
        },
        Commands::Prompt { action } => match action {
            PromptAction::Qa { question, chunks } => {
                prompt_cmd::run_prompt_qa(&cfg, &question, chunks.as_deref())?;
            }
            PromptAction::Extract { chunks } => {
                prompt_cmd::run_prompt_extract(&cfg, chunks.as_deref())?;
            }
        },
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&cfg)?);
        }
    }

    Ok(())
}
