//! TOML configuration for chunking, review gates, retrieval and ingestion.
//!
//! Every key has a default, so an empty file (or no file at all) is a valid
//! configuration. A handful of environment variables override the file:
//!
//! | Variable | Key |
//! |----------|-----|
//! | `CHUNK_SIZE` | `chunking.chunk_size` |
//! | `CHUNK_OVERLAP` | `chunking.chunk_overlap` |
//! | `RETRIEVAL_TOP_K` | `retrieval.top_k` |
//! | `GATE_CONFIDENCE_THRESHOLD` | `gate.confidence_threshold` |
//! | `GATE_MIN_CHUNKS` | `gate.min_chunks` |

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::chunk::{
    default_separators, ChunkParams, ChunkStrategy, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
use crate::error::ConfigurationError;
use crate::gate::{GateConfig, ReviewGate};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChunkingConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: default_separators(),
        }
    }
}

fn default_strategy() -> String {
    ChunkStrategy::default().as_str().to_string()
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl ChunkingConfig {
    /// Resolve into validated [`ChunkParams`].
    pub fn params(&self) -> Result<ChunkParams, ConfigurationError> {
        let params = ChunkParams {
            strategy: ChunkStrategy::from_str(&self.strategy)?,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            separators: self.separators.clone(),
        };
        params.validate()?;
        Ok(params)
    }
}

/// Retrieval settings handed to the external vector-store collaborator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    /// Skip files that fail to load instead of aborting the whole ingest.
    #[serde(default = "default_skip_unreadable")]
    pub skip_unreadable: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            skip_unreadable: default_skip_unreadable(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.pdf".to_string()]
}
fn default_skip_unreadable() -> bool {
    true
}

impl Config {
    pub fn review_gate(&self) -> Result<ReviewGate, ConfigurationError> {
        ReviewGate::new(&self.gate)
    }
}

/// Read, override from the environment, and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults
/// (still subject to environment overrides).
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Apply environment overrides through `lookup` (normally `std::env::var`).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("CHUNK_SIZE") {
        config.chunking.chunk_size = parse_env("CHUNK_SIZE", &v)?;
    }
    if let Some(v) = lookup("CHUNK_OVERLAP") {
        config.chunking.chunk_overlap = parse_env("CHUNK_OVERLAP", &v)?;
    }
    if let Some(v) = lookup("RETRIEVAL_TOP_K") {
        config.retrieval.top_k = parse_env("RETRIEVAL_TOP_K", &v)?;
    }
    if let Some(v) = lookup("GATE_CONFIDENCE_THRESHOLD") {
        config.gate.confidence_threshold = parse_env("GATE_CONFIDENCE_THRESHOLD", &v)?;
    }
    if let Some(v) = lookup("GATE_MIN_CHUNKS") {
        config.gate.min_chunks = parse_env("GATE_MIN_CHUNKS", &v)?;
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: '{}'", key, value))
}

pub fn validate(config: &Config) -> Result<()> {
    config
        .chunking
        .params()
        .with_context(|| "Invalid [chunking] configuration")?;

    config
        .review_gate()
        .with_context(|| "Invalid [gate] configuration")?;

    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    if config.ingest.include_globs.is_empty() {
        bail!("ingest.include_globs must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.chunking.chunk_size, 512);
        assert_eq!(config.chunking.chunk_overlap, 64);
        assert_eq!(config.gate.confidence_threshold, 0.7);
        assert_eq!(config.gate.min_chunks, 1);
        assert_eq!(config.retrieval.top_k, 4);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
[chunking]
strategy = "by_paragraph"
chunk_size = 1000

[gate]
min_chunks = 2
"#,
        )
        .unwrap();
        let params = config.chunking.params().unwrap();
        assert_eq!(params.strategy, ChunkStrategy::ByParagraph);
        assert_eq!(params.chunk_size, 1000);
        assert_eq!(params.chunk_overlap, 64);
        assert_eq!(config.gate.min_chunks, 2);
        assert_eq!(config.gate.confidence_threshold, 0.7);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("CHUNK_SIZE", "256"),
                ("CHUNK_OVERLAP", " 32 "),
                ("GATE_CONFIDENCE_THRESHOLD", "0.8"),
                ("GATE_MIN_CHUNKS", "3"),
                ("RETRIEVAL_TOP_K", "6"),
            ]),
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 256);
        assert_eq!(config.chunking.chunk_overlap, 32);
        assert_eq!(config.gate.confidence_threshold, 0.8);
        assert_eq!(config.gate.min_chunks, 3);
        assert_eq!(config.retrieval.top_k, 6);
    }

    #[test]
    fn test_env_override_must_parse() {
        let mut config = Config::default();
        let err = apply_env_overrides(&mut config, env(&[("CHUNK_SIZE", "big")])).unwrap_err();
        assert!(err.to_string().contains("CHUNK_SIZE"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = 512;
        let err = validate(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("chunk_overlap (512) must be smaller"));

        let mut config = Config::default();
        config.chunking.strategy = "semantic".to_string();
        let err = validate(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown chunking strategy"));

        let mut config = Config::default();
        config.gate.confidence_threshold = -0.1;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docgate.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 300\nchunk_overlap = 30\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 300);

        std::fs::write(&path, "[chunking\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
