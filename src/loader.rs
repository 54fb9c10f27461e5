//! Document loading from the local filesystem.
//!
//! Supports plain text (`.txt`, read as lossy UTF-8) and PDF (`.pdf`, text
//! extracted with `pdf-extract`). Directories given on the command line are
//! walked recursively and filtered with include globs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::LoadError;
use crate::models::Document;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Load a single file. The document source is the file name; its id is the
/// full path, so same-named files in different folders stay distinct.
pub fn load_document(path: &Path) -> Result<Document, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "txt" => {
            let bytes = read_bytes(path)?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        "pdf" => {
            let bytes = read_bytes(path)?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| LoadError::Pdf {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        }
        other => return Err(LoadError::Unsupported(format!(".{}", other))),
    };

    Ok(Document::new(display_name(path), text).with_id(path.display().to_string()))
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Expand the given paths into a list of files. Files are kept as given;
/// directories are walked and filtered by `include_globs` (matched against
/// the path relative to that directory). Output from each directory is
/// sorted for deterministic ordering.
pub fn collect_paths(inputs: &[PathBuf], include_globs: &[String]) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(include_globs)?;
    let exclude_set = build_globset(DEFAULT_EXCLUDES)?;

    let mut paths = Vec::new();
    for input in inputs {
        if input.is_file() {
            paths.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            bail!("Path does not exist: {}", input.display());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(input).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }
            found.push(path.to_path_buf());
        }
        found.sort();
        paths.extend(found);
    }

    Ok(paths)
}

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn globs() -> Vec<String> {
        vec!["**/*.txt".to_string(), "**/*.pdf".to_string()]
    }

    #[test]
    fn test_load_text_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lease.txt");
        fs::write(&path, "Tenant: Acme Corp.\n\nRent: $2,000 per month.").unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.source, "lease.txt");
        assert_eq!(doc.id, path.display().to_string());
        assert!(doc.text.contains("Rent: $2,000"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_document(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.docx");
        fs::write(&path, b"PK").unwrap();

        let err = load_document(&path).unwrap_err();
        assert_eq!(err.to_string(), "unsupported file type: '.docx'. Use .txt or .pdf");
    }

    #[test]
    fn test_load_corrupt_pdf() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        fs::write(&path, b"not a pdf").unwrap();

        assert!(matches!(load_document(&path), Err(LoadError::Pdf { .. })));
    }

    #[test]
    fn test_collect_paths_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("nested/c.txt"), "c").unwrap();
        fs::write(root.join("skip.md"), "md").unwrap();
        fs::write(root.join(".git/config.txt"), "git").unwrap();

        let paths = collect_paths(&[root.to_path_buf()], &globs()).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "nested/c.txt"]);
    }

    #[test]
    fn test_collect_paths_keeps_explicit_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("readme.md");
        fs::write(&file, "explicit").unwrap();

        let paths = collect_paths(&[file.clone()], &globs()).unwrap();
        assert_eq!(paths, vec![file]);

        assert!(collect_paths(&[tmp.path().join("missing")], &globs()).is_err());
    }
}
