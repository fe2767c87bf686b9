/*!
 * Common test utilities for the md-tools test suite
 */

use std::path::{Path, PathBuf};
use std::fs;
use anyhow::Result;
use tempfile::TempDir;
use md_tools::{Config, Controller};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample Markdown document with four equally sized paragraphs
pub fn create_test_document(dir: &PathBuf, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, "AAAA\n\nBBBB\n\nCCCC\n\nDDDD\n")
}

/// Controller wired to the offline fake translator
pub fn fake_controller() -> Controller {
    let mut config = Config::default();
    config.apply_fake_override(Some("stub"));
    Controller::with_config(config)
}

/// Path rendered as a single pipeline token
pub fn token(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Whitespace-separated line into owned tokens
pub fn tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Names of all files directly inside `dir`, sorted
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}
