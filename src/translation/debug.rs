/*!
 * Per-paragraph translation records for `translate-md --debug-output`.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::file_utils::FileManager;

/// What happened to one paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    /// 1-based position in the document
    pub index: usize,
    pub original: String,
    pub translation: String,
    /// Segments sent to the backend
    pub requests: usize,
    /// Backend calls including retries
    pub attempts: usize,
    pub cached: bool,
    pub elapsed_ms: u64,
}

/// The file written by `--debug-output`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugReport {
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub backend: String,
    pub cache_hit_rate: f64,
    pub paragraphs: Vec<ParagraphRecord>,
}

impl DebugReport {
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialise debug output")?;
        FileManager::write_to_file(path, &json).with_context(|| format!("Failed to write debug output: {}", path.display()))
    }
}
