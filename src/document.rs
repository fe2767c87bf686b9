/*!
 * The in-memory Markdown document handed from stage to stage.
 */

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::paragraphs::detect_newline;

/// Newline convention of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Newline {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl Newline {
    /// Detect the dominant convention used by `text`
    pub fn detect(text: &str) -> Self {
        match detect_newline(text) {
            "\r\n" => Newline::CrLf,
            "\r" => Newline::Cr,
            _ => Newline::Lf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
            Newline::Cr => "\r",
        }
    }
}

/// Textual content plus the newline convention detected from its origin.
///
/// Artifacts are moved between stages; a stage consumes the one it receives
/// and returns a fresh value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentArtifact {
    text: String,
    newline: Newline,
    origin: Option<PathBuf>,
}

impl DocumentArtifact {
    /// Wrap text that did not come from a file
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let newline = Newline::detect(&text);
        Self { text, newline, origin: None }
    }

    /// Read a document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = FileManager::read_to_string(path)?;
        Ok(Self::from_text(text).with_origin(path))
    }

    /// Attach the path the document was read from or written to
    pub fn with_origin<P: AsRef<Path>>(mut self, origin: P) -> Self {
        self.origin = Some(origin.as_ref().to_path_buf());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn newline(&self) -> Newline {
        self.newline
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Label used in log lines
    pub fn label(&self) -> String {
        match &self.origin {
            Some(path) => path.display().to_string(),
            None => "<pipeline document>".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
