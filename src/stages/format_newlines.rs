/*!
 * `format-newlines`: turn single newlines between blocks into blank lines.
 */

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

use crate::document::DocumentArtifact;
use crate::file_utils::FileManager;
use crate::paragraphs::ParagraphExtractor;

use super::{resolve_document, StageContext, StageOperation, StageOutput};

/// Ensure single newline separators between paragraphs are expanded to two
#[derive(Parser, Debug, Clone, PartialEq, Eq, Default)]
#[command(name = "format-newlines")]
pub struct FormatNewlinesArgs {
    /// Markdown file to normalise (omit inside a pipeline)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Where to write the formatted Markdown; may equal INPUT for in-place updates
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl StageOperation for FormatNewlinesArgs {
    fn positional_inputs(&self) -> Vec<&Path> {
        self.input.as_deref().into_iter().collect()
    }

    fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    fn execute(&self, document: Option<DocumentArtifact>, _context: &StageContext<'_>) -> Result<StageOutput> {
        let document = resolve_document("format-newlines", document, self.input.as_deref())?;
        let formatted = expand_single_newlines(document.text(), document.newline().as_str());

        if formatted == document.text() {
            info!("Paragraph spacing already normalised for {}", document.label());
        } else {
            info!("Reformatted paragraph spacing in {}", document.label());
        }

        let mut artifact = DocumentArtifact::from_text(formatted);
        let mut written = Vec::new();

        if let Some(output) = &self.output {
            FileManager::write_to_file(output, artifact.text())?;
            info!("Wrote reformatted Markdown to {}", output.display());
            written.push(output.clone());
            artifact = artifact.with_origin(output);
        }

        Ok(StageOutput::new(artifact).with_written(written))
    }
}

/// Expand isolated newlines between content blocks into blank lines.
///
/// Runs of two or more newlines are kept as they are, multi-line blocks
/// (fences, tables, html, equations) are never split, and a trailing newline
/// is preserved.
pub fn expand_single_newlines(text: &str, newline: &str) -> String {
    let ends_with_newline = text.ends_with(newline);
    let body = text.strip_suffix(newline).unwrap_or(text);
    if body.is_empty() {
        return text.to_string();
    }

    let blocks = ParagraphExtractor::new(newline).collect(body);
    if blocks.iter().all(|b| b.kind.is_blank()) {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len() + text.len() / 8);
    let mut pending_blanks: Vec<String> = Vec::new();
    let mut seen_content = false;

    for block in blocks {
        if block.kind.is_blank() {
            pending_blanks.push(block.text(newline));
            continue;
        }

        if seen_content {
            result.push_str(newline);
            if pending_blanks.is_empty() {
                result.push_str(newline);
            }
            for blank in pending_blanks.drain(..) {
                result.push_str(&blank);
                result.push_str(newline);
            }
        } else {
            for blank in pending_blanks.drain(..) {
                result.push_str(&blank);
                result.push_str(newline);
            }
        }

        result.push_str(&block.text(newline));
        seen_content = true;
    }

    for blank in pending_blanks {
        result.push_str(newline);
        result.push_str(&blank);
    }

    if ends_with_newline {
        result.push_str(newline);
    }
    result
}
