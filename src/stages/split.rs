/*!
 * `split`: cut a document into balanced groups of contiguous paragraphs.
 */

use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

use crate::document::DocumentArtifact;
use crate::file_utils::FileManager;
use crate::paragraphs::{collect_paragraphs, normalise_paragraph_newlines};

use super::{resolve_document, StageContext, StageOperation, StageOutput};

/// Split a Markdown file into multiple parts by paragraph
#[derive(Parser, Debug, Clone, PartialEq, Eq, Default)]
#[command(name = "split")]
pub struct SplitArgs {
    /// Markdown file to split (omit inside a pipeline)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Number of parts to split the document into (must be >= 1)
    #[arg(value_name = "PARTS", conflicts_with = "parts_option")]
    pub parts: Option<String>,

    /// Number of parts, as an option
    #[arg(short = 'p', long = "parts", value_name = "N", id = "parts_option")]
    pub parts_option: Option<usize>,

    /// Output base: parts are written as <base>_part_<n><ext>
    #[arg(short, long, value_name = "BASE")]
    pub output: Option<PathBuf>,
}

impl SplitArgs {
    /// Resolved number of parts
    pub fn part_count(&self) -> Option<usize> {
        match &self.parts {
            Some(raw) => raw.trim().parse().ok(),
            None => self.parts_option,
        }
    }
}

fn numeric_path(path: Option<&PathBuf>) -> Option<String> {
    path.and_then(|p| p.to_str())
        .filter(|s| s.trim().parse::<usize>().is_ok())
        .map(str::to_string)
}

impl StageOperation for SplitArgs {
    fn positional_inputs(&self) -> Vec<&Path> {
        self.input.as_deref().into_iter().collect()
    }

    fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// A leading integer is the part count: `split 3`, `split 3 doc.md`
    fn normalize(&mut self) {
        let Some(count) = numeric_path(self.input.as_ref()) else {
            return;
        };

        match self.parts.take() {
            None if self.parts_option.is_none() => {
                self.parts = Some(count);
                self.input = None;
            }
            Some(raw) if raw.trim().parse::<usize>().is_err() => {
                self.parts = Some(count);
                self.input = Some(PathBuf::from(raw));
            }
            other => self.parts = other,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(raw) = &self.parts {
            if raw.trim().parse::<usize>().is_err() {
                return Err(format!("invalid number of parts '{}'", raw));
            }
        }
        match self.part_count() {
            None => Err("the number of parts is required (PARTS or -p/--parts)".to_string()),
            Some(0) => Err("the number of parts must be at least 1".to_string()),
            Some(_) => Ok(()),
        }
    }

    fn execute(&self, document: Option<DocumentArtifact>, _context: &StageContext<'_>) -> Result<StageOutput> {
        let parts = self
            .part_count()
            .filter(|n| *n >= 1)
            .ok_or_else(|| anyhow!("The number of parts must be at least 1."))?;

        let document = resolve_document("split", document, self.input.as_deref())?;
        let paragraphs = collect_paragraphs(document.text());

        if paragraphs.is_empty() {
            return Err(anyhow!("The input document does not contain any paragraphs."));
        }
        if parts > paragraphs.len() {
            return Err(anyhow!(
                "Requested number of parts ({}) exceeds the number of paragraphs ({}); refusing to split.",
                parts,
                paragraphs.len()
            ));
        }

        info!("Paragraphs found: {}", paragraphs.len());

        let mut written = Vec::new();
        if let Some(base) = &self.output {
            let groups = split_paragraphs(&paragraphs, parts);
            let newline = document.newline().as_str();

            for (index, group) in groups.iter().enumerate() {
                let target = FileManager::part_path(base, index + 1);
                FileManager::write_to_file(&target, &render_part(group, newline))?;
                written.push(target);
            }

            info!("Wrote {} part file(s) from base {}", written.len(), base.display());
        }

        Ok(StageOutput::new(document).with_written(written))
    }
}

/// Group paragraphs into `parts` contiguous runs of roughly equal byte length.
///
/// Every group receives at least one paragraph; callers guarantee
/// `1 <= parts <= paragraphs.len()`.
pub fn split_paragraphs(paragraphs: &[String], parts: usize) -> Vec<Vec<String>> {
    if parts <= 1 {
        return vec![paragraphs.to_vec()];
    }

    let lengths: Vec<usize> = paragraphs.iter().map(String::len).collect();
    let mut remaining_length: usize = lengths.iter().sum();
    let mut groups = Vec::with_capacity(parts);
    let mut index = 0;

    for part_index in 0..parts {
        let remaining_parts = parts - part_index;

        if part_index == parts - 1 {
            groups.push(paragraphs[index..].to_vec());
            break;
        }

        let target = remaining_length as f64 / remaining_parts as f64;
        let min_needed = remaining_parts - 1;
        let mut group = Vec::new();
        let mut group_length = 0;

        while index < paragraphs.len() {
            let remaining_paragraphs = paragraphs.len() - index;
            if !group.is_empty()
                && (group_length as f64 >= target || remaining_paragraphs <= min_needed)
            {
                break;
            }

            group.push(paragraphs[index].clone());
            group_length += lengths[index];
            index += 1;
        }

        remaining_length -= group_length;
        groups.push(group);
    }

    groups
}

/// Paragraphs joined by a blank line, terminated by a newline
fn render_part(paragraphs: &[String], newline: &str) -> String {
    let mut content = normalise_paragraph_newlines(paragraphs, newline).join(&newline.repeat(2));
    if !content.is_empty() && !content.ends_with(newline) {
        content.push_str(newline);
    }
    content
}
