/*!
 * `combine`: concatenate documents, one newline between each.
 */

use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

use crate::document::DocumentArtifact;
use crate::file_utils::FileManager;
use crate::paragraphs::detect_newline;

use super::{StageContext, StageOperation, StageOutput};

/// Concatenate Markdown files, separating each file with a single newline
#[derive(Parser, Debug, Clone, PartialEq, Eq, Default)]
#[command(name = "combine")]
pub struct CombineArgs {
    /// Markdown files to concatenate (ignored when --file-list is provided)
    #[arg(value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Text file containing one Markdown path per line
    #[arg(short = 'l', long, value_name = "PATH")]
    pub file_list: Option<PathBuf>,

    /// Destination Markdown file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl CombineArgs {
    /// Paths to read: the file list when given, else the positional inputs
    fn gather_inputs(&self) -> Result<Vec<PathBuf>> {
        match &self.file_list {
            Some(list) => FileManager::load_file_list(list),
            None => Ok(self.inputs.clone()),
        }
    }
}

impl StageOperation for CombineArgs {
    fn positional_inputs(&self) -> Vec<&Path> {
        self.inputs.iter().map(PathBuf::as_path).collect()
    }

    fn file_list(&self) -> Option<&Path> {
        self.file_list.as_deref()
    }

    fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    fn execute(&self, document: Option<DocumentArtifact>, _context: &StageContext<'_>) -> Result<StageOutput> {
        let inputs = self.gather_inputs()?;

        if inputs.is_empty() && document.is_none() {
            return Err(anyhow!("No input files specified for combine stage."));
        }

        let missing = FileManager::missing_files(&inputs);
        if !missing.is_empty() {
            let listing = missing
                .iter()
                .map(|p| format!("  - {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(anyhow!("The following input files were not found:\n{}", listing));
        }

        let mut texts = Vec::with_capacity(inputs.len() + 1);
        if let Some(document) = document {
            texts.push(document.into_text());
        }
        for path in &inputs {
            texts.push(FileManager::read_to_string(path)?);
        }

        let combined = combine_contents(&texts);
        let mut artifact = DocumentArtifact::from_text(combined);
        let mut written = Vec::new();

        if let Some(output) = &self.output {
            FileManager::write_to_file(output, artifact.text())?;
            info!("Wrote combined Markdown to {}", output.display());
            written.push(output.clone());
            artifact = artifact.with_origin(output);
        }

        Ok(StageOutput::new(artifact).with_written(written))
    }
}

/// Join texts with the first text's newline, each stripped of trailing newlines
pub fn combine_contents(texts: &[String]) -> String {
    let Some(first) = texts.first() else {
        return String::new();
    };

    let newline = if first.is_empty() { "\n" } else { detect_newline(first) };
    let mut combined = texts
        .iter()
        .map(|t| t.trim_end_matches(['\r', '\n']))
        .collect::<Vec<_>>()
        .join(newline);
    combined.push_str(newline);
    combined
}
