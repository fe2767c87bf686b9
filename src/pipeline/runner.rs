use log::{debug, info};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::document::DocumentArtifact;
use crate::errors::StageExecutionError;
use crate::file_utils::FileManager;
use crate::stages::{StageContext, StageOperation};

use super::builder::PipelineDefinition;

// @module: Sequential stage runner

/// What a single stage did during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub index: usize,
    pub name: &'static str,
    pub written: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    // @field: Document produced by the last stage
    pub document: Option<DocumentArtifact>,
    // @field: Every file written, in write order
    pub written: Vec<PathBuf>,
    pub stages: Vec<StageSummary>,
}

impl RunReport {
    /// Final document text, if the pipeline produced one
    pub fn text(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.text())
    }
}

/// Executes a `PipelineDefinition` stage by stage.
///
/// Stages run strictly in order. The first failure stops the run; files
/// already written by earlier stages are left in place.
pub struct PipelineRunner<'a> {
    config: &'a Config,
    interactive: bool,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, interactive: false }
    }

    /// Show progress bars for long-running stages
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn run(&self, definition: &PipelineDefinition) -> Result<RunReport, StageExecutionError> {
        let start_time = Instant::now();
        let context = StageContext::new(self.config).interactive(self.interactive);
        let total = definition.len();

        let mut document = match definition.input() {
            Some(path) => {
                let first = definition.stages().first().map(|s| s.name()).unwrap_or("pipeline");
                let loaded = DocumentArtifact::load(path)
                    .map_err(|e| StageExecutionError::new(0, first, format!("{:#}", e), Some(e)))?;
                Some(loaded)
            }
            None => None,
        };

        let mut report = RunReport {
            document: None,
            written: Vec::new(),
            stages: Vec::with_capacity(total),
        };

        for stage in definition.stages() {
            info!("Conducting {} [stage {}/{}]: {}", stage.name(), stage.index() + 1, total, stage.label());
            let stage_start = Instant::now();

            let output = stage
                .args()
                .execute(document.take(), &context)
                .map_err(|e| StageExecutionError::new(stage.index(), stage.name(), format!("{:#}", e), Some(e)))?;

            let elapsed = stage_start.elapsed();
            debug!(
                "Stage {} ({}) finished in {}, {} file(s) written",
                stage.index() + 1,
                stage.name(),
                format_duration(elapsed),
                output.written.len()
            );

            report.written.extend(output.written.iter().cloned());
            report.stages.push(StageSummary {
                index: stage.index(),
                name: stage.name(),
                written: output.written,
                elapsed,
            });
            document = Some(output.document);
        }

        if let (Some(path), Some(artifact)) = (definition.output(), document.as_ref()) {
            let last = definition.stages().last();
            FileManager::write_to_file(path, artifact.text()).map_err(|e| {
                StageExecutionError::new(
                    last.map(|s| s.index()).unwrap_or_default(),
                    last.map(|s| s.name()).unwrap_or("pipeline"),
                    format!("{:#}", e),
                    Some(e),
                )
            })?;
            info!("Wrote pipeline output to {}", path.display());
            report.written.push(path.to_path_buf());
        }

        if definition.no_render() {
            debug!("Render suppression requested; nothing is rendered by the pipeline runner");
        }

        info!(
            "Pipeline completed: {} stage(s), {} file(s) written in {}",
            total,
            report.written.len(),
            format_duration(start_time.elapsed())
        );

        report.document = document;
        Ok(report)
    }
}

/// Format a duration into a human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
