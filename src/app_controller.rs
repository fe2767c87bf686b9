use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::language_utils::validate_language_code;
use crate::paragraphs::collect_paragraphs;
use crate::pipeline::{PayloadEntry, PipelineBuilder, PipelineDefinition, PipelinePayload, PipelineRunner, RunReport};
use crate::stages::{StageArgs, StageRegistry};
use crate::translation::{block_on_translation, translator_from_config, BatchOptions, ParagraphTranslator, TranslationCache};

// @module: Application controller shared by every front end

/// Result of one definition in a payload batch
#[derive(Debug)]
pub struct BatchOutcome {
    // @field: 0-based position in the batch
    pub index: usize,
    pub result: Result<RunReport, PipelineError>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Owns the configuration and the stage registry and drives pipelines
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Read-only stage table shared by all definitions
    registry: StageRegistry,
    interactive: bool,
}

impl Controller {
    /// Create a controller with default configuration
    pub fn new_for_test() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            registry: StageRegistry::builtin(),
            interactive: false,
        }
    }

    /// Draw progress bars while stages run
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    fn builder(&self) -> PipelineBuilder<'_> {
        PipelineBuilder::new(&self.registry)
    }

    /// Build a definition from the token grammar
    pub fn build_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        output: Option<PathBuf>,
        no_render: bool,
    ) -> Result<PipelineDefinition, PipelineError> {
        Ok(self.builder().with_output(output).with_no_render(no_render).build(tokens)?)
    }

    /// Execute an already validated definition
    pub fn run_definition(&self, definition: &PipelineDefinition) -> Result<RunReport, PipelineError> {
        let runner = PipelineRunner::new(&self.config).interactive(self.interactive);
        Ok(runner.run(definition)?)
    }

    pub fn run_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        output: Option<PathBuf>,
        no_render: bool,
    ) -> Result<RunReport, PipelineError> {
        let definition = self.build_tokens(tokens, output, no_render)?;
        self.run_definition(&definition)
    }

    /// Run a standalone subcommand as a one-stage pipeline
    pub fn run_standalone(&self, args: StageArgs) -> Result<RunReport, PipelineError> {
        let definition = self.builder().build_standalone(args)?;
        self.run_definition(&definition)
    }

    pub fn run_payload(&self, payload: &PipelinePayload) -> Result<RunReport, PipelineError> {
        let definition = payload.build(self.builder())?;
        self.run_definition(&definition)
    }

    /// Build and run each payload independently, in order.
    ///
    /// An entry that failed to decode counts as a failed definition at its
    /// own index. With `stop_on_error` the batch ends at the first failed
    /// definition; otherwise every definition is attempted.
    pub fn run_payloads(&self, payloads: &[PayloadEntry], stop_on_error: bool) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(payloads.len());

        for (index, entry) in payloads.iter().enumerate() {
            info!("Running pipeline {}/{}", index + 1, payloads.len());
            let result = match entry {
                Ok(payload) => self.run_payload(payload),
                Err(e) => Err(PipelineError::Config(e.clone())),
            };

            let failed = result.is_err();
            if let Err(e) = &result {
                error!("Pipeline {} failed: {}", index + 1, e);
            }
            outcomes.push(BatchOutcome { index, result });

            if failed && stop_on_error {
                let skipped = payloads.len() - index - 1;
                if skipped > 0 {
                    warn!("Stopping batch after failure, {} pipeline(s) skipped", skipped);
                }
                break;
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            "Batch completed: {} succeeded, {} failed, {} skipped",
            succeeded,
            outcomes.len() - succeeded,
            payloads.len() - outcomes.len()
        );
        outcomes
    }

    /// Translate free text paragraph by paragraph with the configured backend
    pub fn translate_text(&self, text: &str, source: &str, target: &str, timeout_secs: Option<u64>) -> Result<String> {
        validate_language_code(source, true).context("Invalid source language")?;
        validate_language_code(target, false).context("Invalid target language")?;

        let paragraphs = collect_paragraphs(text);
        if paragraphs.is_empty() {
            return Err(anyhow!("Nothing to translate: the text is empty"));
        }

        let settings = &self.config.translation;
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(settings.timeout_secs));
        let translator = translator_from_config(settings, timeout)?;
        let options = BatchOptions {
            workers: settings.workers,
            request_delay: Duration::from_millis(settings.request_delay_ms),
            ..BatchOptions::new(source, target)
        };
        let batch = ParagraphTranslator::new(translator, TranslationCache::new(settings.cache_enabled), options);

        let translations = block_on_translation(batch.translate_all(&paragraphs))??;

        Ok(translations.join("\n\n"))
    }
}
