/*!
 * `translate-md`: bilingual paragraph-by-paragraph translation.
 *
 * The runner calls the stage synchronously; it drives the translation
 * future itself and returns only once every paragraph is translated or one
 * has failed.
 */

use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::document::DocumentArtifact;
use crate::file_utils::FileManager;
use crate::language_utils::{get_language_name, validate_language_code};
use crate::paragraphs::{collect_paragraphs, normalise_paragraph_newlines, normalise_to_lf};
use crate::translation::{
    block_on_translation, translator_from_config, BatchOptions, DebugReport, DelayRange, ParagraphTranslator,
    TranslationCache,
};

use super::{resolve_document, StageContext, StageOperation, StageOutput};

/// Translate a Markdown document paragraph by paragraph
#[derive(Parser, Debug, Clone, PartialEq, Eq, Default)]
#[command(name = "translate-md")]
pub struct TranslateMdArgs {
    /// Markdown file to translate (omit inside a pipeline)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Target language code (for example 'es' or 'fr')
    #[arg(short, long, value_name = "LANG")]
    pub target: String,

    /// Source language code
    #[arg(short, long, value_name = "LANG", default_value = "auto")]
    pub source: String,

    /// Timeout for each translation request in seconds (overrides config)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of concurrent translation workers (overrides config)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Delay between translation requests in milliseconds (overrides config)
    #[arg(long = "delay-ms", value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Lower bound of the random delay between requests, in seconds
    #[arg(long = "delay-min", value_name = "SECS", value_parser = parse_seconds)]
    pub delay_min: Option<Duration>,

    /// Upper bound of the random delay between requests, in seconds
    #[arg(long = "delay-max", value_name = "SECS", value_parser = parse_seconds)]
    pub delay_max: Option<Duration>,

    /// Pause after every N requests (0 disables the pause)
    #[arg(long = "bulk-delay-every", value_name = "N", default_value_t = 0)]
    pub bulk_delay_every: usize,

    /// Length of the periodic pause, in seconds
    #[arg(long = "bulk-delay", value_name = "SECS", value_parser = parse_seconds, default_value = "10")]
    pub bulk_delay: Duration,

    /// Retries for a request that failed with a transient error
    #[arg(long = "retry-count", value_name = "N", default_value_t = 0)]
    pub retry_count: u32,

    /// Write per-paragraph translation records to this JSON file
    #[arg(long = "debug-output", value_name = "PATH")]
    pub debug_output: Option<PathBuf>,

    /// Where to write the translated Markdown
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl TranslateMdArgs {
    /// Random request spacing from `--delay-min`/`--delay-max`
    pub fn random_delay(&self) -> Option<DelayRange> {
        match (self.delay_min, self.delay_max) {
            (None, None) => None,
            (Some(min), None) => Some(DelayRange::new(min, min)),
            (None, Some(max)) => Some(DelayRange::new(Duration::ZERO, max)),
            (Some(min), Some(max)) => Some(DelayRange::new(min, max)),
        }
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("'{}' must be a non-negative number of seconds", value));
    }
    Ok(Duration::from_secs_f64(seconds))
}

impl StageOperation for TranslateMdArgs {
    fn positional_inputs(&self) -> Vec<&Path> {
        self.input.as_deref().into_iter().collect()
    }

    fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    fn validate(&self) -> Result<(), String> {
        validate_language_code(&self.target, false).map_err(|e| format!("target language: {}", e))?;
        validate_language_code(&self.source, true).map_err(|e| format!("source language: {}", e))?;

        if self.workers == Some(0) {
            return Err("worker count must be at least 1".to_string());
        }
        if self.timeout == Some(0) {
            return Err("timeout must be greater than 0".to_string());
        }
        if let (Some(min), Some(max)) = (self.delay_min, self.delay_max) {
            if min > max {
                return Err("--delay-min must not exceed --delay-max".to_string());
            }
        }
        if self.debug_output.is_some() && self.debug_output == self.output {
            return Err("--debug-output must differ from --output".to_string());
        }
        Ok(())
    }

    fn execute(&self, document: Option<DocumentArtifact>, context: &StageContext<'_>) -> Result<StageOutput> {
        let document = resolve_document("translate-md", document, self.input.as_deref())?;
        let source_name = document.origin().map(|p| p.display().to_string());
        let paragraphs = collect_paragraphs(document.text());

        if paragraphs.is_empty() {
            return Err(anyhow!("The input document does not contain any paragraphs."));
        }

        let settings = &context.config.translation;
        let timeout = Duration::from_secs(self.timeout.unwrap_or(settings.timeout_secs));
        let options = BatchOptions {
            workers: self.workers.unwrap_or(settings.workers),
            request_delay: Duration::from_millis(self.delay_ms.unwrap_or(settings.request_delay_ms)),
            random_delay: self.random_delay(),
            bulk_delay_every: self.bulk_delay_every,
            bulk_delay: self.bulk_delay,
            retry_count: self.retry_count,
            show_progress: context.interactive,
            ..BatchOptions::new(&self.source, &self.target)
        };

        info!(
            "Translating {} paragraph(s) from {} to {}",
            paragraphs.len(),
            get_language_name(&self.source).unwrap_or_else(|_| self.source.clone()),
            get_language_name(&self.target).unwrap_or_else(|_| self.target.clone())
        );

        let translator = translator_from_config(settings, timeout)?;
        let batch = ParagraphTranslator::new(translator, TranslationCache::new(settings.cache_enabled), options);

        let records = block_on_translation(batch.translate_all_detailed(&paragraphs))??;
        let translations: Vec<String> = records.iter().map(|r| r.translation.clone()).collect();

        let bilingual = render_bilingual(&paragraphs, &translations, document.newline().as_str());
        let mut artifact = DocumentArtifact::from_text(bilingual);
        let mut written = Vec::new();

        if let Some(path) = &self.debug_output {
            let report = DebugReport {
                source: source_name,
                target: self.output.as_ref().map(|p| p.display().to_string()),
                source_language: self.source.clone(),
                target_language: self.target.clone(),
                backend: batch.backend_name(),
                cache_hit_rate: batch.cache().stats().hit_rate(),
                paragraphs: records,
            };
            report.write(path)?;
            info!("Wrote translation debug data to {}", path.display());
            written.push(path.clone());
        }

        if let Some(output) = &self.output {
            FileManager::write_to_file(output, artifact.text())?;
            info!("Wrote translated Markdown to {}", output.display());
            written.push(output.clone());
            artifact = artifact.with_origin(output);
        }

        Ok(StageOutput::new(artifact).with_written(written))
    }
}

/// Each original paragraph, a blank line, then its translation
pub fn render_bilingual(paragraphs: &[String], translations: &[String], newline: &str) -> String {
    let blocks: Vec<String> = paragraphs
        .iter()
        .zip(translations)
        .map(|(original, translation)| format!("{}\n\n{}", normalise_to_lf(original), translation))
        .collect();

    let mut result = normalise_paragraph_newlines(&blocks, newline).join(&newline.repeat(2));
    if !result.is_empty() && !result.ends_with(newline) {
        result.push_str(newline);
    }
    result
}
