/*!
 * Concurrent paragraph translation.
 *
 * Paragraphs are fanned out over a bounded worker pool. Each paragraph is
 * segmented, its translatable segments are sent to the backend one after the
 * other, and the results are reassembled in document order. Once any
 * paragraph fails, pending paragraphs are skipped instead of sent.
 *
 * Requests share one pacing gate: a fixed minimum spacing, an optional
 * random spacing drawn from a `DelayRange`, and a longer pause after every
 * `bulk_delay_every` requests.
 */

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, warn};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

use crate::errors::TranslationError;
use crate::paragraphs::normalise_to_lf;

use super::cache::TranslationCache;
use super::client::{TextTranslator, TranslationRequest};
use super::debug::ParagraphRecord;
use super::segment::segment_paragraph;

/// Inclusive bounds for a random delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Bounds are reordered when given backwards
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max { Self { min, max } } else { Self { min: max, max: min } }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_zero(&self) -> bool {
        self.max.is_zero()
    }

    /// Draw a delay uniformly from the range, at millisecond resolution
    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if min == max {
            return self.min;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// Options for one batch of paragraphs
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub source_language: String,
    pub target_language: String,
    /// Maximum paragraphs in flight
    pub workers: usize,
    /// Minimum spacing between two backend requests
    pub request_delay: Duration,
    /// Random spacing between two backend requests, on top of `request_delay`
    pub random_delay: Option<DelayRange>,
    /// Pause after this many requests; 0 disables
    pub bulk_delay_every: usize,
    pub bulk_delay: Duration,
    /// Extra attempts for a request that failed with a transient error
    pub retry_count: u32,
    /// Wait before retry `n` is `retry_backoff * 2^(n-1)`
    pub retry_backoff: Duration,
    pub show_progress: bool,
}

impl BatchOptions {
    /// One worker, no pacing, no retries
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            workers: 1,
            request_delay: Duration::ZERO,
            random_delay: None,
            bulk_delay_every: 0,
            bulk_delay: Duration::ZERO,
            retry_count: 0,
            retry_backoff: Duration::from_secs(1),
            show_progress: false,
        }
    }

    fn paced(&self) -> bool {
        !self.request_delay.is_zero()
            || self.random_delay.is_some_and(|range| !range.is_zero())
            || (self.bulk_delay_every > 0 && !self.bulk_delay.is_zero())
    }
}

// @field: shared by every worker of one batch
#[derive(Debug, Default)]
struct PacingState {
    last_request: Option<Instant>,
    sent: usize,
}

/// Translation of one paragraph plus what it cost
#[derive(Debug)]
struct ParagraphOutcome {
    translation: String,
    requests: usize,
    attempts: usize,
    cached: bool,
}

/// Translates paragraphs concurrently through a `TextTranslator`
pub struct ParagraphTranslator {
    translator: Arc<dyn TextTranslator>,
    cache: TranslationCache,
    options: BatchOptions,
    pacing: Mutex<PacingState>,
}

impl ParagraphTranslator {
    pub fn new(translator: Arc<dyn TextTranslator>, cache: TranslationCache, options: BatchOptions) -> Self {
        Self {
            translator,
            cache,
            options,
            pacing: Mutex::new(PacingState::default()),
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn backend_name(&self) -> String {
        self.translator.name()
    }

    /// Translate every paragraph, returning translations in input order
    pub async fn translate_all(&self, paragraphs: &[String]) -> Result<Vec<String>> {
        let records = self.translate_all_detailed(paragraphs).await?;
        Ok(records.into_iter().map(|record| record.translation).collect())
    }

    /// Translate every paragraph, returning one record per paragraph in input order
    pub async fn translate_all_detailed(&self, paragraphs: &[String]) -> Result<Vec<ParagraphRecord>> {
        if self.options.workers == 0 {
            return Err(anyhow!("Worker count must be at least 1."));
        }

        let workers = self.options.workers;
        let semaphore = Arc::new(Semaphore::new(workers));
        let failed = Arc::new(AtomicBool::new(false));
        let progress = self.progress_bar(paragraphs.len());

        let results = stream::iter(paragraphs.iter().enumerate())
            .map(|(index, paragraph)| {
                let semaphore = semaphore.clone();
                let failed = failed.clone();
                let progress = progress.clone();

                async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(e) => return (index, Some(Err(anyhow!("Worker pool closed: {}", e)))),
                    };

                    if failed.load(Ordering::SeqCst) {
                        return (index, None);
                    }

                    let started = Instant::now();
                    let result = self.translate_paragraph(paragraph).await.map(|outcome| ParagraphRecord {
                        index: index + 1,
                        original: paragraph.clone(),
                        translation: outcome.translation,
                        requests: outcome.requests,
                        attempts: outcome.attempts,
                        cached: outcome.cached,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    });
                    if result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    progress.inc(1);
                    (index, Some(result))
                }
            })
            .buffer_unordered(workers)
            .collect::<Vec<_>>()
            .await;

        progress.finish_and_clear();

        // Sort results by paragraph index to restore document order
        let mut sorted_results = results;
        sorted_results.sort_by_key(|(idx, _)| *idx);

        let mut records = Vec::with_capacity(paragraphs.len());
        let mut errors = Vec::new();
        let mut skipped = 0;

        for (idx, result) in sorted_results {
            match result {
                Some(Ok(record)) => records.push(record),
                Some(Err(e)) => errors.push(format!("Paragraph {} failed: {:#}", idx + 1, e)),
                None => skipped += 1,
            }
        }

        if !errors.is_empty() {
            let mut message = format!("Failed to translate document: {}", errors.join("; "));
            if skipped > 0 {
                message.push_str(&format!(" ({} paragraph(s) skipped)", skipped));
            }
            error!("{}", message);
            return Err(anyhow!(message));
        }

        let stats = self.cache.stats();
        debug!(
            "Translated {} paragraph(s) with {} ({} cache hit(s), hit rate {:.1}%)",
            records.len(),
            self.translator.name(),
            stats.hits,
            stats.hit_rate() * 100.0
        );

        Ok(records)
    }

    /// Translate the translatable segments of one paragraph
    async fn translate_paragraph(&self, paragraph: &str) -> Result<ParagraphOutcome> {
        let source = &self.options.source_language;
        let target = &self.options.target_language;

        if let Some(cached) = self.cache.get(paragraph, source, target) {
            return Ok(ParagraphOutcome {
                translation: cached,
                requests: 0,
                attempts: 0,
                cached: true,
            });
        }

        let mut parts = Vec::new();
        let mut requests = 0;
        let mut attempts = 0;

        for segment in segment_paragraph(paragraph) {
            let block = segment.text();
            if !segment.translatable || block.trim().is_empty() {
                parts.push(block);
                continue;
            }

            let request = TranslationRequest::new(&normalise_to_lf(&block), source, target)?;
            let (translated, used) = self.send_with_retry(&request).await;
            requests += 1;
            attempts += used;
            parts.push(translated?);
        }

        let translation = parts.join("\n");
        self.cache.store(paragraph, source, target, &translation);
        Ok(ParagraphOutcome {
            translation,
            requests,
            attempts,
            cached: false,
        })
    }

    /// Send one request, retrying transient failures. Returns the number of attempts made.
    async fn send_with_retry(&self, request: &TranslationRequest) -> (Result<String>, usize) {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.wait_for_slot().await;

            match self.translator.translate(request).await {
                Ok(text) => return (Ok(text), attempt as usize),
                Err(e) if e.is_retryable() && attempt <= self.options.retry_count => {
                    let backoff = self.options.retry_backoff * (1u32 << (attempt - 1).min(16));
                    warn!(
                        "Backend {} failed ({}), retry {}/{} in {:?}",
                        self.translator.name(),
                        e,
                        attempt,
                        self.options.retry_count,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return (Err(self.rejected(e, attempt)), attempt as usize),
            }
        }
    }

    fn rejected(&self, error: TranslationError, attempts: u32) -> anyhow::Error {
        let context = if attempts > 1 {
            format!("Backend {} rejected the request after {} attempts", self.translator.name(), attempts)
        } else {
            format!("Backend {} rejected the request", self.translator.name())
        };
        anyhow::Error::new(error).context(context)
    }

    /// Space consecutive backend requests and insert the periodic bulk pause
    async fn wait_for_slot(&self) {
        if !self.options.paced() {
            return;
        }

        let spacing = self.next_spacing();
        let mut state = self.pacing.lock().await;

        let every = self.options.bulk_delay_every;
        if every > 0 && state.sent > 0 && state.sent % every == 0 && !self.options.bulk_delay.is_zero() {
            debug!("Pausing {:?} after {} request(s)", self.options.bulk_delay, state.sent);
            tokio::time::sleep(self.options.bulk_delay).await;
        } else if let Some(previous) = state.last_request {
            let elapsed = previous.elapsed();
            if elapsed < spacing {
                tokio::time::sleep(spacing - elapsed).await;
            }
        }

        state.sent += 1;
        state.last_request = Some(Instant::now());
    }

    fn next_spacing(&self) -> Duration {
        let random = self.options.random_delay.map(|range| range.sample()).unwrap_or_default();
        self.options.request_delay.max(random)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.options.show_progress || total == 0 {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} paragraphs ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");
        progress_bar
    }
}
