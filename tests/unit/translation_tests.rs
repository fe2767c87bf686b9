/*!
 * Tests for paragraph translation pacing, retries and debug records
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use async_trait::async_trait;
use md_tools::errors::TranslationError;
use md_tools::translation::{
    block_on_translation, BatchOptions, DebugReport, DelayRange, FakeTranslator, ParagraphTranslator,
    TextTranslator, TranslationCache, TranslationRequest,
};

/// Backend that times out on its first call and then echoes the text
#[derive(Debug, Default)]
struct TimeoutOnceTranslator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextTranslator for TimeoutOnceTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslationError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(TranslationError::Connection("timed out".to_string()));
        }
        Ok(request.text.to_lowercase())
    }

    fn name(&self) -> String {
        "timeout-once".to_string()
    }
}

fn paragraphs(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Paragraph {}", i)).collect()
}

fn quick_options() -> BatchOptions {
    BatchOptions {
        retry_backoff: Duration::ZERO,
        ..BatchOptions::new("en", "fr")
    }
}

#[test]
fn test_retryCount_withConnectionFailure_shouldRetryOnce() {
    let backend = Arc::new(TimeoutOnceTranslator::default());
    let translator = ParagraphTranslator::new(
        backend.clone(),
        TranslationCache::new(false),
        BatchOptions { retry_count: 1, ..quick_options() },
    );

    let translated = block_on_translation(translator.translate_all(&["Hello".to_string()])).unwrap().unwrap();

    assert_eq!(translated, vec!["hello"]);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_retryCount_withZero_shouldFailOnFirstError() {
    let backend = Arc::new(TimeoutOnceTranslator::default());
    let translator = ParagraphTranslator::new(backend.clone(), TranslationCache::new(false), quick_options());

    let result = block_on_translation(translator.translate_all(&["Hello".to_string()])).unwrap();

    assert!(result.is_err());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_bulkDelay_withSeveralWorkers_shouldStillPause() {
    let translator = ParagraphTranslator::new(
        Arc::new(FakeTranslator::new("stub")),
        TranslationCache::new(false),
        BatchOptions {
            workers: 3,
            bulk_delay_every: 3,
            bulk_delay: Duration::from_millis(80),
            ..quick_options()
        },
    );

    let started = Instant::now();
    let translated = block_on_translation(translator.translate_all(&paragraphs(4))).unwrap().unwrap();

    assert_eq!(translated.len(), 4);
    assert!(started.elapsed() >= Duration::from_millis(80));
}

#[test]
fn test_delayRange_withEqualBounds_shouldSampleExactly() {
    let range = DelayRange::new(Duration::from_millis(25), Duration::from_millis(25));

    assert_eq!(range.sample(), Duration::from_millis(25));
    assert!(!range.is_zero());
}

#[test]
fn test_debugReport_fromDetailedRecords_shouldKeepDocumentOrder() {
    let translator = ParagraphTranslator::new(
        Arc::new(FakeTranslator::new("identity")),
        TranslationCache::default(),
        BatchOptions { workers: 4, ..quick_options() },
    );

    let records = block_on_translation(translator.translate_all_detailed(&paragraphs(6))).unwrap().unwrap();
    let report = DebugReport {
        source: None,
        target: None,
        source_language: "en".to_string(),
        target_language: "fr".to_string(),
        backend: translator.backend_name(),
        cache_hit_rate: translator.cache().stats().hit_rate(),
        paragraphs: records,
    };

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["backend"], "fake (identity)");
    assert_eq!(json["paragraphs"][5]["index"], 6);
    assert_eq!(json["paragraphs"][5]["translation"], "[en->fr|identity] Paragraph 6");
    assert_eq!(json["cache_hit_rate"], 0.0);
}
