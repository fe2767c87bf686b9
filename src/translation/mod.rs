/*!
 * Paragraph translation used by the `translate-md` stage and the
 * `translate` command.
 *
 * - `client`: backend trait and the Google / fake implementations
 * - `segment`: splits a paragraph into translatable and verbatim runs
 * - `batch`: bounded concurrent translation of many paragraphs
 * - `cache`: per-stage memoisation of paragraph translations
 * - `debug`: per-paragraph records written by `--debug-output`
 */

use anyhow::{anyhow, Context, Result};
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};

pub mod batch;
pub mod cache;
pub mod client;
pub mod debug;
pub mod segment;

pub use batch::{BatchOptions, DelayRange, ParagraphTranslator};
pub use cache::{CacheStats, TranslationCache};
pub use client::{FakeTranslator, GoogleTranslator, TextTranslator, TranslationRequest, translator_from_config};
pub use debug::{DebugReport, ParagraphRecord};
pub use segment::{Segment, segment_paragraph};

/// Drive a translation future to completion from synchronous code.
///
/// Outside of any runtime a dedicated multi-thread runtime is started. Inside
/// a multi-thread runtime the current worker is handed over with
/// `block_in_place`. A current-thread runtime cannot be blocked and is
/// reported as an error.
pub fn block_on_translation<F: Future>(future: F) -> Result<F::Output> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(tokio::task::block_in_place(|| handle.block_on(future)))
        }
        Ok(_) => Err(anyhow!(
            "Translation cannot run inside a single-threaded Tokio runtime; use a multi-thread runtime instead."
        )),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start translation runtime")?;
            Ok(runtime.block_on(future))
        }
    }
}
