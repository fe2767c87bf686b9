/*!
 * # md-tools - Markdown pipeline toolkit
 *
 * A Rust library for chaining Markdown transformations into pipelines.
 *
 * ## Features
 *
 * - Split a document into balanced parts by paragraph
 * - Combine documents and file lists into one
 * - Expand single newlines between paragraphs
 * - Bilingual paragraph-by-paragraph translation
 * - Pipelines from a `=`-separated token grammar or JSON payloads
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: The document artifact flowing between stages
 * - `paragraphs`: Paragraph and block extraction
 * - `stages`: Stage registry and the stage implementations
 * - `pipeline`: Token grammar, builder, validation, payloads and runner
 * - `translation`: Translation backends, caching and batching
 * - `file_utils`: File system operations
 * - `app_controller`: Application controller shared by the CLI front ends
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod paragraphs;
pub mod pipeline;
pub mod stages;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchOutcome, Controller};
pub use document::{DocumentArtifact, Newline};
pub use errors::{ConfigError, ErrorKind, PipelineError, StageExecutionError, TranslationError};
pub use language_utils::{get_language_name, normalize_to_part2t, validate_language_code};
pub use pipeline::{PipelineBuilder, PipelineDefinition, PipelinePayload, PipelineRunner, RunReport};
pub use stages::{StageArgs, StageKind, StageRegistry};
