/*!
 * Pipeline engine: token grammar, definition builder, capability
 * validation, JSON payloads and the sequential runner.
 */

pub mod builder;
pub mod grammar;
pub mod payload;
pub mod runner;
pub mod validation;

pub use builder::{PipelineBuilder, PipelineDefinition, PipelineStage};
pub use grammar::{split_tokens, SplitTokens, STAGE_SEPARATOR};
pub use payload::{parse_payloads, PayloadEntry, PayloadStages, PipelinePayload, StageEntry};
pub use runner::{format_duration, PipelineRunner, RunReport, StageSummary};
pub use validation::{validate_stages, PipelineContext};
