/*!
 * Error types for the md-tools pipeline engine.
 *
 * Two classes of failure reach the caller:
 * - `ConfigError`: the pipeline description is invalid. Always raised before
 *   any stage runs, so nothing has been written to disk.
 * - `StageExecutionError`: a stage failed while the runner was executing it.
 *   Remaining stages are skipped and files written by earlier stages stay.
 *
 * Both are wrapped by `PipelineError`, which exposes an `ErrorKind` so front
 * ends can render them uniformly.
 */

use thiserror::Error;

/// Distinguishes the two error classes surfaced by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid grammar, arguments, or capability rule violation
    Configuration,
    /// A stage failed during execution
    StageExecution,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration error"),
            Self::StageExecution => write!(f, "stage execution error"),
        }
    }
}

/// Errors detected while splitting, parsing and validating a pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No stage was supplied at all
    #[error("No stages were provided to the pipeline.")]
    EmptyPipeline,

    /// A separator with nothing before it (leading or doubled '=')
    #[error("Encountered '=' with no preceding stage (stage group {position} is empty).")]
    EmptyStage {
        /// 1-based position of the empty group
        position: usize,
    },

    /// The token stream ends with a separator
    #[error("The pipeline ends with a dangling '=' separator.")]
    TrailingSeparator,

    /// `-i` / `--input` without a path
    #[error("The global input directive '{directive}' requires a path.")]
    MissingInputValue {
        /// The directive as written
        directive: String,
    },

    /// `-i <file>` must be followed by '=' before the first stage
    #[error("The global input directive must be followed by '=' before the first stage, e.g. -i <file> = <stage> ...")]
    MissingSeparatorAfterInput,

    /// `-i` / `--input` found inside or after a stage group
    #[error("The global input directive '{directive}' must precede the first stage (found in stage group {position}).")]
    MisplacedInput {
        /// The directive as written
        directive: String,
        /// 1-based position of the offending group
        position: usize,
    },

    /// No descriptor is registered under this name
    #[error("Unknown stage '{0}'.")]
    UnknownStage(String),

    /// The stage's own argument schema rejected its tokens
    #[error("Failed to parse arguments for stage '{stage}': {message}")]
    InvalidArguments {
        /// Stage name
        stage: String,
        /// Parser or schema message
        message: String,
    },

    /// A stage that must consume the upstream document was given its own input path
    #[error("Stage '{stage}' received a positional input path, which is not allowed at this point in the pipeline. Use: md-tool pipeline -i <file> = {stage} [options] ...")]
    PositionalInputNotAllowed {
        /// Stage name
        stage: String,
        /// 0-based stage index
        index: usize,
    },

    /// The leading stage has no way to obtain a document
    #[error("Pipeline has nothing to transform: stage '{stage}' needs an input document. Pass it to the stage or start the pipeline with -i <file>.")]
    NothingToTransform {
        /// Stage name
        stage: String,
    },

    /// A terminal stage whose purpose is writing files lacks `-o/--output`
    #[error("The final stage '{stage}' requires -o/--output to be provided.")]
    MissingOutput {
        /// Stage name
        stage: String,
    },

    /// A structured payload could not be turned into the token grammar
    #[error("Invalid pipeline payload: {0}")]
    InvalidPayload(String),

    /// Several validation rules failed at once
    #[error("{} configuration errors:\n{}", .0.len(), join_messages(.0))]
    Multiple(Vec<ConfigError>),
}

fn join_messages(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConfigError {
    /// Collapse a list of failures into a single error, if any
    pub fn from_all(mut errors: Vec<ConfigError>) -> Option<ConfigError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ConfigError::Multiple(errors)),
        }
    }

    /// Flattened view over a possibly aggregated error
    pub fn failures(&self) -> Vec<&ConfigError> {
        match self {
            ConfigError::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

/// A stage failed while the runner was executing it
#[derive(Error, Debug)]
#[error("Stage {} ({stage}) failed: {message}", .index + 1)]
pub struct StageExecutionError {
    // @field: 0-based position of the failing stage
    index: usize,
    stage: String,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

impl StageExecutionError {
    pub(crate) fn new(index: usize, stage: &str, message: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            index,
            stage: stage.to_string(),
            message: message.into(),
            source,
        }
    }

    /// 0-based position of the failing stage
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based stage number, as shown to users
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Name of the failing stage
    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Any error produced while building or running a pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Raised before execution
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Raised by the runner
    #[error(transparent)]
    Stage(#[from] StageExecutionError),
}

impl PipelineError {
    /// Which error class this is
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) => ErrorKind::Configuration,
            PipelineError::Stage(_) => ErrorKind::StageExecution,
        }
    }

    /// 0-based index of the failing stage for execution errors
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            PipelineError::Config(ConfigError::PositionalInputNotAllowed { index, .. }) => Some(*index),
            PipelineError::Config(_) => None,
            PipelineError::Stage(e) => Some(e.index()),
        }
    }
}

/// Errors that can occur when talking to a translation backend
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The request itself is unusable (empty text, empty language)
    #[error("Invalid translation request: {0}")]
    InvalidRequest(String),

    /// Non-success HTTP status
    #[error("Translation service returned HTTP {0}")]
    Http(u16),

    /// Network failure or timeout
    #[error("Could not reach translation service: {0}")]
    Connection(String),

    /// Response body was not in the expected format
    #[error("Failed to decode translation response: {0}")]
    Parse(String),

    /// Response contained no translated text
    #[error("Translation response did not contain any text")]
    EmptyResponse,
}

impl TranslationError {
    /// Whether sending the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Http(status) => *status == 429 || *status >= 500,
            TranslationError::Connection(_) | TranslationError::EmptyResponse => true,
            TranslationError::InvalidRequest(_) | TranslationError::Parse(_) => false,
        }
    }
}
