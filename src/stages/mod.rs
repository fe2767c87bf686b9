/*!
 * Stage implementations and the closed set of stage variants.
 *
 * Every stage exposes the same shape through `StageOperation`:
 * `(current document, parsed arguments) -> (next document, written files)`.
 * Arguments are parsed with the stage's own clap schema, which is shared by
 * the standalone subcommand and the pipeline grammar.
 */

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::document::DocumentArtifact;
use crate::errors::ConfigError;

pub mod combine;
pub mod format_newlines;
pub mod registry;
pub mod split;
pub mod translate_md;

pub use combine::CombineArgs;
pub use format_newlines::FormatNewlinesArgs;
pub use registry::{InputArity, OutputNaming, StageDescriptor, StageRegistry};
pub use split::SplitArgs;
pub use translate_md::TranslateMdArgs;

/// Read-only environment handed to a stage invocation
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub config: &'a Config,
    /// Draw progress bars for long-running stages
    pub interactive: bool,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, interactive: false }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

/// Result of one stage invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    /// Document handed to the next stage
    pub document: DocumentArtifact,
    /// Files written by this invocation, in write order
    pub written: Vec<PathBuf>,
}

impl StageOutput {
    pub fn new(document: DocumentArtifact) -> Self {
        Self { document, written: Vec::new() }
    }

    pub fn with_written(mut self, written: Vec<PathBuf>) -> Self {
        self.written = written;
        self
    }
}

/// The operation every stage variant provides
pub trait StageOperation {
    /// Positional document paths given to the stage itself
    fn positional_inputs(&self) -> Vec<&Path>;

    /// Additional source listing document paths
    fn file_list(&self) -> Option<&Path> {
        None
    }

    /// Stage-level output path or output base
    fn output(&self) -> Option<&Path>;

    /// Resolve argument shorthands after parsing
    fn normalize(&mut self) {}

    /// Schema-level argument checks, independent of pipeline position
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Run the stage
    fn execute(&self, document: Option<DocumentArtifact>, context: &StageContext<'_>) -> Result<StageOutput>;
}

/// Known stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Split,
    Combine,
    FormatNewlines,
    TranslateMd,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [
        StageKind::Split,
        StageKind::Combine,
        StageKind::FormatNewlines,
        StageKind::TranslateMd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Split => "split",
            StageKind::Combine => "combine",
            StageKind::FormatNewlines => "format-newlines",
            StageKind::TranslateMd => "translate-md",
        }
    }

    /// Parse a stage token group (without the stage name) with the stage's schema
    pub fn parse_args(&self, tokens: &[String]) -> Result<StageArgs, ConfigError> {
        let argv = std::iter::once(self.name().to_string()).chain(tokens.iter().cloned());
        let parsed = match self {
            StageKind::Split => SplitArgs::try_parse_from(argv).map(StageArgs::Split),
            StageKind::Combine => CombineArgs::try_parse_from(argv).map(StageArgs::Combine),
            StageKind::FormatNewlines => FormatNewlinesArgs::try_parse_from(argv).map(StageArgs::FormatNewlines),
            StageKind::TranslateMd => TranslateMdArgs::try_parse_from(argv).map(StageArgs::TranslateMd),
        };

        parsed.map_err(|e| ConfigError::InvalidArguments {
            stage: self.name().to_string(),
            message: clap_message(&e),
        })
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// First line of a clap error, without its `error: ` prefix
fn clap_message(error: &clap::Error) -> String {
    use clap::error::ErrorKind;

    let rendered = error.to_string();
    if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        return rendered.trim_end().to_string();
    }

    rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .trim()
        .to_string()
}

/// Parsed arguments of one stage, tagged by stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageArgs {
    Split(SplitArgs),
    Combine(CombineArgs),
    FormatNewlines(FormatNewlinesArgs),
    TranslateMd(TranslateMdArgs),
}

macro_rules! dispatch {
    ($value:expr, $args:ident => $body:expr) => {
        match $value {
            StageArgs::Split($args) => $body,
            StageArgs::Combine($args) => $body,
            StageArgs::FormatNewlines($args) => $body,
            StageArgs::TranslateMd($args) => $body,
        }
    };
}

impl StageArgs {
    pub fn kind(&self) -> StageKind {
        match self {
            StageArgs::Split(_) => StageKind::Split,
            StageArgs::Combine(_) => StageKind::Combine,
            StageArgs::FormatNewlines(_) => StageKind::FormatNewlines,
            StageArgs::TranslateMd(_) => StageKind::TranslateMd,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl StageOperation for StageArgs {
    fn positional_inputs(&self) -> Vec<&Path> {
        dispatch!(self, args => args.positional_inputs())
    }

    fn file_list(&self) -> Option<&Path> {
        dispatch!(self, args => args.file_list())
    }

    fn output(&self) -> Option<&Path> {
        dispatch!(self, args => args.output())
    }

    fn normalize(&mut self) {
        dispatch!(self, args => args.normalize())
    }

    fn validate(&self) -> Result<(), String> {
        dispatch!(self, args => args.validate())
    }

    fn execute(&self, document: Option<DocumentArtifact>, context: &StageContext<'_>) -> Result<StageOutput> {
        dispatch!(self, args => args.execute(document, context))
    }
}

/// Document the stage works on: upstream if present, else its own input path
pub(crate) fn resolve_document(
    stage: &str,
    document: Option<DocumentArtifact>,
    input: Option<&Path>,
) -> Result<DocumentArtifact> {
    match (document, input) {
        (Some(document), _) => Ok(document),
        (None, Some(path)) => DocumentArtifact::load(path),
        (None, None) => Err(anyhow::anyhow!(
            "{} stage requires an input document when used without upstream pipeline data.",
            stage
        )),
    }
}
