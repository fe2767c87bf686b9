/*!
 * Immutable table of stage descriptors.
 *
 * Built once at startup with `StageRegistry::builtin()` and passed by
 * reference to the builder. Nothing mutates it afterwards.
 */

use std::collections::BTreeMap;

use crate::errors::ConfigError;

use super::{StageArgs, StageKind};

/// How many documents a stage takes on its own when standalone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputArity {
    /// Consumes only the upstream document
    Zero,
    /// Exactly one document path
    One,
    /// A list of paths or a file list
    Many,
}

/// What a stage writes when given an output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputNaming {
    /// One file at the given path
    Single,
    /// `<base>_part_<n>` files derived from the given base
    Family,
}

/// Static description of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub kind: StageKind,
    pub name: &'static str,
    pub summary: &'static str,
    pub arity: InputArity,
    pub output_naming: OutputNaming,
    /// A terminal occurrence must name its own output unless the pipeline has one
    pub output_mandatory_when_terminal: bool,
}

impl StageDescriptor {
    /// Parse a token group with this stage's argument schema
    pub fn parse(&self, tokens: &[String]) -> Result<StageArgs, ConfigError> {
        self.kind.parse_args(tokens)
    }

    pub fn accepts_inputs(&self) -> bool {
        matches!(self.arity, InputArity::One | InputArity::Many)
    }
}

/// Lookup table from stage name to descriptor
#[derive(Debug, Clone)]
pub struct StageRegistry {
    descriptors: BTreeMap<&'static str, StageDescriptor>,
}

impl StageRegistry {
    pub fn new(descriptors: impl IntoIterator<Item = StageDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into_iter().map(|d| (d.name, d)).collect(),
        }
    }

    /// Registry holding every stage shipped with md-tool
    pub fn builtin() -> Self {
        Self::new(StageKind::ALL.iter().map(|kind| builtin_descriptor(*kind)))
    }

    pub fn get(&self, name: &str) -> Option<&StageDescriptor> {
        self.descriptors.get(name)
    }

    /// Descriptor for `name`, or a configuration error naming it
    pub fn lookup(&self, name: &str) -> Result<&StageDescriptor, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownStage(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.descriptors.values()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.keys().copied().collect()
    }

    /// One aligned line per stage: name, summary and the terminal-output rule
    pub fn listing(&self) -> String {
        let width = self.descriptors.keys().map(|name| name.len()).max().unwrap_or(0);
        self.iter()
            .map(|descriptor| {
                let rule = if descriptor.output_mandatory_when_terminal {
                    " (needs -o when final)"
                } else {
                    ""
                };
                format!("{:width$}  {}{}", descriptor.name, descriptor.summary, rule, width = width)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn builtin_descriptor(kind: StageKind) -> StageDescriptor {
    let (summary, arity, output_naming, output_mandatory_when_terminal) = match kind {
        StageKind::Split => (
            "Split a Markdown file into balanced parts by paragraph",
            InputArity::One,
            OutputNaming::Family,
            true,
        ),
        StageKind::Combine => (
            "Concatenate Markdown files with a single newline between them",
            InputArity::Many,
            OutputNaming::Single,
            false,
        ),
        StageKind::FormatNewlines => (
            "Expand single newlines between paragraphs into blank lines",
            InputArity::One,
            OutputNaming::Single,
            true,
        ),
        StageKind::TranslateMd => (
            "Translate a Markdown file paragraph by paragraph",
            InputArity::One,
            OutputNaming::Single,
            false,
        ),
    };

    StageDescriptor {
        kind,
        name: kind.name(),
        summary,
        arity,
        output_naming,
        output_mandatory_when_terminal,
    }
}
