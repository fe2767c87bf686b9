/*!
 * Builds validated, immutable pipeline definitions.
 *
 * Both front ends end up here: the token grammar goes through `build`, a
 * typed standalone invocation through `build_standalone`. No I/O happens
 * while building.
 */

use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::stages::{OutputNaming, StageArgs, StageDescriptor, StageOperation, StageRegistry};

use super::grammar::{split_tokens, SplitTokens};
use super::validation::{validate_stages, PipelineContext};

/// One resolved stage of a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    index: usize,
    name: &'static str,
    tokens: Vec<String>,
    args: StageArgs,
    output: Option<PathBuf>,
    naming: OutputNaming,
}

impl PipelineStage {
    /// 0-based position
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw token group, stage name first
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn args(&self) -> &StageArgs {
        &self.args
    }

    /// Stage-level output path (or base, for a family)
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn naming(&self) -> OutputNaming {
        self.naming
    }

    /// Human-readable form of the stage invocation
    pub fn label(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Ordered, validated plan of stages. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDefinition {
    stages: Vec<PipelineStage>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    no_render: bool,
}

impl PipelineDefinition {
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Legacy suppress-render flag. Accepted and carried, never acted on.
    pub fn no_render(&self) -> bool {
        self.no_render
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }
}

/// Turns tokens or typed stage arguments into a `PipelineDefinition`
#[derive(Debug, Clone)]
pub struct PipelineBuilder<'r> {
    registry: &'r StageRegistry,
    output: Option<PathBuf>,
    no_render: bool,
}

impl<'r> PipelineBuilder<'r> {
    pub fn new(registry: &'r StageRegistry) -> Self {
        Self {
            registry,
            output: None,
            no_render: false,
        }
    }

    /// Pipeline-level output written after the last stage
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_no_render(mut self, no_render: bool) -> Self {
        self.no_render = no_render;
        self
    }

    /// Build from the token grammar
    pub fn build<S: AsRef<str>>(&self, tokens: &[S]) -> Result<PipelineDefinition, ConfigError> {
        let SplitTokens { input, groups } = split_tokens(tokens)?;

        let mut errors = Vec::new();
        let mut parsed = Vec::with_capacity(groups.len());

        for group in groups {
            match self.parse_group(&group) {
                Ok((descriptor, args)) => parsed.push((descriptor, group, args)),
                Err(error) => errors.push(error),
            }
        }

        if let Some(error) = ConfigError::from_all(errors) {
            return Err(error);
        }

        self.assemble(parsed, input)
    }

    /// Build a one-stage definition from already-parsed arguments, as the
    /// standalone subcommands do
    pub fn build_standalone(&self, mut args: StageArgs) -> Result<PipelineDefinition, ConfigError> {
        let descriptor = self.registry.lookup(args.name())?;
        args.normalize();
        check_schema(descriptor, &args)?;

        let tokens = vec![descriptor.name.to_string()];
        self.assemble(vec![(descriptor, tokens, args)], None)
    }

    fn parse_group(&self, group: &[String]) -> Result<(&'r StageDescriptor, StageArgs), ConfigError> {
        let (name, stage_tokens) = group.split_first().ok_or(ConfigError::EmptyPipeline)?;
        let descriptor = self.registry.lookup(name)?;

        let mut args = descriptor.parse(stage_tokens)?;
        args.normalize();
        check_schema(descriptor, &args)?;

        Ok((descriptor, args))
    }

    fn assemble(
        &self,
        parsed: Vec<(&'r StageDescriptor, Vec<String>, StageArgs)>,
        input: Option<PathBuf>,
    ) -> Result<PipelineDefinition, ConfigError> {
        let context = PipelineContext {
            has_global_input: input.is_some(),
            has_global_output: self.output.is_some(),
        };
        let checks: Vec<(&StageDescriptor, &StageArgs)> =
            parsed.iter().map(|(descriptor, _, args)| (*descriptor, args)).collect();
        validate_stages(&checks, context)?;

        let stages = parsed
            .into_iter()
            .enumerate()
            .map(|(index, (descriptor, tokens, args))| PipelineStage {
                index,
                name: descriptor.name,
                output: args.output().map(Path::to_path_buf),
                naming: descriptor.output_naming,
                tokens,
                args,
            })
            .collect();

        Ok(PipelineDefinition {
            stages,
            input,
            output: self.output.clone(),
            no_render: self.no_render,
        })
    }
}

fn check_schema(descriptor: &StageDescriptor, args: &StageArgs) -> Result<(), ConfigError> {
    args.validate().map_err(|message| ConfigError::InvalidArguments {
        stage: descriptor.name.to_string(),
        message,
    })
}
