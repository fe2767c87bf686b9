/*!
 * Capability validation: every rule is checked for every stage before
 * anything runs, and all violations are reported together.
 */

use crate::errors::ConfigError;
use crate::stages::{InputArity, StageArgs, StageDescriptor, StageOperation};

/// Pipeline-level facts the rules depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineContext {
    pub has_global_input: bool,
    pub has_global_output: bool,
}

/// Check input arity and output requirements of every stage in context
pub fn validate_stages(
    stages: &[(&StageDescriptor, &StageArgs)],
    context: PipelineContext,
) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    let last = stages.len().saturating_sub(1);

    for (index, (descriptor, args)) in stages.iter().enumerate() {
        let positional = args.positional_inputs();
        let leading = index == 0 && !context.has_global_input;

        if leading {
            let satisfied = match descriptor.arity {
                InputArity::Zero => false,
                InputArity::One => !positional.is_empty(),
                InputArity::Many => !positional.is_empty() || args.file_list().is_some(),
            };
            if !satisfied {
                errors.push(ConfigError::NothingToTransform {
                    stage: descriptor.name.to_string(),
                });
            }
        } else if descriptor.accepts_inputs() && !positional.is_empty() {
            errors.push(ConfigError::PositionalInputNotAllowed {
                stage: descriptor.name.to_string(),
                index,
            });
        }

        if index == last
            && descriptor.output_mandatory_when_terminal
            && !context.has_global_output
            && args.output().is_none()
        {
            errors.push(ConfigError::MissingOutput {
                stage: descriptor.name.to_string(),
            });
        }
    }

    match ConfigError::from_all(errors) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
