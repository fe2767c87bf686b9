/*!
 * Token splitter for the pipeline grammar:
 *
 * ```text
 * [-i PATH =] <stage> <stage tokens...> [= <stage> <stage tokens...>]...
 * ```
 *
 * A token equal to `=` is always a stage boundary, never stage data.
 */

use std::path::PathBuf;

use crate::errors::ConfigError;

/// Literal token separating stage groups
pub const STAGE_SEPARATOR: &str = "=";

/// Result of splitting a token stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitTokens {
    /// Path given by the leading `-i` / `--input` directive
    pub input: Option<PathBuf>,
    /// One token group per stage; each starts with the stage name
    pub groups: Vec<Vec<String>>,
}

/// Directive forms recognised in front of the first stage
fn input_directive(token: &str) -> Option<(&str, Option<&str>)> {
    match token {
        "-i" | "--input" => Some((token, None)),
        _ => token.strip_prefix("--input=").map(|value| ("--input", Some(value))),
    }
}

fn is_separator(token: &str) -> bool {
    token == STAGE_SEPARATOR
}

/// Split a flat token stream into the global input and per-stage groups
pub fn split_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<SplitTokens, ConfigError> {
    let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
    if tokens.is_empty() {
        return Err(ConfigError::EmptyPipeline);
    }

    let mut input = None;
    let mut rest: &[&str] = &tokens;

    if let Some((directive, inline_value)) = input_directive(tokens[0]) {
        let (value, consumed) = match inline_value {
            Some(value) => (Some(value), 1),
            None => (tokens.get(1).copied(), 2),
        };

        let value = value
            .filter(|v| !v.is_empty() && !is_separator(v))
            .ok_or_else(|| ConfigError::MissingInputValue { directive: directive.to_string() })?;
        input = Some(PathBuf::from(value));
        rest = &tokens[consumed..];

        match rest.first() {
            Some(token) if is_separator(token) => rest = &rest[1..],
            _ => return Err(ConfigError::MissingSeparatorAfterInput),
        }
        if rest.is_empty() {
            return Err(ConfigError::TrailingSeparator);
        }
    }

    let mut groups: Vec<Vec<String>> = vec![Vec::new()];
    for token in rest {
        if is_separator(token) {
            groups.push(Vec::new());
        } else if let Some(current) = groups.last_mut() {
            current.push(token.to_string());
        }
    }

    let last = groups.len() - 1;
    for (index, group) in groups.iter().enumerate() {
        if group.is_empty() {
            return Err(if index == last && index > 0 {
                ConfigError::TrailingSeparator
            } else {
                ConfigError::EmptyStage { position: index + 1 }
            });
        }

        if let Some(directive) = group.iter().find_map(|t| input_directive(t).map(|(d, _)| d)) {
            return Err(ConfigError::MisplacedInput {
                directive: directive.to_string(),
                position: index + 1,
            });
        }
    }

    Ok(SplitTokens { input, groups })
}
