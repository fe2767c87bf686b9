/*!
 * JSON pipeline payloads.
 *
 * A payload is a structured description of the same pipeline the token
 * grammar expresses. It is converted to tokens and goes through the very
 * same builder, so both forms yield equal definitions.
 *
 * ```json
 * {
 *   "input": "doc.md",
 *   "output": "final.md",
 *   "stages": [
 *     { "name": "split", "args": ["2"] },
 *     { "name": "format-newlines" }
 *   ]
 * }
 * ```
 *
 * `stages` may also be a flat token list using `=` separators. A batch is a
 * JSON array of such objects; each element is decoded on its own so one
 * malformed entry only fails its own slot.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::errors::ConfigError;

use super::builder::{PipelineBuilder, PipelineDefinition};
use super::grammar::STAGE_SEPARATOR;

/// One stage of a structured payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Stage list, either structured or as raw tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadStages {
    Structured(Vec<StageEntry>),
    Tokens(Vec<String>),
}

/// A serialisable pipeline description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelinePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub no_output: bool,
    pub stages: PayloadStages,
}

/// One decoded batch element
pub type PayloadEntry = Result<PipelinePayload, ConfigError>;

impl PipelinePayload {
    /// Decode one payload object
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidPayload(e.to_string()))
    }

    /// Equivalent token stream for the pipeline grammar
    pub fn to_tokens(&self) -> Result<Vec<String>, ConfigError> {
        let mut tokens = Vec::new();

        if let Some(input) = &self.input {
            tokens.push("-i".to_string());
            tokens.push(input.to_string_lossy().to_string());
            tokens.push(STAGE_SEPARATOR.to_string());
        }

        match &self.stages {
            PayloadStages::Tokens(stage_tokens) => tokens.extend(stage_tokens.iter().cloned()),
            PayloadStages::Structured(entries) => {
                for (position, entry) in entries.iter().enumerate() {
                    if entry.name.trim().is_empty() {
                        return Err(ConfigError::InvalidPayload(format!(
                            "stage {} has an empty name",
                            position + 1
                        )));
                    }
                    if entry.name == STAGE_SEPARATOR || entry.args.iter().any(|a| a == STAGE_SEPARATOR) {
                        return Err(ConfigError::InvalidPayload(format!(
                            "stage {} ({}) contains a bare '{}' token",
                            position + 1,
                            entry.name,
                            STAGE_SEPARATOR
                        )));
                    }

                    if position > 0 {
                        tokens.push(STAGE_SEPARATOR.to_string());
                    }
                    tokens.push(entry.name.clone());
                    tokens.extend(entry.args.iter().cloned());
                }
            }
        }

        Ok(tokens)
    }

    /// Build the definition this payload describes
    pub fn build(&self, builder: PipelineBuilder<'_>) -> Result<PipelineDefinition, ConfigError> {
        let tokens = self.to_tokens()?;
        builder
            .with_output(self.output.clone())
            .with_no_render(self.no_output)
            .build(&tokens)
    }
}

/// Parse a single payload object or an array of payloads.
///
/// Only malformed JSON or a top-level value that is neither an object nor an
/// array fails the whole call. Entries are decoded independently.
pub fn parse_payloads(json: &str) -> Result<Vec<PayloadEntry>, ConfigError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ConfigError::InvalidPayload(e.to_string()))?;

    let values = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(ConfigError::InvalidPayload(format!(
                "expected an object or an array of objects, found {}",
                json_kind(&other)
            )));
        }
    };

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            PipelinePayload::from_value(value)
                .map_err(|e| ConfigError::InvalidPayload(format!("entry {}: {}", index + 1, inner_message(e))))
        })
        .collect())
}

fn inner_message(error: ConfigError) -> String {
    match error {
        ConfigError::InvalidPayload(message) => message,
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
