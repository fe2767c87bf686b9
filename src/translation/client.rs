/*!
 * Translation backends.
 *
 * A backend turns one block of text into another language. Two are
 * available:
 * - `GoogleTranslator`: the public `translate_a/single` endpoint
 * - `FakeTranslator`: a deterministic offline stand-in used for dry runs
 *   and tests
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::app_config::{TranslationBackend, TranslationConfig};
use crate::errors::TranslationError;

/// A single block of text to translate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

impl TranslationRequest {
    /// Build a request, trimming the text and lowercasing language codes
    pub fn new(text: &str, source_language: &str, target_language: &str) -> Result<Self, TranslationError> {
        let text = text.trim();
        let source_language = source_language.trim().to_lowercase();
        let target_language = target_language.trim().to_lowercase();

        if text.is_empty() {
            return Err(TranslationError::InvalidRequest("Translation text must not be empty.".to_string()));
        }
        if target_language.is_empty() {
            return Err(TranslationError::InvalidRequest("Target language must not be empty.".to_string()));
        }
        if source_language.is_empty() {
            return Err(TranslationError::InvalidRequest("Source language must not be empty.".to_string()));
        }

        Ok(Self {
            text: text.to_string(),
            source_language,
            target_language,
        })
    }
}

/// Common trait for translation backends
#[async_trait]
pub trait TextTranslator: Send + Sync + Debug {
    /// Translate one request
    async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslationError>;

    /// Backend name used in logs
    fn name(&self) -> String;
}

/// Client for the public Google Translate endpoint
#[derive(Debug)]
pub struct GoogleTranslator {
    /// HTTP client for making requests
    client: Client,
    /// Endpoint URL
    endpoint: String,
}

impl GoogleTranslator {
    /// Create a new client
    pub fn new(endpoint: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self, TranslationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TranslationError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn request_url(&self, request: &TranslationRequest) -> Result<Url, TranslationError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("client", "gtx"),
                ("sl", request.source_language.as_str()),
                ("tl", request.target_language.as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ],
        )
        .map_err(|e| TranslationError::InvalidRequest(format!("Invalid endpoint '{}': {}", self.endpoint, e)))
    }

    /// Concatenate the translated segments of a `translate_a/single` response.
    ///
    /// The body is a nested array whose first element lists
    /// `[translated, original, ...]` segments.
    pub fn parse_response(body: &str) -> Result<String, TranslationError> {
        let data: Value = serde_json::from_str(body)
            .map_err(|e| TranslationError::Parse(e.to_string()))?;

        let segments = data
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| TranslationError::Parse("Unexpected response format from Google Translate.".to_string()))?;

        let translation: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        if translation.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(translation)
    }
}

#[async_trait]
impl TextTranslator for GoogleTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslationError> {
        let url = self.request_url(request)?;

        let response = self.client.get(url)
            .send()
            .await
            .map_err(|e| TranslationError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!("Google Translate returned HTTP {}", status.as_u16());
            return Err(TranslationError::Http(status.as_u16()));
        }

        let body = response.text().await
            .map_err(|e| TranslationError::Connection(e.to_string()))?;

        Self::parse_response(&body)
    }

    fn name(&self) -> String {
        "google".to_string()
    }
}

/// Offline translator producing `[src->tgt|label] payload`
#[derive(Debug, Clone)]
pub struct FakeTranslator {
    label: String,
}

impl FakeTranslator {
    /// `reverse` and `identity` select their transformations; any other label uppercases
    pub fn new(label: &str) -> Self {
        let label = label.trim();
        Self {
            label: if label.is_empty() { "stub".to_string() } else { label.to_string() },
        }
    }

    pub fn render(&self, request: &TranslationRequest) -> String {
        let payload = match self.label.to_lowercase().as_str() {
            "reverse" => request.text.chars().rev().collect(),
            "identity" => request.text.clone(),
            _ => request.text.to_uppercase(),
        };
        format!(
            "[{}->{}|{}] {}",
            request.source_language, request.target_language, self.label, payload
        )
    }
}

#[async_trait]
impl TextTranslator for FakeTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslationError> {
        Ok(self.render(request))
    }

    fn name(&self) -> String {
        format!("fake ({})", self.label)
    }
}

/// Build the backend selected by the configuration
pub fn translator_from_config(
    config: &TranslationConfig,
    timeout: Duration,
) -> Result<Arc<dyn TextTranslator>, TranslationError> {
    let translator: Arc<dyn TextTranslator> = match config.backend {
        TranslationBackend::Google => Arc::new(GoogleTranslator::new(
            config.endpoint.clone(),
            timeout,
            &config.user_agent,
        )?),
        TranslationBackend::Fake => Arc::new(FakeTranslator::new(&config.fake_mode)),
    };
    debug!("Using translation backend: {}", translator.name());
    Ok(translator)
}
