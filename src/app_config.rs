use anyhow::{anyhow, Context, Result};
use log::{debug, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles loading and validating the md-tool settings file
/// (`md-tool.json` by default). Every field is optional in the file.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Translation backend settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    // @backend: Public Google Translate endpoint
    #[default]
    Google,
    // @backend: Offline deterministic translator
    Fake,
}

impl TranslationBackend {
    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::Fake => "fake".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "fake" => Ok(Self::Fake),
            _ => Err(anyhow!("Invalid translation backend: {}", s)),
        }
    }
}

/// Translation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Active backend
    #[serde(default)]
    pub backend: TranslationBackend,

    // @field: Label for the fake backend (stub, reverse, identity)
    #[serde(default = "default_fake_mode")]
    pub fake_mode: String,

    // @field: Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Per-request timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Concurrent paragraph requests
    #[serde(default = "default_workers")]
    pub workers: usize,

    // @field: Delay between consecutive requests
    #[serde(default)]
    pub request_delay_ms: u64,

    // @field: User-Agent header sent to the service
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // @field: Memoise repeated paragraphs within a stage
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackend::default(),
            fake_mode: default_fake_mode(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            workers: default_workers(),
            request_delay_ms: 0,
            user_agent: default_user_agent(),
            cache_enabled: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Environment variable selecting the offline fake backend
pub const FAKE_TRANSLATE_ENV: &str = "MD_TOOL_FAKE_TRANSLATE";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "md-tool.json";

fn default_fake_mode() -> String {
    "stub".to_string()
}

fn default_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_workers() -> usize {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file, falling back to defaults when it is absent.
    ///
    /// `explicit` marks a path the user asked for; a missing explicit file is
    /// reported as a warning, the implicit default file silently.
    pub fn load_or_default<P: AsRef<Path>>(path: P, explicit: bool) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            if explicit {
                warn!("Config file not found at '{}', using defaults.", path.display());
            } else {
                debug!("No config file at '{}', using defaults.", path.display());
            }
            return Ok(Config::default());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Switch to the fake backend when a non-empty mode is given
    pub fn apply_fake_override(&mut self, mode: Option<&str>) {
        if let Some(mode) = mode.map(str::trim).filter(|m| !m.is_empty()) {
            self.translation.backend = TranslationBackend::Fake;
            self.translation.fake_mode = mode.to_string();
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let translation = &self.translation;

        if translation.workers == 0 {
            return Err(anyhow!("translation.workers must be at least 1"));
        }

        if translation.timeout_secs == 0 {
            return Err(anyhow!("translation.timeout_secs must be greater than 0"));
        }

        if translation.backend == TranslationBackend::Google {
            url::Url::parse(&translation.endpoint)
                .with_context(|| format!("Invalid translation endpoint: {}", translation.endpoint))?;
        }

        Ok(())
    }
}
