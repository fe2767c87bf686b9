/*!
 * Tests for application configuration
 */

use std::str::FromStr;
use anyhow::Result;
use log::LevelFilter;
use md_tools::app_config::{Config, LogLevel, TranslationBackend, DEFAULT_CONFIG_FILE};
use crate::common;

/// Test loading a configuration file from disk
#[test]
fn test_load_or_default_withExistingFile_shouldReadValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "md-tool.json",
        r#"{
            "translation": {"backend": "fake", "fake_mode": "identity", "workers": 3, "request_delay_ms": 250},
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_default(&path, true)?;

    assert_eq!(config.translation.backend, TranslationBackend::Fake);
    assert_eq!(config.translation.fake_mode, "identity");
    assert_eq!(config.translation.workers, 3);
    assert_eq!(config.translation.request_delay_ms, 250);
    assert!(config.translation.cache_enabled);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that a missing file yields defaults
#[test]
fn test_load_or_default_withMissingFile_shouldUseDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = Config::load_or_default(temp_dir.path().join(DEFAULT_CONFIG_FILE), false)?;

    assert_eq!(config.translation.backend, TranslationBackend::Google);
    assert_eq!(config.translation.timeout_secs, 10);
    Ok(())
}

/// Test that malformed JSON is reported with the file name
#[test]
fn test_load_or_default_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(&temp_dir.path().to_path_buf(), "broken.json", "{ not json")?;

    let error = Config::load_or_default(&path, true).unwrap_err();

    assert!(format!("{:#}", error).contains("broken.json"));
    Ok(())
}

/// Test validation of the translation endpoint
#[test]
fn test_validate_withInvalidEndpoint_shouldFailOnlyForGoogle() {
    let mut config = Config::default();
    config.translation.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());

    config.apply_fake_override(Some("stub"));
    assert!(config.validate().is_ok());
}

/// Test validation of the request timeout
#[test]
fn test_validate_withZeroTimeout_shouldFail() {
    let mut config = Config::default();
    config.translation.timeout_secs = 0;
    assert!(config.validate().is_err());
}

/// Test backend parsing and display
#[test]
fn test_translation_backend_fromStr_shouldRoundTripNames() {
    assert_eq!(TranslationBackend::from_str("GOOGLE").unwrap(), TranslationBackend::Google);
    assert_eq!(TranslationBackend::Fake.to_string(), "fake");
    assert!(TranslationBackend::from_str("deepl").is_err());
}

/// Test log level mapping
#[test]
fn test_log_level_toLevelFilter_shouldMatchVerbosity() {
    assert_eq!(LogLevel::Error.to_level_filter(), LevelFilter::Error);
    assert_eq!(LogLevel::default().to_level_filter(), LevelFilter::Info);
    assert_eq!(LogLevel::Trace.to_level_filter(), LevelFilter::Trace);
}
