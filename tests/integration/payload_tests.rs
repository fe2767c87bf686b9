/*!
 * Tests for the JSON payload front end and payload batches
 */

use std::fs;
use anyhow::Result;
use serde_json::json;
use md_tools::errors::{ConfigError, ErrorKind};
use md_tools::pipeline::{parse_payloads, PipelinePayload};
use crate::common::{self, token, tokens};

fn payload_from(value: serde_json::Value) -> PipelinePayload {
    serde_json::from_value(value).unwrap()
}

/// Test that a structured payload and the token grammar yield the same definition and output
#[test]
fn test_payload_andTokens_shouldProduceIdenticalResults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::create_test_file(&temp_dir.path().to_path_buf(), "doc.md", "One\nTwo\n")?;
    let from_payload = temp_dir.path().join("payload.md");
    let from_tokens = temp_dir.path().join("tokens.md");
    let controller = common::fake_controller();

    let payload = payload_from(json!({
        "input": token(&doc),
        "stages": [
            {"name": "format-newlines"},
            {"name": "translate-md", "args": ["-t", "es", "-o", token(&from_payload)]}
        ]
    }));
    let line = format!("-i {} = format-newlines = translate-md -t es -o {}", token(&doc), token(&from_payload));

    let payload_definition = payload.build(md_tools::PipelineBuilder::new(controller.registry()))?;
    let token_definition = controller.build_tokens(&tokens(&line), None, false)?;
    assert_eq!(payload_definition, token_definition);

    controller.run_payload(&payload)?;
    let line = format!("-i {} = format-newlines = translate-md -t es -o {}", token(&doc), token(&from_tokens));
    controller.run_tokens(&tokens(&line), None, false)?;

    assert_eq!(fs::read_to_string(&from_payload)?, fs::read_to_string(&from_tokens)?);
    Ok(())
}

/// Test that payload validation errors are configuration errors
#[test]
fn test_payload_withUnknownStage_shouldBeConfigurationError() {
    let controller = common::fake_controller();
    let payload = payload_from(json!({"stages": [{"name": "frobnicate", "args": ["x"]}]}));

    let error = controller.run_payload(&payload).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(error.to_string().contains("frobnicate"));
}

/// Test that a payload output acts as the pipeline-level output
#[test]
fn test_payload_withOutput_shouldWriteFinalDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::create_test_file(&temp_dir.path().to_path_buf(), "doc.md", "A\nB")?;
    let out = temp_dir.path().join("out.md");
    let controller = common::fake_controller();

    let payload = payload_from(json!({
        "output": token(&out),
        "no_output": true,
        "stages": ["format-newlines", token(&doc)]
    }));
    let report = controller.run_payload(&payload)?;

    assert_eq!(report.written, vec![out.clone()]);
    assert_eq!(fs::read_to_string(&out)?, "A\n\nB");
    Ok(())
}

/// Test batch execution continuing past failures
#[test]
fn test_run_payloads_withoutStopOnError_shouldAttemptEveryDefinition() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let doc = common::create_test_file(&dir, "doc.md", "A\nB\n")?;
    let first_out = dir.join("first.md");
    let third_out = dir.join("third.md");
    let controller = common::fake_controller();

    let json = json!([
        {"stages": ["format-newlines", token(&doc), "-o", token(&first_out)]},
        {"stages": ["format-newlines", token(&dir.join("missing.md")), "-o", token(&dir.join("second.md"))]},
        {"stages": ["format-newlines", token(&doc), "-o", token(&third_out)]}
    ])
    .to_string();
    let payloads = parse_payloads(&json)?;

    let outcomes = controller.run_payloads(&payloads, false);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[2].is_success());
    assert_eq!(outcomes[1].index, 1);
    assert!(first_out.exists());
    assert!(third_out.exists());
    Ok(())
}

/// Test batch execution stopping at the first failure
#[test]
fn test_run_payloads_withStopOnError_shouldSkipRemainingDefinitions() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let doc = common::create_test_file(&dir, "doc.md", "A\nB\n")?;
    let third_out = dir.join("third.md");
    let controller = common::fake_controller();

    let payloads = vec![
        Ok(payload_from(json!({"stages": ["format-newlines", token(&doc), "-o", token(&dir.join("first.md"))]}))),
        Ok(payload_from(json!({"stages": ["split", token(&doc), "0", "-o", token(&dir.join("base.md"))]}))),
        Ok(payload_from(json!({"stages": ["format-newlines", token(&doc), "-o", token(&third_out)]}))),
    ];

    let outcomes = controller.run_payloads(&payloads, true);

    assert_eq!(outcomes.len(), 2);
    match &outcomes[1].result {
        Err(error) => assert_eq!(error.kind(), ErrorKind::Configuration),
        Ok(_) => panic!("split with zero parts should fail"),
    }
    assert!(!third_out.exists());
    Ok(())
}

/// Test that a malformed batch entry fails only its own slot
#[test]
fn test_run_payloads_withMalformedEntry_shouldRunValidEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let doc = common::create_test_file(&dir, "a.md", "A\n")?;
    let first_out = dir.join("c1.md");
    let third_out = dir.join("c3.md");
    let controller = common::fake_controller();

    let json = json!([
        {"stages": ["combine", token(&doc), "-o", token(&first_out)]},
        {"stages": 3},
        {"stages": ["combine", token(&doc), "-o", token(&third_out)]}
    ])
    .to_string();
    let payloads = parse_payloads(&json)?;

    let outcomes = controller.run_payloads(&payloads, false);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(outcomes[2].is_success());
    match &outcomes[1].result {
        Err(error) => {
            assert_eq!(error.kind(), ErrorKind::Configuration);
            assert!(error.to_string().contains("entry 2"));
        }
        Ok(_) => panic!("an entry with numeric stages should fail"),
    }
    assert_eq!(fs::read_to_string(&first_out)?, "A\n");
    assert!(third_out.exists());
    Ok(())
}

/// Test that a malformed entry stops the batch when asked to
#[test]
fn test_run_payloads_withMalformedEntryAndStopOnError_shouldStopThere() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let doc = common::create_test_file(&dir, "a.md", "A\n")?;
    let third_out = dir.join("c3.md");
    let controller = common::fake_controller();

    let json = json!([
        {"stages": ["combine", token(&doc), "-o", token(&dir.join("c1.md"))]},
        {"input": 7, "stages": ["combine"]},
        {"stages": ["combine", token(&doc), "-o", token(&third_out)]}
    ])
    .to_string();

    let outcomes = controller.run_payloads(&parse_payloads(&json)?, true);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[1].index, 1);
    assert!(!outcomes[1].is_success());
    assert!(!third_out.exists());
    Ok(())
}

/// Test that a bare separator inside structured args is refused
#[test]
fn test_payload_withSeparatorArgument_shouldBeInvalid() {
    let payload = payload_from(json!({"stages": [{"name": "combine", "args": ["a.md", "="]}]}));

    assert!(matches!(payload.to_tokens(), Err(ConfigError::InvalidPayload(_))));
}
