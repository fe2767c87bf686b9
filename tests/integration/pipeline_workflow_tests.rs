/*!
 * End-to-end tests for pipelines built from the token grammar
 */

use std::fs;
use anyhow::Result;
use md_tools::errors::{ConfigError, ErrorKind, PipelineError};
use crate::common::{self, token, tokens};

/// Test that k separators produce k + 1 stages
#[test]
fn test_pipeline_build_withSeparators_shouldCreateOneStagePerGroup() -> Result<()> {
    let controller = common::fake_controller();

    let definition = controller.build_tokens(
        &tokens("split doc.md 2 = format-newlines = translate-md -t fr = combine -o all.md"),
        None,
        false,
    )?;

    assert_eq!(definition.len(), 4);
    assert_eq!(definition.stage_names(), vec!["split", "format-newlines", "translate-md", "combine"]);
    Ok(())
}

/// Test that a terminal stage without its required output is rejected before any write
#[test]
fn test_pipeline_run_withMissingTerminalOutput_shouldWriteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::create_test_document(&temp_dir.path().to_path_buf(), "doc.md")?;
    let controller = common::fake_controller();

    let line = format!("split {} 3 = format-newlines", token(&doc));
    let error = controller.run_tokens(&tokens(&line), None, false).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(matches!(
        error,
        PipelineError::Config(ConfigError::MissingOutput { ref stage }) if stage == "format-newlines"
    ));
    assert_eq!(common::list_files(temp_dir.path())?, vec!["doc.md"]);
    Ok(())
}

/// Test that only the terminal output is written when split has no base
#[test]
fn test_pipeline_run_splitThenFormat_shouldWriteExactlyTerminalOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::create_test_document(&temp_dir.path().to_path_buf(), "doc.md")?;
    let out = temp_dir.path().join("out.md");
    let controller = common::fake_controller();

    let line = format!("split {} 3 = format-newlines -o {}", token(&doc), token(&out));
    let report = controller.run_tokens(&tokens(&line), None, false)?;

    assert_eq!(report.written, vec![out.clone()]);
    assert_eq!(common::list_files(temp_dir.path())?, vec!["doc.md", "out.md"]);
    assert_eq!(fs::read_to_string(&out)?, "AAAA\n\nBBBB\n\nCCCC\n\nDDDD\n");
    Ok(())
}

/// Test that a positional input after the first stage is a configuration error
#[test]
fn test_pipeline_run_withPositionalInputAfterFirstStage_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::create_test_document(&temp_dir.path().to_path_buf(), "doc.md")?;
    let out = temp_dir.path().join("out.md");
    let controller = common::fake_controller();

    let line = format!("split {} 2 = format-newlines {} -o {}", token(&doc), token(&doc), token(&out));
    let error = controller.run_tokens(&tokens(&line), None, false).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert_eq!(error.stage_index(), Some(1));
    assert!(!out.exists());
    Ok(())
}

/// Test abort semantics: stage 2 of 3 fails, stage 3 never runs, stage 1 files remain
#[test]
fn test_pipeline_run_withFailingMiddleStage_shouldKeepEarlierFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let doc = common::create_test_document(&dir, "doc.md")?;
    let base = dir.join("parts").join("doc.md");
    let missing_list = dir.join("missing.txt");
    let out = dir.join("out.md");
    let controller = common::fake_controller();

    let line = format!(
        "-i {} = split 2 -o {} = combine -l {} = format-newlines -o {}",
        token(&doc),
        token(&base),
        token(&missing_list),
        token(&out)
    );
    let error = controller.run_tokens(&tokens(&line), None, false).unwrap_err();

    match error {
        PipelineError::Stage(stage_error) => {
            assert_eq!(stage_error.index(), 1);
            assert_eq!(stage_error.number(), 2);
            assert_eq!(stage_error.stage(), "combine");
            assert!(stage_error.message().contains("File list not found"));
            assert!(stage_error.to_string().starts_with("Stage 2 (combine) failed"));
        }
        other => panic!("expected a stage execution error, got {:?}", other),
    }

    assert_eq!(fs::read_to_string(dir.join("parts").join("doc_part_1.md"))?, "AAAA\n\nBBBB\n");
    assert_eq!(fs::read_to_string(dir.join("parts").join("doc_part_2.md"))?, "CCCC\n\nDDDD\n");
    assert!(!out.exists());
    Ok(())
}

/// Test that combine appends file list entries after the upstream document
#[test]
fn test_pipeline_run_combineWithFileList_shouldAppendAfterUpstream() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let first = common::create_test_file(&dir, "a.md", "Alpha\n")?;
    let second = common::create_test_file(&dir, "b.md", "Bravo\n\n")?;
    let list = common::create_test_file(&dir, "list.txt", &format!("{}\n", token(&second)))?;
    let out = dir.join("all.md");
    let controller = common::fake_controller();

    let line = format!("-i {} = combine -l {} -o {}", token(&first), token(&list), token(&out));
    let report = controller.run_tokens(&tokens(&line), None, false)?;

    assert_eq!(report.text(), Some("Alpha\nBravo\n"));
    assert_eq!(fs::read_to_string(&out)?, "Alpha\nBravo\n");
    Ok(())
}

/// Test a formatting and translation chain with the fake backend
#[test]
fn test_pipeline_run_formatThenTranslate_shouldProduceBilingualOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::create_test_file(&temp_dir.path().to_path_buf(), "doc.md", "Hello\nWorld\n")?;
    let out = temp_dir.path().join("doc.fr.md");
    let controller = common::fake_controller();

    let line = format!("-i {} = format-newlines = translate-md -s en -t fr -o {}", token(&doc), token(&out));
    let report = controller.run_tokens(&tokens(&line), None, false)?;

    let expected = "Hello\n\n[en->fr|stub] HELLO\n\nWorld\n\n[en->fr|stub] WORLD\n";
    assert_eq!(fs::read_to_string(&out)?, expected);
    assert_eq!(report.stages.len(), 2);
    assert!(report.stages[0].written.is_empty());
    Ok(())
}

/// Test that translate-md accepts pacing, retry and debug options inside a pipeline
#[test]
fn test_pipeline_run_translateWithDebugOutput_shouldWriteRecordsAndDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let doc = common::create_test_file(&dir, "doc.md", "Hello\n\nWorld\n")?;
    let out = dir.join("t.md");
    let debug = dir.join("d.json");
    let controller = common::fake_controller();

    let line = format!(
        "-i {} = translate-md -t fr --workers 1 --delay-min 0 --delay-max 0 --bulk-delay-every 0 --retry-count 0 --debug-output {} -o {}",
        token(&doc),
        token(&debug),
        token(&out)
    );
    let report = controller.run_tokens(&tokens(&line), None, false)?;

    assert_eq!(report.written, vec![debug.clone(), out.clone()]);
    assert!(fs::read_to_string(&out)?.contains("[auto->fr|stub] HELLO"));

    let records: serde_json::Value = serde_json::from_str(&fs::read_to_string(&debug)?)?;
    let paragraphs = records["paragraphs"].as_array().expect("paragraphs array");
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[0]["original"], "Hello");
    assert_eq!(paragraphs[1]["translation"], "[auto->fr|stub] WORLD");
    assert_eq!(records["target"], token(&out));
    Ok(())
}

/// Test that a pipeline-level output satisfies the terminal output rule
#[test]
fn test_pipeline_run_withPipelineOutput_shouldWriteFinalDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let doc = common::create_test_file(&temp_dir.path().to_path_buf(), "doc.md", "A\nB\n")?;
    let out = temp_dir.path().join("final.md");
    let controller = common::fake_controller();

    let line = format!("format-newlines {}", token(&doc));
    let report = controller.run_tokens(&tokens(&line), Some(out.clone()), true)?;

    assert_eq!(report.written, vec![out.clone()]);
    assert_eq!(fs::read_to_string(&out)?, "A\n\nB\n");
    Ok(())
}

/// Test that a missing global input fails on the first stage
#[test]
fn test_pipeline_run_withMissingGlobalInput_shouldFailOnStageOne() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("missing.md");
    let out = temp_dir.path().join("out.md");
    let controller = common::fake_controller();

    let line = format!("-i {} = format-newlines -o {}", token(&missing), token(&out));
    let error = controller.run_tokens(&tokens(&line), None, false).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::StageExecution);
    assert_eq!(error.stage_index(), Some(0));
    assert!(!out.exists());
    Ok(())
}
