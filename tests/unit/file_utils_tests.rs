/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use md_tools::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(&temp_dir.path().to_path_buf(), "exists.md", "content")?;

    assert!(FileManager::file_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for directories and missing files
#[test]
fn test_file_exists_withDirectoryOrMissingFile_shouldReturnFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.md")));
    assert!(FileManager::dir_exists(temp_dir.path()));

    Ok(())
}

/// Test that a regular file in the parent position is reported instead of reused
#[test]
fn test_write_to_file_withFileAsParent_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let blocker = common::create_test_file(&temp_dir.path().to_path_buf(), "blocker", "x")?;

    let result = FileManager::write_to_file(blocker.join("out.md"), "hello\n");

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("Failed to create directory"));
    Ok(())
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("a").join("b").join("out.md");

    FileManager::write_to_file(&target, "hello\n")?;

    assert_eq!(fs::read_to_string(&target)?, "hello\n");
    Ok(())
}

/// Test that read_to_string names the missing file
#[test]
fn test_read_to_string_withMissingFile_shouldNamePath() {
    let error = FileManager::read_to_string("does/not/exist.md").unwrap_err();

    assert!(error.to_string().contains("Input file not found"));
    assert!(error.to_string().contains("exist.md"));
}

/// Test that file lists skip blank lines and trim entries
#[test]
fn test_load_file_list_withBlankLines_shouldSkipThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let list = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "files.txt",
        "first.md\n\n  second.md  \n\r\nthird.md",
    )?;

    let paths = FileManager::load_file_list(&list)?;

    assert_eq!(
        paths,
        vec![PathBuf::from("first.md"), PathBuf::from("second.md"), PathBuf::from("third.md")]
    );
    Ok(())
}

/// Test that a missing file list is reported
#[test]
fn test_load_file_list_withMissingList_shouldFail() {
    let error = FileManager::load_file_list("no-such-list.txt").unwrap_err();
    assert!(error.to_string().contains("File list not found"));
}

/// Test that missing_files keeps the input order
#[test]
fn test_missing_files_shouldReturnOnlyAbsentPaths() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let present = common::create_test_file(&temp_dir.path().to_path_buf(), "present.md", "x")?;
    let absent_a = temp_dir.path().join("a.md");
    let absent_b = temp_dir.path().join("b.md");

    let missing = FileManager::missing_files(&[absent_a.clone(), present, absent_b.clone()]);

    assert_eq!(missing, vec![absent_a, absent_b]);
    Ok(())
}

/// Test the part file naming scheme
#[test]
fn test_part_path_shouldDeriveFamilyNames() {
    assert_eq!(FileManager::part_path("out/doc.md", 2), Path::new("out/doc_part_2.md"));
    assert_eq!(FileManager::part_path("notes.txt", 1), Path::new("notes_part_1.txt"));
    assert_eq!(FileManager::part_path("base", 3), Path::new("base_part_3.md"));
}
