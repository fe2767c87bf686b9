use anyhow::{Result, Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !Self::dir_exists(path) {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        if !Self::file_exists(path) {
            return Err(anyhow!("Input file not found: {}", path.display()));
        }
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {:?}", path))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    // @reads: One path per non-blank line
    pub fn load_file_list<P: AsRef<Path>>(list_path: P) -> Result<Vec<PathBuf>> {
        let list_path = list_path.as_ref();
        if !Self::file_exists(list_path) {
            return Err(anyhow!("File list not found: {}", list_path.display()));
        }

        let content = fs::read_to_string(list_path)
            .with_context(|| format!("Failed to read file list: {:?}", list_path))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    // @returns: The subset of paths that are not regular files
    pub fn missing_files(paths: &[PathBuf]) -> Vec<PathBuf> {
        paths
            .iter()
            .filter(|path| !Self::file_exists(path))
            .cloned()
            .collect()
    }

    // @generates: `<dir(base)>/<stem(base)>_part_<n><ext(base) or .md>`
    pub fn part_path<P: AsRef<Path>>(base: P, index: usize) -> PathBuf {
        let base = base.as_ref();
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let suffix = base
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| ".md".to_string());

        let file_name = format!("{}_part_{}{}", stem, index, suffix);
        match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
            _ => PathBuf::from(file_name),
        }
    }
}
