// ABOUTME: Output location handling with atomic writes
// ABOUTME: Archives appear complete or not at all

use crate::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct Paths {
    pub output_dir: PathBuf,
}

impl Paths {
    pub fn new(output_dir_override: Option<PathBuf>) -> Result<Self> {
        let output_dir = match output_dir_override {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        Ok(Paths { output_dir })
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Stages `content` beside `path` and renames it into place.
///
/// The staging file lives in the target's own directory, so the rename never
/// crosses filesystems.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut staged = NamedTempFile::new_in(&parent)?;
    staged.write_all(content)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| e.error)?;

    Ok(())
}
