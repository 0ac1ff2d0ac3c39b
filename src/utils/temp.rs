//! Temporary file management for intermediate render artifacts.
//!
//! Every render job owns one [`TempFileManager`]; its directory is removed
//! when the manager is dropped, on success, failure and cancellation alike.
//! With cleanup disabled the directory is kept for inspection.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Scoped holder for a job's intermediate files.
pub struct TempFileManager {
    /// Present while the directory is scheduled for removal on drop
    dir: Option<TempDir>,
    dir_path: PathBuf,
    files: Vec<PathBuf>,
}

impl TempFileManager {
    /// Create a manager with a fresh temporary directory.
    ///
    /// When `cleanup` is false the directory is detached from the manager's
    /// lifetime and survives for inspection.
    pub fn new(cleanup: bool) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        if cleanup {
            let dir_path = dir.path().to_path_buf();
            Ok(Self {
                dir: Some(dir),
                dir_path,
                files: Vec::new(),
            })
        } else {
            let dir_path = dir.into_path();
            log::info!(
                "Temp file cleanup disabled, artifacts kept in {}",
                dir_path.display()
            );
            Ok(Self {
                dir: None,
                dir_path,
                files: Vec::new(),
            })
        }
    }

    /// Create an empty uniquely named file inside the managed directory.
    pub fn create_temp_file(&mut self, prefix: &str, extension: &str) -> Result<PathBuf> {
        let file_name = format!("{}_{}.{}", prefix, uuid::Uuid::new_v4(), extension);
        let file_path = self.dir_path.join(file_name);

        fs::File::create(&file_path)?;
        self.files.push(file_path.clone());

        Ok(file_path)
    }

    /// Path of the managed directory.
    pub fn temp_dir_path(&self) -> &Path {
        &self.dir_path
    }

    /// Remove created files now instead of waiting for drop.
    pub fn cleanup(&mut self) -> Result<()> {
        if self.dir.is_some() {
            for file in &self.files {
                if file.exists() {
                    fs::remove_file(file)?;
                }
            }
            self.files.clear();
        }
        Ok(())
    }
}

impl Drop for TempFileManager {
    fn drop(&mut self) {
        // The TempDir field removes the directory itself
        let _ = self.cleanup();
    }
}
