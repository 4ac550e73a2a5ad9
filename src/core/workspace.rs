use crate::utils::error::{RelayError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The downloads directory shared by both phases.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Leaves `root` existing and empty.
    pub fn prepare(&self) -> Result<()> {
        if self.root.exists() {
            if !self.root.is_dir() {
                return Err(RelayError::WorkspaceError {
                    path: self.root.clone(),
                    message: "path exists and is not a directory".to_string(),
                });
            }
            tracing::info!("🧹 Cleaning {} folder...", self.root.display());
            clear_directory(&self.root)?;
            tracing::info!("✅ {} folder cleaned.", self.root.display());
        } else {
            fs::create_dir_all(&self.root)?;
            tracing::info!("✅ Created {} folder.", self.root.display());
        }
        Ok(())
    }
}

/// Removes every entry under `dir`. Symlinks are unlinked, never followed.
pub fn clear_directory(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        tracing::debug!("Removed {}", path.display());
    }
    Ok(())
}

/// Per-item scratch directory, removed when dropped.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    removed: bool,
}

impl ScratchDir {
    /// Creates `path` empty, discarding leftovers from an interrupted item.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(mut self) -> Result<()> {
        self.removed = true;
        if self.path.exists() {
            fs::remove_dir_all(&self.path)?;
        }
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.removed || !self.path.exists() {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            tracing::warn!(
                "⚠️ Could not clean up temporary directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
