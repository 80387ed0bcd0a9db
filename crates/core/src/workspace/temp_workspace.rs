use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    FRAME_EXTENSION, FRAME_INDEX_WIDTH, TEMP_OUTPUT_NAME, WORKSPACE_DIR_NAME,
};

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("failed to create workspace {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to list frames in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to move output to {path}: {source}")]
    Move {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to clear workspace {path}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-scoped directory of extracted frame files, keyed by target path so
/// concurrent runs on different targets do not collide.
///
/// Frame files are named by zero-padded index, so lexicographic
/// enumeration order equals temporal order. Creating a workspace clears
/// any stale one for the same target first; stale frames from an aborted
/// prior run must never leak into a new run.
#[derive(Clone, Debug)]
pub struct TempWorkspace {
    root: PathBuf,
}

impl TempWorkspace {
    pub fn new() -> Self {
        Self {
            root: std::env::temp_dir().join(WORKSPACE_DIR_NAME),
        }
    }

    /// Workspace rooted somewhere other than the system temp dir (tests,
    /// embedders with their own scratch space).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding this target's frames.
    pub fn dir(&self, target: &Path) -> PathBuf {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "target".to_string());
        let mut hasher = DefaultHasher::new();
        target.hash(&mut hasher);
        self.root.join(format!("{stem}-{:016x}", hasher.finish()))
    }

    /// Clears any stale workspace for `target`, then creates a fresh one.
    pub fn create(&self, target: &Path) -> Result<(), WorkspaceError> {
        self.clear(target)?;
        let dir = self.dir(target);
        fs::create_dir_all(&dir).map_err(|source| WorkspaceError::Create { path: dir, source })
    }

    pub fn exists(&self, target: &Path) -> bool {
        self.dir(target).is_dir()
    }

    /// Path for the frame at `index` (not necessarily existing yet).
    pub fn frame_path(&self, target: &Path, index: usize) -> PathBuf {
        self.dir(target).join(format!(
            "{index:0width$}.{FRAME_EXTENSION}",
            width = FRAME_INDEX_WIDTH
        ))
    }

    /// Extracted frame files in temporal order. An absent workspace lists
    /// as empty.
    pub fn list_frames(&self, target: &Path) -> Result<Vec<PathBuf>, WorkspaceError> {
        let dir = self.dir(target);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|source| WorkspaceError::List {
            path: dir.clone(),
            source,
        })?;
        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAME_EXTENSION))
            })
            .collect();
        frames.sort();
        Ok(frames)
    }

    /// Path of the merged (not yet audio-restored) video for `target`.
    pub fn temp_output_path(&self, target: &Path) -> PathBuf {
        self.dir(target).join(TEMP_OUTPUT_NAME)
    }

    /// Moves the merged video out of the workspace to its final location.
    /// Falls back to copy+remove when the rename crosses filesystems.
    pub fn move_output(&self, target: &Path, dest: &Path) -> Result<(), WorkspaceError> {
        let merged = self.temp_output_path(target);
        if fs::rename(&merged, dest).is_ok() {
            return Ok(());
        }
        fs::copy(&merged, dest)
            .and_then(|_| fs::remove_file(&merged))
            .map(|_| ())
            .map_err(|source| WorkspaceError::Move {
                path: dest.to_path_buf(),
                source,
            })
    }

    /// Removes the workspace for `target`. Idempotent: clearing a target
    /// with no workspace is a no-op.
    pub fn clear(&self, target: &Path) -> Result<(), WorkspaceError> {
        let dir = self.dir(target);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkspaceError::Clear { path: dir, source }),
        }
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
