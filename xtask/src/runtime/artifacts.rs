//! Artifact path management for catalog workflows.

use crate::runtime::error::{XtaskError, XtaskResult};
use std::fs;
use std::path::{Path, PathBuf};

const AUTOMATION_RUNS_DIR: &str = ".artifacts/automation/runs";
const VALIDATION_REPORT: &str = ".artifacts/catalog/validation.json";

/// Central artifact path policy.
///
/// Commands use this instead of hard-coding joins from `ctx.root()`.
#[derive(Clone, Debug)]
pub struct ArtifactManager {
    root: PathBuf,
}

impl ArtifactManager {
    /// Create an artifact manager rooted at the workspace.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a workspace-relative artifact path.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Resolve a possibly-relative workspace path.
    ///
    /// Absolute paths are preserved, while relative paths are anchored to the workspace root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Return the standard automation run root used by [`WorkflowRecorder`](crate::runtime::workflow::WorkflowRecorder).
    pub fn automation_runs_dir(&self) -> PathBuf {
        self.path(AUTOMATION_RUNS_DIR)
    }

    /// Default location of the JSON validation report.
    pub fn validation_report(&self) -> PathBuf {
        self.path(VALIDATION_REPORT)
    }

    /// Ensure a directory exists.
    pub fn ensure_dir(&self, path: &Path) -> XtaskResult<()> {
        fs::create_dir_all(path)
            .map_err(|err| XtaskError::io(format!("failed to create {}: {err}", path.display())))
    }

    /// Write `body` to `path`, creating parent directories first.
    pub fn write_text(&self, path: &Path, body: &str) -> XtaskResult<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }
        fs::write(path, body).map_err(|err| {
            XtaskError::io(format!("failed to write {}: {err}", path.display())).with_path(path)
        })
    }
}
