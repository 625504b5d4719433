//! Shared command context passed into command families.

use crate::runtime::artifacts::ArtifactManager;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::runtime::workflow::WorkflowRecorder;
use crate::runtime::workspace::WorkspaceState;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that points the automation at a different collection checkout.
pub const CATALOG_ROOT_ENV: &str = "CATALOG_ROOT";

/// Shared execution context for xtask command families.
#[derive(Clone, Debug)]
pub struct CommandContext {
    root: PathBuf,
    artifacts: ArtifactManager,
    workspace: WorkspaceState,
    workflow: WorkflowRecorder,
}

impl CommandContext {
    /// Create a context rooted at `CATALOG_ROOT` or, when unset, the workspace containing xtask.
    pub fn new() -> XtaskResult<Self> {
        let root = resolve_root(env::var(CATALOG_ROOT_ENV).ok().as_deref())?;
        Ok(Self::with_root(root))
    }

    /// Create a context rooted at an explicit directory.
    pub fn with_root(root: PathBuf) -> Self {
        let artifacts = ArtifactManager::new(root.clone());
        let workspace = WorkspaceState::new(root.clone());
        let workflow = WorkflowRecorder::new(artifacts.clone());
        Self {
            root,
            artifacts,
            workspace,
            workflow,
        }
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Shared artifact manager.
    pub fn artifacts(&self) -> &ArtifactManager {
        &self.artifacts
    }

    /// Shared git inspector.
    pub fn workspace(&self) -> &WorkspaceState {
        &self.workspace
    }

    /// Shared workflow recorder.
    pub fn workflow(&self) -> &WorkflowRecorder {
        &self.workflow
    }
}

fn resolve_root(override_root: Option<&str>) -> XtaskResult<PathBuf> {
    if let Some(raw) = override_root {
        if raw.trim().is_empty() {
            return Err(XtaskError::environment(format!(
                "{CATALOG_ROOT_ENV} is set but empty; expected a directory path"
            )));
        }
        let candidate = PathBuf::from(raw);
        let root = if candidate.is_absolute() {
            candidate
        } else {
            env::current_dir()?.join(candidate)
        };
        if !root.is_dir() {
            return Err(XtaskError::environment(format!(
                "{CATALOG_ROOT_ENV} does not point at a directory"
            ))
            .with_path(&root));
        }
        return Ok(root);
    }

    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| XtaskError::environment("xtask lives under workspace root"))
}
