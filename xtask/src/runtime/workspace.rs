//! Git change detection for the workspace.

use crate::runtime::error::{XtaskError, XtaskResult};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Workspace-scoped git inspection.
#[derive(Clone, Debug)]
pub struct WorkspaceState {
    root: PathBuf,
}

impl WorkspaceState {
    /// Create an inspector rooted at the given workspace path.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Changed paths from `git status --porcelain`, relative to the workspace root.
    ///
    /// Untracked directories are expanded to their files. Paths outside the workspace root are
    /// dropped.
    pub fn changed_paths(&self) -> XtaskResult<Vec<String>> {
        let stdout = self.git_stdout(&["status", "--porcelain", "--untracked-files=all"])?;
        self.relative_to_root(stdout.lines().filter_map(parse_porcelain_status_path))
    }

    /// Paths touched between the merge base of `base` and `HEAD`, relative to the workspace root.
    pub fn diff_paths(&self, base: &str) -> XtaskResult<Vec<String>> {
        if base.trim().is_empty() || base.starts_with('-') {
            return Err(XtaskError::validation(format!(
                "invalid git base ref `{base}`"
            )));
        }
        let range = format!("{base}...HEAD");
        let stdout = self.git_stdout(&["diff", "--name-only", &range])?;
        self.relative_to_root(
            stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(unquote_git_path),
        )
    }

    /// Git reports paths from the repository top level; the workspace may be a subdirectory.
    fn relative_to_root(&self, paths: impl Iterator<Item = String>) -> XtaskResult<Vec<String>> {
        let stdout = self.git_stdout(&["rev-parse", "--show-prefix"])?;
        let prefix = stdout.trim();
        Ok(paths
            .filter_map(|path| strip_repo_prefix(&path, prefix))
            .collect())
    }

    /// Current `HEAD` commit SHA, or `"unavailable"` when not resolvable.
    pub fn git_head_sha(&self) -> String {
        self.git_stdout(&["rev-parse", "HEAD"])
            .map(|out| out.trim().to_string())
            .unwrap_or_else(|_| "unavailable".into())
    }

    fn git_stdout(&self, args: &[&str]) -> XtaskResult<String> {
        let rendered = format!("git {}", args.join(" "));
        let output = Command::new("git")
            .current_dir(&self.root)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                XtaskError::process_launch(format!("failed to start `{rendered}`: {err}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut err = XtaskError::process_exit(format!(
                "`{rendered}` exited with status {}",
                output.status
            ));
            if let Some(first) = stderr.lines().find(|line| !line.trim().is_empty()) {
                err = err.with_hint(first.trim().to_string());
            }
            return Err(err);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub(crate) fn parse_porcelain_status_path(line: &str) -> Option<String> {
    if line.len() < 4 {
        return None;
    }

    let raw = line[3..].trim();
    let path = match raw.split_once(" -> ") {
        Some((_, new)) => new.trim(),
        None => raw,
    };
    if path.is_empty() {
        None
    } else {
        Some(unquote_git_path(path))
    }
}

pub(crate) fn strip_repo_prefix(path: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return Some(path.to_string());
    }
    path.strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// Strip the double quotes git adds around paths with spaces or unusual bytes.
fn unquote_git_path(path: &str) -> String {
    match path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_test_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "xtask-workspace-test-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ))
    }

    #[test]
    fn porcelain_parser_handles_rename_records() {
        assert_eq!(
            parse_porcelain_status_path("R  old/README.md -> new/README.md"),
            Some("new/README.md".into())
        );
    }

    #[test]
    fn porcelain_parser_unquotes_paths_with_spaces() {
        assert_eq!(
            parse_porcelain_status_path("?? \"networking/tcp notes.md\""),
            Some("networking/tcp notes.md".into())
        );
        assert_eq!(parse_porcelain_status_path("M "), None);
    }

    #[test]
    fn repo_paths_are_rebased_onto_a_subdirectory_root() {
        assert_eq!(
            strip_repo_prefix("notes/compilers/README.md", "notes/"),
            Some("compilers/README.md".into())
        );
        assert_eq!(strip_repo_prefix("xtask/src/lib.rs", "notes/"), None);
        assert_eq!(
            strip_repo_prefix("compilers/README.md", ""),
            Some("compilers/README.md".into())
        );
    }

    #[test]
    fn untracked_topic_directory_lists_its_files() {
        let root = unique_test_root();
        fs::create_dir_all(root.join("newtopic/sub")).expect("create topic dirs");
        let status = Command::new("git")
            .args(["init", "-q"])
            .current_dir(&root)
            .status()
            .expect("run git init");
        assert!(status.success());
        fs::write(root.join("newtopic/README.md"), "# New\n").expect("write topic");
        fs::write(root.join("newtopic/sub/README.md"), "# Sub\n").expect("write subtopic");

        let mut changed = WorkspaceState::new(root.clone())
            .changed_paths()
            .expect("changed paths");
        changed.sort();
        assert_eq!(
            changed,
            vec![
                "newtopic/README.md".to_string(),
                "newtopic/sub/README.md".to_string()
            ]
        );

        let nested = WorkspaceState::new(root.join("newtopic"))
            .changed_paths()
            .expect("changed paths below a subdirectory root");
        assert!(nested.contains(&"README.md".to_string()));
        assert!(nested.contains(&"sub/README.md".to_string()));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn git_head_sha_is_unavailable_outside_git_repo() {
        let root = unique_test_root();
        fs::create_dir_all(&root).expect("create temp root");
        let state = WorkspaceState::new(root.clone());
        assert_eq!(state.git_head_sha(), "unavailable");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn diff_rejects_option_like_base() {
        let state = WorkspaceState::new(PathBuf::from("."));
        let err = state.diff_paths("--output=x").expect_err("reject");
        assert_eq!(
            err.category,
            crate::runtime::error::XtaskErrorCategory::Validation
        );
    }
}
