//! Workflow recording, stage timing, and structured run artifacts.

use crate::runtime::artifacts::ArtifactManager;
use crate::runtime::error::{XtaskError, XtaskResult};
use serde::Serialize;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize)]
struct RunStageRecord {
    name: String,
    started_unix_ms: u64,
    duration_ms: u128,
    status: String,
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct RunManifest {
    workflow: String,
    profile: Option<String>,
    started_unix_ms: u64,
    finished_unix_ms: u64,
    duration_ms: u128,
    status: String,
    error: Option<String>,
    run_dir: String,
    command: String,
    stages: Vec<RunStageRecord>,
    summary: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug)]
struct ActiveRun {
    workflow: String,
    profile: Option<String>,
    started_unix_ms: u64,
    started_instant: Instant,
    run_dir: PathBuf,
    manifest_path: PathBuf,
    events_path: PathBuf,
    command: String,
    stages: Vec<RunStageRecord>,
    summary: serde_json::Map<String, serde_json::Value>,
}

static ACTIVE_RUN: OnceLock<Mutex<Option<ActiveRun>>> = OnceLock::new();

fn active_run() -> XtaskResult<MutexGuard<'static, Option<ActiveRun>>> {
    ACTIVE_RUN
        .get_or_init(|| Mutex::new(None))
        .lock()
        .map_err(|_| XtaskError::io("failed to lock workflow recorder"))
}

/// Shared workflow recorder service.
///
/// Commands execute through [`with_workflow_run`](Self::with_workflow_run) and nest their work
/// in [`run_timed_stage`](Self::run_timed_stage). Each run leaves a `manifest.json` and an
/// `events.jsonl` stream under `.artifacts/automation/runs/<ts>-<workflow>/`.
#[derive(Clone, Debug)]
pub struct WorkflowRecorder {
    artifacts: ArtifactManager,
}

impl WorkflowRecorder {
    /// Create a recorder service.
    pub fn new(artifacts: ArtifactManager) -> Self {
        Self { artifacts }
    }

    /// Run a workflow with manifest and event recording.
    pub fn with_workflow_run<T, F>(
        &self,
        workflow: &str,
        profile: Option<String>,
        action: F,
    ) -> XtaskResult<T>
    where
        F: FnOnce() -> XtaskResult<T>,
    {
        let run = self.begin_workflow_run(workflow, profile)?;
        *active_run()? = Some(run);

        let result = action();
        self.finish_workflow_run(result.as_ref().err().cloned())?;
        result
    }

    fn begin_workflow_run(
        &self,
        workflow: &str,
        profile: Option<String>,
    ) -> XtaskResult<ActiveRun> {
        let started_unix_ms = unix_timestamp_millis();
        let run_dir = self
            .artifacts
            .automation_runs_dir()
            .join(format!("{started_unix_ms}-{workflow}"));
        self.artifacts.ensure_dir(&run_dir)?;

        let events_path = run_dir.join("events.jsonl");
        let manifest_path = run_dir.join("manifest.json");
        fs::write(&events_path, "").map_err(|err| {
            XtaskError::io(format!(
                "failed to initialize {}: {err}",
                events_path.display()
            ))
        })?;

        append_run_event(
            &events_path,
            serde_json::json!({
                "type": "workflow_started",
                "workflow": workflow,
                "profile": profile,
                "timestamp_unix_ms": started_unix_ms
            }),
        )?;

        Ok(ActiveRun {
            workflow: workflow.to_string(),
            profile,
            started_unix_ms,
            started_instant: Instant::now(),
            run_dir,
            manifest_path,
            events_path,
            command: env::args().collect::<Vec<_>>().join(" "),
            stages: Vec::new(),
            summary: serde_json::Map::new(),
        })
    }

    fn finish_workflow_run(&self, error: Option<XtaskError>) -> XtaskResult<()> {
        let Some(run) = active_run()?.take() else {
            return Ok(());
        };

        let finished_unix_ms = unix_timestamp_millis();
        let status = if error.is_none() { "ok" } else { "failed" }.to_string();
        let error_text = error.as_ref().map(ToString::to_string);

        append_run_event(
            &run.events_path,
            serde_json::json!({
                "type": "workflow_finished",
                "workflow": run.workflow,
                "timestamp_unix_ms": finished_unix_ms,
                "status": status,
                "error": error_text
            }),
        )?;

        let manifest = RunManifest {
            workflow: run.workflow,
            profile: run.profile,
            started_unix_ms: run.started_unix_ms,
            finished_unix_ms,
            duration_ms: run.started_instant.elapsed().as_millis(),
            status,
            error: error_text,
            run_dir: run.run_dir.display().to_string(),
            command: run.command,
            stages: run.stages,
            summary: run.summary,
        };
        let manifest_json = serde_json::to_string_pretty(&manifest).map_err(|err| {
            XtaskError::io(format!("failed to serialize run manifest: {err}"))
        })?;
        self.artifacts.write_text(&run.manifest_path, &manifest_json)?;
        println!("    run artifact: {}", run.manifest_path.display());

        Ok(())
    }

    /// Record a stage with timing and structured events.
    ///
    /// The stage result is returned unchanged after `stage_started` / `stage_finished` events
    /// are appended.
    pub fn run_timed_stage<T, F>(&self, message: &str, action: F) -> XtaskResult<T>
    where
        F: FnOnce() -> XtaskResult<T>,
    {
        println!("\n==> {message}");
        let started = Instant::now();
        let started_unix_ms = unix_timestamp_millis();
        append_active_run_event(serde_json::json!({
            "type": "stage_started",
            "name": message,
            "timestamp_unix_ms": started_unix_ms
        }))?;

        let result = action();
        let elapsed = started.elapsed();
        let stage = RunStageRecord {
            name: message.to_string(),
            started_unix_ms,
            duration_ms: elapsed.as_millis(),
            status: if result.is_ok() { "ok" } else { "failed" }.to_string(),
            error: result.as_ref().err().map(ToString::to_string),
        };
        record_stage_event(stage, unix_timestamp_millis())?;
        match &result {
            Ok(_) => println!("    done in {}", format_duration(elapsed)),
            Err(_) => println!("    failed in {}", format_duration(elapsed)),
        }
        result
    }

    /// Attach a key/value pair to the active run's manifest summary.
    pub fn record_summary(&self, key: &str, value: impl Serialize) -> XtaskResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|err| XtaskError::io(format!("failed to serialize run summary: {err}")))?;
        if let Some(run) = active_run()?.as_mut() {
            run.summary.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Print an informational line inside the current stage.
    pub fn note(&self, message: &str) {
        println!("    {message}");
    }
}

fn append_run_event(path: &Path, event: serde_json::Value) -> XtaskResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| XtaskError::io(format!("failed to open {}: {err}", path.display())))?;
    let line = serde_json::to_string(&event)
        .map_err(|err| XtaskError::io(format!("failed to serialize run event: {err}")))?;
    use std::io::Write as _;
    writeln!(&mut file, "{line}")
        .map_err(|err| XtaskError::io(format!("failed to append {}: {err}", path.display())))
}

fn append_active_run_event(event: serde_json::Value) -> XtaskResult<()> {
    let guard = active_run()?;
    let Some(run) = guard.as_ref() else {
        return Ok(());
    };
    append_run_event(&run.events_path, event)
}

fn record_stage_event(stage: RunStageRecord, end_timestamp_unix_ms: u64) -> XtaskResult<()> {
    let mut guard = active_run()?;
    let Some(run) = guard.as_mut() else {
        return Ok(());
    };
    append_run_event(
        &run.events_path,
        serde_json::json!({
            "type": "stage_finished",
            "name": stage.name,
            "started_unix_ms": stage.started_unix_ms,
            "finished_unix_ms": end_timestamp_unix_ms,
            "duration_ms": stage.duration_ms,
            "status": stage.status,
            "error": stage.error
        }),
    )?;
    run.stages.push(stage);
    Ok(())
}

/// Format a duration for human-readable terminal output.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    if secs >= 60 {
        let minutes = secs / 60;
        let rem_secs = secs % 60;
        format!("{minutes}m {rem_secs}.{millis:03}s")
    } else {
        format!("{secs}.{millis:03}s")
    }
}

/// Return the current unix timestamp in milliseconds.
pub fn unix_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Serializes tests that drive the process-wide active run.
#[cfg(test)]
pub(crate) fn workflow_test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}
