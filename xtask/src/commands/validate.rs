//! `cargo xtask validate`: check changed topic documents against the entry template.

use crate::catalog_config::{load_catalog_settings, CatalogSettings};
use crate::commands::scanner_for;
use crate::runtime::context::CommandContext;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::XtaskCommand;
use article_catalog::scanner::rel_posix;
use article_catalog::{ScanOptions, TopicDocument, ValidationReport};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// `cargo xtask validate`
pub struct ValidateCommand;

/// Which files a validation run looks at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidateSelection {
    /// Working-tree changes from `git status --porcelain`.
    Changed,
    /// Every topic document.
    All,
    /// Files changed between the merge base with a ref and `HEAD`.
    Base(String),
    /// Explicit workspace-relative or absolute paths.
    Paths(Vec<String>),
}

impl ValidateSelection {
    fn label(&self) -> String {
        match self {
            Self::Changed => "changed".into(),
            Self::All => "all".into(),
            Self::Base(base) => format!("base:{base}"),
            Self::Paths(_) => "paths".into(),
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            Self::Changed => "--changed",
            Self::All => "--all",
            Self::Base(_) => "--base",
            Self::Paths(_) => "<path>",
        }
    }
}

/// Destination of the JSON report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReportTarget {
    /// `--report` without a value: `.artifacts/catalog/validation.json`.
    Default,
    /// `--report <path>`, workspace-relative or absolute.
    Path(PathBuf),
}

/// Parsed `validate` arguments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidateOptions {
    /// File selection mode.
    pub selection: ValidateSelection,
    /// `--report [<path>]` destination for the JSON report.
    pub report: Option<ReportTarget>,
    /// `--help`.
    pub show_help: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            selection: ValidateSelection::Changed,
            report: None,
            show_help: false,
        }
    }
}

impl XtaskCommand for ValidateCommand {
    type Options = ValidateOptions;

    fn parse(args: &[String]) -> XtaskResult<Self::Options> {
        parse_validate_options(args)
    }

    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()> {
        if options.show_help {
            print_validate_usage();
            return Ok(());
        }

        let settings = load_catalog_settings(ctx.root())?;
        ctx.workflow().with_workflow_run(
            "catalog-validate",
            Some(options.selection.label()),
            || run_validate(ctx, &settings, &options),
        )
    }
}

fn run_validate(
    ctx: &CommandContext,
    settings: &CatalogSettings,
    options: &ValidateOptions,
) -> XtaskResult<()> {
    let workflow = ctx.workflow();

    let selected = workflow.run_timed_stage("Select topic documents", || {
        let candidates = candidate_paths(ctx, settings, &options.selection)?;
        let selection = select_topic_documents(&settings.topic_root, &settings.scan, candidates);
        for path in &selection.missing {
            workflow.note(&format!("skipping {path}: no longer exists"));
        }
        workflow.note(&format!(
            "{} topic document(s) selected",
            selection.documents.len()
        ));
        Ok(selection.documents)
    })?;

    let documents = workflow.run_timed_stage("Scan selected documents", || {
        let scanner = scanner_for(settings);
        selected
            .iter()
            .map(|path| scanner.read_document(path).map_err(XtaskError::from))
            .collect::<XtaskResult<Vec<TopicDocument>>>()
    })?;

    let report = workflow.run_timed_stage("Validate entry format", || {
        let report = ValidationReport::from_documents(&documents);
        print_report(&report);
        Ok(report)
    })?;

    workflow.record_summary("files", report.files.len())?;
    workflow.record_summary("hard", report.hard_count())?;
    workflow.record_summary("soft", report.soft_count())?;

    if let Some(target) = &options.report {
        let path = match target {
            ReportTarget::Default => ctx.artifacts().validation_report(),
            ReportTarget::Path(path) => ctx.artifacts().resolve_path(path),
        };
        workflow.run_timed_stage("Write validation report", || {
            let body = report_json(ctx, options, &report)?;
            ctx.artifacts().write_text(&path, &body)?;
            workflow.note(&format!("report: {}", path.display()));
            Ok(())
        })?;
    }

    if report.passed() {
        Ok(())
    } else {
        let failing = report.files.iter().filter(|file| !file.passed()).count();
        Err(XtaskError::validation(format!(
            "{} hard violation(s) in {failing} file(s)",
            report.hard_count()
        ))
        .with_hint("fix the entries listed above; template/README.md shows the expected layout"))
    }
}

fn candidate_paths(
    ctx: &CommandContext,
    settings: &CatalogSettings,
    selection: &ValidateSelection,
) -> XtaskResult<Vec<PathBuf>> {
    let from_repo = |paths: Vec<String>| -> Vec<PathBuf> {
        paths.into_iter().map(|path| ctx.root().join(path)).collect()
    };
    match selection {
        ValidateSelection::All => Ok(scanner_for(settings).document_paths()?),
        ValidateSelection::Changed => Ok(from_repo(ctx.workspace().changed_paths()?)),
        ValidateSelection::Base(base) => Ok(from_repo(ctx.workspace().diff_paths(base)?)),
        ValidateSelection::Paths(paths) => Ok(paths
            .iter()
            .map(|path| ctx.artifacts().resolve_path(Path::new(path)))
            .collect()),
    }
}

/// Result of narrowing candidate paths to topic documents.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TopicSelection {
    /// Existing topic documents, sorted and deduplicated.
    pub documents: Vec<PathBuf>,
    /// Topic-relative paths that passed the filters but are gone from disk.
    pub missing: Vec<String>,
}

/// Keep markdown files under `topic_root` that the scanner would treat as topic documents.
pub fn select_topic_documents(
    topic_root: &Path,
    scan: &ScanOptions,
    candidates: Vec<PathBuf>,
) -> TopicSelection {
    let mut documents = BTreeSet::new();
    let mut missing = BTreeSet::new();

    for path in candidates {
        let Ok(rel) = path.strip_prefix(topic_root) else {
            continue;
        };
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            continue;
        }
        let rel = rel_posix(topic_root, &path);
        if scan.is_excluded(&rel) {
            continue;
        }
        if path.is_file() {
            documents.insert(path);
        } else {
            missing.insert(rel);
        }
    }

    TopicSelection {
        documents: documents.into_iter().collect(),
        missing: missing.into_iter().collect(),
    }
}

fn print_report(report: &ValidationReport) {
    for violation in report.violations() {
        println!("{violation}");
    }
    let entries: usize = report.files.iter().map(|file| file.entries).sum();
    let verdict = if report.passed() { "OK" } else { "FAILED" };
    println!(
        "\n{verdict}: {} file(s), {entries} entr{}, {} hard, {} soft",
        report.files.len(),
        if entries == 1 { "y" } else { "ies" },
        report.hard_count(),
        report.soft_count()
    );
}

fn report_json(
    ctx: &CommandContext,
    options: &ValidateOptions,
    report: &ValidationReport,
) -> XtaskResult<String> {
    let mut value = report.to_json_value();
    if let Some(object) = value.as_object_mut() {
        object.insert("selection".into(), options.selection.label().into());
        object.insert("head".into(), ctx.workspace().git_head_sha().into());
    }
    serde_json::to_string_pretty(&value)
        .map_err(|err| XtaskError::io(format!("failed to serialize validation report: {err}")))
}

fn print_validate_usage() {
    eprintln!(
        "Usage: cargo xtask validate [--all | --changed | --base <ref> | <path>...] [--report [<path>]]\n\
         \n\
         Checks topic documents against the entry template. Hard violations fail the run;\n\
         soft violations are reported only.\n\
         \n\
         Selection (default: --changed):\n\
           --changed             Files reported by `git status --porcelain`\n\
           --base <ref>          Files changed in `<ref>...HEAD`\n\
           --all                 Every topic document\n\
           <path>...             Explicit files (workspace-relative or absolute)\n\
         \n\
         Options:\n\
           --report [<path>]     Also write a JSON report (default .artifacts/catalog/validation.json)\n"
    );
}

fn parse_validate_options(args: &[String]) -> XtaskResult<ValidateOptions> {
    let mut options = ValidateOptions::default();
    let mut mode: Option<ValidateSelection> = None;
    let mut paths = Vec::new();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--all" => {
                set_mode(&mut mode, ValidateSelection::All)?;
                i += 1;
            }
            "--changed" => {
                set_mode(&mut mode, ValidateSelection::Changed)?;
                i += 1;
            }
            "--base" => {
                let Some(base) = args.get(i + 1) else {
                    return Err(XtaskError::validation("missing value for `--base`"));
                };
                set_mode(&mut mode, ValidateSelection::Base(base.clone()))?;
                i += 2;
            }
            "--report" => match args.get(i + 1).filter(|next| !next.starts_with('-')) {
                Some(path) => {
                    options.report = Some(ReportTarget::Path(PathBuf::from(path)));
                    i += 2;
                }
                None => {
                    options.report = Some(ReportTarget::Default);
                    i += 1;
                }
            },
            "help" | "--help" | "-h" => {
                options.show_help = true;
                i += 1;
            }
            other if other.starts_with('-') => {
                return Err(XtaskError::validation(format!(
                    "unsupported `cargo xtask validate` argument `{other}` (expected `--all`, `--changed`, `--base`, `--report`, or paths)"
                )));
            }
            path => {
                paths.push(path.to_string());
                i += 1;
            }
        }
    }

    if !paths.is_empty() {
        if let Some(previous) = &mode {
            return Err(XtaskError::validation(format!(
                "explicit paths cannot be combined with `{}`",
                previous.flag()
            )));
        }
        mode = Some(ValidateSelection::Paths(paths));
    }
    if let Some(mode) = mode {
        options.selection = mode;
    }
    Ok(options)
}

fn set_mode(mode: &mut Option<ValidateSelection>, next: ValidateSelection) -> XtaskResult<()> {
    if let Some(previous) = mode {
        return Err(XtaskError::validation(format!(
            "`{}` cannot be combined with `{}`",
            previous.flag(),
            next.flag()
        )));
    }
    *mode = Some(next);
    Ok(())
}
