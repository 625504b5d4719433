//! `cargo xtask index`: regenerate the recent-articles and statistics sections.

use crate::catalog_config::{load_catalog_settings, CatalogSettings};
use crate::commands::scan_documents;
use crate::runtime::context::CommandContext;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::XtaskCommand;
use article_catalog::model::parse_date;
use article_catalog::{update_index, Cutoff, IndexUpdate};
use chrono::NaiveDate;
use std::fs;

/// `cargo xtask index`
pub struct IndexCommand;

/// Parsed `index` arguments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexCommandOptions {
    /// `--count <n>` override.
    pub count: Option<usize>,
    /// `--since <YYYY-MM-DD>` override.
    pub since: Option<NaiveDate>,
    /// `--check`: fail instead of writing when the index is stale.
    pub check: bool,
    /// `--help`.
    pub show_help: bool,
}

impl XtaskCommand for IndexCommand {
    type Options = IndexCommandOptions;

    fn parse(args: &[String]) -> XtaskResult<Self::Options> {
        parse_index_options(args)
    }

    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()> {
        if options.show_help {
            print_index_usage();
            return Ok(());
        }

        let settings = load_catalog_settings(ctx.root())?;
        let profile = options.check.then(|| "check".to_string());
        ctx.workflow()
            .with_workflow_run("catalog-index", profile, || {
                run_index(ctx, &settings, &options)
            })
            .map(|_| ())
    }
}

fn run_index(
    ctx: &CommandContext,
    settings: &CatalogSettings,
    options: &IndexCommandOptions,
) -> XtaskResult<IndexUpdate> {
    let workflow = ctx.workflow();
    let index_options = settings.index_options(options.count, options.since);
    workflow.note(&format!("config: {}", settings.source));
    workflow.note(&format!("cutoff: {}", describe_cutoff(index_options.cutoff)));

    let documents =
        workflow.run_timed_stage("Scan topic documents", || scan_documents(settings))?;

    let index_path = &settings.index_path;
    let current = fs::read_to_string(index_path).map_err(|err| {
        XtaskError::io(format!("failed to read {}: {err}", index_path.display()))
            .with_operation("read root index")
            .with_path(index_path)
    })?;

    let update = workflow.run_timed_stage("Render index sections", || {
        update_index(&current, &documents, &index_options)
            .map_err(|err| XtaskError::from(err).with_path(index_path))
    })?;
    workflow.note(&format!(
        "listed {} of {} article(s)",
        update.recent_count, update.total_articles
    ));
    workflow.record_summary("recent_count", update.recent_count)?;
    workflow.record_summary("total_articles", update.total_articles)?;
    workflow.record_summary("changed", update.changed)?;

    if options.check {
        workflow.run_timed_stage("Check root index is current", || {
            if update.changed {
                Err(XtaskError::validation("root index sections are out of date")
                    .with_path(index_path)
                    .with_hint("run `cargo xtask index` and commit the result"))
            } else {
                workflow.note("root index is up to date");
                Ok(())
            }
        })?;
    } else {
        workflow.run_timed_stage("Write root index", || {
            if update.changed {
                ctx.artifacts().write_text(index_path, &update.content)?;
                workflow.note(&format!("updated {}", index_path.display()));
            } else {
                workflow.note("root index already current; nothing written");
            }
            Ok(())
        })?;
    }

    Ok(update)
}

fn describe_cutoff(cutoff: Cutoff) -> String {
    match cutoff {
        Cutoff::Count(n) => format!("{n} most recent"),
        Cutoff::Since { since, limit: None } => format!("added since {since}"),
        Cutoff::Since {
            since,
            limit: Some(n),
        } => format!("added since {since}, at most {n}"),
    }
}

fn print_index_usage() {
    eprintln!(
        "Usage: cargo xtask index [--count <n>] [--since <YYYY-MM-DD>] [--check]\n\
         \n\
         Regenerates the `## Recently Added Articles` and `## Statistics` sections of the root\n\
         index from every topic document.\n\
         \n\
         Options:\n\
           --count <n>           List the n most recent entries (default from config, else 5)\n\
           --since <date>        List entries added on or after date; caps at --count if given\n\
           --check               Do not write; fail when the committed index is stale\n"
    );
}

fn parse_index_options(args: &[String]) -> XtaskResult<IndexCommandOptions> {
    let mut options = IndexCommandOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--count" => {
                let Some(raw) = args.get(i + 1) else {
                    return Err(XtaskError::validation("missing value for `--count`"));
                };
                let count = raw.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                    XtaskError::validation(format!(
                        "invalid `--count` value `{raw}` (expected a positive integer)"
                    ))
                })?;
                options.count = Some(count);
                i += 2;
            }
            "--since" => {
                let Some(raw) = args.get(i + 1) else {
                    return Err(XtaskError::validation("missing value for `--since`"));
                };
                let since = parse_date(raw).ok_or_else(|| {
                    XtaskError::validation(format!(
                        "invalid `--since` date `{raw}` (expected YYYY-MM-DD)"
                    ))
                })?;
                options.since = Some(since);
                i += 2;
            }
            "--check" => {
                options.check = true;
                i += 1;
            }
            "help" | "--help" | "-h" => {
                options.show_help = true;
                i += 1;
            }
            other => {
                return Err(XtaskError::validation(format!(
                    "unsupported `cargo xtask index` argument `{other}` (expected `--count`, `--since`, `--check`)"
                )));
            }
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::error::XtaskErrorCategory;
    use crate::runtime::workflow::workflow_test_lock;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    const INDEX: &str = "# Reading List\n\n## Recently Added Articles\n\n## Statistics\n\n## About\n\nkept\n";
    const TOPIC: &str = "# Compilers\n\n\
                         ### [Pratt Parsing](https://example.com/pratt)\n\
                         **Added by:** ada\n\
                         **Added on:** 2025-04-17\n\
                         **Summary:** Operator precedence without grammar rewrites.\n\
                         **Key Insights:**\n\
                         - Binding power per token\n\
                         **Tags:** #parsing\n";

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn unique_test_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "xtask-index-test-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ))
    }

    fn fixture(root: &Path) {
        fs::create_dir_all(root.join("compilers")).expect("create topic dir");
        fs::write(root.join("README.md"), INDEX).expect("write index");
        fs::write(root.join("compilers/README.md"), TOPIC).expect("write topic");
    }

    #[test]
    fn parser_accepts_count_since_and_check() {
        let parsed = parse_index_options(&args(&[
            "--count",
            "3",
            "--since",
            "2025-04-01",
            "--check",
        ]))
        .expect("parse");
        assert_eq!(parsed.count, Some(3));
        assert_eq!(parsed.since, NaiveDate::from_ymd_opt(2025, 4, 1));
        assert!(parsed.check);
    }

    #[test]
    fn parser_rejects_bad_values() {
        for bad in [
            vec!["--count"],
            vec!["--count", "0"],
            vec!["--count", "many"],
            vec!["--since", "2025-4-1"],
            vec!["--frobnicate"],
        ] {
            let err = parse_index_options(&args(&bad)).expect_err("invalid args");
            assert_eq!(err.category, XtaskErrorCategory::Validation);
        }
    }

    #[test]
    fn write_then_check_passes_and_stale_index_fails_check() {
        let _guard = workflow_test_lock().lock().expect("lock workflow test");
        let root = unique_test_root();
        fixture(&root);
        let ctx = CommandContext::with_root(root.clone());

        let stale = IndexCommandOptions {
            check: true,
            ..IndexCommandOptions::default()
        };
        let err = IndexCommand::run(&ctx, stale.clone()).expect_err("stale index");
        assert_eq!(err.category, XtaskErrorCategory::Validation);

        IndexCommand::run(&ctx, IndexCommandOptions::default()).expect("write index");
        let written = fs::read_to_string(root.join("README.md")).expect("read index");
        assert!(written.contains(
            "- [Pratt Parsing](https://example.com/pratt) - *compilers* (added 2025-04-17)"
        ));
        assert!(written.ends_with("## About\n\nkept\n"));

        IndexCommand::run(&ctx, stale).expect("index is current");

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_marker_is_reported_with_hint() {
        let _guard = workflow_test_lock().lock().expect("lock workflow test");
        let root = unique_test_root();
        fixture(&root);
        fs::write(root.join("README.md"), "# Reading List\n\n## Statistics\n")
            .expect("write index");
        let ctx = CommandContext::with_root(root.clone());

        let err = IndexCommand::run(&ctx, IndexCommandOptions::default()).expect_err("missing");
        assert_eq!(err.category, XtaskErrorCategory::Validation);
        assert!(err.to_string().contains("## Recently Added Articles"));
        assert!(err.hint.is_some());

        let _ = fs::remove_dir_all(root);
    }
}
