//! `cargo xtask stats`: print catalog statistics without touching the index.

use crate::catalog_config::load_catalog_settings;
use crate::commands::scan_documents;
use crate::runtime::context::CommandContext;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::XtaskCommand;
use article_catalog::{collect_stats, render_statistics};

/// `cargo xtask stats`
pub struct StatsCommand;

/// Parsed `stats` arguments.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatsCommandOptions {
    /// `--json`: print the counts as JSON instead of markdown.
    pub json: bool,
    /// `--help`.
    pub show_help: bool,
}

impl XtaskCommand for StatsCommand {
    type Options = StatsCommandOptions;

    fn parse(args: &[String]) -> XtaskResult<Self::Options> {
        let mut options = StatsCommandOptions::default();
        for arg in args {
            match arg.as_str() {
                "--json" => options.json = true,
                "help" | "--help" | "-h" => options.show_help = true,
                other => {
                    return Err(XtaskError::validation(format!(
                        "unsupported `cargo xtask stats` argument `{other}` (expected `--json`)"
                    )))
                }
            }
        }
        Ok(options)
    }

    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()> {
        if options.show_help {
            eprintln!(
                "Usage: cargo xtask stats [--json]\n\
                 \n\
                 Prints the statistics section that `cargo xtask index` would write.\n"
            );
            return Ok(());
        }

        println!("{}", render_stats(ctx, options)?);
        Ok(())
    }
}

/// Statistics as markdown (the body `index` writes) or, with `--json`, as raw counts.
fn render_stats(ctx: &CommandContext, options: StatsCommandOptions) -> XtaskResult<String> {
    let settings = load_catalog_settings(ctx.root())?;
    let documents = scan_documents(&settings)?;
    let stats = collect_stats(&documents, &settings.stats);
    if options.json {
        serde_json::to_string_pretty(&stats)
            .map_err(|err| XtaskError::io(format!("failed to serialize statistics: {err}")))
    } else {
        Ok(format!("\n{}", render_statistics(&stats)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn parser_accepts_json_flag_and_rejects_others() {
        let parsed = StatsCommand::parse(&["--json".to_string()]).expect("parse");
        assert!(parsed.json);
        assert!(StatsCommand::parse(&["--count".to_string()]).is_err());
    }

    fn unique_test_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "xtask-stats-test-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ))
    }

    #[test]
    fn stats_runs_against_an_empty_tree() {
        let root = unique_test_root();
        fs::create_dir_all(&root).expect("create root");
        let ctx = CommandContext::with_root(root.clone());
        StatsCommand::run(&ctx, StatsCommandOptions::default()).expect("stats");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn json_output_reports_last_updated_date() {
        let root = unique_test_root();
        fs::create_dir_all(root.join("compilers")).expect("create topic dir");
        fs::write(
            root.join("compilers/README.md"),
            "# Compilers\n\n\
             ### [Pratt Parsing](https://example.com/pratt)\n\
             **Added by:** ada\n\
             **Added on:** 2025-04-17\n\
             **Tags:** #parsing\n",
        )
        .expect("write topic");
        let ctx = CommandContext::with_root(root.clone());

        let body = render_stats(
            &ctx,
            StatsCommandOptions {
                json: true,
                show_help: false,
            },
        )
        .expect("stats json");
        let value: serde_json::Value = serde_json::from_str(&body).expect("parse stats json");
        assert_eq!(value["last_updated"], "2025-04-17");
        assert_eq!(value["total_articles"], 1);
        assert_eq!(value["contributors"][0][0], "ada");

        let markdown = render_stats(&ctx, StatsCommandOptions::default()).expect("stats");
        assert!(markdown.contains("- **Last Updated:** 2025-04-17"));

        let _ = fs::remove_dir_all(root);
    }
}
