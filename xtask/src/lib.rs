//! Catalog automation commands (`cargo xtask`).
//!
//! A small CLI layer over the `article_catalog` library. Command modules own argument parsing and
//! workflow policy while [`runtime`] owns configuration, git inspection, artifact paths, and
//! workflow recording.

pub mod catalog_config;
pub mod cli;
pub mod commands;
pub mod runtime;

use crate::cli::TopLevelCommand;
use crate::commands::index::IndexCommand;
use crate::commands::stats::StatsCommand;
use crate::commands::validate::ValidateCommand;
use crate::runtime::context::CommandContext;
use crate::runtime::error::XtaskResult;

/// Shared command contract for top-level xtask command families.
///
/// [`XtaskCommand::parse`] is a pure translation from raw CLI arguments into typed options; side
/// effects belong in [`XtaskCommand::run`].
pub trait XtaskCommand {
    /// Typed options produced by CLI parsing for the command family.
    type Options;

    /// Parse command-line arguments into typed options.
    ///
    /// Invalid argument shapes are reported with
    /// [`XtaskError::validation`](crate::runtime::error::XtaskError::validation).
    fn parse(args: &[String]) -> XtaskResult<Self::Options>;

    /// Execute the command family using the shared runtime context.
    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()>;
}

/// Executes the `xtask` binary using the current process arguments.
pub fn execute_from_env() -> XtaskResult<()> {
    let parsed = cli::parse(std::env::args().skip(1).collect())?;
    if parsed == TopLevelCommand::Help {
        cli::print_usage();
        return Ok(());
    }
    let ctx = CommandContext::new()?;

    match parsed {
        TopLevelCommand::Index(args) => IndexCommand::run(&ctx, IndexCommand::parse(&args)?),
        TopLevelCommand::Validate(args) => {
            ValidateCommand::run(&ctx, ValidateCommand::parse(&args)?)
        }
        TopLevelCommand::Stats(args) => StatsCommand::run(&ctx, StatsCommand::parse(&args)?),
        TopLevelCommand::Help => {
            cli::print_usage();
            Ok(())
        }
    }
}

/// Converts an xtask result into a process exit code.
///
/// Every failure maps to exit code `1` after printing the formatted error to stderr.
pub fn exit_code(result: XtaskResult<()>) -> std::process::ExitCode {
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::ExitCode::from(1)
        }
    }
}
