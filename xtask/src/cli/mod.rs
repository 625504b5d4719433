//! Top-level CLI parsing and help output.

use crate::runtime::error::{XtaskError, XtaskResult};

/// Top-level `xtask` command families.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TopLevelCommand {
    Index(Vec<String>),
    Validate(Vec<String>),
    Stats(Vec<String>),
    Help,
}

/// Parse raw command-line arguments into a top-level command selection.
pub fn parse(args: Vec<String>) -> XtaskResult<TopLevelCommand> {
    let Some(cmd) = args.first().cloned() else {
        return Ok(TopLevelCommand::Help);
    };

    let rest = args[1..].to_vec();
    match cmd.as_str() {
        "index" => Ok(TopLevelCommand::Index(rest)),
        "validate" => Ok(TopLevelCommand::Validate(rest)),
        "stats" => Ok(TopLevelCommand::Stats(rest)),
        "help" | "--help" | "-h" => Ok(TopLevelCommand::Help),
        other => Err(XtaskError::validation(format!(
            "unknown xtask command: {other}"
        ))
        .with_hint("run `cargo xtask help` for the command list")),
    }
}

/// Print the canonical top-level usage text.
pub fn print_usage() {
    eprintln!(
        "Usage: cargo xtask <command> [args]\n\
         \n\
         Commands:\n\
           index [--count <n>] [--since <date>] [--check]\n\
                              Regenerate the recent-articles and statistics sections\n\
           validate [--all|--changed|--base <ref>|<path>...] [--report [<path>]]\n\
                              Check topic documents against the entry template\n\
           stats [--json]      Print catalog statistics\n\
           help                Show this message\n\
         \n\
         Environment:\n\
           CATALOG_ROOT        Run against another checkout of the collection\n"
    );
}
