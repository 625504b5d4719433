//! `cargo xtask` entrypoint for the article catalog automation.

fn main() -> std::process::ExitCode {
    xtask::exit_code(xtask::execute_from_env())
}
