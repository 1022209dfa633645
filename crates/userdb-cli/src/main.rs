//! CLI entrypoint for querying user database services.
//!
//! The binary delegates to [`userdb_cli::run`], which parses arguments,
//! sends one `GetUserRecord` request and prints each reply as a JSON line.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    userdb_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
