//! Query runtime for the `userdb-query` tool.
//!
//! One invocation opens one connection to a service socket, sends a single
//! `GetUserRecord` request and writes each reply to stdout as a JSON line.
//! The target socket and timeouts come from the configuration shared with the
//! daemon, so `USERDB_*` variables and configuration files apply here too.
//! The process fails when the service cannot be reached, when the stream
//! breaks before its terminal reply, or when that reply carries an error.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use userdb_config::Config;
use userdb_protocol::{GetUserRecordReply, GetUserRecordReplyParams, Method, Request};

mod cli;
mod config;
mod errors;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
use errors::AppError;


/// Runs the tool with explicit arguments and output streams.
///
/// Returns [`ExitCode::SUCCESS`] when the terminal reply carries no error.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, &OrthoConfigLoader, stdout, stderr)
}

fn run_with_loader<I, W, E>(
    args: I,
    loader: &dyn ConfigLoader,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_arguments(&args);
    let result = Cli::try_parse_from(split.query_arguments)
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            let config = loader.load(&split.config_arguments)?;
            execute(&config, &cli, stdout)
        });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(AppError::CliUsage(error)) => {
            let _ = write!(stderr, "{error}");
            ExitCode::from(2)
        }
        Err(error) => {
            let _ = writeln!(stderr, "userdb-query: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(config: &Config, cli: &Cli, stdout: &mut W) -> Result<(), AppError> {
    let path = config.socket_path()?;
    let request = Request::new(
        Method::GetUserRecord,
        cli.parameters(config.service()),
        cli.more(),
    );
    let replies = userdb_protocol::query::<GetUserRecordReplyParams, _>(
        path.as_std_path(),
        config.connect_timeout(),
        &request,
    )?;

    let mut outcome = Ok(());
    for item in replies {
        let reply = item?;
        emit(stdout, &reply)?;
        if let Some(code) = reply.error {
            outcome = Err(AppError::Service(code));
        }
    }
    outcome
}

fn emit<W: Write>(stdout: &mut W, reply: &GetUserRecordReply) -> Result<(), AppError> {
    let line = serde_json::to_string(reply).map_err(AppError::SerialiseReply)?;
    writeln!(stdout, "{line}").map_err(AppError::WriteReply)
}
