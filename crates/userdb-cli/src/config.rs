//! Configuration loading for the query tool.
//!
//! The tool shares [`Config`] with the daemon, so the runtime directory,
//! service name and timeouts resolve through the same file, `USERDB_*`
//! environment and flag layers. Arguments are split before parsing: flags
//! that name a configuration field go to `ortho-config`, and the remaining
//! query flags go to the tool's own parser.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use userdb_config::Config;

use crate::AppError;

/// Flags owned by the shared configuration rather than by the query parser.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--runtime-directory",
    "--service",
    "--records-directory",
    "--log-filter",
    "--log-format",
    "--connect-timeout-ms",
    "--reply-timeout-ms",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the configuration half of the arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Config { needs_value: bool },
    Query,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Query;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Config {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Query
    }
}

/// Arguments partitioned between the configuration loader and the query
/// parser. Both halves keep the program name in front.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) query_arguments: Vec<OsString>,
}

/// Splits `args` wherever configuration flags appear. A lone `--` ends flag
/// processing and sends everything after it to the query parser.
pub(crate) fn split_arguments(args: &[OsString]) -> ArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ArgumentSplit::default();
    };
    let mut split = ArgumentSplit {
        config_arguments: vec![program.clone()],
        query_arguments: vec![program.clone()],
    };

    let mut remaining = rest.iter();
    while let Some(argument) = remaining.next() {
        if argument == "--" {
            split.query_arguments.push(argument.clone());
            split.query_arguments.extend(remaining.cloned());
            break;
        }
        match classify(argument) {
            FlagAction::Config { needs_value } => {
                split.config_arguments.push(argument.clone());
                if needs_value {
                    split.config_arguments.extend(remaining.next().cloned());
                }
            }
            FlagAction::Query => split.query_arguments.push(argument.clone()),
        }
    }
    split
}
