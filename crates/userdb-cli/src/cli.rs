//! Query arguments of `userdb-query`.
//!
//! Runtime directory, service and timeouts are configuration flags and are
//! parsed by [`crate::config`] instead.

use clap::Parser;
use userdb_protocol::GetUserRecordRequestParams;

const CONFIGURATION_HELP: &str = "\
Configuration:
      --config-path <PATH>          Configuration file to load
      --runtime-directory <DIR>     Directory holding the service sockets
      --service <NAME>              Service to query
      --connect-timeout-ms <MS>     Budget for the service to accept the connection

Configuration may also come from USERDB_* environment variables.";

/// Looks users up through a user database service.
#[derive(Parser, Debug)]
#[command(name = "userdb-query", after_help = CONFIGURATION_HELP)]
pub(crate) struct Cli {
    /// Login name to look up.
    #[arg(long, value_name = "NAME")]
    pub(crate) user_name: Option<String>,
    /// Numeric user id to look up.
    #[arg(long, value_name = "N")]
    pub(crate) uid: Option<u32>,
    /// Requests a single reply instead of a stream.
    #[arg(long)]
    pub(crate) no_more: bool,
}

impl Cli {
    /// Request parameters addressed to `service`.
    pub(crate) fn parameters(&self, service: &str) -> GetUserRecordRequestParams {
        GetUserRecordRequestParams {
            user_name: self.user_name.clone(),
            uid: self.uid,
            service: service.to_owned(),
        }
    }

    /// Whether the caller accepts a stream of replies.
    pub(crate) const fn more(&self) -> bool {
        !self.no_more
    }
}
