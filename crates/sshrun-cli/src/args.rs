//! Command-line arguments

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sshrun_exec::{ConnectionRequest, PinnedKnownHosts};
use thiserror::Error;

/// Usage line reported when the positional arguments are incomplete
pub const USAGE: &str = "Usage: sshrun <host> <username> <password> <command>";

#[derive(Parser, Debug)]
#[command(name = "sshrun", version)]
#[command(
    about = "Run one command on a remote host over SSH and print the result as JSON",
    long_about = None,
    after_help = "Options must come before HOST; every token from HOST onwards is taken verbatim."
)]
pub struct Cli {
    /// Host name or address, optionally with `:port`
    #[arg(allow_hyphen_values = true)]
    pub host: String,

    /// Login user
    #[arg(allow_hyphen_values = true)]
    pub username: String,

    /// Login password
    #[arg(allow_hyphen_values = true)]
    pub password: String,

    /// Command passed verbatim to the remote shell
    #[arg(allow_hyphen_values = true)]
    pub command: String,

    /// Anything after COMMAND; ignored
    #[arg(num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub extra: Vec<String>,

    /// SSH port (overrides a port given in HOST)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Seconds allowed for connect, handshake and authentication
    #[arg(long, value_name = "SECS", value_parser = parse_secs, default_value = "10")]
    pub connect_timeout: Duration,

    /// Seconds allowed for the command to finish (default: unbounded)
    #[arg(long, value_name = "SECS", value_parser = parse_secs)]
    pub timeout: Option<Duration>,

    /// Only trust host keys listed in this known_hosts file
    #[arg(long, value_name = "PATH", conflicts_with = "strict_host_keys")]
    pub known_hosts: Option<PathBuf>,

    /// Only trust host keys listed in ~/.ssh/known_hosts
    #[arg(long)]
    pub strict_host_keys: bool,
}

/// Arguments that parse but cannot be turned into a request
#[derive(Error, Debug)]
pub enum ArgsError {
    #[error("--strict-host-keys needs a home directory; pass --known-hosts <PATH> instead")]
    NoHomeDirectory,
}

impl Cli {
    /// Build the connection request described by the arguments
    ///
    /// # Errors
    /// Returns `ArgsError::NoHomeDirectory` if `--strict-host-keys` is set
    /// and the home directory cannot be determined
    pub fn into_request(self) -> Result<ConnectionRequest, ArgsError> {
        let pinned = match (self.known_hosts, self.strict_host_keys) {
            (Some(path), _) => Some(PinnedKnownHosts::new(path)),
            (None, true) => Some(
                PinnedKnownHosts::user_default().ok_or(ArgsError::NoHomeDirectory)?,
            ),
            (None, false) => None,
        };

        let mut request =
            ConnectionRequest::new(&self.host, self.username, self.password, self.command)
                .with_connect_timeout(self.connect_timeout);

        if let Some(port) = self.port {
            request = request.with_port(port);
        }
        if let Some(limit) = self.timeout {
            request = request.with_command_timeout(limit);
        }
        if let Some(verifier) = pinned {
            request = request.with_host_key_verifier(Arc::new(verifier));
        }

        Ok(request)
    }
}

fn parse_secs(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("`{value}`: {e}"))
}
