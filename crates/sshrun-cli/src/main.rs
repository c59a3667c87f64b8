//! sshrun CLI
//!
//! Runs one command on a remote host over SSH and prints the outcome as a
//! single JSON object. Exits 1 only when the arguments are unusable; remote
//! failures are reported in the JSON with exit status 0.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use color_eyre::Result;
use sshrun_exec::{CommandRunner, ConnectionRequest, ExecutionOutcome, RemoteCommandRunner};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Cli, USAGE};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    // stdout carries only the JSON outcome
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            warn!(kind = ?e.kind(), "invalid arguments");
            emit(&usage_outcome())?;
            return Ok(ExitCode::FAILURE);
        }
    };

    if !cli.extra.is_empty() {
        // values may be secrets, log only how many
        warn!(count = cli.extra.len(), "ignoring arguments after COMMAND");
    }

    let request = match cli.into_request() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "invalid arguments");
            emit(&ExecutionOutcome::usage(format!("{e}. {USAGE}")))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let runner = RemoteCommandRunner::new();
    let outcome = report(&runner, &request).await;
    emit(&outcome)?;

    Ok(ExitCode::SUCCESS)
}

fn usage_outcome() -> ExecutionOutcome {
    ExecutionOutcome::usage(USAGE)
}

async fn report(runner: &dyn CommandRunner, request: &ConnectionRequest) -> ExecutionOutcome {
    runner.run(request).await
}

fn emit(outcome: &ExecutionOutcome) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", outcome.to_json())?;
    stdout.flush()?;
    Ok(())
}
