//! Result types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// What a command produced once a session was established
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Exit status, if the server reported one
    pub exit_status: Option<u32>,
    /// Time from dispatch to channel close
    pub duration: Duration,
}

impl CommandOutput {
    /// Check if the command wrote nothing to stderr
    ///
    /// The exit status is deliberately not consulted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stderr.is_empty()
    }
}

/// Report of a single invocation, serialized as the process output
///
/// * `success: true` - command ran, stderr empty; `output` is stdout
/// * `success: false`, `output: Some` - command ran but wrote to stderr
/// * `success: false`, `output: None` - no command ran, or the run failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    /// Classify the output of a command that ran
    #[must_use]
    pub fn from_output(output: CommandOutput) -> Self {
        if output.is_clean() {
            Self {
                success: true,
                output: Some(output.stdout),
                error: None,
            }
        } else {
            Self {
                success: false,
                output: Some(output.stdout),
                error: Some(output.stderr),
            }
        }
    }

    /// Report a failure that left no command output
    #[must_use]
    pub fn from_error(err: &RunError) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(err.to_string()),
        }
    }

    /// Report an invocation that could not be attempted
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(message.into()),
        }
    }

    /// Single-line JSON object
    #[must_use]
    pub fn to_json(&self) -> String {
        // Strings and bools only, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"output":null,"error":"failed to serialize outcome"}"#.to_string()
        })
    }
}

impl From<Result<CommandOutput, RunError>> for ExecutionOutcome {
    fn from(result: Result<CommandOutput, RunError>) -> Self {
        match result {
            Ok(output) => Self::from_output(output),
            Err(err) => Self::from_error(&err),
        }
    }
}
