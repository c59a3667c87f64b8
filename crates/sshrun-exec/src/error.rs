//! Error types for sshrun-exec

use std::time::Duration;

use thiserror::Error;

/// Which output stream of the remote command a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Coarse classification of a [`RunError`]
///
/// The JSON outcome has the same shape for every kind; callers that need to
/// tell a refused session from an internal fault match on this instead of
/// parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable session: DNS, TCP, handshake, host key or timeout
    Connection,
    /// The server rejected the credentials
    Authentication,
    /// Anything that went wrong after a session existed
    Unexpected,
}

/// Errors that can occur while running a remote command
#[derive(Error, Debug, Clone)]
pub enum RunError {
    /// Failed to connect to remote host
    #[error("connection failed: {0}")]
    Connection(String),

    /// Host key refused by the configured verifier
    #[error("host key rejected for {host}:{port}")]
    HostKeyRejected {
        /// Host that presented the key
        host: String,
        /// Port that was dialed
        port: u16,
    },

    /// Session could not be established within the connect timeout
    #[error("connection timed out after {timeout:?}")]
    ConnectTimeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Authentication failed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Command did not finish within the command timeout
    #[error("command timed out after {timeout:?}")]
    CommandTimeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Output was not valid UTF-8
    #[error("{stream} is not valid UTF-8: {message}")]
    Decode {
        /// Stream that failed to decode
        stream: Stream,
        /// Decoder message
        message: String,
    },

    /// Protocol or I/O fault after the session was established
    #[error("{0}")]
    Unexpected(String),
}

impl RunError {
    /// Classify the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Connection(_)
            | RunError::HostKeyRejected { .. }
            | RunError::ConnectTimeout { .. } => ErrorKind::Connection,
            RunError::Authentication(_) => ErrorKind::Authentication,
            RunError::CommandTimeout { .. }
            | RunError::Decode { .. }
            | RunError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Whether the failure happened before any command was dispatched
    #[must_use]
    pub fn before_command(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Unexpected)
    }
}
