//! sshrun-exec: One-shot remote command execution
//!
//! Opens an SSH session with password authentication, runs exactly one
//! command, collects stdout and stderr, closes the session and reports an
//! [`ExecutionOutcome`].

pub mod error;
pub mod outcome;
pub mod request;
pub mod ssh;
pub mod traits;
pub mod verify;

pub use error::{ErrorKind, RunError, Stream};
pub use outcome::{CommandOutput, ExecutionOutcome};
pub use request::{ConnectionRequest, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
pub use ssh::RemoteCommandRunner;
pub use traits::CommandRunner;
pub use verify::{AcceptAnyHostKey, HostKeyDecision, HostKeyVerifier, PinnedKnownHosts};
