//! SSH command execution using russh crate

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::{ChannelMsg, Disconnect, client};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::error::{RunError, Stream};
use crate::outcome::{CommandOutput, ExecutionOutcome};
use crate::request::ConnectionRequest;
use crate::traits::CommandRunner;
use crate::verify::{HostKeyDecision, HostKeyVerifier};

/// SSH_EXTENDED_DATA_STDERR
const EXTENDED_DATA_STDERR: u32 = 1;

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler {
    host: String,
    port: u16,
    verifier: Arc<dyn HostKeyVerifier>,
}

impl SshClientHandler {
    fn new(request: &ConnectionRequest) -> Self {
        Self {
            host: request.host().to_string(),
            port: request.port(),
            verifier: request.verifier(),
        }
    }
}

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match self
            .verifier
            .verify(&self.host, self.port, server_public_key)
        {
            HostKeyDecision::Accept => Ok(true),
            HostKeyDecision::Reject { reason } => {
                warn!(
                    host = %self.host,
                    policy = self.verifier.name(),
                    reason = %reason,
                    "host key rejected"
                );
                Ok(false)
            }
        }
    }
}

type Session = client::Handle<SshClientHandler>;

/// One-shot SSH command runner
///
/// Every call opens a fresh session, authenticates with the request's
/// password (keys and agents are never tried), runs exactly one command and
/// disconnects. Nothing is shared between calls.
#[derive(Clone)]
pub struct RemoteCommandRunner {
    config: Arc<client::Config>,
}

impl std::fmt::Debug for RemoteCommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCommandRunner").finish_non_exhaustive()
    }
}

impl Default for RemoteCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteCommandRunner {
    /// Create a runner with the default russh client configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(client::Config::default())
    }

    /// Create a runner with a custom russh client configuration
    #[must_use]
    pub fn with_config(config: client::Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run the request's command and classify the result
    ///
    /// Never fails; see [`ExecutionOutcome`] for how failures are reported.
    #[instrument(
        skip(self, request),
        fields(host = %request.host(), port = request.port(), user = %request.username())
    )]
    pub async fn run(&self, request: &ConnectionRequest) -> ExecutionOutcome {
        let result = self.execute(request).await;

        match &result {
            Ok(output) => info!(
                exit_status = ?output.exit_status,
                stdout_len = output.stdout.len(),
                stderr_len = output.stderr.len(),
                duration = ?output.duration,
                "remote command completed"
            ),
            Err(e) => warn!(kind = ?e.kind(), error = %e, "remote command not completed"),
        }

        ExecutionOutcome::from(result)
    }

    /// Run the request's command, returning the typed failure on error
    ///
    /// # Errors
    /// * `Connection`, `HostKeyRejected`, `ConnectTimeout` - no session
    /// * `Authentication` - password rejected
    /// * `CommandTimeout`, `Decode`, `Unexpected` - failed after the session
    ///   was established; the session is still closed
    pub async fn execute(&self, request: &ConnectionRequest) -> Result<CommandOutput, RunError> {
        let session = self.establish(request).await?;

        let result = match request.command_timeout() {
            Some(limit) => timeout(limit, exec(&session, request.command()))
                .await
                .unwrap_or(Err(RunError::CommandTimeout { timeout: limit })),
            None => exec(&session, request.command()).await,
        };

        close(session).await;
        result
    }

    /// Connect, handshake and authenticate within the connect timeout
    async fn establish(&self, request: &ConnectionRequest) -> Result<Session, RunError> {
        let limit = request.connect_timeout();

        timeout(limit, self.connect_and_authenticate(request))
            .await
            .map_err(|_| RunError::ConnectTimeout { timeout: limit })?
    }

    async fn connect_and_authenticate(
        &self,
        request: &ConnectionRequest,
    ) -> Result<Session, RunError> {
        info!(
            host = %request.host(),
            port = request.port(),
            user = %request.username(),
            policy = request.verifier().name(),
            "connecting to SSH"
        );

        let mut session = client::connect(
            Arc::clone(&self.config),
            (request.host(), request.port()),
            SshClientHandler::new(request),
        )
        .await
        .map_err(|e| match e {
            russh::Error::UnknownKey => RunError::HostKeyRejected {
                host: request.host().to_string(),
                port: request.port(),
            },
            other => RunError::Connection(other.to_string()),
        })?;

        let auth = session
            .authenticate_password(request.username(), request.password())
            .await;

        match auth {
            Ok(auth) if auth.success() => {
                debug!(host = %request.host(), "SSH connected and authenticated");
                Ok(session)
            }
            Ok(_) => {
                close(session).await;
                Err(RunError::Authentication(format!(
                    "password rejected for {}@{}",
                    request.username(),
                    request.host()
                )))
            }
            Err(e) => {
                close(session).await;
                Err(RunError::Authentication(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl CommandRunner for RemoteCommandRunner {
    async fn run(&self, request: &ConnectionRequest) -> ExecutionOutcome {
        RemoteCommandRunner::run(self, request).await
    }

    fn runner_type(&self) -> &'static str {
        "ssh"
    }
}

/// Execute one command and drain both streams until the channel closes
async fn exec(session: &Session, command: &str) -> Result<CommandOutput, RunError> {
    debug!(command = %command, "executing remote command");

    let start = Instant::now();

    let mut channel = session
        .channel_open_session()
        .await
        .map_err(|e| RunError::Unexpected(format!("failed to open session channel: {e}")))?;

    channel
        .exec(true, command)
        .await
        .map_err(|e| RunError::Unexpected(format!("failed to request exec: {e}")))?;

    let mut exit_status = None;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                stdout.extend_from_slice(&data);
            }
            ChannelMsg::ExtendedData { data, ext } => {
                if ext == EXTENDED_DATA_STDERR {
                    stderr.extend_from_slice(&data);
                }
            }
            ChannelMsg::ExitStatus { exit_status: status } => {
                exit_status = Some(status);
            }
            ChannelMsg::ExitSignal { signal_name, .. } => {
                debug!(signal = ?signal_name, "remote command killed by signal");
            }
            ChannelMsg::Failure => {
                return Err(RunError::Unexpected(
                    "server refused to execute command".to_string(),
                ));
            }
            ChannelMsg::Close => break,
            _ => {}
        }
    }

    let duration = start.elapsed();
    let stdout = decode(stdout, Stream::Stdout)?;
    let stderr = decode(stderr, Stream::Stderr)?;

    debug!(
        exit_status = ?exit_status,
        duration = ?duration,
        "remote command finished"
    );

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_status,
        duration,
    })
}

fn decode(bytes: Vec<u8>, stream: Stream) -> Result<String, RunError> {
    String::from_utf8(bytes).map_err(|e| RunError::Decode {
        stream,
        message: e.to_string(),
    })
}

/// Disconnect, discarding any error so it cannot replace the real outcome
async fn close(session: Session) {
    if let Err(e) = session
        .disconnect(Disconnect::ByApplication, "", "English")
        .await
    {
        debug!(error = %e, "ignoring SSH disconnect failure");
    }
}
