//! Connection request for a single remote command

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::verify::{AcceptAnyHostKey, HostKeyVerifier};

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default bound on session establishment
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to run one command on one host
///
/// The password is kept in a [`SecretString`] and is redacted from `Debug`
/// output, so the request can be logged as a whole.
#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    command: String,
    connect_timeout: Duration,
    command_timeout: Option<Duration>,
    verifier: Arc<dyn HostKeyVerifier>,
}

impl ConnectionRequest {
    /// Create a request with default port, timeouts and host key policy
    ///
    /// `host` may carry a port suffix (`host:2222`, `[::1]:2222`).
    pub fn new(
        host: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        let (host, port) = split_host_port(host.as_ref());
        Self {
            host,
            port: port.unwrap_or(DEFAULT_PORT),
            username: username.into(),
            password: SecretString::new(password.into()),
            command: command.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: None,
            verifier: Arc::new(AcceptAnyHostKey),
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bound connect, handshake and authentication
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound command execution and output drain
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Replace the host key policy
    #[must_use]
    pub fn with_host_key_verifier(mut self, verifier: Arc<dyn HostKeyVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Plaintext password, for the authentication call only
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    pub fn verifier(&self) -> Arc<dyn HostKeyVerifier> {
        Arc::clone(&self.verifier)
    }
}

/// Split an optional `:port` suffix off a host
///
/// Bare IPv6 addresses contain several colons and are returned untouched;
/// use the bracketed form to attach a port to one.
fn split_host_port(input: &str) -> (String, Option<u16>) {
    if let Some((addr, tail)) = input.strip_prefix('[').and_then(|r| r.split_once(']')) {
        let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
        return (addr.to_string(), port);
    }

    if input.matches(':').count() == 1 {
        if let Some((host, Ok(port))) = input
            .rsplit_once(':')
            .map(|(host, port)| (host, port.parse::<u16>()))
        {
            return (host.to_string(), Some(port));
        }
    }

    (input.to_string(), None)
}
