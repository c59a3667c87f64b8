//! Host key verification policies
//!
//! The runner asks a [`HostKeyVerifier`] whether to trust the key a server
//! presents during the handshake. [`AcceptAnyHostKey`] is the default and
//! trusts every key without recording it. Callers that need pinning pass a
//! [`PinnedKnownHosts`] instead.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use russh::keys::ssh_key::{HashAlg, PublicKey};
use tracing::{debug, warn};

/// Verdict on a presented host key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyDecision {
    Accept,
    Reject {
        /// Why the key was refused
        reason: String,
    },
}

impl HostKeyDecision {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, HostKeyDecision::Accept)
    }
}

/// Pluggable host identity check
pub trait HostKeyVerifier: Send + Sync + Debug {
    /// Decide whether `key`, presented by `host:port`, is trusted
    fn verify(&self, host: &str, port: u16, key: &PublicKey) -> HostKeyDecision;

    /// Short policy name for logs
    fn name(&self) -> &'static str;
}

/// Trust-on-first-use without persistence
///
/// Every key is accepted and nothing is written anywhere, so a changed key is
/// never noticed. Equivalent to `StrictHostKeyChecking=no` with
/// `UserKnownHostsFile=/dev/null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyHostKey;

impl HostKeyVerifier for AcceptAnyHostKey {
    fn verify(&self, host: &str, port: u16, key: &PublicKey) -> HostKeyDecision {
        debug!(
            host = %host,
            port = port,
            algorithm = %key.algorithm(),
            fingerprint = %key.fingerprint(HashAlg::Sha256),
            "accepting unverified host key"
        );
        HostKeyDecision::Accept
    }

    fn name(&self) -> &'static str {
        "accept-any"
    }
}

/// Only trust keys already listed in an OpenSSH `known_hosts` file
///
/// The file is read on every verification and never written. Unknown hosts
/// and changed keys are both rejected.
#[derive(Debug, Clone)]
pub struct PinnedKnownHosts {
    path: PathBuf,
}

impl PinnedKnownHosts {
    /// Verify against the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Verify against `~/.ssh/known_hosts`
    #[must_use]
    pub fn user_default() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".ssh").join("known_hosts")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostKeyVerifier for PinnedKnownHosts {
    fn verify(&self, host: &str, port: u16, key: &PublicKey) -> HostKeyDecision {
        let fingerprint = key.fingerprint(HashAlg::Sha256);

        match russh::keys::check_known_hosts_path(host, port, key, &self.path) {
            Ok(true) => {
                debug!(host = %host, port = port, fingerprint = %fingerprint, "host key verified");
                HostKeyDecision::Accept
            }
            Ok(false) => {
                warn!(
                    host = %host,
                    port = port,
                    fingerprint = %fingerprint,
                    known_hosts = %self.path.display(),
                    "host not present in known_hosts"
                );
                HostKeyDecision::Reject {
                    reason: format!("{host} is not in {}", self.path.display()),
                }
            }
            Err(e) => {
                warn!(
                    host = %host,
                    port = port,
                    fingerprint = %fingerprint,
                    error = %e,
                    "host key check failed"
                );
                HostKeyDecision::Reject {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "known-hosts"
    }
}
