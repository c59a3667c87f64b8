//! Command runner trait

use async_trait::async_trait;

use crate::outcome::ExecutionOutcome;
use crate::request::ConnectionRequest;

/// Runs one command described by a [`ConnectionRequest`]
///
/// Implementations never fail: every problem is reported inside the
/// returned [`ExecutionOutcome`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, request: &ConnectionRequest) -> ExecutionOutcome;

    /// Get runner type name
    fn runner_type(&self) -> &'static str;
}
