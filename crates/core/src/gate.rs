//! The human confirmation checkpoint in front of every effectful action.

use async_trait::async_trait;

/// Synchronous human approval boundary.
///
/// `confirm` blocks the turn until the human accepts or declines; the
/// decision is never cached and is re-asked per action instance. The gate
/// must not mutate agent state.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    /// Present the pending action and block for an explicit accept/decline.
    async fn confirm(&self, prompt: &str, default_accept: bool) -> bool;

    /// Show a status line to the human operator.
    async fn notify(&self, message: &str);
}
