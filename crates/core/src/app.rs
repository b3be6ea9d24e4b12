//! The capability contract every pluggable app implements.

use crate::error::AppError;
use crate::schema::ActionSchema;
use crate::types::{ActionEnvelope, AppOutput};
use async_trait::async_trait;

/// A pluggable capability module.
///
/// The agent loop only ever calls `handle_action` with an action whose tag
/// is a member of `action_schemas()`; any other call is a caller bug, not a
/// recoverable app error. Apps own their internal resources (connections,
/// pages), acquire them eagerly at construction and release them on drop.
#[async_trait]
pub trait App: Send + Sync {
    /// Stable registry key.
    fn name(&self) -> &str;

    /// One-line description shown on the home screen.
    fn description(&self) -> &str;

    /// Prompt shown while the app is active. May reflect mutable app state
    /// (e.g. the currently open page) and is recomputed every turn.
    fn usage_prompt(&self) -> String {
        self.description().to_string()
    }

    /// The closed set of action variants this app accepts.
    fn action_schemas(&self) -> Vec<ActionSchema>;

    /// Handle a validated, confirmed action.
    async fn handle_action(&self, action: ActionEnvelope) -> Result<AppOutput, AppError>;
}
