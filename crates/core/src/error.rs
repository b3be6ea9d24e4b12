//! Error taxonomy for the AMI runtime.

use thiserror::Error;

/// Errors raised by the agent loop and its collaborators.
///
/// Only `Configuration` is fatal, and only before the loop starts; every
/// other variant is recoverable and is converted into a corrective system
/// message on the conversation.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Unknown app: {0}")]
    UnknownApp(String),

    #[error("App handler error: {0}")]
    AppHandler(#[from] AppError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Whether the running loop can absorb this error and continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AgentError::Configuration(_))
    }
}

/// Errors raised inside an app's action handler. Apps own their own
/// partial-failure cleanup; the loop only surfaces the description.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Operation timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::Configuration("no apps registered".to_string());
        assert_eq!(err.to_string(), "Configuration error: no apps registered");

        let err = AgentError::UnknownApp("solitaire".to_string());
        assert_eq!(err.to_string(), "Unknown app: solitaire");
    }

    #[test]
    fn test_recoverability() {
        assert!(!AgentError::Configuration("x".into()).is_recoverable());
        assert!(AgentError::Transport("x".into()).is_recoverable());
        assert!(AgentError::SchemaViolation("x".into()).is_recoverable());
        assert!(AgentError::InvalidAction("x".into()).is_recoverable());
        assert!(AgentError::UnknownApp("x".into()).is_recoverable());
        assert!(AgentError::AppHandler(AppError::Timeout).is_recoverable());
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AgentError = AppError::Execution("boom".into()).into();
        assert_eq!(err.to_string(), "App handler error: Execution failed: boom");
    }
}
