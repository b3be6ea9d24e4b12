//! Opaque boundary to the LLM call.

use crate::error::AgentError;
use crate::schema::ResponseSchema;
use crate::types::{AgentReply, Message};
use async_trait::async_trait;

/// One turn's request to the model: the state-dependent system prompt, the
/// bounded conversation window and the schema the reply must satisfy.
#[derive(Debug)]
pub struct TurnRequest<'a> {
    pub system_prompt: &'a str,
    pub messages: &'a [Message],
    pub schema: &'a ResponseSchema,
}

/// Exchange conversation + schema for a validated next action.
///
/// Implementations fail with [`AgentError::Transport`] on network or quota
/// failure and [`AgentError::SchemaViolation`] when the returned payload
/// cannot be decoded against the requested schema; both are absorbed by the
/// loop rather than crashing it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn next_action(&self, request: TurnRequest<'_>) -> Result<AgentReply, AgentError>;
}
