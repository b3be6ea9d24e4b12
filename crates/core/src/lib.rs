//! AMI core runtime
//!
//! The state machine that lets an LLM act inside a constrained environment:
//! per-state response schemas, human-gated dispatch, and an append-only
//! conversation that carries app results back to the model.

pub mod agent_loop;
pub mod app;
pub mod error;
pub mod gate;
pub mod registry;
pub mod schema;
pub mod transport;
pub mod types;

pub use agent_loop::{AgentLoop, AgentState, TurnOutcome, DENIED_RESULT};
pub use app::App;
pub use error::{AgentError, AppError};
pub use gate::ConfirmationGate;
pub use registry::AppRegistry;
pub use schema::{compose_schema, ActionSchema, ResponseSchema, EXIT_APP_TAG, LAUNCH_APP_TAG};
pub use transport::{Transport, TurnRequest};
pub use types::{
    ActionEnvelope, AgentReply, AppOutput, Attachment, ContentPart, Message, Role,
};
