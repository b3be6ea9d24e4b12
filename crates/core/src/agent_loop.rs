//! Agent loop - the state machine that owns the current app pointer, the
//! conversation, schema composition, dispatch and turn sequencing.

use crate::app::App;
use crate::error::AgentError;
use crate::gate::ConfirmationGate;
use crate::registry::AppRegistry;
use crate::schema::{compose_schema, EXIT_APP_TAG, LAUNCH_APP_TAG};
use crate::transport::{Transport, TurnRequest};
use crate::types::{ActionEnvelope, AppOutput, ContentPart, Message, Role};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const BASE_PROMPT: &str = "You are an autonomous AI agent operating in a structured environment. \
     Your task is to interact with the available apps to achieve your goals. \
     Your responses must follow the specified format exactly. \
     You should explain your reasoning in the reasoning field before taking any action.";

const INITIAL_PROMPT: &str = "What would you like to do? Please explain your reasoning.";
const NEXT_PROMPT: &str = "What would you like to do next? Please explain your reasoning.";

/// Terminal result of a declined confirmation. Not an error.
pub const DENIED_RESULT: &str = "Action denied by user";

const DEFAULT_HISTORY_WINDOW: usize = 10;

/// The mutable pair the loop owns: active app (or none) plus conversation.
#[derive(Debug, Default)]
pub struct AgentState {
    current_app: Option<String>,
    conversation: Vec<Message>,
}

impl AgentState {
    pub fn current_app(&self) -> Option<&str> {
        self.current_app.as_deref()
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }
}

/// What one turn produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// An action was dispatched (or declined) and its result recorded.
    Completed { result: String },
    /// A recoverable error was absorbed; the turn was rolled back and one
    /// corrective system message appended.
    Recovered { error: String },
}

/// Core agent execution loop.
pub struct AgentLoop<T, G>
where
    T: Transport,
    G: ConfirmationGate,
{
    registry: AppRegistry,
    transport: T,
    gate: G,
    state: AgentState,
    history_window: usize,
}

#[derive(Debug, Deserialize)]
struct LaunchAction {
    app_name: String,
}

impl<T, G> AgentLoop<T, G>
where
    T: Transport,
    G: ConfirmationGate,
{
    /// Create a new agent loop. Registration is closed from here on.
    pub fn new(registry: AppRegistry, transport: T, gate: G) -> Self {
        Self {
            registry,
            transport,
            gate,
            state: AgentState::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Override the size of the conversation window sent to the model.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Run turns until interrupted. Fails only before the first turn
    /// (empty registry) or on a configuration defect surfacing mid-run.
    pub async fn run(&mut self) -> Result<(), AgentError> {
        if self.registry.is_empty() {
            return Err(AgentError::Configuration(
                "cannot start the agent loop with no registered apps".into(),
            ));
        }

        info!("Starting agent loop with {} registered apps", self.registry.count());
        if self.state.conversation.is_empty() {
            self.state
                .conversation
                .push(Message::text(Role::User, INITIAL_PROMPT));
        }

        loop {
            self.turn().await?;
        }
    }

    /// Execute a single turn: compose schema, fetch the next action,
    /// confirm, dispatch, record the result.
    pub async fn turn(&mut self) -> Result<TurnOutcome, AgentError> {
        let active = self.active_app();
        let schema = compose_schema(active.as_deref(), &self.registry)?;
        let system_prompt = self.system_prompt(active.as_deref());

        let window_start = self
            .state
            .conversation
            .len()
            .saturating_sub(self.history_window);
        let window = &self.state.conversation[window_start..];

        debug!(
            "Requesting next action ({} schema variants, {} window messages)",
            schema.variants().len(),
            window.len()
        );

        let reply = match self
            .transport
            .next_action(TurnRequest {
                system_prompt: &system_prompt,
                messages: window,
                schema: &schema,
            })
            .await
        {
            Ok(reply) => reply,
            Err(err) if err.is_recoverable() => return Ok(self.recover(err)),
            Err(err) => return Err(err),
        };

        for thought in &reply.reasoning {
            info!("Agent thought: {}", thought);
        }

        let output = match self.dispatch(reply.action, active).await {
            Ok(output) => output,
            Err(err) if err.is_recoverable() => return Ok(self.recover(err)),
            Err(err) => return Err(err),
        };

        self.record_result(&output);
        self.gate.notify(&format!("Result: {}", output.text)).await;
        self.gate
            .notify(&format!("Current state: {}", self.state_label()))
            .await;

        self.state
            .conversation
            .push(Message::text(Role::User, NEXT_PROMPT));

        Ok(TurnOutcome::Completed {
            result: output.text,
        })
    }

    /// Route a decoded action through the confirmation gate and into either
    /// the built-in launch/exit handling or the active app's handler.
    async fn dispatch(
        &mut self,
        action: ActionEnvelope,
        active: Option<Arc<dyn App>>,
    ) -> Result<AppOutput, AgentError> {
        match action.tag.as_str() {
            LAUNCH_APP_TAG => {
                if self.state.current_app.is_some() {
                    return Err(AgentError::InvalidAction(
                        "launch_app is only legal on the home screen".into(),
                    ));
                }
                let launch: LaunchAction = action
                    .decode()
                    .map_err(|e| AgentError::SchemaViolation(e.to_string()))?;

                let approved = self
                    .gate
                    .confirm(
                        &format!("Allow agent to launch app '{}'?", launch.app_name),
                        true,
                    )
                    .await;
                if !approved {
                    return Ok(AppOutput::text(DENIED_RESULT));
                }

                // The schema already constrains app_name to the registered
                // set, but the registry stays the source of truth.
                let app = self
                    .registry
                    .get(&launch.app_name)
                    .ok_or_else(|| AgentError::UnknownApp(launch.app_name.clone()))?;
                self.state.current_app = Some(app.name().to_string());
                info!("Launched app: {}", launch.app_name);
                Ok(AppOutput::text(format!("Launched app: {}", launch.app_name)))
            }
            EXIT_APP_TAG => {
                let name = match &self.state.current_app {
                    Some(name) => name.clone(),
                    None => {
                        return Err(AgentError::InvalidAction(
                            "exit_app is only legal inside an app".into(),
                        ))
                    }
                };

                let approved = self
                    .gate
                    .confirm(&format!("Allow agent to exit app '{}'?", name), true)
                    .await;
                if !approved {
                    return Ok(AppOutput::text(DENIED_RESULT));
                }

                self.state.current_app = None;
                info!("Exited app: {}", name);
                Ok(AppOutput::text("Returned to home screen"))
            }
            tag => {
                let app = match active {
                    Some(app) => app,
                    None => {
                        return Err(AgentError::InvalidAction(format!(
                            "action '{}' is not legal on the home screen",
                            tag
                        )))
                    }
                };
                if !app.action_schemas().iter().any(|schema| schema.tag == tag) {
                    return Err(AgentError::InvalidAction(format!(
                        "app '{}' does not accept action '{}'",
                        app.name(),
                        tag
                    )));
                }

                let summary = serde_json::to_string_pretty(&action.payload)
                    .unwrap_or_else(|_| tag.to_string());
                let approved = self
                    .gate
                    .confirm(
                        &format!(
                            "Allow agent to perform action in '{}'?\nAction: {}",
                            app.name(),
                            summary
                        ),
                        true,
                    )
                    .await;
                if !approved {
                    return Ok(AppOutput::text(DENIED_RESULT));
                }

                let output = app.handle_action(action).await?;
                Ok(output)
            }
        }
    }

    /// Absorb a recoverable error: roll the turn back and append a single
    /// corrective system message so the model can try again.
    fn recover(&mut self, err: AgentError) -> TurnOutcome {
        warn!("Recoverable error, turn rolled back: {}", err);
        self.state
            .conversation
            .push(Message::text(Role::System, format!("Error occurred: {}", err)));
        TurnOutcome::Recovered {
            error: err.to_string(),
        }
    }

    fn record_result(&mut self, output: &AppOutput) {
        let mut content = vec![ContentPart::Text {
            text: output.text.clone(),
        }];
        if let Some(attachment) = &output.attachment {
            content.push(ContentPart::Image {
                media_type: attachment.media_type.clone(),
                data: BASE64.encode(&attachment.data),
            });
        }
        self.state.conversation.push(Message {
            role: Role::System,
            content,
        });
    }

    fn active_app(&self) -> Option<Arc<dyn App>> {
        self.state
            .current_app
            .as_ref()
            .and_then(|name| self.registry.get(name))
    }

    fn system_prompt(&self, active: Option<&dyn App>) -> String {
        match active {
            None => {
                let app_list = self
                    .registry
                    .descriptions()
                    .into_iter()
                    .map(|(name, description)| format!("- {}: {}", name, description))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{}\n\nAvailable apps:\n{}", BASE_PROMPT, app_list)
            }
            Some(app) => format!(
                "{}\n\n{}\n\nYou can return to the home screen by choosing to exit the app.",
                BASE_PROMPT,
                app.usage_prompt()
            ),
        }
    }

    fn state_label(&self) -> String {
        match &self.state.current_app {
            None => "Home Screen".to_string(),
            Some(name) => format!("In {}", name),
        }
    }
}
