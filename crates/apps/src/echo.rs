//! A simple app that echoes back messages with different text effects.

use ami_core::{ActionEnvelope, ActionSchema, App, AppError, AppOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Available text effects for the echo app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEffect {
    Uppercase,
    Lowercase,
    Reverse,
    Alternating,
}

impl TextEffect {
    fn label(&self) -> &'static str {
        match self {
            TextEffect::Uppercase => "uppercase",
            TextEffect::Lowercase => "lowercase",
            TextEffect::Reverse => "reverse",
            TextEffect::Alternating => "alternating",
        }
    }

    fn apply(&self, message: &str) -> String {
        match self {
            TextEffect::Uppercase => message.to_uppercase(),
            TextEffect::Lowercase => message.to_lowercase(),
            TextEffect::Reverse => message.chars().rev().collect(),
            TextEffect::Alternating => message
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    if i % 2 == 0 {
                        c.to_uppercase().to_string()
                    } else {
                        c.to_lowercase().to_string()
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EchoAction {
    Echo { message: String, effect: TextEffect },
}

pub struct EchoApp;

#[async_trait]
impl App for EchoApp {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "A fun app that echoes back your messages with different text effects. \
         Available effects: uppercase, lowercase, reverse, and alternating case."
    }

    fn action_schemas(&self) -> Vec<ActionSchema> {
        vec![ActionSchema::new(
            "echo",
            "Echo a message back with a text effect applied",
            json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to echo back",
                    },
                    "effect": {
                        "type": "string",
                        "enum": ["uppercase", "lowercase", "reverse", "alternating"],
                        "description": "The text effect to apply",
                    },
                },
                "required": ["message", "effect"],
            }),
        )]
    }

    async fn handle_action(&self, action: ActionEnvelope) -> Result<AppOutput, AppError> {
        let EchoAction::Echo { message, effect } = action
            .decode()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let result = effect.apply(&message);
        Ok(AppOutput::text(format!(
            "Echo ({}): {}",
            effect.label(),
            result
        )))
    }
}
