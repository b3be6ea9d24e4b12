//! Core type definitions for the AMI runtime.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in conversation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One piece of message content. Most turns are plain text; app results may
/// carry an image next to the text (e.g. a screenshot).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { media_type: String, data: String },
}

/// A single message in the conversation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl Message {
    /// Create a plain-text message.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Concatenated text parts of this message.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Binary payload attached to an app result.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Result of handling one action: human-readable text plus an optional
/// attachment, appended verbatim into the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppOutput {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl AppOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(text: impl Into<String>, attachment: Attachment) -> Self {
        Self {
            text: text.into(),
            attachment: Some(attachment),
        }
    }
}

/// One discriminated action as emitted by the model: the `type` tag plus the
/// full action object it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEnvelope {
    pub tag: String,
    pub payload: Value,
}

impl ActionEnvelope {
    /// Parse an envelope out of a raw action object. Returns `None` if the
    /// value is not an object carrying a string `type` discriminator.
    pub fn from_value(value: &Value) -> Option<Self> {
        let tag = value.as_object()?.get("type")?.as_str()?;
        Some(Self {
            tag: tag.to_string(),
            payload: value.clone(),
        })
    }

    /// Build an envelope from a tag and payload fields.
    pub fn new(tag: impl Into<String>, mut payload: Value) -> Self {
        let tag = tag.into();
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("type".to_string(), Value::String(tag.clone()));
        }
        Self { tag, payload }
    }

    /// Decode the payload into an app's typed action enum.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// A validated model reply: the reasoning trace plus the chosen action.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub reasoning: Vec<String>,
    pub action: ActionEnvelope,
}
