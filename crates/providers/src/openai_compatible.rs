//! OpenAI-compatible transport adapter.
//!
//! Sends the conversation to a `/chat/completions` endpoint with a
//! `response_format` built from the composed schema, so the model's reply is
//! constrained server-side to the legal action set; the decoded reply is
//! validated against the same schema on the way back.

use ami_core::{
    AgentError, AgentReply, ContentPart, Message, ResponseSchema, Role, Transport, TurnRequest,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    response_format: Value,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiCompatibleTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleTransport {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn wire_content(message: &Message) -> Value {
    match message.content.as_slice() {
        [ContentPart::Text { text }] => Value::String(text.clone()),
        parts => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => {
                        serde_json::json!({"type": "text", "text": text})
                    }
                    ContentPart::Image { media_type, data } => serde_json::json!({
                        "type": "image_url",
                        "image_url": {"url": format!("data:{};base64,{}", media_type, data)},
                    }),
                })
                .collect(),
        ),
    }
}

fn wire_messages(system_prompt: &str, messages: &[Message]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);
    wire.push(WireMessage {
        role: "system",
        content: Value::String(system_prompt.to_string()),
    });
    wire.extend(messages.iter().map(|message| WireMessage {
        role: wire_role(message.role),
        content: wire_content(message),
    }));
    wire
}

/// Decode the completion content against the requested schema.
fn parse_reply(content: &str, schema: &ResponseSchema) -> Result<AgentReply, AgentError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| AgentError::SchemaViolation(format!("reply is not valid JSON: {}", e)))?;
    schema.decode(&value)
}

#[async_trait]
impl Transport for OpenAiCompatibleTransport {
    async fn next_action(&self, request: TurnRequest<'_>) -> Result<AgentReply, AgentError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: wire_messages(request.system_prompt, request.messages),
            response_format: request.schema.to_response_format(),
        };

        debug!("Requesting completion from {} ({})", url, self.model);

        let mut http_request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Transport(format!("{}: {}", status, text)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Transport(format!("malformed completion payload: {}", e)))?;

        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| AgentError::SchemaViolation("completion contained no content".into()))?;

        parse_reply(content, request.schema)
    }
}
