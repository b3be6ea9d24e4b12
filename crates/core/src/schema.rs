//! Response-schema composition.
//!
//! Every turn the loop recomputes the exact schema the model must follow:
//! a required `reasoning` field plus a discriminated-union `action` field
//! whose members are precisely the legal actions for the current state. On
//! the home screen the only member is `launch_app`, with the app name
//! constrained to the closed set of registered names; inside an app the
//! members are the app's own actions plus `exit_app`. An illegal action is
//! unrepresentable by construction, not merely rejected after the fact.

use crate::app::App;
use crate::error::AgentError;
use crate::registry::AppRegistry;
use crate::types::{ActionEnvelope, AgentReply};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Built-in action tag for launching an app from the home screen.
pub const LAUNCH_APP_TAG: &str = "launch_app";

/// Built-in action tag for returning to the home screen.
pub const EXIT_APP_TAG: &str = "exit_app";

/// One discriminated action variant: a tag, a one-line description and a
/// JSON-Schema object describing the typed fields. Pure data; identity is
/// the tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSchema {
    pub tag: String,
    pub description: String,
    pub parameters: Value,
}

impl ActionSchema {
    pub fn new(tag: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tag: tag.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Render this variant as a member of the `action` union: the field
    /// schema merged with a `type` const discriminator.
    fn to_union_member(&self) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert("type".to_string(), json!({"const": self.tag}));

        let mut required = vec![json!("type")];

        if let Some(props) = self.parameters.get("properties").and_then(Value::as_object) {
            for (key, schema) in props {
                properties.insert(key.clone(), schema.clone());
            }
        }
        if let Some(reqs) = self.parameters.get("required").and_then(Value::as_array) {
            required.extend(reqs.iter().cloned());
        }

        json!({
            "type": "object",
            "description": self.description,
            "properties": Value::Object(properties),
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// The full per-turn response schema: the set of legal action variants.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    variants: Vec<ActionSchema>,
}

impl ResponseSchema {
    /// Build a schema from an explicit variant list. `compose_schema` is the
    /// normal producer; this constructor exists for adapters and tests.
    pub fn from_variants(variants: Vec<ActionSchema>) -> Self {
        Self { variants }
    }

    pub fn variants(&self) -> &[ActionSchema] {
        &self.variants
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.variants.iter().any(|v| v.tag == tag)
    }

    /// Render the OpenAI `response_format` value enforcing this schema.
    pub fn to_response_format(&self) -> Value {
        let members: Vec<Value> = self.variants.iter().map(ActionSchema::to_union_member).collect();
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": "agent_turn",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "reasoning": {
                            "type": "array",
                            "items": {"type": "string"},
                            "minItems": 1,
                            "description": "Your reasoning for this action, one thought per entry",
                        },
                        "action": {"oneOf": members},
                    },
                    "required": ["reasoning", "action"],
                    "additionalProperties": false,
                }
            }
        })
    }

    /// Validate a raw model payload against this schema and decode it into
    /// an [`AgentReply`]. Any shape mismatch is a [`AgentError::SchemaViolation`].
    pub fn decode(&self, payload: &Value) -> Result<AgentReply, AgentError> {
        let obj = payload
            .as_object()
            .ok_or_else(|| AgentError::SchemaViolation("reply is not a JSON object".into()))?;

        let reasoning: Vec<String> = obj
            .get("reasoning")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::SchemaViolation("missing reasoning array".into()))?
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AgentError::SchemaViolation("reasoning entry is not a string".into()))
            })
            .collect::<Result<_, _>>()?;
        if reasoning.is_empty() {
            return Err(AgentError::SchemaViolation("reasoning array is empty".into()));
        }

        let action_value = obj
            .get("action")
            .ok_or_else(|| AgentError::SchemaViolation("missing action field".into()))?;
        let action = ActionEnvelope::from_value(action_value).ok_or_else(|| {
            AgentError::SchemaViolation("action is not an object with a string type tag".into())
        })?;

        if !self.has_tag(&action.tag) {
            return Err(AgentError::SchemaViolation(format!(
                "action tag '{}' is not a member of the current schema",
                action.tag
            )));
        }

        Ok(AgentReply { reasoning, action })
    }
}

/// The `launch_app` variant for the given closed set of app names.
fn launch_app_schema(names: &[String]) -> ActionSchema {
    ActionSchema::new(
        LAUNCH_APP_TAG,
        "Launch an app from the home screen",
        json!({
            "type": "object",
            "properties": {
                "app_name": {
                    "type": "string",
                    "enum": names,
                    "description": "Name of the app to launch",
                }
            },
            "required": ["app_name"],
        }),
    )
}

fn exit_app_schema() -> ActionSchema {
    ActionSchema::new(
        EXIT_APP_TAG,
        "Exit the current app and return to the home screen",
        json!({"type": "object", "properties": {}, "required": []}),
    )
}

/// Compose the response schema for the current state. Pure; recomputed
/// every turn so late registry changes are always reflected.
pub fn compose_schema(
    current_app: Option<&dyn App>,
    registry: &AppRegistry,
) -> Result<ResponseSchema, AgentError> {
    match current_app {
        None => {
            let names = registry.names();
            if names.is_empty() {
                return Err(AgentError::Configuration(
                    "cannot compose home-screen schema with no registered apps".into(),
                ));
            }
            Ok(ResponseSchema::from_variants(vec![launch_app_schema(&names)]))
        }
        Some(app) => {
            let mut variants = app.action_schemas();
            let mut seen = HashSet::new();
            for variant in &variants {
                if variant.tag == LAUNCH_APP_TAG || variant.tag == EXIT_APP_TAG {
                    return Err(AgentError::Configuration(format!(
                        "app '{}' declares reserved action tag '{}'",
                        app.name(),
                        variant.tag
                    )));
                }
                if !seen.insert(variant.tag.clone()) {
                    return Err(AgentError::Configuration(format!(
                        "app '{}' declares duplicate action tag '{}'",
                        app.name(),
                        variant.tag
                    )));
                }
            }
            variants.push(exit_app_schema());
            Ok(ResponseSchema::from_variants(variants))
        }
    }
}
