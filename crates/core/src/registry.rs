//! App registry: the roster of launchable apps.

use crate::app::App;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of apps keyed by name. Registration is closed before the agent
/// loop starts; the loop only reads.
pub struct AppRegistry {
    apps: HashMap<String, Arc<dyn App>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self {
            apps: HashMap::new(),
        }
    }

    pub fn register(&mut self, app: Arc<dyn App>) -> &mut Self {
        self.apps.insert(app.name().to_string(), app);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn App>> {
        self.apps.get(name).cloned()
    }

    /// Registered app names, sorted so schema composition is deterministic.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.apps.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// `name: description` pairs for the home-screen prompt, in name order.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.names()
            .into_iter()
            .filter_map(|name| {
                self.apps
                    .get(&name)
                    .map(|app| (name.clone(), app.description().to_string()))
            })
            .collect()
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::schema::ActionSchema;
    use crate::types::{ActionEnvelope, AppOutput};
    use async_trait::async_trait;
    use serde_json::json;

    struct StubApp {
        name: &'static str,
    }

    #[async_trait]
    impl App for StubApp {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "a stub"
        }

        fn action_schemas(&self) -> Vec<ActionSchema> {
            vec![ActionSchema::new("noop", "does nothing", json!({"type": "object"}))]
        }

        async fn handle_action(&self, _action: ActionEnvelope) -> Result<AppOutput, AppError> {
            Ok(AppOutput::text("ok"))
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = AppRegistry::new();
        registry.register(Arc::new(StubApp { name: "echo" }));

        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = AppRegistry::new();
        registry
            .register(Arc::new(StubApp { name: "ssh" }))
            .register(Arc::new(StubApp { name: "browser" }))
            .register(Arc::new(StubApp { name: "echo" }));

        assert_eq!(registry.names(), vec!["browser", "echo", "ssh"]);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = AppRegistry::new();
        registry.register(Arc::new(StubApp { name: "echo" }));
        registry.register(Arc::new(StubApp { name: "echo" }));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_empty() {
        let registry = AppRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_descriptions() {
        let mut registry = AppRegistry::new();
        registry.register(Arc::new(StubApp { name: "echo" }));
        let descriptions = registry.descriptions();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].0, "echo");
        assert_eq!(descriptions[0].1, "a stub");
    }
}
