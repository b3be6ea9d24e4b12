use ami_apps::{SshConfig, DEFAULT_USER_AGENT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_PATH: &str = "ami.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub apps: AppsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppsConfig {
    #[serde(default = "default_true")]
    pub echo: bool,
    #[serde(default)]
    pub ssh: Option<SshConfig>,
    #[serde(default)]
    pub browser: Option<BrowserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_browser_timeout")]
    pub timeout_secs: u64,
}

fn default_history_window() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_browser_timeout() -> u64 {
    30
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            echo: true,
            ssh: None,
            browser: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-2024-08-06".to_string(),
                api_key: None,
                history_window: default_history_window(),
            },
            apps: AppsConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Endpoint, overridable through `AMI_LLM_ENDPOINT`.
    pub fn endpoint(&self) -> String {
        std::env::var("AMI_LLM_ENDPOINT").unwrap_or_else(|_| self.endpoint.clone())
    }

    /// Model, overridable through `AMI_LLM_MODEL`.
    pub fn model(&self) -> String {
        std::env::var("AMI_LLM_MODEL").unwrap_or_else(|_| self.model.clone())
    }

    /// API key: `AMI_LLM_API_KEY` wins over the config file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var("AMI_LLM_API_KEY")
            .ok()
            .or_else(|| self.api_key.clone())
    }
}

impl Config {
    pub fn exists() -> bool {
        Path::new(CONFIG_PATH).exists()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.endpoint().trim().is_empty() {
            anyhow::bail!("LLM endpoint must not be empty");
        }
        if self.llm.model().trim().is_empty() {
            anyhow::bail!("LLM model must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_enable_only_echo() {
        let config = Config::default();
        assert!(config.apps.echo);
        assert!(config.apps.ssh.is_none());
        assert!(config.apps.browser.is_none());
        assert_eq!(config.llm.history_window, 10);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
llm:
  endpoint: "http://localhost:8000/v1"
  model: "local-model"
apps:
  echo: true
  ssh:
    host: "build-box"
    port: 2222
    username: "ci"
  browser:
    timeout_secs: 10
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.endpoint, "http://localhost:8000/v1");
        let ssh = config.apps.ssh.unwrap();
        assert_eq!(ssh.host, "build-box");
        assert_eq!(ssh.port, 2222);
        assert_eq!(ssh.username, "ci");
        let browser = config.apps.browser.unwrap();
        assert_eq!(browser.timeout_secs, 10);
        assert_eq!(browser.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "llm:\n  endpoint: \"http://localhost:9999\"\n  model: \"m\""
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.llm.model, "m");
        assert!(config.apps.echo);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = Config::load_from(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = Config::default();
        config.llm.model = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
