//! App for executing commands over SSH.
//!
//! Command execution goes through the system `ssh` client in batch mode, so
//! authentication rides on the operator's existing keys or agent. Every
//! command is bounded by an explicit execution timeout.

use ami_core::{ActionEnvelope, ActionSchema, App, AppError, AppOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Connection settings for the ssh app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_command_timeout() -> u64 {
    120
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 22,
            username: "root".to_string(),
            connect_timeout_secs: default_connect_timeout(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

/// Result of executing a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Seam for running one remote command. The production implementation
/// shells out; tests script outcomes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<CommandOutcome, AppError>;
}

/// Runs commands through the system `ssh` client.
pub struct SshCommandRunner {
    config: SshConfig,
}

impl SshCommandRunner {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CommandRunner for SshCommandRunner {
    async fn run(&self, command: &str) -> Result<CommandOutcome, AppError> {
        let destination = format!("{}@{}", self.config.username, self.config.host);
        let output = tokio::time::timeout(
            Duration::from_secs(self.config.command_timeout_secs),
            tokio::process::Command::new("ssh")
                .arg("-o")
                .arg("BatchMode=yes")
                .arg("-o")
                .arg(format!("ConnectTimeout={}", self.config.connect_timeout_secs))
                .arg("-o")
                .arg("StrictHostKeyChecking=accept-new")
                .arg("-p")
                .arg(self.config.port.to_string())
                .arg(destination)
                .arg("--")
                .arg(command)
                .output(),
        )
        .await
        .map_err(|_| AppError::Timeout)?
        .map_err(|e| AppError::Execution(e.to_string()))?;

        Ok(CommandOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SshAction {
    Ssh { commands: Vec<String> },
}

pub struct SshApp {
    config: SshConfig,
    description: String,
    runner: Arc<dyn CommandRunner>,
}

impl SshApp {
    pub fn new(config: SshConfig) -> Self {
        let runner = Arc::new(SshCommandRunner::new(config.clone()));
        Self::with_runner(config, runner)
    }

    pub fn with_runner(config: SshConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let description = format!(
            "Execute commands on the remote server via SSH. \
             You can send multiple commands at once, and they will be executed in sequence. \
             The commands will be executed on {} as user {}.",
            config.host, config.username
        );
        Self {
            config,
            description,
            runner,
        }
    }

    fn format_results(commands: &[String], outcomes: &[CommandOutcome]) -> String {
        let mut output = Vec::new();
        for (i, (command, outcome)) in commands.iter().zip(outcomes).enumerate() {
            output.push(format!("Command {}: {}", i + 1, command));
            output.push(format!("Exit code: {}", outcome.exit_code));
            output.push("Output:".to_string());
            let stdout = outcome.stdout.trim();
            output.push(if stdout.is_empty() {
                "(no output)".to_string()
            } else {
                stdout.to_string()
            });
            let stderr = outcome.stderr.trim();
            if !stderr.is_empty() {
                output.push("Errors:".to_string());
                output.push(stderr.to_string());
            }
            output.push(String::new());
        }
        output.join("\n")
    }
}

#[async_trait]
impl App for SshApp {
    fn name(&self) -> &str {
        "ssh"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn usage_prompt(&self) -> String {
        format!(
            "This is the SSH app. You can execute commands on the remote server at {}.\n\
             \n\
             Features:\n\
             - Execute one or more shell commands\n\
             - Commands are run in sequence\n\
             - Full output (stdout and stderr) is captured\n\
             - Exit codes are returned\n\
             \n\
             Example action:\n\
             {{\n\
                 \"type\": \"ssh\",\n\
                 \"commands\": [\n\
                     \"uptime\",\n\
                     \"df -h\",\n\
                     \"free -m\"\n\
                 ]\n\
             }}\n\
             \n\
             The response will include:\n\
             - The command that was executed\n\
             - Its exit code (0 means success)\n\
             - Standard output\n\
             - Standard error (if any)\n\
             \n\
             You are connected as: {}@{}",
            self.config.host, self.config.username, self.config.host
        )
    }

    fn action_schemas(&self) -> Vec<ActionSchema> {
        vec![ActionSchema::new(
            "ssh",
            "Execute shell commands on the remote server",
            json!({
                "type": "object",
                "properties": {
                    "commands": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of commands to execute on the server via SSH",
                    },
                },
                "required": ["commands"],
            }),
        )]
    }

    async fn handle_action(&self, action: ActionEnvelope) -> Result<AppOutput, AppError> {
        let SshAction::Ssh { commands } = action
            .decode()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        if commands.is_empty() {
            return Err(AppError::InvalidInput("no commands to execute".into()));
        }

        let mut outcomes = Vec::with_capacity(commands.len());
        for command in &commands {
            info!("Executing command: {}", command);
            let outcome = match self.runner.run(command).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Command '{}' failed: {}", command, e);
                    CommandOutcome {
                        exit_code: -1,
                        stdout: String::new(),
                        stderr: e.to_string(),
                    }
                }
            };
            info!("Command exit code: {}", outcome.exit_code);
            outcomes.push(outcome);
        }

        Ok(AppOutput::text(Self::format_results(&commands, &outcomes)))
    }
}
