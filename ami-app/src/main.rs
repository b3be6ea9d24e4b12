use ami_apps::{BrowserApp, EchoApp, HttpPageFetcher, SshApp};
use ami_core::{AgentLoop, AppRegistry};
use ami_interfaces::TerminalGate;
use ami_providers::OpenAiCompatibleTransport;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                  AMI — Agent Machine Interface                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = if Config::exists() {
        match Config::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("❌ Failed to load config: {}", e);
                eprintln!("💡 Tip: delete {} to fall back to defaults", config::CONFIG_PATH);
                return Err(e);
            }
        }
    } else {
        println!("No {} found, using defaults.", config::CONFIG_PATH);
        Config::default()
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {}", e);
        return Err(e);
    }

    let registry = build_registry(&config)?;

    println!("Using model: {} via {}", config.llm.model(), config.llm.endpoint());
    println!("Registered apps: {}", registry.names().join(", "));
    println!();
    println!("Starting autonomous agent system");
    println!("The agent will request permission before taking any actions.");
    println!("Initial state: Home Screen");
    println!();

    let transport = OpenAiCompatibleTransport::new(
        config.llm.endpoint(),
        config.llm.api_key(),
        config.llm.model(),
    );
    let mut agent = AgentLoop::new(registry, transport, TerminalGate::new())
        .with_history_window(config.llm.history_window);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            Ok(())
        }
        result = agent.run() => {
            result.map_err(Into::into)
        }
    }
}

fn build_registry(config: &Config) -> Result<AppRegistry> {
    let mut registry = AppRegistry::new();

    if config.apps.echo {
        registry.register(Arc::new(EchoApp));
    }

    if let Some(ssh) = &config.apps.ssh {
        registry.register(Arc::new(SshApp::new(ssh.clone())));
    }

    if let Some(browser) = &config.apps.browser {
        let fetcher = HttpPageFetcher::new(
            &browser.user_agent,
            Duration::from_secs(browser.timeout_secs),
        )
        .context("Failed to initialize browser HTTP client")?;
        let app = BrowserApp::new(Arc::new(fetcher))
            .context("Failed to initialize browser app")?;
        registry.register(Arc::new(app));
    }

    if registry.is_empty() {
        eprintln!("❌ No apps enabled in configuration");
        eprintln!("💡 Tip: enable at least the echo app under 'apps:'");
        anyhow::bail!("no apps enabled");
    }

    Ok(registry)
}
