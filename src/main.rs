//! # Axiom Shell
//!
//! Headless driver for the shell core: loads the configuration, replays a
//! scenario of client sessions and user input against the default window
//! management policy, and prints where focus ended up.

use anyhow::{Context, Result};
use axiom_shell::scenario::{Scenario, ScenarioRunner};
use axiom_shell::{LoggingShellReport, ShellConfig};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "axiom-shell")]
#[command(about = "Session and focus management core for the Axiom display server")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/axiom/shell.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Scenario to replay (TOML)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting Axiom Shell");
    info!("📄 Version: {}", axiom_shell::VERSION);

    // Load configuration
    let config = match ShellConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            info!("📝 Using default configuration");
            ShellConfig::default()
        }
    };

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => {
            info!("📭 No scenario given, nothing to replay");
            Scenario::default()
        }
    };

    let mut runner = ScenarioRunner::new(&config, Arc::new(LoggingShellReport));
    let outcome = runner.run(&scenario)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?;
        println!("{}", json);
    } else {
        print!("{}", outcome.render_text());
    }

    info!("🏁 Replay finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["axiom-shell"]).unwrap();
        assert!(!cli.debug);
        assert!(!cli.json);
        assert!(cli.scenario.is_none());
        assert_eq!(cli.config, "~/.config/axiom/shell.toml");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "axiom-shell",
            "--debug",
            "--json",
            "--scenario",
            "focus.toml",
            "-c",
            "shell.toml",
        ])
        .unwrap();
        assert!(cli.debug);
        assert!(cli.json);
        assert_eq!(cli.scenario.as_deref(), Some("focus.toml"));
        assert_eq!(cli.config, "shell.toml");
    }
}
