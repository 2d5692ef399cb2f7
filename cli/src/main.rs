// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Somnia CLI
//!
//! The `somnia` binary drives the unconscious profile engine in-process.
//!
//! ## Commands
//!
//! - `somnia analyze --user U --input FILE [--extract]` - Record dreams and refresh the profile
//! - `somnia profile show|recompute|quick` - Inspect and maintain profiles
//! - `somnia config show|validate|generate` - Configuration management
//! - `somnia update [--dry-run]` - Apply database migrations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use somnia_cli::commands::{self, AnalyzeCommand, ConfigCommand, ProfileCommand, UpdateCommand};
use somnia_profile::domain::engine_config::EngineConfig;

/// Somnia - dream patterns and unconscious profiles
#[derive(Parser)]
#[command(name = "somnia")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SOMNIA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SOMNIA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true, env = "SOMNIA_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze dreams for a user
    #[command(name = "analyze")]
    Analyze {
        #[command(flatten)]
        command: AnalyzeCommand,
    },

    /// Profile operations
    #[command(name = "profile")]
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Update the Somnia database
    #[command(name = "update")]
    Update {
        #[command(flatten)]
        command: UpdateCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    if let Commands::Config { command } = command {
        init_logging(cli.log_level.as_deref().unwrap_or("info"), cli.log_format.as_deref())?;
        return commands::config::handle_command(command, cli.config).await;
    }

    let config = EngineConfig::load_or_default(cli.config).context("Failed to load configuration")?;
    let logging = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.logging.as_ref());
    let level = cli
        .log_level
        .as_deref()
        .or(logging.map(|l| l.level.as_str()))
        .unwrap_or("info");
    let format = cli.log_format.as_deref().or(logging.map(|l| l.format.as_str()));
    init_logging(level, format)?;

    match command {
        Commands::Analyze { command } => commands::analyze::execute(command, &config).await,
        Commands::Profile { command } => commands::profile::handle_command(command, &config).await,
        Commands::Update { command } => commands::update::execute(command, &config).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: Option<&str>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        Some("json") => builder.json().init(),
        _ => builder.compact().init(),
    }

    Ok(())
}
