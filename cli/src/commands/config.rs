// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use somnia_profile::domain::engine_config::{EngineConfig, StorageBackendKind};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./somnia-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = EngineConfig::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. SOMNIA_CONFIG_PATH: {}",
            std::env::var("SOMNIA_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./somnia-config.yaml");
        println!("  4. ~/.somnia/config.yaml");
        println!("  5. /etc/somnia/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();
    println!("  Name: {}", config.metadata.name);

    println!();
    println!("{}", "Storage:".bold());
    let storage = &config.spec.storage;
    match storage.backend {
        StorageBackendKind::InMemory => println!("  Backend: in_memory"),
        StorageBackendKind::Postgres => {
            println!("  Backend: postgres");
            // env: references are shown as written; literal URLs may carry credentials
            let connection = match storage.connection_string.as_deref() {
                Some(value) if value.starts_with("env:") => value.to_string(),
                Some(_) => "(set)".to_string(),
                None => "(not set)".to_string(),
            };
            println!("  Connection: {}", connection);
            println!("  Max connections: {}", storage.max_connections);
        }
    }

    println!();
    println!("{}", "Extraction:".bold());
    match &config.spec.extraction {
        Some(extraction) => {
            println!("  Endpoint: {}", extraction.endpoint);
            println!(
                "  API key: {}",
                if extraction.api_key.is_some() { "(set)" } else { "(none)" }
            );
            println!("  Timeout: {}s", extraction.timeout_seconds);
        }
        None => println!("  {}", "(not configured)".dimmed()),
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = EngineConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;
    config.storage_backend().context("Storage backend cannot be resolved")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample).with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());

    Ok(())
}
