// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Update Command
//!
//! `somnia update` applies the SQL migrations that create the
//! `dream_patterns` and `unconscious_profiles` tables.
//!
//! ```bash
//! # Apply all pending migrations
//! somnia update
//!
//! # Preview migrations without applying
//! somnia update --dry-run
//! ```
//!
//! The connection string comes from `spec.storage.connection_string` or
//! `SOMNIA_DATABASE_URL`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sqlx::postgres::PgPoolOptions;

use somnia_profile::domain::engine_config::EngineConfig;
use somnia_profile::domain::repository::StorageBackend;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Args)]
pub struct UpdateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: UpdateCommand, config: &EngineConfig) -> Result<()> {
    println!("{}", "Somnia Update".bold().green());

    let StorageBackend::PostgreSQL(postgres) = config.storage_backend()? else {
        anyhow::bail!(
            "Storage backend is in_memory; set spec.storage.connection_string or SOMNIA_DATABASE_URL to run updates."
        );
    };

    println!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&postgres.connection_string)
        .await
        .context("Failed to connect to database")?;

    let applied_count = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success")
        .fetch_all(&pool)
        .await
        .map(|rows| rows.len())
        .unwrap_or(0);

    let total_migrations = MIGRATOR.iter().count();

    println!(
        "Migration status: {} applied, {} total available.",
        applied_count, total_migrations
    );

    if applied_count < total_migrations {
        if cmd.dry_run {
            println!("Pending migrations found (Dry Run):");
            for migration in MIGRATOR.iter().skip(applied_count) {
                println!(" - {} {}", migration.version, migration.description);
            }
            println!("Skipping application due to --dry-run");
            return Ok(());
        }

        println!("Applying pending migrations...");
        MIGRATOR.run(&pool).await.context("Failed to apply migrations")?;
        println!("{}", "✓ Database updated successfully.".green());
    } else {
        println!("{}", "✓ Database is up to date.".green());
    }

    Ok(())
}
