// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Profile commands
//!
//! Commands: show, recompute, quick

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use somnia_profile::domain::engine_config::EngineConfig;
use somnia_profile::{Archetype, ProfileError, QuizResult, UnconsciousProfile, UserId};

use crate::engine::Engine;

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Show the stored profile of a user
    Show {
        #[arg(short, long)]
        user: String,

        /// Print the raw profile document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recompute a user's profile from their full dream history
    Recompute {
        #[arg(short, long)]
        user: String,
    },

    /// Seed a quick profile from an onboarding quiz result
    Quick {
        #[arg(short, long)]
        user: String,

        /// Primary archetype chosen in the quiz
        #[arg(long)]
        primary: Archetype,

        /// Optional secondary archetype
        #[arg(long)]
        secondary: Option<Archetype>,
    },
}

pub async fn handle_command(command: ProfileCommand, config: &EngineConfig) -> Result<()> {
    let engine = Engine::new(config).await?;

    match command {
        ProfileCommand::Show { user, json } => show(&engine, UserId::new(user), json).await,
        ProfileCommand::Recompute { user } => recompute(&engine, UserId::new(user)).await,
        ProfileCommand::Quick {
            user,
            primary,
            secondary,
        } => {
            let mut quiz = QuizResult::new(primary);
            if let Some(secondary) = secondary {
                quiz = quiz.with_secondary(secondary);
            }
            quick(&engine, UserId::new(user), quiz).await
        }
    }
}

async fn show(engine: &Engine, user_id: UserId, json: bool) -> Result<()> {
    let profile = engine
        .profiles
        .get_profile(&user_id)
        .await
        .context("Failed to load profile")?;

    let Some(profile) = profile else {
        println!("{}", format!("No profile stored for user {}", user_id).yellow());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }
    Ok(())
}

async fn recompute(engine: &Engine, user_id: UserId) -> Result<()> {
    match engine.profiles.recompute(&user_id).await {
        Ok(profile) => {
            println!("{}", "✓ Profile recomputed".green());
            print_profile(&profile);
            Ok(())
        }
        Err(ProfileError::InsufficientData { found, required }) => {
            println!(
                "{}",
                format!("Not enough dreams yet: {} of {} analyzed.", found, required).yellow()
            );
            Ok(())
        }
        Err(e) => Err(e).context("Profile recomputation failed"),
    }
}

async fn quick(engine: &Engine, user_id: UserId, quiz: QuizResult) -> Result<()> {
    match engine.profiles.seed_quick_profile(&user_id, &quiz).await {
        Ok(profile) => {
            println!("{}", "✓ Quick profile stored".green());
            print_profile(&profile);
            Ok(())
        }
        Err(ProfileError::QuickProfileLocked { total_dreams_analyzed }) => {
            println!(
                "{}",
                format!(
                    "Quick profile rejected: the full profile already covers {} dreams.",
                    total_dreams_analyzed
                )
                .yellow()
            );
            Ok(())
        }
        Err(e) => Err(e).context("Failed to store quick profile"),
    }
}

fn print_profile(profile: &UnconsciousProfile) {
    println!();
    println!("{} {}", "User:".bold(), profile.user_id);
    println!("  State: {}", profile.state.as_str());
    println!(
        "  Archetypes: {} / {}",
        profile.primary_archetype.as_str().bold(),
        profile.secondary_archetype
    );
    println!("  Dreams analyzed: {}", profile.total_dreams_analyzed);
    println!("  Last updated: {}", profile.last_updated.to_rfc3339());

    let ranked: Vec<_> = profile
        .archetype_scores
        .ranked()
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .collect();
    if !ranked.is_empty() {
        println!();
        println!("{}", "Archetype scores:".bold());
        for (archetype, score) in ranked {
            println!("  {:<10} {:.3}", archetype.as_str(), score);
        }
    }

    if !profile.recurring_symbols.is_empty() {
        println!();
        println!("{}", "Recurring symbols:".bold());
        for symbol in &profile.recurring_symbols {
            println!(
                "  {} ×{}  [{}]",
                symbol.symbol,
                symbol.count,
                symbol.emotions.join(", ")
            );
        }
    }

    if let Some(emotion) = &profile.dominant_emotion {
        println!();
        println!("{} {}", "Dominant emotion:".bold(), emotion);
    }

    let style = &profile.dream_style;
    println!();
    println!("{}", "Dream style:".bold());
    println!("  Vividness: {:.2}", style.vividness);
    println!("  Abstractness: {:.2}", style.abstractness);
    println!("  Average length: {:.0} characters", style.avg_length);
}
