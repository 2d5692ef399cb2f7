// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `somnia analyze` - record dreams for a user and refresh their profile
//!
//! The input file (YAML or JSON) holds one dream entry or a list of them:
//!
//! ```yaml
//! - dream_id: d-001
//!   text: "I was swimming through a flooded library"
//!   extraction:            # optional with --extract
//!     symbols: [water, books]
//!     emotions: [awe]
//!     archetype_hints: { sage: 0.8 }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;

use somnia_profile::application::{AnalysisOutcome, DreamSubmission, RecomputeMode, RecomputeOutcome};
use somnia_profile::domain::engine_config::EngineConfig;
use somnia_profile::ExtractionResult;

use crate::engine::Engine;

#[derive(Args)]
pub struct AnalyzeCommand {
    /// User the dreams belong to
    #[arg(short, long)]
    user: String,

    /// Dream entries file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Call the configured extraction service instead of using the
    /// `extraction` field of each entry
    #[arg(long)]
    extract: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DreamEntry {
    pub dream_id: String,
    pub text: String,
    #[serde(default)]
    pub interpretation: Option<String>,
    #[serde(default)]
    pub extraction: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DreamInput {
    Many(Vec<DreamEntry>),
    One(DreamEntry),
}

/// Read dream entries from a YAML or JSON file.
pub fn load_entries(path: &Path) -> Result<Vec<DreamEntry>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let input: DreamInput = if is_json {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))?
    };

    Ok(match input {
        DreamInput::Many(entries) => entries,
        DreamInput::One(entry) => vec![entry],
    })
}

pub async fn execute(cmd: AnalyzeCommand, config: &EngineConfig) -> Result<()> {
    let entries = load_entries(&cmd.input)?;
    if entries.is_empty() {
        println!("{}", "No dream entries found in input.".yellow());
        return Ok(());
    }

    if !cmd.extract {
        if let Some(entry) = entries.iter().find(|e| e.extraction.is_none()) {
            anyhow::bail!(
                "Entry '{}' has no extraction result. Add one or pass --extract.",
                entry.dream_id
            );
        }
    }

    let engine = Engine::new(config).await?;
    if engine.repositories.pool.is_none() {
        println!(
            "{}",
            "⚠ Using in-memory storage: results are discarded when the command exits.".yellow()
        );
    }

    let mut last: Option<AnalysisOutcome> = None;
    for entry in entries {
        let mut submission = DreamSubmission::new(&entry.dream_id, &cmd.user, &entry.text);
        submission.interpretation = entry.interpretation.clone();

        let outcome = match entry.extraction {
            Some(extraction) if !cmd.extract => {
                engine
                    .analysis
                    .ingest_pattern(&submission, ExtractionResult::from(extraction), RecomputeMode::Await)
                    .await
            }
            _ => engine.analysis.analyze_dream(&submission, RecomputeMode::Await).await,
        }
        .with_context(|| format!("Failed to analyze dream '{}'", entry.dream_id))?;

        let record = &outcome.record;
        println!(
            "{} {}  symbols: [{}]  emotions: [{}]",
            "✓".green(),
            record.dream_id.as_str().bold(),
            record.symbols.join(", "),
            record.emotions.join(", ")
        );
        last = Some(outcome);
    }

    if let Some(outcome) = last {
        println!();
        match outcome.profile {
            RecomputeOutcome::Updated(profile) => {
                println!(
                    "{} primary {}, secondary {} ({} dreams)",
                    "Profile updated:".bold().green(),
                    profile.primary_archetype.as_str().bold(),
                    profile.secondary_archetype,
                    profile.total_dreams_analyzed
                );
            }
            RecomputeOutcome::InsufficientData { found, required } => {
                println!(
                    "{}",
                    format!(
                        "Profile not updated: {} of {} dreams needed for a full profile.",
                        found, required
                    )
                    .yellow()
                );
            }
            RecomputeOutcome::Scheduled => println!("Profile recomputation scheduled."),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_yaml_list() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
- dream_id: d1
  text: "flying over the sea"
  extraction:
    symbols: [sea]
- dream_id: d2
  text: "a locked door"
  interpretation: "something withheld"
"#
        )
        .unwrap();

        let entries = load_entries(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].dream_id, "d1");
        assert_eq!(entries[0].extraction, Some(serde_json::json!({"symbols": ["sea"]})));
        assert_eq!(entries[1].interpretation.as_deref(), Some("something withheld"));
        assert!(entries[1].extraction.is_none());
    }

    #[test]
    fn test_load_single_json_entry() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"dream_id": "d9", "text": "a red bird"}}"#).unwrap();

        let entries = load_entries(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "a red bird");
    }

    #[test]
    fn test_load_rejects_missing_text() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"dream_id": "d1"}}]"#).unwrap();
        assert!(load_entries(file.path()).is_err());
    }
}
