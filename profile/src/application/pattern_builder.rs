// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pattern Record Builder
//!
//! Converts one untrusted [`ExtractionResult`] into a strict
//! [`PatternRecord`]. Malformed optional fields fall back to defaults and
//! never raise; only missing identifiers or an empty dream text are errors.
//!
//! | Field | Rule |
//! |-------|------|
//! | `symbols` | string entries of a sequence, trimmed, blanks dropped, first 5 |
//! | `emotions` | same rule, first 3 |
//! | `archetype_affinity` | canonical keys with numeric values, clamped to [0,1] |
//! | `vividness`, `abstractness` | numeric → clamped to [0,1], otherwise 0.5 |
//! | `text_length` | character count of the raw text |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    Archetype, ArchetypeScores, DreamId, ExtractionResult, PatternRecord, ProfileError, UserId,
    MAX_EMOTIONS, MAX_SYMBOLS, NEUTRAL_STYLE_SCORE,
};

/// A dream as submitted for analysis. Every field is optional on the wire;
/// [`DreamSubmission::validate`] enforces the required ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DreamSubmission {
    #[serde(default)]
    pub dream_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Prior interpretation forwarded to the extraction service
    #[serde(default)]
    pub interpretation: Option<String>,
}

/// A submission whose identifiers and text are known to be present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDream {
    pub dream_id: DreamId,
    pub user_id: UserId,
    pub text: String,
    pub interpretation: Option<String>,
}

impl DreamSubmission {
    pub fn new(dream_id: impl Into<String>, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            dream_id: Some(dream_id.into()),
            user_id: Some(user_id.into()),
            text: Some(text.into()),
            interpretation: None,
        }
    }

    pub fn validate(&self) -> Result<ValidatedDream, ProfileError> {
        let dream_id = required(&self.dream_id, "dream_id")?;
        let user_id = required(&self.user_id, "user_id")?;
        let text = match self.text.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => return Err(ProfileError::InvalidInput("dream text is missing or empty".to_string())),
        };

        Ok(ValidatedDream {
            dream_id: DreamId::new(dream_id),
            user_id: UserId::new(user_id),
            text,
            interpretation: self
                .interpretation
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String, ProfileError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProfileError::InvalidInput(format!("{} is required", field)))
}

/// Build the canonical record for a validated dream.
pub fn build_pattern_record(
    dream: &ValidatedDream,
    extraction: &ExtractionResult,
    analyzed_at: DateTime<Utc>,
) -> PatternRecord {
    PatternRecord {
        dream_id: dream.dream_id.clone(),
        user_id: dream.user_id.clone(),
        symbols: string_list(extraction.symbols.as_ref(), MAX_SYMBOLS),
        emotions: string_list(extraction.emotions.as_ref(), MAX_EMOTIONS),
        archetype_affinity: affinity(extraction.archetype_hints.as_ref()),
        vividness: style_score(extraction.vividness_score.as_ref()),
        abstractness: style_score(extraction.abstractness_score.as_ref()),
        text_length: dream.text.chars().count() as u64,
        analyzed_at,
    }
}

/// Validate a submission and build its record in one step.
pub fn build_from_submission(
    submission: &DreamSubmission,
    extraction: &ExtractionResult,
    analyzed_at: DateTime<Utc>,
) -> Result<PatternRecord, ProfileError> {
    let dream = submission.validate()?;
    Ok(build_pattern_record(&dream, extraction, analyzed_at))
}

fn string_list(value: Option<&Value>, limit: usize) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

fn affinity(value: Option<&Value>) -> ArchetypeScores {
    let Some(Value::Object(hints)) = value else {
        return ArchetypeScores::zero();
    };
    hints
        .iter()
        .filter_map(|(key, value)| {
            let archetype = key.parse::<Archetype>().ok()?;
            let score = value.as_f64().filter(|v| v.is_finite())?;
            Some((archetype, score.clamp(0.0, 1.0)))
        })
        .collect()
}

fn style_score(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
        .unwrap_or(NEUTRAL_STYLE_SCORE)
}
