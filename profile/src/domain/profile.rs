// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Unconscious Profile
//!
//! Per-user aggregate derived from every pattern record of that user. The
//! profile is a materialized view: it has no identity beyond the user key
//! and every full recomputation replaces it wholesale.
//!
//! ## States
//!
//! - **Quick**: seeded from the onboarding quiz before enough dreams exist.
//!   `total_dreams_analyzed` is pinned to 1.
//! - **Full**: folded from at least [`MIN_DREAMS_FOR_FULL_PROFILE`] pattern
//!   records. Reaching it latches; quick writes are rejected from then on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::archetype::{Archetype, ArchetypeScores};
use super::pattern::{UserId, NEUTRAL_STYLE_SCORE};

/// Pattern records required before the full aggregation takes over.
pub const MIN_DREAMS_FOR_FULL_PROFILE: usize = 5;

pub const MAX_RECURRING_SYMBOLS: usize = 5;

/// `total_dreams_analyzed` reported by a quiz-seeded profile.
pub const QUICK_PROFILE_DREAM_COUNT: u64 = 1;

const QUIZ_PRIMARY_WEIGHT: f64 = 0.6;
const QUIZ_SECONDARY_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileState {
    Quick,
    Full,
}

impl ProfileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileState::Quick => "quick",
            ProfileState::Full => "full",
        }
    }
}

/// A symbol seen across dreams, with every emotion that appeared in any
/// dream containing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringSymbol {
    pub symbol: String,
    pub count: u64,
    pub emotions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DreamStyle {
    pub vividness: f64,
    pub abstractness: f64,
    pub avg_length: f64,
}

impl DreamStyle {
    pub fn neutral() -> Self {
        Self {
            vividness: NEUTRAL_STYLE_SCORE,
            abstractness: NEUTRAL_STYLE_SCORE,
            avg_length: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnconsciousProfile {
    pub user_id: UserId,
    pub state: ProfileState,
    pub primary_archetype: Archetype,
    pub secondary_archetype: Archetype,
    pub archetype_scores: ArchetypeScores,
    pub recurring_symbols: Vec<RecurringSymbol>,
    pub emotion_distribution: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<String>,
    pub dream_style: DreamStyle,
    pub total_dreams_analyzed: u64,
    pub last_updated: DateTime<Utc>,
}

impl UnconsciousProfile {
    /// Build a provisional profile from an onboarding quiz answer.
    pub fn quick(user_id: UserId, quiz: &QuizResult, now: DateTime<Utc>) -> Self {
        let (primary_archetype, secondary_archetype, archetype_scores) = quiz.seed_scores();
        Self {
            user_id,
            state: ProfileState::Quick,
            primary_archetype,
            secondary_archetype,
            archetype_scores,
            recurring_symbols: Vec::new(),
            emotion_distribution: BTreeMap::new(),
            dominant_emotion: None,
            dream_style: DreamStyle::neutral(),
            total_dreams_analyzed: QUICK_PROFILE_DREAM_COUNT,
            last_updated: now,
        }
    }

    /// True once the full aggregation owns this profile. Quick writes must
    /// not replace a latched profile.
    pub fn is_latched(&self) -> bool {
        self.total_dreams_analyzed >= MIN_DREAMS_FOR_FULL_PROFILE as u64
    }

    /// Equality ignoring `last_updated`.
    pub fn same_content(&self, other: &Self) -> bool {
        let mut other = other.clone();
        other.last_updated = self.last_updated;
        *self == other
    }
}

/// Outcome of the onboarding quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub primary_archetype: Archetype,
    #[serde(default)]
    pub secondary_archetype: Option<Archetype>,
    /// Raw per-archetype quiz tallies, when the quiz reports them.
    #[serde(default)]
    pub archetype_scores: Option<ArchetypeScores>,
}

impl QuizResult {
    pub fn new(primary_archetype: Archetype) -> Self {
        Self {
            primary_archetype,
            secondary_archetype: None,
            archetype_scores: None,
        }
    }

    pub fn with_secondary(mut self, secondary: Archetype) -> Self {
        self.secondary_archetype = Some(secondary);
        self
    }

    pub fn with_scores(mut self, scores: ArchetypeScores) -> Self {
        self.archetype_scores = Some(scores);
        self
    }

    fn seed_scores(&self) -> (Archetype, Archetype, ArchetypeScores) {
        let secondary = self
            .secondary_archetype
            .filter(|s| *s != self.primary_archetype);

        // Negative or non-finite tallies carry no weight.
        let tallies = self.archetype_scores.map(|raw| {
            raw.iter()
                .map(|(archetype, value)| (archetype, if value.is_finite() && value > 0.0 { value } else { 0.0 }))
                .collect::<ArchetypeScores>()
        });

        if let Some(tallies) = tallies.filter(|s| s.total() > 0.0 && s.total().is_finite()) {
            let scores = tallies.normalized();
            let runner_up = next_ranked(&scores, self.primary_archetype);
            return (self.primary_archetype, secondary.unwrap_or(runner_up), scores);
        }

        let mut scores = ArchetypeScores::zero();
        match secondary {
            Some(secondary) => {
                scores.set(self.primary_archetype, QUIZ_PRIMARY_WEIGHT);
                scores.set(secondary, QUIZ_SECONDARY_WEIGHT);
                (self.primary_archetype, secondary, scores)
            }
            None => {
                scores.set(self.primary_archetype, 1.0);
                let runner_up = next_ranked(&scores, self.primary_archetype);
                (self.primary_archetype, runner_up, scores)
            }
        }
    }
}

/// Highest-ranked archetype other than `primary`.
fn next_ranked(scores: &ArchetypeScores, primary: Archetype) -> Archetype {
    scores
        .ranked()
        .into_iter()
        .map(|(archetype, _)| archetype)
        .find(|a| *a != primary)
        .unwrap_or(primary)
}
