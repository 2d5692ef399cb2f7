// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::archetype::ArchetypeScores;

pub const MAX_SYMBOLS: usize = 5;
pub const MAX_EMOTIONS: usize = 3;

/// Score used for vividness/abstractness when the extraction gave none.
pub const NEUTRAL_STYLE_SCORE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DreamId(pub String);

impl DreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured extraction of a single dream.
///
/// Only built through `application::pattern_builder::build_pattern_record`,
/// which enforces the length limits and the [0,1] range on every score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub dream_id: DreamId,
    pub user_id: UserId,
    pub symbols: Vec<String>,
    pub emotions: Vec<String>,
    pub archetype_affinity: ArchetypeScores,
    pub vividness: f64,
    pub abstractness: f64,
    /// Character count of the source text.
    pub text_length: u64,
    pub analyzed_at: DateTime<Utc>,
}
