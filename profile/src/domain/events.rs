// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the profile engine
//! Published to the EventBus for observability and for the downstream
//! consumers (growth quests, narrative e-mails) that react to profile changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::archetype::Archetype;
use super::pattern::{DreamId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileEvent {
    /// A dream was (re-)analyzed and its pattern record stored
    PatternRecorded {
        dream_id: DreamId,
        user_id: UserId,
        symbol_count: usize,
        emotion_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A full recomputation replaced the user's profile
    ProfileRecomputed {
        user_id: UserId,
        primary_archetype: Archetype,
        secondary_archetype: Archetype,
        total_dreams_analyzed: u64,
        timestamp: DateTime<Utc>,
    },

    /// Recomputation was requested below the sample threshold
    RecomputeSkipped {
        user_id: UserId,
        found: usize,
        required: usize,
        timestamp: DateTime<Utc>,
    },

    /// A quiz result seeded a quick profile
    QuickProfileSeeded {
        user_id: UserId,
        primary_archetype: Archetype,
        timestamp: DateTime<Utc>,
    },

    /// A quiz result arrived after the full profile latched
    QuickProfileRejected {
        user_id: UserId,
        total_dreams_analyzed: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ProfileEvent {
    pub fn user_id(&self) -> &UserId {
        match self {
            ProfileEvent::PatternRecorded { user_id, .. } => user_id,
            ProfileEvent::ProfileRecomputed { user_id, .. } => user_id,
            ProfileEvent::RecomputeSkipped { user_id, .. } => user_id,
            ProfileEvent::QuickProfileSeeded { user_id, .. } => user_id,
            ProfileEvent::QuickProfileRejected { user_id, .. } => user_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ProfileEvent::PatternRecorded { timestamp, .. } => *timestamp,
            ProfileEvent::ProfileRecomputed { timestamp, .. } => *timestamp,
            ProfileEvent::RecomputeSkipped { timestamp, .. } => *timestamp,
            ProfileEvent::QuickProfileSeeded { timestamp, .. } => *timestamp,
            ProfileEvent::QuickProfileRejected { timestamp, .. } => *timestamp,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ProfileEvent::PatternRecorded { .. } => "pattern_recorded",
            ProfileEvent::ProfileRecomputed { .. } => "profile_recomputed",
            ProfileEvent::RecomputeSkipped { .. } => "recompute_skipped",
            ProfileEvent::QuickProfileSeeded { .. } => "quick_profile_seeded",
            ProfileEvent::QuickProfileRejected { .. } => "quick_profile_rejected",
        }
    }
}
