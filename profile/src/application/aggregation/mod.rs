// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Profile Aggregation
//!
//! Pure functions over an explicit snapshot of a user's pattern records.
//! No aggregator keeps state between calls and none depends on another's
//! output; [`fold_profile`] runs all three and merges them into one
//! profile document.

pub mod archetypes;
pub mod symbols;
pub mod style;

use chrono::{DateTime, Utc};

use crate::domain::{PatternRecord, ProfileState, UnconsciousProfile, UserId};

pub use archetypes::{aggregate_archetypes, ArchetypeSummary};
pub use style::aggregate_style;
pub use symbols::{aggregate_symbols, SymbolSummary};

/// Fold the full history of a user into a full-state profile.
///
/// The caller enforces the minimum-sample gate; this function only needs a
/// non-empty slice to name two archetypes meaningfully.
pub fn fold_profile(user_id: UserId, records: &[PatternRecord], now: DateTime<Utc>) -> UnconsciousProfile {
    let archetypes = aggregate_archetypes(records);
    let symbols = aggregate_symbols(records);
    let dream_style = aggregate_style(records);

    UnconsciousProfile {
        user_id,
        state: ProfileState::Full,
        primary_archetype: archetypes.primary,
        secondary_archetype: archetypes.secondary,
        archetype_scores: archetypes.scores,
        recurring_symbols: symbols.recurring_symbols,
        emotion_distribution: symbols.emotion_distribution,
        dominant_emotion: symbols.dominant_emotion,
        dream_style,
        total_dreams_analyzed: records.len() as u64,
        last_updated: now,
    }
}
