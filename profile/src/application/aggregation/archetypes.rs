// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Archetype aggregation: sum affinities, normalize, rank.

use crate::domain::{Archetype, ArchetypeScores, PatternRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeSummary {
    /// Distribution summing to 1, or all zero when no record carried signal
    pub scores: ArchetypeScores,
    pub primary: Archetype,
    pub secondary: Archetype,
}

/// Fold every record's affinity vector into a normalized distribution.
///
/// A zero total is a valid "insufficient signal" state: scores stay zero
/// and primary/secondary fall to the first two canonical archetypes.
pub fn aggregate_archetypes(records: &[PatternRecord]) -> ArchetypeSummary {
    let mut totals = ArchetypeScores::zero();
    for record in records {
        totals.add(&record.archetype_affinity);
    }

    let scores = totals.normalized();
    let ranked = scores.ranked();

    ArchetypeSummary {
        scores,
        primary: ranked[0].0,
        secondary: ranked[1].0,
    }
}
