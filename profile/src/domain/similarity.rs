// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Symbol-overlap similarity between dreams.
//! The dream-connection graph draws one edge per pair returned by
//! [`dream_connections`]; the layout itself lives in the front end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::pattern::{DreamId, PatternRecord};

/// Jaccard index of the two records' symbol sets.
///
/// Symmetric and in [0,1]. Zero when either dream has no symbols.
pub fn symbol_similarity(a: &PatternRecord, b: &PatternRecord) -> f64 {
    let left: BTreeSet<&str> = a.symbols.iter().map(String::as_str).collect();
    let right: BTreeSet<&str> = b.symbols.iter().map(String::as_str).collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamConnection {
    pub source: DreamId,
    pub target: DreamId,
    pub weight: f64,
    pub shared_symbols: Vec<String>,
}

/// Every unordered pair of dreams whose similarity reaches `threshold`.
///
/// The threshold is clamped into (0,1] and NaN counts as 1.0, so unrelated
/// dreams never connect.
/// Output is sorted by weight descending, then by dream ids.
pub fn dream_connections(records: &[PatternRecord], threshold: f64) -> Vec<DreamConnection> {
    let threshold = if threshold.is_nan() {
        1.0
    } else {
        threshold.clamp(f64::MIN_POSITIVE, 1.0)
    };
    let mut connections = Vec::new();

    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if a.dream_id == b.dream_id {
                continue;
            }
            let weight = symbol_similarity(a, b);
            if weight < threshold {
                continue;
            }
            let (source, target) = if a.dream_id <= b.dream_id { (a, b) } else { (b, a) };
            let target_symbols: BTreeSet<&str> = target.symbols.iter().map(String::as_str).collect();
            let shared_symbols = source
                .symbols
                .iter()
                .filter(|s| target_symbols.contains(s.as_str()))
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            connections.push(DreamConnection {
                source: source.dream_id.clone(),
                target: target.dream_id.clone(),
                weight,
                shared_symbols,
            });
        }
    }

    connections.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });
    connections
}
