// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Symbol and emotion aggregation.
//!
//! Symbols are compared exactly as stored (case-sensitive). A symbol's
//! emotion set is the union of the emotions of every dream it appeared in.
//! Emotions are counted per list entry with no de-duplication inside a
//! record.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{PatternRecord, RecurringSymbol, MAX_RECURRING_SYMBOLS};

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSummary {
    pub recurring_symbols: Vec<RecurringSymbol>,
    pub emotion_distribution: BTreeMap<String, f64>,
    pub dominant_emotion: Option<String>,
}

#[derive(Default)]
struct SymbolTally {
    count: u64,
    emotions: BTreeSet<String>,
}

pub fn aggregate_symbols(records: &[PatternRecord]) -> SymbolSummary {
    let mut symbols: HashMap<&str, SymbolTally> = HashMap::new();
    let mut emotions: BTreeMap<&str, u64> = BTreeMap::new();

    for record in records {
        for symbol in &record.symbols {
            let tally = symbols.entry(symbol.as_str()).or_default();
            tally.count += 1;
            tally.emotions.extend(record.emotions.iter().cloned());
        }
        for emotion in &record.emotions {
            *emotions.entry(emotion.as_str()).or_insert(0) += 1;
        }
    }

    SymbolSummary {
        recurring_symbols: rank_symbols(symbols),
        emotion_distribution: distribution(&emotions),
        dominant_emotion: dominant(&emotions),
    }
}

/// Top symbols by count; equal counts order by symbol.
fn rank_symbols(symbols: HashMap<&str, SymbolTally>) -> Vec<RecurringSymbol> {
    let mut ranked: Vec<_> = symbols.into_iter().collect();
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(MAX_RECURRING_SYMBOLS)
        .map(|(symbol, tally)| RecurringSymbol {
            symbol: symbol.to_string(),
            count: tally.count,
            emotions: tally.emotions.into_iter().collect(),
        })
        .collect()
}

fn distribution(counts: &BTreeMap<&str, u64>) -> BTreeMap<String, f64> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }
    counts
        .iter()
        .map(|(emotion, count)| (emotion.to_string(), *count as f64 / total as f64))
        .collect()
}

/// Highest raw count. Ties go to the alphabetically first emotion: the map
/// iterates in key order and only a strictly greater count replaces the
/// current pick.
fn dominant(counts: &BTreeMap<&str, u64>) -> Option<String> {
    let mut best: Option<(&str, u64)> = None;
    for (emotion, count) in counts {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((*emotion, *count)),
        }
    }
    best.map(|(emotion, _)| emotion.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregation::tests::record_with_symbols;

    #[test]
    fn test_symbol_ranking() {
        let records = vec![
            record_with_symbols(0, &["water", "fire"], &["fear"]),
            record_with_symbols(1, &["water", "fire"], &["joy"]),
            record_with_symbols(2, &["water"], &[]),
        ];
        let summary = aggregate_symbols(&records);

        assert_eq!(summary.recurring_symbols[0].symbol, "water");
        assert_eq!(summary.recurring_symbols[0].count, 3);
        assert_eq!(summary.recurring_symbols[1].symbol, "fire");
        assert_eq!(summary.recurring_symbols[1].count, 2);
    }

    #[test]
    fn test_co_occurring_emotions_are_unioned() {
        let records = vec![
            record_with_symbols(0, &["door"], &["fear", "awe"]),
            record_with_symbols(1, &["door", "key"], &["relief"]),
        ];
        let summary = aggregate_symbols(&records);

        let door = &summary.recurring_symbols[0];
        assert_eq!(door.symbol, "door");
        assert_eq!(door.emotions, vec!["awe", "fear", "relief"]);

        let key = &summary.recurring_symbols[1];
        assert_eq!(key.emotions, vec!["relief"]);
    }

    #[test]
    fn test_symbols_are_case_sensitive_and_capped() {
        let records = vec![
            record_with_symbols(0, &["Moon", "moon", "a", "b", "c"], &[]),
            record_with_symbols(1, &["d", "e"], &[]),
        ];
        let summary = aggregate_symbols(&records);
        assert_eq!(summary.recurring_symbols.len(), 5);
        let names: Vec<_> = summary.recurring_symbols.iter().map(|s| s.symbol.as_str()).collect();
        // all count 1, ordered by symbol
        assert_eq!(names, vec!["Moon", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_emotion_distribution_counts_duplicates() {
        let records = vec![
            record_with_symbols(0, &[], &["fear", "fear", "joy"]),
            record_with_symbols(1, &[], &["joy"]),
        ];
        let summary = aggregate_symbols(&records);

        assert_eq!(summary.emotion_distribution["fear"], 0.5);
        assert_eq!(summary.emotion_distribution["joy"], 0.5);
        let total: f64 = summary.emotion_distribution.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_emotion_tie_is_alphabetical() {
        let records = vec![
            record_with_symbols(0, &[], &["wonder", "anxiety"]),
            record_with_symbols(1, &[], &["wonder", "anxiety", "calm"]),
        ];
        assert_eq!(aggregate_symbols(&records).dominant_emotion.as_deref(), Some("anxiety"));

        let reversed: Vec<_> = records.into_iter().rev().collect();
        assert_eq!(aggregate_symbols(&reversed).dominant_emotion.as_deref(), Some("anxiety"));
    }

    #[test]
    fn test_no_emotions() {
        let records = vec![record_with_symbols(0, &["water"], &[])];
        let summary = aggregate_symbols(&records);
        assert!(summary.emotion_distribution.is_empty());
        assert!(summary.dominant_emotion.is_none());
        assert!(summary.recurring_symbols[0].emotions.is_empty());
    }
}
