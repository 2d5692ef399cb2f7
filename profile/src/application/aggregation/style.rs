// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::{DreamStyle, PatternRecord};

/// Unweighted means of vividness, abstractness and text length. Every dream
/// counts equally regardless of age; an empty slice yields zeros.
pub fn aggregate_style(records: &[PatternRecord]) -> DreamStyle {
    if records.is_empty() {
        return DreamStyle {
            vividness: 0.0,
            abstractness: 0.0,
            avg_length: 0.0,
        };
    }

    let n = records.len() as f64;
    let (vividness, abstractness, length) = records.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (acc.0 + r.vividness, acc.1 + r.abstractness, acc.2 + r.text_length as f64)
    });

    DreamStyle {
        vividness: vividness / n,
        abstractness: abstractness / n,
        avg_length: length / n,
    }
}
