// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The twelve archetypes a dream can resonate with, and the dense score
//! vector keyed by them.
//!
//! The declaration order of [`Archetype`] is the canonical order. Every
//! tie-break in the engine falls back to it, so reordering the variants
//! changes which archetype a user is shown.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Innocent,
    Sage,
    Explorer,
    Outlaw,
    Magician,
    Hero,
    Lover,
    Jester,
    Everyman,
    Caregiver,
    Ruler,
    Creator,
}

impl Archetype {
    pub const COUNT: usize = 12;

    /// All archetypes in canonical order.
    pub const ALL: [Archetype; Archetype::COUNT] = [
        Archetype::Innocent,
        Archetype::Sage,
        Archetype::Explorer,
        Archetype::Outlaw,
        Archetype::Magician,
        Archetype::Hero,
        Archetype::Lover,
        Archetype::Jester,
        Archetype::Everyman,
        Archetype::Caregiver,
        Archetype::Ruler,
        Archetype::Creator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Innocent => "innocent",
            Archetype::Sage => "sage",
            Archetype::Explorer => "explorer",
            Archetype::Outlaw => "outlaw",
            Archetype::Magician => "magician",
            Archetype::Hero => "hero",
            Archetype::Lover => "lover",
            Archetype::Jester => "jester",
            Archetype::Everyman => "everyman",
            Archetype::Caregiver => "caregiver",
            Archetype::Ruler => "ruler",
            Archetype::Creator => "creator",
        }
    }

    /// Position in the canonical order.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown archetype: '{0}'")]
pub struct UnknownArchetype(pub String);

impl FromStr for Archetype {
    type Err = UnknownArchetype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownArchetype(s.to_string()))
    }
}

/// One real value per archetype.
///
/// Serialized as a JSON object keyed by archetype name in canonical order.
/// Deserialization treats missing keys as zero and ignores unknown keys, so
/// rows written before an archetype rename still load.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArchetypeScores([f64; Archetype::COUNT]);

impl ArchetypeScores {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, archetype: Archetype) -> f64 {
        self.0[archetype.index()]
    }

    pub fn set(&mut self, archetype: Archetype, value: f64) {
        self.0[archetype.index()] = value;
    }

    pub fn add(&mut self, other: &ArchetypeScores) {
        for (slot, value) in self.0.iter_mut().zip(other.0.iter()) {
            *slot += value;
        }
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Divide every slot by the total. A zero total leaves every slot at 0.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return Self::zero();
        }
        let mut out = *self;
        for slot in out.0.iter_mut() {
            *slot /= total;
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (Archetype, f64)> + '_ {
        Archetype::ALL.iter().map(move |a| (*a, self.get(*a)))
    }

    /// Archetypes sorted by score descending. The sort is stable over the
    /// canonical order, so equal scores keep canonical precedence.
    pub fn ranked(&self) -> Vec<(Archetype, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

impl FromIterator<(Archetype, f64)> for ArchetypeScores {
    fn from_iter<I: IntoIterator<Item = (Archetype, f64)>>(iter: I) -> Self {
        let mut scores = Self::zero();
        for (archetype, value) in iter {
            scores.set(archetype, value);
        }
        scores
    }
}

impl Serialize for ArchetypeScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Archetype::COUNT))?;
        for (archetype, value) in self.iter() {
            map.serialize_entry(archetype.as_str(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ArchetypeScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| key.parse::<Archetype>().ok().map(|a| (a, value)))
            .collect())
    }
}
