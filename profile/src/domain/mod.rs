// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: archetypes, pattern records, profiles and the persistence
//! and extraction ports they depend on.

pub mod archetype;
pub mod pattern;
pub mod extraction;
pub mod profile;
pub mod events;
pub mod error;
pub mod repository;
pub mod similarity;
pub mod engine_config;

pub use archetype::*;
pub use pattern::*;
pub use extraction::*;
pub use profile::*;
pub use events::*;
pub use error::*;
