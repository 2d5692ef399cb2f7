// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Somnia Profile Engine
//!
//! Turns free-text dream entries into per-dream pattern records and folds a
//! user's records into an aggregated unconscious profile.
//!
//! # Architecture
//!
//! - **Layer:** Learning & Profile Layer
//! - **Purpose:** Pattern records, aggregation and profile recomputation

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
