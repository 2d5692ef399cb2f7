// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: record building, aggregation, recomputation and the
//! dream analysis pipeline.

pub mod pattern_builder;
pub mod aggregation;
pub mod profile_service;
pub mod dream_analysis;
pub mod repository_factory;

use async_trait::async_trait;

use crate::domain::ProfileEvent;

/// Event bus trait for publishing domain events
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: ProfileEvent) -> anyhow::Result<()>;
}

pub use dream_analysis::{AnalysisOutcome, DreamAnalysisService, RecomputeMode, RecomputeOutcome};
pub use pattern_builder::{build_from_submission, build_pattern_record, DreamSubmission, ValidatedDream};
pub use repository_factory::{create_repositories, Repositories};
pub use profile_service::{spawn_recompute, ProfileService, StandardProfileService};
