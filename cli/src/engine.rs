// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-process engine wiring
//!
//! Builds the repositories, event bus and services described by an
//! `EngineConfig` so commands can call the profile engine directly.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use somnia_profile::application::{
    create_repositories, DreamAnalysisService, ProfileService, Repositories, StandardProfileService,
};
use somnia_profile::domain::engine_config::EngineConfig;
use somnia_profile::infrastructure::{BroadcastEventBus, HttpPatternExtractor};

pub struct Engine {
    pub repositories: Repositories,
    pub event_bus: Arc<BroadcastEventBus>,
    pub profiles: Arc<dyn ProfileService>,
    pub analysis: DreamAnalysisService,
}

impl Engine {
    pub async fn new(config: &EngineConfig) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let backend = config.storage_backend()?;
        let repositories = create_repositories(&backend)
            .await
            .context("Failed to initialize storage")?;
        Self::with_repositories(config, repositories)
    }

    /// Wire services on top of already-built repositories.
    pub fn with_repositories(config: &EngineConfig, repositories: Repositories) -> Result<Self> {
        let event_bus = Arc::new(BroadcastEventBus::with_default_capacity());

        let profiles: Arc<dyn ProfileService> = Arc::new(StandardProfileService::new(
            repositories.patterns.clone(),
            repositories.profiles.clone(),
            event_bus.clone(),
        ));

        let mut analysis =
            DreamAnalysisService::new(repositories.patterns.clone(), profiles.clone(), event_bus.clone());
        if let Some(extraction) = &config.spec.extraction {
            debug!("Extraction service configured at {}", extraction.endpoint);
            let extractor = HttpPatternExtractor::from_config(extraction)
                .context("Failed to initialize extraction client")?;
            analysis = analysis.with_extractor(Arc::new(extractor));
        }

        Ok(Self {
            repositories,
            event_bus,
            profiles,
            analysis,
        })
    }
}
