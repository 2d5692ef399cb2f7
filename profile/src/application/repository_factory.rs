// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory
//!
//! Creates concrete repository implementations from the configured storage
//! backend, keeping the domain layer free of infrastructure types.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::domain::repository::{PatternRepository, ProfileRepository, StorageBackend};
use crate::infrastructure::repositories::{
    InMemoryPatternRepository, InMemoryProfileRepository, PostgresPatternRepository,
    PostgresProfileRepository,
};
use crate::infrastructure::Database;

/// The two stores the engine reads and writes.
#[derive(Clone)]
pub struct Repositories {
    pub patterns: Arc<dyn PatternRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    /// Present for the PostgreSQL backend, used for migrations
    pub pool: Option<PgPool>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            patterns: Arc::new(InMemoryPatternRepository::new()),
            profiles: Arc::new(InMemoryProfileRepository::new()),
            pool: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            patterns: Arc::new(PostgresPatternRepository::new(pool.clone())),
            profiles: Arc::new(PostgresProfileRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }
}

/// Build the repositories for the configured backend, connecting to
/// PostgreSQL when required.
pub async fn create_repositories(backend: &StorageBackend) -> Result<Repositories> {
    match backend {
        StorageBackend::InMemory => {
            info!("Using in-memory storage; profiles are lost on exit");
            Ok(Repositories::in_memory())
        }
        StorageBackend::PostgreSQL(config) => {
            let database = Database::new(config).await?;
            info!(max_connections = config.max_connections, "Connected to PostgreSQL");
            Ok(Repositories::postgres(database.get_pool().clone()))
        }
    }
}
