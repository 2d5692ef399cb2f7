// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the two aggregates of the profile engine. The
//! interfaces live in the domain layer and are implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Key | Implementations |
//! |-------|-----------|-----|----------------|
//! | `PatternRepository` | `PatternRecord` | `dream_id` | `InMemoryPatternRepository`, `PostgresPatternRepository` |
//! | `ProfileRepository` | `UnconsciousProfile` | `user_id` | `InMemoryProfileRepository`, `PostgresProfileRepository` |
//!
//! Both `upsert`/`save` calls are whole-row replacements in a single
//! statement, so a failed call never leaves a partially-written row. No
//! transaction spans the two repositories.

use async_trait::async_trait;

use crate::domain::pattern::{DreamId, PatternRecord, UserId};
use crate::domain::profile::UnconsciousProfile;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Repository interface for per-dream pattern records
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Insert or replace the record keyed by its dream id
    async fn upsert(&self, record: &PatternRecord) -> Result<(), RepositoryError>;

    /// Find the record for one dream
    async fn find_by_dream(&self, dream_id: &DreamId) -> Result<Option<PatternRecord>, RepositoryError>;

    /// All records of a user, in no particular order
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<PatternRecord>, RepositoryError>;

    /// Number of records of a user
    async fn count_for_user(&self, user_id: &UserId) -> Result<usize, RepositoryError>;

    /// Delete the record of a dream (cascade from dream deletion)
    async fn delete(&self, dream_id: &DreamId) -> Result<(), RepositoryError>;
}

/// Repository interface for per-user profiles
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace the whole profile document
    async fn save(&self, profile: &UnconsciousProfile) -> Result<(), RepositoryError>;

    /// Find the profile of a user
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<UnconsciousProfile>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
