// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in
//! `crate::domain::repository`.
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresPatternRepository** - `dream_patterns` table
//! - **PostgresProfileRepository** - `unconscious_profiles` table
//!
//! ## In-Memory Repositories
//!
//! HashMap-backed storage for tests and local runs:
//! - **InMemoryPatternRepository**
//! - **InMemoryProfileRepository**

pub mod postgres_pattern;
pub mod postgres_profile;

pub use postgres_pattern::PostgresPatternRepository;
pub use postgres_profile::PostgresProfileRepository;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::pattern::{DreamId, PatternRecord, UserId};
use crate::domain::profile::UnconsciousProfile;
use crate::domain::repository::{PatternRepository, ProfileRepository, RepositoryError};

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unknown("in-memory store lock poisoned".to_string())
}

#[derive(Clone, Default)]
pub struct InMemoryPatternRepository {
    records: Arc<RwLock<HashMap<DreamId, PatternRecord>>>,
}

impl InMemoryPatternRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatternRepository for InMemoryPatternRepository {
    async fn upsert(&self, record: &PatternRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.insert(record.dream_id.clone(), record.clone());
        Ok(())
    }

    async fn find_by_dream(&self, dream_id: &DreamId) -> Result<Option<PatternRecord>, RepositoryError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(dream_id).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<PatternRecord>, RepositoryError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.values().filter(|r| &r.user_id == user_id).cloned().collect())
    }

    async fn count_for_user(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.values().filter(|r| &r.user_id == user_id).count())
    }

    async fn delete(&self, dream_id: &DreamId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.remove(dream_id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<UserId, UnconsciousProfile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn save(&self, profile: &UnconsciousProfile) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.write().map_err(poisoned)?;
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<UnconsciousProfile>, RepositoryError> {
        let profiles = self.profiles.read().map_err(poisoned)?;
        Ok(profiles.get(user_id).cloned())
    }
}
