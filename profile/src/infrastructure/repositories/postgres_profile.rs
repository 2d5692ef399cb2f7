// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Profile Repository
//!
//! `ProfileRepository` backed by the `unconscious_profiles` table. The whole
//! profile document lives in `profile_json`; state, archetypes and the dream
//! count are duplicated into plain columns for querying. Every save replaces
//! the full row in one statement.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::pattern::UserId;
use crate::domain::profile::UnconsciousProfile;
use crate::domain::repository::{ProfileRepository, RepositoryError};

pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn save(&self, profile: &UnconsciousProfile) -> Result<(), RepositoryError> {
        let profile_json = serde_json::to_value(profile)?;

        sqlx::query(
            r#"
            INSERT INTO unconscious_profiles (
                user_id, state, primary_archetype, secondary_archetype,
                total_dreams_analyzed, profile_json, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                state = EXCLUDED.state,
                primary_archetype = EXCLUDED.primary_archetype,
                secondary_archetype = EXCLUDED.secondary_archetype,
                total_dreams_analyzed = EXCLUDED.total_dreams_analyzed,
                profile_json = EXCLUDED.profile_json,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(profile.user_id.as_str())
        .bind(profile.state.as_str())
        .bind(profile.primary_archetype.as_str())
        .bind(profile.secondary_archetype.as_str())
        .bind(profile.total_dreams_analyzed as i64)
        .bind(profile_json)
        .bind(profile.last_updated)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save profile: {}", e)))?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<UnconsciousProfile>, RepositoryError> {
        let row = sqlx::query("SELECT profile_json FROM unconscious_profiles WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let value: serde_json::Value = row.try_get("profile_json")?;
                let profile = serde_json::from_value(value).map_err(|e| {
                    RepositoryError::Serialization(format!("Failed to deserialize profile: {}", e))
                })?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }
}
