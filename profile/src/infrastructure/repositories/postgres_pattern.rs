// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Pattern Repository
//!
//! `PatternRepository` backed by the `dream_patterns` table. One row per
//! dream; list columns and the affinity map are stored as JSONB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::pattern::{DreamId, PatternRecord, UserId};
use crate::domain::repository::{PatternRepository, RepositoryError};

pub struct PostgresPatternRepository {
    pool: PgPool,
}

impl PostgresPatternRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<PatternRecord, RepositoryError> {
    let dream_id: String = row.try_get("dream_id")?;
    let user_id: String = row.try_get("user_id")?;
    let symbols: serde_json::Value = row.try_get("symbols")?;
    let emotions: serde_json::Value = row.try_get("emotions")?;
    let affinity: serde_json::Value = row.try_get("archetype_affinity")?;
    let text_length: i64 = row.try_get("text_length")?;
    let analyzed_at: DateTime<Utc> = row.try_get("analyzed_at")?;

    Ok(PatternRecord {
        dream_id: DreamId(dream_id),
        user_id: UserId(user_id),
        symbols: serde_json::from_value(symbols)?,
        emotions: serde_json::from_value(emotions)?,
        archetype_affinity: serde_json::from_value(affinity)?,
        vividness: row.try_get("vividness")?,
        abstractness: row.try_get("abstractness")?,
        text_length: text_length.max(0) as u64,
        analyzed_at,
    })
}

#[async_trait]
impl PatternRepository for PostgresPatternRepository {
    async fn upsert(&self, record: &PatternRecord) -> Result<(), RepositoryError> {
        let symbols = serde_json::to_value(&record.symbols)?;
        let emotions = serde_json::to_value(&record.emotions)?;
        let affinity = serde_json::to_value(record.archetype_affinity)?;

        sqlx::query(
            r#"
            INSERT INTO dream_patterns (
                dream_id, user_id, symbols, emotions, archetype_affinity,
                vividness, abstractness, text_length, analyzed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (dream_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                symbols = EXCLUDED.symbols,
                emotions = EXCLUDED.emotions,
                archetype_affinity = EXCLUDED.archetype_affinity,
                vividness = EXCLUDED.vividness,
                abstractness = EXCLUDED.abstractness,
                text_length = EXCLUDED.text_length,
                analyzed_at = EXCLUDED.analyzed_at
            "#,
        )
        .bind(record.dream_id.as_str())
        .bind(record.user_id.as_str())
        .bind(symbols)
        .bind(emotions)
        .bind(affinity)
        .bind(record.vividness)
        .bind(record.abstractness)
        .bind(record.text_length as i64)
        .bind(record.analyzed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to upsert pattern record: {}", e)))?;

        Ok(())
    }

    async fn find_by_dream(&self, dream_id: &DreamId) -> Result<Option<PatternRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT dream_id, user_id, symbols, emotions, archetype_affinity,
                   vividness, abstractness, text_length, analyzed_at
            FROM dream_patterns
            WHERE dream_id = $1
            "#,
        )
        .bind(dream_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<PatternRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT dream_id, user_id, symbols, emotions, archetype_affinity,
                   vividness, abstractness, text_length, analyzed_at
            FROM dream_patterns
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn count_for_user(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dream_patterns WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as usize)
    }

    async fn delete(&self, dream_id: &DreamId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM dream_patterns WHERE dream_id = $1")
            .bind(dream_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete pattern record: {}", e)))?;

        Ok(())
    }
}
