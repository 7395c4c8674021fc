//! ABOUTME: Sequence repository for unique amino-acid sequences
//! ABOUTME: Uniqueness of the sequence text is enforced by the storage engine

use crate::error::classify;
use adb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::require_affected;

/// Sequence entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sequence {
    pub id: i64,
    pub sequence: String,
}

/// Sequence repository
pub struct SequenceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SequenceRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new sequence. A duplicate surfaces as `Error::UniqueViolation`.
    #[instrument(skip(self, sequence), fields(len = sequence.len()))]
    pub async fn create(&self, sequence: &str) -> Result<Sequence> {
        if sequence.trim().is_empty() {
            return Err(Error::Validation("Sequence must not be blank".to_string()));
        }

        let row = sqlx::query_as::<_, Sequence>(
            "INSERT INTO sequence (sequence) VALUES (?1) RETURNING id, sequence",
        )
        .bind(sequence)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create sequence", e))?;

        debug!(id = row.id, "Created sequence");
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Sequence>> {
        sqlx::query_as::<_, Sequence>("SELECT id, sequence FROM sequence WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find sequence", e))
    }

    #[instrument(skip(self, sequence))]
    pub async fn find_by_sequence(&self, sequence: &str) -> Result<Option<Sequence>> {
        sqlx::query_as::<_, Sequence>("SELECT id, sequence FROM sequence WHERE sequence = ?1")
            .bind(sequence)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find sequence by text", e))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Sequence>> {
        sqlx::query_as::<_, Sequence>(
            "SELECT id, sequence FROM sequence ORDER BY id LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list sequences", e))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sequence")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to count sequences", e))
    }

    /// Delete a sequence and, by cascade, every structure built on it
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM sequence WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete sequence", e))?;

        require_affected(result.rows_affected(), "Sequence", id)?;
        debug!(id, "Deleted sequence");
        Ok(())
    }
}
