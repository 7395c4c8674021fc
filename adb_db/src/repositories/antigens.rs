//! ABOUTME: Antigen repository; each antigen is resolved in one structure
//! ABOUTME: Removing an antigen cascades to antibodies bound to it and their affinities

use crate::error::classify;
use adb_core::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::require_affected;

/// Antigen entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Antigen {
    pub id: i64,
    pub structure_id: i64,
}

pub struct AntigenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AntigenRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, structure_id: i64) -> Result<Antigen> {
        let antigen = sqlx::query_as::<_, Antigen>(
            "INSERT INTO antigen (structure_id) VALUES (?1) RETURNING id, structure_id",
        )
        .bind(structure_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create antigen", e))?;

        debug!(id = antigen.id, structure_id, "Created antigen");
        Ok(antigen)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Antigen>> {
        sqlx::query_as::<_, Antigen>("SELECT id, structure_id FROM antigen WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find antigen", e))
    }

    pub async fn list_by_structure(&self, structure_id: i64) -> Result<Vec<Antigen>> {
        sqlx::query_as::<_, Antigen>(
            "SELECT id, structure_id FROM antigen WHERE structure_id = ?1 ORDER BY id",
        )
        .bind(structure_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list antigens", e))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM antigen")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to count antigens", e))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM antigen WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete antigen", e))?;

        require_affected(result.rows_affected(), "Antigen", id)
    }
}
