//! ABOUTME: Binding affinity repository for measured antibody/antigen interactions
//! ABOUTME: At most one affinity per (antibody, antigen) pair, enforced by the schema

use crate::error::classify;
use adb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::require_affected;

const AFFINITY_COLUMNS: &str = "id, antibody_id, antigen_id, affinity";

/// Binding affinity entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BindingAffinity {
    pub id: i64,
    pub antibody_id: i64,
    pub antigen_id: i64,
    pub affinity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBindingAffinityRequest {
    pub antibody_id: i64,
    pub antigen_id: i64,
    pub affinity: f64,
}

fn validate_affinity(affinity: f64) -> Result<()> {
    if !affinity.is_finite() {
        return Err(Error::Validation(format!(
            "affinity must be a finite number, got {}",
            affinity
        )));
    }
    Ok(())
}

pub struct BindingAffinityRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BindingAffinityRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an affinity. A second value for the same pair is rejected with
    /// `Error::UniqueViolation`; use [`upsert`](Self::upsert) to replace it.
    #[instrument(skip(self))]
    pub async fn create(&self, request: CreateBindingAffinityRequest) -> Result<BindingAffinity> {
        validate_affinity(request.affinity)?;

        let query = format!(
            r#"
            INSERT INTO binding_affinity (antibody_id, antigen_id, affinity)
            VALUES (?1, ?2, ?3)
            RETURNING {}
            "#,
            AFFINITY_COLUMNS
        );
        let row = sqlx::query_as::<_, BindingAffinity>(&query)
            .bind(request.antibody_id)
            .bind(request.antigen_id)
            .bind(request.affinity)
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to create binding affinity", e))?;

        debug!(id = row.id, "Created binding affinity");
        Ok(row)
    }

    /// Insert or replace the affinity for a pair during re-ingestion
    #[instrument(skip(self))]
    pub async fn upsert(&self, request: CreateBindingAffinityRequest) -> Result<BindingAffinity> {
        validate_affinity(request.affinity)?;

        let query = format!(
            r#"
            INSERT INTO binding_affinity (antibody_id, antigen_id, affinity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (antibody_id, antigen_id) DO UPDATE SET affinity = excluded.affinity
            RETURNING {}
            "#,
            AFFINITY_COLUMNS
        );
        sqlx::query_as::<_, BindingAffinity>(&query)
            .bind(request.antibody_id)
            .bind(request.antigen_id)
            .bind(request.affinity)
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to upsert binding affinity", e))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<BindingAffinity>> {
        let query = format!("SELECT {} FROM binding_affinity WHERE id = ?1", AFFINITY_COLUMNS);
        sqlx::query_as::<_, BindingAffinity>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find binding affinity", e))
    }

    pub async fn find_for_pair(
        &self,
        antibody_id: i64,
        antigen_id: i64,
    ) -> Result<Option<BindingAffinity>> {
        let query = format!(
            "SELECT {} FROM binding_affinity WHERE antibody_id = ?1 AND antigen_id = ?2",
            AFFINITY_COLUMNS
        );
        sqlx::query_as::<_, BindingAffinity>(&query)
            .bind(antibody_id)
            .bind(antigen_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find binding affinity for pair", e))
    }

    pub async fn list_by_antibody(&self, antibody_id: i64) -> Result<Vec<BindingAffinity>> {
        let query = format!(
            "SELECT {} FROM binding_affinity WHERE antibody_id = ?1 ORDER BY id",
            AFFINITY_COLUMNS
        );
        sqlx::query_as::<_, BindingAffinity>(&query)
            .bind(antibody_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to list binding affinities", e))
    }

    pub async fn list_by_antigen(&self, antigen_id: i64) -> Result<Vec<BindingAffinity>> {
        let query = format!(
            "SELECT {} FROM binding_affinity WHERE antigen_id = ?1 ORDER BY id",
            AFFINITY_COLUMNS
        );
        sqlx::query_as::<_, BindingAffinity>(&query)
            .bind(antigen_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to list binding affinities", e))
    }

    #[instrument(skip(self))]
    pub async fn update_affinity(&self, id: i64, affinity: f64) -> Result<BindingAffinity> {
        validate_affinity(affinity)?;

        let query = format!(
            "UPDATE binding_affinity SET affinity = ?1 WHERE id = ?2 RETURNING {}",
            AFFINITY_COLUMNS
        );
        sqlx::query_as::<_, BindingAffinity>(&query)
            .bind(affinity)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to update binding affinity", e))?
            .ok_or_else(|| Error::NotFound(format!("Binding affinity {} not found", id)))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM binding_affinity")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to count binding affinities", e))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM binding_affinity WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete binding affinity", e))?;

        require_affected(result.rows_affected(), "Binding affinity", id)
    }
}
