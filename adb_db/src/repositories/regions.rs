//! ABOUTME: Variable and conserved region repository for heavy and light chains
//! ABOUTME: The four region tables share one shape, selected by RegionKind

use crate::error::classify;
use adb_core::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use tracing::{debug, instrument};

use super::require_affected;

/// Which of the four region tables an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    HeavyVariable,
    HeavyConserved,
    LightVariable,
    LightConserved,
}

impl RegionKind {
    pub const ALL: [RegionKind; 4] = [
        RegionKind::HeavyVariable,
        RegionKind::HeavyConserved,
        RegionKind::LightVariable,
        RegionKind::LightConserved,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::HeavyVariable => "heavy_variable",
            Self::HeavyConserved => "heavy_conserved",
            Self::LightVariable => "light_variable",
            Self::LightConserved => "light_conserved",
        }
    }

    /// Foreign-key column pointing at the owning chain
    pub fn chain_column(&self) -> &'static str {
        if self.is_heavy() {
            "heavy_chain_id"
        } else {
            "light_chain_id"
        }
    }

    pub fn is_heavy(&self) -> bool {
        matches!(self, Self::HeavyVariable | Self::HeavyConserved)
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Row of any region table; `chain_id` is the heavy or light chain by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Region {
    pub id: i64,
    pub chain_id: i64,
    pub structure_id: i64,
}

pub struct RegionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RegionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, kind: RegionKind, chain_id: i64, structure_id: i64) -> Result<Region> {
        let query = format!(
            "INSERT INTO {table} ({col}, structure_id) VALUES (?1, ?2) RETURNING id, {col} AS chain_id, structure_id",
            table = kind.table(),
            col = kind.chain_column()
        );
        let region = sqlx::query_as::<_, Region>(&query)
            .bind(chain_id)
            .bind(structure_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify(&format!("Failed to create {}", kind), e))?;

        debug!(id = region.id, %kind, chain_id, "Created region");
        Ok(region)
    }

    pub async fn find_by_id(&self, kind: RegionKind, id: i64) -> Result<Option<Region>> {
        let query = format!(
            "SELECT id, {col} AS chain_id, structure_id FROM {table} WHERE id = ?1",
            table = kind.table(),
            col = kind.chain_column()
        );
        sqlx::query_as::<_, Region>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify(&format!("Failed to find {}", kind), e))
    }

    pub async fn list_by_chain(&self, kind: RegionKind, chain_id: i64) -> Result<Vec<Region>> {
        let query = format!(
            "SELECT id, {col} AS chain_id, structure_id FROM {table} WHERE {col} = ?1 ORDER BY id",
            table = kind.table(),
            col = kind.chain_column()
        );
        sqlx::query_as::<_, Region>(&query)
            .bind(chain_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify(&format!("Failed to list {}", kind), e))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, kind: RegionKind, id: i64) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify(&format!("Failed to delete {}", kind), e))?;

        require_affected(result.rows_affected(), kind.table(), id)
    }
}
