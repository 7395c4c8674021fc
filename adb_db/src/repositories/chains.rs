//! ABOUTME: Heavy and light chain repository
//! ABOUTME: Light chains carry their isotype (kappa, lambda or N/A)

use crate::error::classify;
use crate::models::LightChainType;
use adb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::require_affected;

/// Heavy chain of an antibody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HeavyChain {
    pub id: i64,
    pub antibody_id: i64,
    pub structure_id: i64,
}

/// Light chain of an antibody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LightChain {
    pub id: i64,
    pub antibody_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub chain_type: LightChainType,
    pub structure_id: i64,
}

pub struct ChainRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChainRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create_heavy(&self, antibody_id: i64, structure_id: i64) -> Result<HeavyChain> {
        let chain = sqlx::query_as::<_, HeavyChain>(
            r#"
            INSERT INTO heavy_chain (antibody_id, structure_id) VALUES (?1, ?2)
            RETURNING id, antibody_id, structure_id
            "#,
        )
        .bind(antibody_id)
        .bind(structure_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create heavy chain", e))?;

        debug!(id = chain.id, antibody_id, "Created heavy chain");
        Ok(chain)
    }

    pub async fn find_heavy(&self, id: i64) -> Result<Option<HeavyChain>> {
        sqlx::query_as::<_, HeavyChain>(
            "SELECT id, antibody_id, structure_id FROM heavy_chain WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to find heavy chain", e))
    }

    pub async fn list_heavy_by_antibody(&self, antibody_id: i64) -> Result<Vec<HeavyChain>> {
        sqlx::query_as::<_, HeavyChain>(
            "SELECT id, antibody_id, structure_id FROM heavy_chain WHERE antibody_id = ?1 ORDER BY id",
        )
        .bind(antibody_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list heavy chains", e))
    }

    #[instrument(skip(self))]
    pub async fn delete_heavy(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM heavy_chain WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete heavy chain", e))?;

        require_affected(result.rows_affected(), "Heavy chain", id)
    }

    #[instrument(skip(self))]
    pub async fn create_light(
        &self,
        antibody_id: i64,
        chain_type: LightChainType,
        structure_id: i64,
    ) -> Result<LightChain> {
        let chain = sqlx::query_as::<_, LightChain>(
            r#"
            INSERT INTO light_chain (antibody_id, type, structure_id) VALUES (?1, ?2, ?3)
            RETURNING id, antibody_id, type, structure_id
            "#,
        )
        .bind(antibody_id)
        .bind(chain_type)
        .bind(structure_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create light chain", e))?;

        debug!(id = chain.id, antibody_id, chain_type = %chain.chain_type, "Created light chain");
        Ok(chain)
    }

    pub async fn find_light(&self, id: i64) -> Result<Option<LightChain>> {
        sqlx::query_as::<_, LightChain>(
            "SELECT id, antibody_id, type, structure_id FROM light_chain WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to find light chain", e))
    }

    pub async fn list_light_by_antibody(&self, antibody_id: i64) -> Result<Vec<LightChain>> {
        sqlx::query_as::<_, LightChain>(
            r#"
            SELECT id, antibody_id, type, structure_id FROM light_chain
            WHERE antibody_id = ?1 ORDER BY id
            "#,
        )
        .bind(antibody_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list light chains", e))
    }

    /// Correct the recorded isotype of a light chain
    #[instrument(skip(self))]
    pub async fn update_light_type(&self, id: i64, chain_type: LightChainType) -> Result<LightChain> {
        sqlx::query_as::<_, LightChain>(
            r#"
            UPDATE light_chain SET type = ?1 WHERE id = ?2
            RETURNING id, antibody_id, type, structure_id
            "#,
        )
        .bind(chain_type)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to update light chain type", e))?
        .ok_or_else(|| Error::NotFound(format!("Light chain {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn delete_light(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM light_chain WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete light chain", e))?;

        require_affected(result.rows_affected(), "Light chain", id)
    }
}
