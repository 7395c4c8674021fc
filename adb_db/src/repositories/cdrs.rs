//! ABOUTME: CDR repository: heavy/light CDR loops, their pairings and cluster labels
//! ABOUTME: A cluster classifies one heavy/light CDR pair under a numbering scheme

use crate::error::classify;
use crate::models::{CdrType, ClusterMethod};
use adb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::require_affected;

/// CDR of a heavy-chain variable region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CdrHeavy {
    pub id: i64,
    pub heavy_variable_id: i64,
    pub structure_id: i64,
}

/// CDR of a light-chain variable region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CdrLight {
    pub id: i64,
    pub light_variable_id: i64,
    pub structure_id: i64,
}

/// A heavy CDR paired with a light CDR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CdrPair {
    pub id: i64,
    pub heavy_cdr_id: i64,
    pub light_cdr_id: i64,
}

/// Cluster label for a CDR pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CdrCluster {
    pub id: i64,
    pub method: ClusterMethod,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub cdr_type: CdrType,
    pub pair_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCdrClusterRequest {
    pub pair_id: i64,
    #[serde(default)]
    pub method: ClusterMethod,
    #[serde(default, rename = "type")]
    pub cdr_type: CdrType,
}

/// Relabel a cluster; `None` keeps the current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCdrClusterRequest {
    pub method: Option<ClusterMethod>,
    #[serde(rename = "type")]
    pub cdr_type: Option<CdrType>,
}

const CLUSTER_COLUMNS: &str = "id, method, type, pair_id";

pub struct CdrRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CdrRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create_heavy(&self, heavy_variable_id: i64, structure_id: i64) -> Result<CdrHeavy> {
        let cdr = sqlx::query_as::<_, CdrHeavy>(
            r#"
            INSERT INTO cdr_heavy (heavy_variable_id, structure_id) VALUES (?1, ?2)
            RETURNING id, heavy_variable_id, structure_id
            "#,
        )
        .bind(heavy_variable_id)
        .bind(structure_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create heavy CDR", e))?;

        debug!(id = cdr.id, heavy_variable_id, "Created heavy CDR");
        Ok(cdr)
    }

    #[instrument(skip(self))]
    pub async fn create_light(&self, light_variable_id: i64, structure_id: i64) -> Result<CdrLight> {
        let cdr = sqlx::query_as::<_, CdrLight>(
            r#"
            INSERT INTO cdr_light (light_variable_id, structure_id) VALUES (?1, ?2)
            RETURNING id, light_variable_id, structure_id
            "#,
        )
        .bind(light_variable_id)
        .bind(structure_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create light CDR", e))?;

        debug!(id = cdr.id, light_variable_id, "Created light CDR");
        Ok(cdr)
    }

    pub async fn find_heavy(&self, id: i64) -> Result<Option<CdrHeavy>> {
        sqlx::query_as::<_, CdrHeavy>(
            "SELECT id, heavy_variable_id, structure_id FROM cdr_heavy WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to find heavy CDR", e))
    }

    pub async fn find_light(&self, id: i64) -> Result<Option<CdrLight>> {
        sqlx::query_as::<_, CdrLight>(
            "SELECT id, light_variable_id, structure_id FROM cdr_light WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to find light CDR", e))
    }

    pub async fn list_heavy_by_variable(&self, heavy_variable_id: i64) -> Result<Vec<CdrHeavy>> {
        sqlx::query_as::<_, CdrHeavy>(
            r#"
            SELECT id, heavy_variable_id, structure_id FROM cdr_heavy
            WHERE heavy_variable_id = ?1 ORDER BY id
            "#,
        )
        .bind(heavy_variable_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list heavy CDRs", e))
    }

    pub async fn list_light_by_variable(&self, light_variable_id: i64) -> Result<Vec<CdrLight>> {
        sqlx::query_as::<_, CdrLight>(
            r#"
            SELECT id, light_variable_id, structure_id FROM cdr_light
            WHERE light_variable_id = ?1 ORDER BY id
            "#,
        )
        .bind(light_variable_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list light CDRs", e))
    }

    #[instrument(skip(self))]
    pub async fn create_pair(&self, heavy_cdr_id: i64, light_cdr_id: i64) -> Result<CdrPair> {
        let pair = sqlx::query_as::<_, CdrPair>(
            r#"
            INSERT INTO cdr_pair (heavy_cdr_id, light_cdr_id) VALUES (?1, ?2)
            RETURNING id, heavy_cdr_id, light_cdr_id
            "#,
        )
        .bind(heavy_cdr_id)
        .bind(light_cdr_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create CDR pair", e))?;

        debug!(id = pair.id, heavy_cdr_id, light_cdr_id, "Created CDR pair");
        Ok(pair)
    }

    pub async fn find_pair(&self, id: i64) -> Result<Option<CdrPair>> {
        sqlx::query_as::<_, CdrPair>(
            "SELECT id, heavy_cdr_id, light_cdr_id FROM cdr_pair WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to find CDR pair", e))
    }

    pub async fn list_pairs_by_heavy(&self, heavy_cdr_id: i64) -> Result<Vec<CdrPair>> {
        sqlx::query_as::<_, CdrPair>(
            "SELECT id, heavy_cdr_id, light_cdr_id FROM cdr_pair WHERE heavy_cdr_id = ?1 ORDER BY id",
        )
        .bind(heavy_cdr_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list CDR pairs", e))
    }

    pub async fn list_pairs_by_light(&self, light_cdr_id: i64) -> Result<Vec<CdrPair>> {
        sqlx::query_as::<_, CdrPair>(
            "SELECT id, heavy_cdr_id, light_cdr_id FROM cdr_pair WHERE light_cdr_id = ?1 ORDER BY id",
        )
        .bind(light_cdr_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list CDR pairs", e))
    }

    #[instrument(skip(self))]
    pub async fn create_cluster(&self, request: CreateCdrClusterRequest) -> Result<CdrCluster> {
        let query = format!(
            "INSERT INTO cdr_cluster (method, type, pair_id) VALUES (?1, ?2, ?3) RETURNING {}",
            CLUSTER_COLUMNS
        );
        let cluster = sqlx::query_as::<_, CdrCluster>(&query)
            .bind(request.method)
            .bind(request.cdr_type)
            .bind(request.pair_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to create CDR cluster", e))?;

        debug!(
            id = cluster.id,
            method = %cluster.method,
            cdr_type = %cluster.cdr_type,
            "Created CDR cluster"
        );
        Ok(cluster)
    }

    pub async fn find_cluster(&self, id: i64) -> Result<Option<CdrCluster>> {
        let query = format!("SELECT {} FROM cdr_cluster WHERE id = ?1", CLUSTER_COLUMNS);
        sqlx::query_as::<_, CdrCluster>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find CDR cluster", e))
    }

    pub async fn list_clusters_by_pair(&self, pair_id: i64) -> Result<Vec<CdrCluster>> {
        let query = format!(
            "SELECT {} FROM cdr_cluster WHERE pair_id = ?1 ORDER BY id",
            CLUSTER_COLUMNS
        );
        sqlx::query_as::<_, CdrCluster>(&query)
            .bind(pair_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to list CDR clusters", e))
    }

    /// Clusters matching a scheme and/or loop; `None` matches anything
    #[instrument(skip(self))]
    pub async fn list_clusters_by(
        &self,
        method: Option<ClusterMethod>,
        cdr_type: Option<CdrType>,
    ) -> Result<Vec<CdrCluster>> {
        let query = format!(
            r#"
            SELECT {} FROM cdr_cluster
            WHERE (?1 IS NULL OR method = ?1) AND (?2 IS NULL OR type = ?2)
            ORDER BY id
            "#,
            CLUSTER_COLUMNS
        );
        sqlx::query_as::<_, CdrCluster>(&query)
            .bind(method)
            .bind(cdr_type)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to filter CDR clusters", e))
    }

    #[instrument(skip(self))]
    pub async fn update_cluster(&self, id: i64, request: UpdateCdrClusterRequest) -> Result<CdrCluster> {
        if request.method.is_none() && request.cdr_type.is_none() {
            return Err(Error::Validation("No fields to update".to_string()));
        }

        let query = format!(
            r#"
            UPDATE cdr_cluster
            SET method = COALESCE(?1, method), type = COALESCE(?2, type)
            WHERE id = ?3
            RETURNING {}
            "#,
            CLUSTER_COLUMNS
        );
        sqlx::query_as::<_, CdrCluster>(&query)
            .bind(request.method)
            .bind(request.cdr_type)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to update CDR cluster", e))?
            .ok_or_else(|| Error::NotFound(format!("CDR cluster {} not found", id)))
    }

    pub async fn delete_heavy(&self, id: i64) -> Result<()> {
        self.delete_from("cdr_heavy", "Heavy CDR", id).await
    }

    pub async fn delete_light(&self, id: i64) -> Result<()> {
        self.delete_from("cdr_light", "Light CDR", id).await
    }

    pub async fn delete_pair(&self, id: i64) -> Result<()> {
        self.delete_from("cdr_pair", "CDR pair", id).await
    }

    pub async fn delete_cluster(&self, id: i64) -> Result<()> {
        self.delete_from("cdr_cluster", "CDR cluster", id).await
    }

    #[instrument(skip(self))]
    async fn delete_from(&self, table: &'static str, entity: &str, id: i64) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE id = ?1", table);
        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify(&format!("Failed to delete {}", entity), e))?;

        require_affected(result.rows_affected(), entity, id)
    }
}
