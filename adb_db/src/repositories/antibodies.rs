//! ABOUTME: Antibody repository tying a PDB entry, a structure and an optional antigen
//! ABOUTME: Antibodies own their heavy and light chains through cascading keys

use crate::error::classify;
use adb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::require_affected;

const ANTIBODY_COLUMNS: &str = "id, pdb_id, antigen_id, structure_id";

/// Antibody entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Antibody {
    pub id: i64,
    pub pdb_id: i64,
    pub antigen_id: Option<i64>,
    pub structure_id: i64,
}

/// Request to create an antibody
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAntibodyRequest {
    pub pdb_id: i64,
    pub structure_id: i64,
    pub antigen_id: Option<i64>,
}

pub struct AntibodyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AntibodyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, request: CreateAntibodyRequest) -> Result<Antibody> {
        let query = format!(
            "INSERT INTO antibody (pdb_id, antigen_id, structure_id) VALUES (?1, ?2, ?3) RETURNING {}",
            ANTIBODY_COLUMNS
        );
        let antibody = sqlx::query_as::<_, Antibody>(&query)
            .bind(request.pdb_id)
            .bind(request.antigen_id)
            .bind(request.structure_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to create antibody", e))?;

        debug!(id = antibody.id, "Created antibody");
        Ok(antibody)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Antibody>> {
        let query = format!("SELECT {} FROM antibody WHERE id = ?1", ANTIBODY_COLUMNS);
        sqlx::query_as::<_, Antibody>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find antibody", e))
    }

    pub async fn list_by_pdb(&self, pdb_id: i64) -> Result<Vec<Antibody>> {
        let query = format!(
            "SELECT {} FROM antibody WHERE pdb_id = ?1 ORDER BY id",
            ANTIBODY_COLUMNS
        );
        sqlx::query_as::<_, Antibody>(&query)
            .bind(pdb_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to list antibodies by pdb", e))
    }

    pub async fn list_by_antigen(&self, antigen_id: i64) -> Result<Vec<Antibody>> {
        let query = format!(
            "SELECT {} FROM antibody WHERE antigen_id = ?1 ORDER BY id",
            ANTIBODY_COLUMNS
        );
        sqlx::query_as::<_, Antibody>(&query)
            .bind(antigen_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to list antibodies by antigen", e))
    }

    /// Attach the antibody to an antigen, or detach it with `None`
    #[instrument(skip(self))]
    pub async fn set_antigen(&self, id: i64, antigen_id: Option<i64>) -> Result<Antibody> {
        let query = format!(
            "UPDATE antibody SET antigen_id = ?1 WHERE id = ?2 RETURNING {}",
            ANTIBODY_COLUMNS
        );
        sqlx::query_as::<_, Antibody>(&query)
            .bind(antigen_id)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to set antibody antigen", e))?
            .ok_or_else(|| Error::NotFound(format!("Antibody {} not found", id)))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM antibody")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to count antibodies", e))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM antibody WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete antibody", e))?;

        require_affected(result.rows_affected(), "Antibody", id)
    }
}
