//! ABOUTME: PDB entry repository for structure metadata keyed by PDB code
//! ABOUTME: Holds experimental method, organism, resolution and R-factor

use crate::error::classify;
use crate::models::ExpMethod;
use adb_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::{require_affected, validate_file_reference};

const MAX_PDB_CODE_LEN: usize = 255;
const MAX_ORGANISM_LEN: usize = 225;

const PDB_COLUMNS: &str = "id, pdb_code, pdb_file, exp_method, organism, resolution, r_factor";

/// PDB entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Pdb {
    pub id: i64,
    pub pdb_code: String,
    pub pdb_file: String,
    pub exp_method: ExpMethod,
    pub organism: Option<String>,
    pub resolution: Option<f64>,
    pub r_factor: Option<f64>,
}

/// Request to create a PDB entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePdbRequest {
    pub pdb_code: String,
    pub pdb_file: String,
    #[serde(default)]
    pub exp_method: ExpMethod,
    pub organism: Option<String>,
    pub resolution: Option<f64>,
    pub r_factor: Option<f64>,
}

/// Metadata correction; `None` leaves a field as it is.
/// The nullable fields take `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePdbRequest {
    pub pdb_file: Option<String>,
    pub exp_method: Option<ExpMethod>,
    #[serde(default, deserialize_with = "nullable")]
    pub organism: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub resolution: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub r_factor: Option<Option<f64>>,
}

/// A present key becomes `Some`, so an explicit `null` clears the column
fn nullable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdatePdbRequest {
    fn is_empty(&self) -> bool {
        self.pdb_file.is_none()
            && self.exp_method.is_none()
            && self.organism.is_none()
            && self.resolution.is_none()
            && self.r_factor.is_none()
    }
}

fn validate_pdb_code(code: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(Error::Validation("pdb_code must not be blank".to_string()));
    }
    if code.chars().count() > MAX_PDB_CODE_LEN {
        return Err(Error::Validation(format!(
            "pdb_code exceeds {} characters",
            MAX_PDB_CODE_LEN
        )));
    }
    Ok(())
}

fn validate_metadata(
    organism: Option<&str>,
    resolution: Option<f64>,
    r_factor: Option<f64>,
) -> Result<()> {
    if let Some(organism) = organism {
        if organism.chars().count() > MAX_ORGANISM_LEN {
            return Err(Error::Validation(format!(
                "organism exceeds {} characters",
                MAX_ORGANISM_LEN
            )));
        }
    }
    if let Some(resolution) = resolution {
        if !resolution.is_finite() || resolution < 0.0 {
            return Err(Error::Validation(format!(
                "resolution must be a non-negative number, got {}",
                resolution
            )));
        }
    }
    if let Some(r_factor) = r_factor {
        if !r_factor.is_finite() {
            return Err(Error::Validation("r_factor must be finite".to_string()));
        }
    }
    Ok(())
}

/// PDB repository
pub struct PdbRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PdbRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a PDB entry. A reused code surfaces as `Error::UniqueViolation`.
    #[instrument(skip(self, request), fields(pdb_code = %request.pdb_code))]
    pub async fn create(&self, request: CreatePdbRequest) -> Result<Pdb> {
        validate_pdb_code(&request.pdb_code)?;
        validate_file_reference("pdb_file", &request.pdb_file)?;
        validate_metadata(
            request.organism.as_deref(),
            request.resolution,
            request.r_factor,
        )?;

        let query = format!(
            r#"
            INSERT INTO pdb (pdb_code, pdb_file, exp_method, organism, resolution, r_factor)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {}
            "#,
            PDB_COLUMNS
        );
        let pdb = sqlx::query_as::<_, Pdb>(&query)
            .bind(&request.pdb_code)
            .bind(&request.pdb_file)
            .bind(request.exp_method)
            .bind(&request.organism)
            .bind(request.resolution)
            .bind(request.r_factor)
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to create pdb", e))?;

        debug!(id = pdb.id, method = %pdb.exp_method, "Created pdb entry");
        Ok(pdb)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Pdb>> {
        let query = format!("SELECT {} FROM pdb WHERE id = ?1", PDB_COLUMNS);
        sqlx::query_as::<_, Pdb>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find pdb", e))
    }

    #[instrument(skip(self))]
    pub async fn find_by_code(&self, pdb_code: &str) -> Result<Option<Pdb>> {
        let query = format!("SELECT {} FROM pdb WHERE pdb_code = ?1", PDB_COLUMNS);
        sqlx::query_as::<_, Pdb>(&query)
            .bind(pdb_code)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find pdb by code", e))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Pdb>> {
        let query = format!(
            "SELECT {} FROM pdb ORDER BY pdb_code LIMIT ?1 OFFSET ?2",
            PDB_COLUMNS
        );
        sqlx::query_as::<_, Pdb>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to list pdb entries", e))
    }

    #[instrument(skip(self))]
    pub async fn list_by_method(&self, method: ExpMethod) -> Result<Vec<Pdb>> {
        let query = format!(
            "SELECT {} FROM pdb WHERE exp_method = ?1 ORDER BY pdb_code",
            PDB_COLUMNS
        );
        sqlx::query_as::<_, Pdb>(&query)
            .bind(method)
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify("Failed to list pdb entries by method", e))
    }

    /// Correct metadata of an existing entry
    #[instrument(skip(self, request))]
    pub async fn update_metadata(&self, id: i64, request: UpdatePdbRequest) -> Result<Pdb> {
        if request.is_empty() {
            return Err(Error::Validation("No fields to update".to_string()));
        }
        if let Some(file) = &request.pdb_file {
            validate_file_reference("pdb_file", file)?;
        }
        validate_metadata(
            request.organism.as_ref().and_then(|o| o.as_deref()),
            request.resolution.flatten(),
            request.r_factor.flatten(),
        )?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        let select = format!("SELECT {} FROM pdb WHERE id = ?1", PDB_COLUMNS);
        let current = sqlx::query_as::<_, Pdb>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify("Failed to find pdb", e))?
            .ok_or_else(|| Error::NotFound(format!("Pdb {} not found", id)))?;

        let pdb_file = request.pdb_file.unwrap_or(current.pdb_file);
        let exp_method = request.exp_method.unwrap_or(current.exp_method);
        let organism = request.organism.unwrap_or(current.organism);
        let resolution = request.resolution.unwrap_or(current.resolution);
        let r_factor = request.r_factor.unwrap_or(current.r_factor);

        let update = format!(
            r#"
            UPDATE pdb
            SET pdb_file = ?1, exp_method = ?2, organism = ?3, resolution = ?4, r_factor = ?5
            WHERE id = ?6
            RETURNING {}
            "#,
            PDB_COLUMNS
        );
        let pdb = sqlx::query_as::<_, Pdb>(&update)
            .bind(&pdb_file)
            .bind(exp_method)
            .bind(&organism)
            .bind(resolution)
            .bind(r_factor)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify("Failed to update pdb", e))?;

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit transaction: {}", e)))?;

        debug!(id, "Updated pdb metadata");
        Ok(pdb)
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pdb")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to count pdb entries", e))
    }

    /// Delete an entry and, by cascade, every antibody drawn from it
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM pdb WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete pdb", e))?;

        require_affected(result.rows_affected(), "Pdb", id)
    }
}
