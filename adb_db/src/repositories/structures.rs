//! ABOUTME: Structure repository linking sequences to stored structure files
//! ABOUTME: Deleting a structure cascades through antigens, antibodies and chains

use crate::error::classify;
use adb_core::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::{require_affected, validate_file_reference};

/// Structure entity; `structure_file` is a reference into the blob store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Structure {
    pub id: i64,
    pub sequence_id: i64,
    pub structure_file: String,
}

/// Structure repository
pub struct StructureRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StructureRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, sequence_id: i64, structure_file: &str) -> Result<Structure> {
        validate_file_reference("structure_file", structure_file)?;

        let row = sqlx::query_as::<_, Structure>(
            r#"
            INSERT INTO structure (sequence_id, structure_file)
            VALUES (?1, ?2)
            RETURNING id, sequence_id, structure_file
            "#,
        )
        .bind(sequence_id)
        .bind(structure_file)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify("Failed to create structure", e))?;

        debug!(id = row.id, sequence_id, "Created structure");
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Structure>> {
        sqlx::query_as::<_, Structure>(
            "SELECT id, sequence_id, structure_file FROM structure WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to find structure", e))
    }

    #[instrument(skip(self))]
    pub async fn list_by_sequence(&self, sequence_id: i64) -> Result<Vec<Structure>> {
        sqlx::query_as::<_, Structure>(
            "SELECT id, sequence_id, structure_file FROM structure WHERE sequence_id = ?1 ORDER BY id",
        )
        .bind(sequence_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| classify("Failed to list structures", e))
    }

    /// Point the structure at a re-ingested file
    #[instrument(skip(self))]
    pub async fn update_file(&self, id: i64, structure_file: &str) -> Result<Structure> {
        validate_file_reference("structure_file", structure_file)?;

        sqlx::query_as::<_, Structure>(
            r#"
            UPDATE structure SET structure_file = ?1 WHERE id = ?2
            RETURNING id, sequence_id, structure_file
            "#,
        )
        .bind(structure_file)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| classify("Failed to update structure file", e))?
        .ok_or_else(|| adb_core::Error::NotFound(format!("Structure {} not found", id)))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM structure")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to count structures", e))
    }

    /// Delete a structure together with everything that references it
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM structure WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete structure", e))?;

        require_affected(result.rows_affected(), "Structure", id)?;
        debug!(id, "Deleted structure");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::sequences::SequenceRepository;
    use crate::Db;
    use adb_core::Error;

    #[tokio::test]
    async fn test_create_requires_existing_sequence() {
        let db = Db::new_in_memory().await.unwrap();
        let repo = StructureRepository::new(db.pool());

        let err = repo
            .create(999, "structure_files/20240101/a.pdb")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ForeignKeyViolation(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_file_and_list() {
        let db = Db::new_in_memory().await.unwrap();
        let seq = SequenceRepository::new(db.pool()).create("ACDEF").await.unwrap();
        let repo = StructureRepository::new(db.pool());

        let s = repo
            .create(seq.id, "structure_files/20240101/a.pdb")
            .await
            .unwrap();
        let updated = repo
            .update_file(s.id, "structure_files/20240202/b.pdb")
            .await
            .unwrap();
        assert_eq!(updated.structure_file, "structure_files/20240202/b.pdb");

        let listed = repo.list_by_sequence(seq.id).await.unwrap();
        assert_eq!(listed, vec![updated]);

        assert!(matches!(
            repo.update_file(s.id + 10, "x.pdb").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_overlong_reference_rejected() {
        let db = Db::new_in_memory().await.unwrap();
        let seq = SequenceRepository::new(db.pool()).create("ACDEF").await.unwrap();
        let repo = StructureRepository::new(db.pool());

        let long = "x".repeat(101);
        assert!(matches!(
            repo.create(seq.id, &long).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_deleting_sequence_removes_structures() {
        let db = Db::new_in_memory().await.unwrap();
        let sequences = SequenceRepository::new(db.pool());
        let seq = sequences.create("ACDEF").await.unwrap();
        let repo = StructureRepository::new(db.pool());
        repo.create(seq.id, "a.pdb").await.unwrap();
        repo.create(seq.id, "b.pdb").await.unwrap();

        sequences.delete(seq.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
