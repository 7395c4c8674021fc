//! ABOUTME: Repository for the methodology placeholder entity
//! ABOUTME: The table carries only its identifier until attributes are settled

use crate::error::classify;
use adb_core::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

use super::require_affected;

/// Methodology entity (no attributes yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Methodology {
    pub id: i64,
}

pub struct MethodologyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MethodologyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Methodology> {
        sqlx::query_as::<_, Methodology>("INSERT INTO methodology DEFAULT VALUES RETURNING id")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to create methodology", e))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Methodology>> {
        sqlx::query_as::<_, Methodology>("SELECT id FROM methodology WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| classify("Failed to find methodology", e))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM methodology")
            .fetch_one(self.pool)
            .await
            .map_err(|e| classify("Failed to count methodologies", e))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM methodology WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| classify("Failed to delete methodology", e))?;

        require_affected(result.rows_affected(), "Methodology", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Db;

    #[tokio::test]
    async fn test_placeholder_lifecycle() {
        let db = Db::new_in_memory().await.unwrap();
        let repo = MethodologyRepository::new(db.pool());

        let first = repo.create().await.unwrap();
        let second = repo.create().await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(repo.find_by_id(first.id).await.unwrap(), Some(first.clone()));

        repo.delete(first.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.delete(first.id).await.unwrap_err().is_not_found());
    }
}
