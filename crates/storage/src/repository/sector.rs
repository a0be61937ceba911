use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::sector::CreateSectorRequest;
use crate::error::{Result, StorageError};
use crate::models::Sector;

/// Repository for Sector database operations
pub struct SectorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SectorRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all sectors alphabetically
    pub async fn list(&self) -> Result<Vec<Sector>> {
        let sectors = sqlx::query_as::<_, Sector>(
            r#"
            SELECT id, name, created_at
            FROM sectors
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(sectors)
    }

    pub async fn create(&self, req: &CreateSectorRequest) -> Result<Sector> {
        sqlx::query_as::<_, Sector>(
            r#"
            INSERT INTO sectors (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::Conflict(format!("Sector '{}' already exists", req.name));
            }
            err
        })
    }
}
