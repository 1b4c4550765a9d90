use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Official;
use crate::database::repository::{self, Filter, Listing, PageRequest, Scope};

#[derive(Debug, Clone)]
pub struct NewOfficial {
    pub document_name: String,
    pub pdf_url: String,
    pub pdf_file_name: Option<String>,
    pub owner_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct OfficialChanges {
    pub document_name: Option<String>,
    /// A new URL also refreshes the upload timestamp.
    pub pdf_url: Option<String>,
    pub pdf_file_name: Option<Option<String>>,
    pub owner_id: Option<Uuid>,
    pub assigned_to: Option<Option<Uuid>>,
}

pub struct OfficialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfficialRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Official, DatabaseError> {
        sqlx::query_as::<_, Official>("SELECT * FROM officials WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Document not found".to_string()))
    }

    pub async fn list(
        &self,
        scope: Scope,
        filters: &[Filter],
        page: Option<PageRequest>,
    ) -> Result<Listing<Official>, DatabaseError> {
        repository::list(self.pool, "officials", scope, filters, page).await
    }

    pub async fn create(&self, new: &NewOfficial) -> Result<Official, DatabaseError> {
        let official = sqlx::query_as::<_, Official>(
            "INSERT INTO officials (id, document_name, pdf_url, pdf_file_name, owner_id, assigned_to_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.document_name)
        .bind(&new.pdf_url)
        .bind(&new.pdf_file_name)
        .bind(new.owner_id)
        .bind(new.assigned_to_id)
        .fetch_one(self.pool)
        .await?;
        Ok(official)
    }

    pub async fn update(&self, id: Uuid, changes: &OfficialChanges) -> Result<Official, DatabaseError> {
        sqlx::query_as::<_, Official>(
            "UPDATE officials SET \
                document_name = COALESCE($2, document_name), \
                pdf_url = COALESCE($3, pdf_url), \
                pdf_uploaded_at = CASE WHEN $3 IS NULL THEN pdf_uploaded_at ELSE now() END, \
                pdf_file_name = CASE WHEN $4 THEN $5 ELSE pdf_file_name END, \
                owner_id = COALESCE($6, owner_id), \
                assigned_to_id = CASE WHEN $7 THEN $8 ELSE assigned_to_id END \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&changes.document_name)
        .bind(&changes.pdf_url)
        .bind(changes.pdf_file_name.is_some())
        .bind(changes.pdf_file_name.clone().flatten())
        .bind(changes.owner_id)
        .bind(changes.assigned_to.is_some())
        .bind(changes.assigned_to.flatten())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Document not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM officials WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Document not found".to_string()));
        }
        Ok(())
    }
}
