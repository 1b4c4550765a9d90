use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Page;
use crate::database::repository::{self, Filter, Listing, PageRequest, Scope};
use crate::media::ImageCollection;

#[derive(Debug, Clone)]
pub struct NewPage {
    pub page_name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub images: ImageCollection,
}

/// Field updates; `None` keeps the stored value. `assigned_to: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct PageChanges {
    pub page_name: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub assigned_to: Option<Option<Uuid>>,
}

pub struct PageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PageRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Page, DatabaseError> {
        sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Page not found".to_string()))
    }

    pub async fn list(
        &self,
        scope: Scope,
        filters: &[Filter],
        page: Option<PageRequest>,
    ) -> Result<Listing<Page>, DatabaseError> {
        repository::list(self.pool, "pages", scope, filters, page).await
    }

    pub async fn create(&self, new: &NewPage) -> Result<Page, DatabaseError> {
        let page = sqlx::query_as::<_, Page>(
            "INSERT INTO pages (id, page_name, description, owner_id, assigned_to_id, images) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.page_name)
        .bind(&new.description)
        .bind(new.owner_id)
        .bind(new.assigned_to_id)
        .bind(Json(&new.images))
        .fetch_one(self.pool)
        .await?;
        Ok(page)
    }

    /// Apply field changes and replace the image collection, provided the stored
    /// collection still equals `previous`. A concurrent edit yields `Conflict`.
    pub async fn save(
        &self,
        id: Uuid,
        changes: &PageChanges,
        previous: &ImageCollection,
        images: &ImageCollection,
    ) -> Result<Page, DatabaseError> {
        let updated = sqlx::query_as::<_, Page>(
            "UPDATE pages SET \
                page_name = COALESCE($2, page_name), \
                description = COALESCE($3, description), \
                owner_id = COALESCE($4, owner_id), \
                assigned_to_id = CASE WHEN $5 THEN $6 ELSE assigned_to_id END, \
                images = $7 \
             WHERE id = $1 AND images = $8 RETURNING *",
        )
        .bind(id)
        .bind(&changes.page_name)
        .bind(&changes.description)
        .bind(changes.owner_id)
        .bind(changes.assigned_to.is_some())
        .bind(changes.assigned_to.flatten())
        .bind(Json(images))
        .bind(Json(previous))
        .fetch_optional(self.pool)
        .await?;

        match updated {
            Some(page) => Ok(page),
            None => {
                // distinguish a vanished row from a lost race
                self.get(id).await?;
                Err(DatabaseError::Conflict(
                    "Page images were modified concurrently, please retry".to_string(),
                ))
            }
        }
    }

    /// Delete and return the removed row, so its images can be purged.
    pub async fn delete(&self, id: Uuid) -> Result<Page, DatabaseError> {
        sqlx::query_as::<_, Page>("DELETE FROM pages WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Page not found".to_string()))
    }
}
