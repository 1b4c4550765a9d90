use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Report;
use crate::database::repository::{self, Filter, Listing, PageRequest, Scope};
use crate::media::ImageCollection;
use crate::types::{ReportPriority, ReportStatus};

#[derive(Debug, Clone)]
pub struct NewReport {
    pub report_title: String,
    pub content: String,
    pub place: String,
    pub priority: ReportPriority,
    pub owner_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub images: ImageCollection,
}

#[derive(Debug, Clone, Default)]
pub struct ReportChanges {
    pub report_title: Option<String>,
    pub content: Option<String>,
    pub place: Option<String>,
    pub priority: Option<ReportPriority>,
    pub status: Option<ReportStatus>,
    pub assigned_to: Option<Option<Uuid>>,
}

pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Report, DatabaseError> {
        sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Report not found".to_string()))
    }

    pub async fn list(
        &self,
        scope: Scope,
        filters: &[Filter],
        page: Option<PageRequest>,
    ) -> Result<Listing<Report>, DatabaseError> {
        repository::list(self.pool, "reports", scope, filters, page).await
    }

    pub async fn create(&self, new: &NewReport) -> Result<Report, DatabaseError> {
        let report = sqlx::query_as::<_, Report>(
            "INSERT INTO reports (id, report_title, content, place, priority, owner_id, assigned_to_id, images) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.report_title)
        .bind(&new.content)
        .bind(&new.place)
        .bind(new.priority.as_str())
        .bind(new.owner_id)
        .bind(new.assigned_to_id)
        .bind(Json(&new.images))
        .fetch_one(self.pool)
        .await?;
        Ok(report)
    }

    /// Compare-and-set save of fields plus images; see `PageRepository::save`.
    pub async fn save(
        &self,
        id: Uuid,
        changes: &ReportChanges,
        previous: &ImageCollection,
        images: &ImageCollection,
    ) -> Result<Report, DatabaseError> {
        let updated = sqlx::query_as::<_, Report>(
            "UPDATE reports SET \
                report_title = COALESCE($2, report_title), \
                content = COALESCE($3, content), \
                place = COALESCE($4, place), \
                priority = COALESCE($5, priority), \
                status = COALESCE($6, status), \
                assigned_to_id = CASE WHEN $7 THEN $8 ELSE assigned_to_id END, \
                images = $9 \
             WHERE id = $1 AND images = $10 RETURNING *",
        )
        .bind(id)
        .bind(&changes.report_title)
        .bind(&changes.content)
        .bind(&changes.place)
        .bind(changes.priority.map(|p| p.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.assigned_to.is_some())
        .bind(changes.assigned_to.flatten())
        .bind(Json(images))
        .bind(Json(previous))
        .fetch_optional(self.pool)
        .await?;

        match updated {
            Some(report) => Ok(report),
            None => {
                self.get(id).await?;
                Err(DatabaseError::Conflict(
                    "Report images were modified concurrently, please retry".to_string(),
                ))
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<Report, DatabaseError> {
        sqlx::query_as::<_, Report>("DELETE FROM reports WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Report not found".to_string()))
    }
}
