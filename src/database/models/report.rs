use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::media::ImageCollection;
use crate::types::{ReportPriority, ReportStatus};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub report_title: String,
    pub content: String,
    pub place: String,
    #[sqlx(try_from = "String")]
    pub priority: ReportPriority,
    #[sqlx(try_from = "String")]
    pub status: ReportStatus,
    #[serde(skip)]
    pub owner_id: Uuid,
    #[serde(skip)]
    pub assigned_to_id: Option<Uuid>,
    pub images: Json<ImageCollection>,
    pub created_at: DateTime<Utc>,
}
