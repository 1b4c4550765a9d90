use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::media::ImageCollection;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub page_name: String,
    pub description: String,
    #[serde(skip)]
    pub owner_id: Uuid,
    #[serde(skip)]
    pub assigned_to_id: Option<Uuid>,
    pub images: Json<ImageCollection>,
    pub created_at: DateTime<Utc>,
}
