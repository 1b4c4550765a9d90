use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PdfDocument {
    #[sqlx(rename = "pdf_url")]
    pub url: String,
    #[sqlx(rename = "pdf_file_name")]
    pub file_name: Option<String>,
    #[sqlx(rename = "pdf_uploaded_at")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Official {
    pub id: Uuid,
    pub document_name: String,
    #[sqlx(flatten)]
    pub pdf: PdfDocument,
    #[serde(skip)]
    pub owner_id: Uuid,
    #[serde(skip)]
    pub assigned_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
