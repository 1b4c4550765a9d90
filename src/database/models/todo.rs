use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{TodoPriority, TodoStatus};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(skip)]
    pub owner_id: Uuid,
    #[serde(skip)]
    pub assigned_to_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub status: TodoStatus,
    #[sqlx(try_from = "String")]
    pub priority: TodoPriority,
    pub created_at: DateTime<Utc>,
}
