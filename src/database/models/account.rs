use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

pub const DEFAULT_PROJECT_NAME: &str = "Mon Projet";
pub const DEFAULT_DUE_DATE: &str = "No Due Date !";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub project_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub due_date: String,
    pub created_at: DateTime<Utc>,
}

/// Account row including credential columns. Not serializable.
#[derive(Debug, Clone, FromRow)]
pub struct AccountWithSecrets {
    #[sqlx(flatten)]
    pub account: Account,
    pub password_hash: Option<String>,
    pub token: Option<String>,
}

/// The account fields embedded in populated documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub project_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            project_name: account.project_name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}
