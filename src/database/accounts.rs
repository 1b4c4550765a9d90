use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, AccountWithSecrets};
use crate::types::Role;

const ACCOUNT_COLUMNS: &str = "id, project_name, email, role, due_date, created_at";

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub project_name: String,
    pub email: String,
    pub role: Role,
    pub due_date: String,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub project_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub due_date: Option<String>,
}

pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(account)
    }

    pub async fn get(&self, id: Uuid) -> Result<Account, DatabaseError> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Account not found".to_string()))
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn find_with_secrets(&self, id: Uuid) -> Result<Option<AccountWithSecrets>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountWithSecrets>(&format!(
            "SELECT {}, password_hash, token FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_with_secrets_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountWithSecrets>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountWithSecrets>(&format!(
            "SELECT {}, password_hash, token FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// True when another account (other than `except`) already uses this email.
    pub async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, DatabaseError> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(normalize_email(email))
        .bind(except)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn list(&self) -> Result<Vec<Account>, DatabaseError> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts ORDER BY created_at DESC",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(accounts)
    }

    pub async fn first_admin(&self) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE role = 'admin' ORDER BY created_at LIMIT 1",
            ACCOUNT_COLUMNS
        ))
        .fetch_optional(self.pool)
        .await?;
        Ok(account)
    }

    pub async fn create(&self, new: &NewAccount) -> Result<Account, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, project_name, email, role, due_date, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new.project_name)
        .bind(normalize_email(&new.email))
        .bind(new.role.as_str())
        .bind(&new.due_date)
        .bind(&new.password_hash)
        .fetch_one(self.pool)
        .await?;
        Ok(account)
    }

    pub async fn update(&self, id: Uuid, changes: &AccountChanges) -> Result<Account, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET \
                project_name = COALESCE($2, project_name), \
                email = COALESCE($3, email), \
                role = COALESCE($4, role), \
                due_date = COALESCE($5, due_date) \
             WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.project_name)
        .bind(changes.email.as_deref().map(normalize_email))
        .bind(changes.role.map(|r| r.as_str()))
        .bind(&changes.due_date)
        .fetch_optional(self.pool)
        .await?;

        account.ok_or_else(|| DatabaseError::NotFound("Account not found".to_string()))
    }

    pub async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $2, token = NULL WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Account not found".to_string()));
        }
        Ok(())
    }

    /// Store the current session token, or clear it with `None`.
    pub async fn set_token(&self, id: Uuid, token: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE accounts SET token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Returns false when no such account existed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
