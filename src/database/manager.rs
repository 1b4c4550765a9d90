use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    let message = match db_err.constraint() {
                        Some("accounts_email_key") => "Email already in use",
                        _ => "Resource already exists",
                    };
                    return DatabaseError::Conflict(message.to_string());
                }
                // foreign_key_violation
                Some("23503") => {
                    return DatabaseError::Conflict(
                        "Resource is still referenced by other documents".to_string(),
                    );
                }
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Connection pool for the application database
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    fn options(config: &DatabaseConfig) -> Result<PgPoolOptions, DatabaseError> {
        if config.url.trim().is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        Ok(PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout)))
    }

    /// Connect eagerly, failing if the database cannot be reached.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = Self::options(config)?.connect(&config.url).await?;
        info!(max_connections = config.max_connections, "Created database pool");
        Ok(Self { pool })
    }

    /// Build the pool without opening a connection; connections are made on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = Self::options(config)?.connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
