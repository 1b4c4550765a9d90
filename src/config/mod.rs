use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub cloudinary: CloudinaryConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender address; mail is only logged when unset.
    pub from: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("DEVTRACK_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        // Media store
        self.cloudinary.cloud_name = env::var("CLOUDINARY_CLOUD_NAME").ok().or(self.cloudinary.cloud_name);
        self.cloudinary.api_key = env::var("CLOUDINARY_API_KEY").ok().or(self.cloudinary.api_key);
        self.cloudinary.api_secret = env::var("CLOUDINARY_API_SECRET").ok().or(self.cloudinary.api_secret);
        if let Ok(v) = env::var("CLOUDINARY_API_BASE") {
            self.cloudinary.api_base = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_TIMEOUT_SECS") {
            self.cloudinary.timeout_secs = v.parse().unwrap_or(self.cloudinary.timeout_secs);
        }

        // Mail
        if let Ok(v) = env::var("MAIL_FROM") {
            self.mail.from = Some(v).filter(|s| !s.trim().is_empty());
        }

        self
    }

    /// Problems that make the configuration unusable for the current environment.
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err("JWT_SECRET must be set".to_string());
        }
        if self.environment == Environment::Production && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err("JWT_SECRET must be overridden in production".to_string());
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(format!("SECURITY_BCRYPT_COST must be within 4..=31, got {}", self.security.bcrypt_cost));
        }
        Ok(())
    }

    /// Names of the missing Cloudinary settings.
    pub fn missing_cloudinary_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cloudinary.cloud_name.as_deref().map_or(true, str::is_empty) {
            missing.push("CLOUDINARY_CLOUD_NAME");
        }
        if self.cloudinary.api_key.as_deref().map_or(true, str::is_empty) {
            missing.push("CLOUDINARY_API_KEY");
        }
        if self.cloudinary.api_secret.as_deref().map_or(true, str::is_empty) {
            missing.push("CLOUDINARY_API_SECRET");
        }
        missing
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            port: 3000,
            database: DatabaseConfig {
                url: "postgres://localhost:5432/devtrack".to_string(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 30 * 1024 * 1024, // 5 images of 5MB plus form fields
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                bcrypt_cost: 10,
            },
            cloudinary: CloudinaryConfig::default(),
            mail: MailConfig { from: None },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            port: 3000,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 30 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 12,
            },
            cloudinary: CloudinaryConfig::default(),
            mail: MailConfig { from: None },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            port: 3000,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 30 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 12,
            },
            cloudinary: CloudinaryConfig::default(),
            mail: MailConfig { from: None },
        }
    }
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            timeout_secs: 30,
        }
    }
}

const DEV_JWT_SECRET: &str = "devtrack-development-secret";
