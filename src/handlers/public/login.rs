use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{generate_jwt, verify_password_task, Claims};
use crate::database::models::Account;
use crate::database::AccountRepository;
use crate::error::ApiError;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Slows down password guessing against known emails.
const WRONG_PASSWORD_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Account,
}

/// POST /login - exchange email and password for a session JWT
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let body = json_body(payload)?;
    let (email, password) = match (body.email.as_deref().map(str::trim), body.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email.to_string(), password)
        }
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    let repo = AccountRepository::new(state.db.pool());
    let record = repo.find_with_secrets_by_email(&email).await?.ok_or_else(|| {
        warn!(email = %email, "Login for unknown email");
        ApiError::unauthorized("Invalid email or password")
    })?;

    let Some(hash) = record.password_hash else {
        warn!(account_id = %record.account.id, "Login to account without password");
        return Err(ApiError::unauthorized("Account not activated or password not set"));
    };

    if !verify_password_task(password, hash).await? {
        tokio::time::sleep(WRONG_PASSWORD_DELAY).await;
        warn!(account_id = %record.account.id, "Wrong password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let account = record.account;
    let claims = Claims::new(
        account.id,
        account.email.clone(),
        account.role,
        state.config.security.jwt_expiry_hours,
    );
    let token = generate_jwt(&claims, &state.config.security)?;
    repo.set_token(account.id, Some(&token)).await?;

    info!(account_id = %account.id, role = %account.role, "Login successful");
    Ok(ApiResponse::success(LoginResponse { token, user: account }).message("Login successful"))
}
