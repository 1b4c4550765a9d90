use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{bearer_token, validate_jwt, AuthError};
use crate::database::models::Account;
use crate::database::AccountRepository;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Role;

/// Authenticated account, loaded fresh from the database for each request
#[derive(Clone, Debug)]
pub struct CurrentAccount {
    pub account: Account,
}

impl CurrentAccount {
    pub fn id(&self) -> Uuid {
        self.account.id
    }

    pub fn role(&self) -> Role {
        self.account.role
    }

    pub fn is_admin(&self) -> bool {
        self.account.role.is_admin()
    }
}

/// Validates the bearer JWT, requires it to be the account's current session
/// token, and injects `CurrentAccount` into the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()?;
    let token = bearer_token(header)?.to_string();

    let claims = validate_jwt(&token, &state.config.security).map_err(|err| {
        warn!("Rejected token: {}", err);
        ApiError::unauthorized("Invalid token")
    })?;

    let record = AccountRepository::new(state.db.pool())
        .find_with_secrets(claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(account_id = %claims.sub, "Token for unknown account");
            ApiError::unauthorized("Account not found")
        })?;

    if record.token.as_deref() != Some(token.as_str()) {
        warn!(account_id = %claims.sub, "Token is not the current session");
        return Err(ApiError::unauthorized("Session expired, please log in again"));
    }

    debug!(account_id = %record.account.id, role = %record.account.role, "Authenticated request");
    request.extensions_mut().insert(CurrentAccount { account: record.account });

    Ok(next.run(request).await)
}

/// Must run after `jwt_auth_middleware`.
pub async fn require_admin(
    Extension(current): Extension<CurrentAccount>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !current.is_admin() {
        warn!(account_id = %current.id(), "Non-admin attempted admin route");
        return Err(ApiError::forbidden("Admin only"));
    }
    Ok(next.run(request).await)
}
