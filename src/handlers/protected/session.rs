use axum::{extract::State, Extension};
use tracing::info;

use crate::database::models::Account;
use crate::database::AccountRepository;
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::state::AppState;

/// GET /me
pub async fn me(Extension(current): Extension<CurrentAccount>) -> ApiResponse<Account> {
    ApiResponse::success(current.account)
}

/// POST /logout - revokes the stored session token
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> ApiResult<()> {
    AccountRepository::new(state.db.pool())
        .set_token(current.id(), None)
        .await?;

    info!(account_id = %current.id(), "Logged out");
    Ok(ApiResponse::ok_message("Logged out"))
}
