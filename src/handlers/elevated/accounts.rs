use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{generate_password, hash_password_task};
use crate::database::accounts::{AccountChanges, NewAccount};
use crate::database::models::account::{DEFAULT_DUE_DATE, DEFAULT_PROJECT_NAME};
use crate::database::models::Account;
use crate::database::{AccountRepository, DatabaseError};
use crate::error::ApiError;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::services::mailer::{password_mail, Mailer};
use crate::state::AppState;
use crate::types::Role;
use crate::validation::{parse_id, validate_email_format, FieldErrors};

const PROJECT_NAME_MAX: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBody {
    pub project_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub due_date: Option<String>,
}

impl AccountBody {
    fn validate_new(self) -> Result<NewAccount, ApiError> {
        let mut errors = FieldErrors::new();

        let email = errors.required("email", self.email.as_deref());
        if let Some(email) = &email {
            if let Err(message) = validate_email_format(email) {
                errors.add("email", message);
            }
        }
        let project_name = errors.optional(self.project_name.as_deref());
        errors.max_len("projectName", project_name.as_deref(), PROJECT_NAME_MAX);
        let role = errors.parse::<Role>("role", self.role.as_deref());

        errors.finish()?;
        let email = email.ok_or_else(|| ApiError::bad_request("Email is required"))?;
        Ok(NewAccount {
            project_name: project_name.unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            email,
            role: role.unwrap_or_default(),
            due_date: self.due_date.unwrap_or_else(|| DEFAULT_DUE_DATE.to_string()),
            password_hash: None,
        })
    }

    fn validate_changes(self) -> Result<AccountChanges, ApiError> {
        let mut errors = FieldErrors::new();

        let email = errors.optional(self.email.as_deref());
        if let Some(email) = &email {
            if let Err(message) = validate_email_format(email) {
                errors.add("email", message);
            }
        }
        let project_name = errors.optional(self.project_name.as_deref());
        errors.max_len("projectName", project_name.as_deref(), PROJECT_NAME_MAX);
        let role = errors.parse::<Role>("role", self.role.as_deref());

        errors.finish()?;
        Ok(AccountChanges {
            project_name,
            email,
            role,
            due_date: self.due_date,
        })
    }
}

/// GET /admin/accounts
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Account>> {
    let accounts = AccountRepository::new(state.db.pool()).list().await?;
    Ok(ApiResponse::success(accounts))
}

/// GET /admin/accounts/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Account> {
    let account = AccountRepository::new(state.db.pool()).get(parse_id(&id)?).await?;
    Ok(ApiResponse::success(account))
}

/// POST /admin/accounts - creates the account and mails it a generated password
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<AccountBody>, JsonRejection>,
) -> ApiResult<Account> {
    let mut new = json_body(payload)?.validate_new()?;
    let repo = AccountRepository::new(state.db.pool());

    if repo.email_taken(&new.email, None).await? {
        return Err(ApiError::conflict("Email already in use"));
    }

    let password = generate_password();
    new.password_hash =
        Some(hash_password_task(password.clone(), state.config.security.bcrypt_cost).await?);
    let account = repo.create(&new).await?;
    info!(account_id = %account.id, role = %account.role, "Account created");

    notify_created(state.mailer.as_ref(), &account, &password).await;

    Ok(ApiResponse::created(account).message("Account created, password sent by email"))
}

/// PUT /admin/accounts/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AccountBody>, JsonRejection>,
) -> ApiResult<Account> {
    let id = parse_id(&id)?;
    let changes = json_body(payload)?.validate_changes()?;
    let repo = AccountRepository::new(state.db.pool());

    repo.get(id).await?;
    if let Some(email) = &changes.email {
        if repo.email_taken(email, Some(id)).await? {
            return Err(ApiError::conflict("Email already in use by another account"));
        }
    }

    let account = repo.update(id, &changes).await?;
    info!(account_id = %id, "Account updated");
    Ok(ApiResponse::success(account).message("Account updated"))
}

/// POST /admin/accounts/:id/reset-password - new password, mailed; ends the current session
pub async fn reset_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let repo = AccountRepository::new(state.db.pool());
    let account = repo.get(parse_id(&id)?).await?;

    let password = generate_password();
    let hash = hash_password_task(password.clone(), state.config.security.bcrypt_cost).await?;
    repo.set_password_hash(account.id, &hash).await?;
    info!(account_id = %account.id, "Password reset");

    notify_reset(state.mailer.as_ref(), &account, &password).await?;

    Ok(ApiResponse::ok_message("New password sent by email"))
}

/// The account stays usable when this mail fails; an admin can reset the password later.
async fn notify_created(mailer: &dyn Mailer, account: &Account, password: &str) {
    let mail = password_mail(&account.email, password, &account.project_name);
    if let Err(e) = mailer.send(mail).await {
        error!(account_id = %account.id, "Password mail failed: {}", e);
    }
}

/// The new hash is already stored, so a lost mail is reported as a server error.
async fn notify_reset(
    mailer: &dyn Mailer,
    account: &Account,
    password: &str,
) -> Result<(), ApiError> {
    let mail = password_mail(&account.email, password, &account.project_name);
    mailer.send(mail).await.map_err(|e| {
        error!(account_id = %account.id, "Password mail failed: {}", e);
        ApiError::internal_server_error("Account updated but the email could not be sent")
    })
}

/// DELETE /admin/accounts/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    if id == current.id() {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let deleted = match AccountRepository::new(state.db.pool()).delete(id).await {
        Ok(deleted) => deleted,
        Err(DatabaseError::Conflict(_)) => {
            warn!(account_id = %id, "Refused to delete account that still owns documents");
            return Err(ApiError::conflict("Account still owns documents"));
        }
        Err(e) => return Err(e.into()),
    };
    if !deleted {
        return Err(ApiError::not_found("Account not found"));
    }

    info!(account_id = %id, "Account deleted");
    Ok(ApiResponse::ok_message("Account deleted"))
}
