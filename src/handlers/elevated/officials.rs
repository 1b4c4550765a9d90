use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::database::models::{Official, Populated};
use crate::database::officials::{NewOfficial, OfficialChanges};
use crate::database::repository::{populate, populate_one};
use crate::database::{OfficialRepository, Scope};
use crate::error::ApiError;
use crate::handlers::utils::{ensure_account_exists, ensure_assignee_exists, json_body};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{
    double_option, parse_assignment, parse_id, parse_reference, validate_url, FieldErrors,
};

const NAME_MAX: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfBody {
    pub url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub file_name: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialBody {
    pub document_name: Option<String>,
    pub pdf: Option<PdfBody>,
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
}

impl OfficialBody {
    fn assignment(&self) -> Option<Option<&str>> {
        self.assigned_to.as_ref().map(|value| value.as_deref())
    }

    fn pdf_url(&self) -> Option<&str> {
        self.pdf.as_ref().and_then(|pdf| pdf.url.as_deref())
    }

    fn pdf_file_name(&self) -> Option<Option<String>> {
        self.pdf
            .as_ref()
            .and_then(|pdf| pdf.file_name.clone())
            .map(|name| name.filter(|n| !n.trim().is_empty()))
    }

    fn validate_new(&self) -> Result<NewOfficial, ApiError> {
        let mut errors = FieldErrors::new();

        let document_name = errors.required("documentName", self.document_name.as_deref());
        errors.max_len("documentName", document_name.as_deref(), NAME_MAX);
        let pdf_url = errors.required("pdf.url", self.pdf_url());
        if let Some(url) = &pdf_url {
            if let Err(message) = validate_url(url) {
                errors.add("pdf.url", message);
            }
        }
        let owner_id = parse_reference(&mut errors, "owner", self.owner.as_deref());
        let assigned_to = parse_assignment(&mut errors, "assignedTo", self.assignment());

        errors.finish()?;
        match (document_name, pdf_url, owner_id) {
            (Some(document_name), Some(pdf_url), Some(owner_id)) => Ok(NewOfficial {
                document_name,
                pdf_url,
                pdf_file_name: self.pdf_file_name().flatten(),
                owner_id,
                assigned_to_id: assigned_to.flatten(),
            }),
            _ => Err(ApiError::bad_request("documentName, pdf.url and owner are required")),
        }
    }

    fn validate_changes(&self) -> Result<OfficialChanges, ApiError> {
        let mut errors = FieldErrors::new();

        let document_name = errors.optional(self.document_name.as_deref());
        errors.max_len("documentName", document_name.as_deref(), NAME_MAX);
        let pdf_url = errors.optional(self.pdf_url());
        if let Some(url) = &pdf_url {
            if let Err(message) = validate_url(url) {
                errors.add("pdf.url", message);
            }
        }
        let owner_id = match errors.optional(self.owner.as_deref()) {
            Some(owner) => parse_reference(&mut errors, "owner", Some(&owner)),
            None => None,
        };
        let assigned_to = parse_assignment(&mut errors, "assignedTo", self.assignment());

        errors.finish()?;
        Ok(OfficialChanges {
            document_name,
            pdf_url,
            pdf_file_name: self.pdf_file_name(),
            owner_id,
            assigned_to,
        })
    }
}

/// GET /admin/officials - every document, unpaginated
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Populated<Official>>> {
    let pool = state.db.pool();
    let listing = OfficialRepository::new(pool)
        .list(Scope::All, &[], None)
        .await?;

    Ok(ApiResponse::success(populate(pool, listing.items).await?))
}

/// POST /admin/officials
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<OfficialBody>, JsonRejection>,
) -> ApiResult<Populated<Official>> {
    let new = json_body(payload)?.validate_new()?;
    ensure_account_exists(&state, new.owner_id, "Owner").await?;
    ensure_assignee_exists(&state, new.assigned_to_id.map(Some)).await?;

    let pool = state.db.pool();
    let official = OfficialRepository::new(pool).create(&new).await?;

    info!(official_id = %official.id, "Document created");
    Ok(ApiResponse::created(populate_one(pool, official).await?).message("Document created"))
}

/// PUT /admin/officials/:id - a new `pdf.url` refreshes the upload date
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<OfficialBody>, JsonRejection>,
) -> ApiResult<Populated<Official>> {
    let id = parse_id(&id)?;
    let changes = json_body(payload)?.validate_changes()?;
    let pool = state.db.pool();
    let repo = OfficialRepository::new(pool);

    let current = repo.get(id).await?;
    if let Some(owner_id) = changes.owner_id.filter(|owner| *owner != current.owner_id) {
        ensure_account_exists(&state, owner_id, "Owner").await?;
    }
    ensure_assignee_exists(&state, changes.assigned_to).await?;

    let official = repo.update(id, &changes).await?;
    info!(official_id = %id, "Document updated");
    Ok(ApiResponse::success(populate_one(pool, official).await?).message("Document updated"))
}

/// DELETE /admin/officials/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id)?;
    OfficialRepository::new(state.db.pool()).delete(id).await?;

    info!(official_id = %id, "Document deleted");
    Ok(ApiResponse::ok_message("Document deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn nested_pdf_is_read() {
        let owner = Uuid::new_v4();
        let body: OfficialBody = serde_json::from_value(json!({
            "documentName": "Contract",
            "pdf": { "url": "https://files.acme.io/contract.pdf", "fileName": "contract.pdf" },
            "owner": owner.to_string()
        }))
        .unwrap();

        let new = body.validate_new().unwrap();
        assert_eq!(new.pdf_url, "https://files.acme.io/contract.pdf");
        assert_eq!(new.pdf_file_name.as_deref(), Some("contract.pdf"));
        assert_eq!(new.owner_id, owner);
    }

    #[test]
    fn pdf_url_must_be_http() {
        let body: OfficialBody = serde_json::from_value(json!({
            "documentName": "Contract",
            "pdf": { "url": "ftp://files.acme.io/contract.pdf" },
            "owner": Uuid::new_v4().to_string()
        }))
        .unwrap();

        match body.validate_new().unwrap_err() {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert!(fields.contains_key("pdf.url"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn changes_can_clear_file_name() {
        let body: OfficialBody =
            serde_json::from_value(json!({ "pdf": { "fileName": null } })).unwrap();
        let changes = body.validate_changes().unwrap();

        assert_eq!(changes.pdf_url, None);
        assert_eq!(changes.pdf_file_name, Some(None));
        assert_eq!(changes.assigned_to, None);
    }
}
