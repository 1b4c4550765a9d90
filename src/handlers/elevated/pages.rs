use axum::extract::{Multipart, Path, State};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{Page, Populated};
use crate::database::pages::{NewPage, PageChanges};
use crate::database::repository::populate_one;
use crate::database::PageRepository;
use crate::error::ApiError;
use crate::handlers::utils::{ensure_account_exists, ensure_assignee_exists, MultipartForm};
use crate::media::{ImageCollection, ImagePolicy, ImageSynchronizer, SyncRequest};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{parse_assignment, parse_id, parse_reference, FieldErrors};

const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 5000;

/// Older clients send the capitalized field name.
const DESCRIPTION_FIELDS: [&str; 2] = ["description", "Description"];

#[derive(Debug)]
struct PageInput {
    page_name: String,
    description: String,
    owner_id: Uuid,
    assigned_to_id: Option<Uuid>,
}

fn validate_new(form: &MultipartForm) -> Result<PageInput, ApiError> {
    let mut errors = FieldErrors::new();

    let page_name = errors.required("pageName", form.text("pageName"));
    errors.max_len("pageName", page_name.as_deref(), NAME_MAX);
    let description = errors.required("description", form.text_any(&DESCRIPTION_FIELDS));
    errors.max_len("description", description.as_deref(), DESCRIPTION_MAX);
    let owner_id = parse_reference(&mut errors, "owner", form.text("owner"));
    let assigned_to = parse_assignment(&mut errors, "assignedTo", form.assignment("assignedTo"));

    errors.finish()?;
    match (page_name, description, owner_id) {
        (Some(page_name), Some(description), Some(owner_id)) => Ok(PageInput {
            page_name,
            description,
            owner_id,
            assigned_to_id: assigned_to.flatten(),
        }),
        _ => Err(ApiError::bad_request("pageName, description and owner are required")),
    }
}

fn validate_changes(form: &MultipartForm) -> Result<PageChanges, ApiError> {
    let mut errors = FieldErrors::new();

    let page_name = errors.optional(form.text("pageName"));
    errors.max_len("pageName", page_name.as_deref(), NAME_MAX);
    let description = errors.optional(form.text_any(&DESCRIPTION_FIELDS));
    errors.max_len("description", description.as_deref(), DESCRIPTION_MAX);
    let owner_id = match errors.optional(form.text("owner")) {
        Some(owner) => parse_reference(&mut errors, "owner", Some(&owner)),
        None => None,
    };
    let assigned_to = parse_assignment(&mut errors, "assignedTo", form.assignment("assignedTo"));

    errors.finish()?;
    Ok(PageChanges {
        page_name,
        description,
        owner_id,
        assigned_to,
    })
}

/// POST /admin/page - multipart, at most five images
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Populated<Page>> {
    let mut form = MultipartForm::read(multipart, ImagePolicy::PAGE.max).await?;
    let input = validate_new(&form)?;
    ensure_account_exists(&state, input.owner_id, "Owner").await?;
    ensure_assignee_exists(&state, input.assigned_to_id.map(Some)).await?;

    let sync = ImageSynchronizer::new(state.media.as_ref(), ImagePolicy::PAGE);
    let images = sync
        .apply(&ImageCollection::new(), SyncRequest::add_only(form.take_files()))
        .await?;

    let new = NewPage {
        page_name: input.page_name,
        description: input.description,
        owner_id: input.owner_id,
        assigned_to_id: input.assigned_to_id,
        images,
    };

    let pool = state.db.pool();
    let page = match PageRepository::new(pool).create(&new).await {
        Ok(page) => page,
        Err(err) => {
            warn!("Page insert failed, discarding {} uploaded images", new.images.len());
            sync.discard(new.images.as_slice()).await;
            return Err(err.into());
        }
    };

    info!(page_id = %page.id, images = page.images.len(), "Page created");
    Ok(ApiResponse::created(populate_one(pool, page).await?).message("Page created"))
}

/// PUT /admin/page/:id - multipart field changes plus `images` / `imagesToDelete`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Populated<Page>> {
    let id = parse_id(&id)?;
    let pool = state.db.pool();
    let repo = PageRepository::new(pool);
    let page = repo.get(id).await?;

    let mut form = MultipartForm::read(multipart, ImagePolicy::PAGE.max).await?;
    let changes = validate_changes(&form)?;
    if let Some(owner_id) = changes.owner_id.filter(|owner| *owner != page.owner_id) {
        ensure_account_exists(&state, owner_id, "Owner").await?;
    }
    ensure_assignee_exists(&state, changes.assigned_to).await?;
    let request = SyncRequest::new(form.images_to_delete()?, form.take_files());

    let previous = page.images.0;
    let sync = ImageSynchronizer::new(state.media.as_ref(), ImagePolicy::PAGE);
    let images = sync.apply(&previous, request).await?;

    let saved = match repo.save(id, &changes, &previous, &images).await {
        Ok(saved) => saved,
        Err(err) => {
            sync.discard(&images.added_since(&previous)).await;
            return Err(err.into());
        }
    };

    info!(page_id = %id, images = saved.images.len(), "Page updated");
    Ok(ApiResponse::success(populate_one(pool, saved).await?).message("Page updated"))
}

/// DELETE /admin/page/:id - removes the page and its remote images
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id)?;
    let removed = PageRepository::new(state.db.pool()).delete(id).await?;

    ImageSynchronizer::new(state.media.as_ref(), ImagePolicy::PAGE)
        .purge(&removed.images)
        .await;

    info!(page_id = %id, "Page deleted");
    Ok(ApiResponse::ok_message("Page deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_capitalized_description() {
        let owner = Uuid::new_v4().to_string();
        let form = MultipartForm::from_fields(&[
            ("pageName", "Landing"),
            ("Description", "Marketing home"),
            ("owner", owner.as_str()),
        ]);
        let input = validate_new(&form).unwrap();
        assert_eq!(input.description, "Marketing home");
        assert_eq!(input.assigned_to_id, None);
    }

    #[test]
    fn owner_must_be_an_id() {
        let form = MultipartForm::from_fields(&[
            ("pageName", "Landing"),
            ("description", "Home"),
            ("owner", "alice"),
        ]);
        match validate_new(&form).unwrap_err() {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert_eq!(fields["owner"], "Invalid ID");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn changes_distinguish_absent_and_cleared_assignee() {
        let untouched = validate_changes(&MultipartForm::from_fields(&[("pageName", "New")])).unwrap();
        assert_eq!(untouched.assigned_to, None);
        assert_eq!(untouched.page_name.as_deref(), Some("New"));

        let cleared =
            validate_changes(&MultipartForm::from_fields(&[("assignedTo", "null")])).unwrap();
        assert_eq!(cleared.assigned_to, Some(None));
    }
}
