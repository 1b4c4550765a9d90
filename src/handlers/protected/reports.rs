use axum::{
    extract::{Multipart, Path, Query, State},
    Extension,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{Owned, Populated, Report};
use crate::database::reports::{NewReport, ReportChanges};
use crate::database::repository::{populate, populate_one};
use crate::database::{ReportRepository, Scope};
use crate::error::ApiError;
use crate::handlers::utils::{
    contains_filter, ensure_assignee_exists, ensure_visible, ListParams, MultipartForm,
};
use crate::media::{ImageCollection, ImagePolicy, ImageSynchronizer, SyncRequest};
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::state::AppState;
use crate::types::{ReportPriority, ReportStatus};
use crate::validation::{parse_assignment, parse_id, FieldErrors};

const TITLE_MAX: usize = 300;
const CONTENT_MAX: usize = 5000;
const PLACE_MAX: usize = 500;

#[derive(Debug, PartialEq)]
struct ReportInput {
    report_title: String,
    content: String,
    place: String,
    priority: ReportPriority,
    assigned_to_id: Option<Uuid>,
}

fn validate_new(form: &MultipartForm) -> Result<ReportInput, ApiError> {
    let mut errors = FieldErrors::new();

    let report_title = errors.required("reportTitle", form.text("reportTitle"));
    errors.max_len("reportTitle", report_title.as_deref(), TITLE_MAX);
    let content = errors.required("content", form.text("content"));
    errors.max_len("content", content.as_deref(), CONTENT_MAX);
    let place = errors.required("place", form.text("place"));
    errors.max_len("place", place.as_deref(), PLACE_MAX);
    let priority = errors.parse::<ReportPriority>("priority", form.text("priority"));
    let assigned_to = parse_assignment(&mut errors, "assignedTo", form.assignment("assignedTo"));

    errors.finish()?;
    match (report_title, content, place) {
        (Some(report_title), Some(content), Some(place)) => Ok(ReportInput {
            report_title,
            content,
            place,
            priority: priority.unwrap_or_default(),
            assigned_to_id: assigned_to.flatten(),
        }),
        _ => Err(ApiError::bad_request("reportTitle, place and content are required")),
    }
}

fn validate_changes(form: &MultipartForm) -> Result<ReportChanges, ApiError> {
    let mut errors = FieldErrors::new();

    let report_title = errors.optional(form.text("reportTitle"));
    errors.max_len("reportTitle", report_title.as_deref(), TITLE_MAX);
    let content = errors.optional(form.text("content"));
    errors.max_len("content", content.as_deref(), CONTENT_MAX);
    let place = errors.optional(form.text("place"));
    errors.max_len("place", place.as_deref(), PLACE_MAX);
    let priority = errors.parse::<ReportPriority>("priority", form.text("priority"));
    let status = errors.parse::<ReportStatus>("status", form.text("status"));
    let assigned_to = parse_assignment(&mut errors, "assignedTo", form.assignment("assignedTo"));

    errors.finish()?;
    Ok(ReportChanges {
        report_title,
        content,
        place,
        priority,
        status,
        assigned_to,
    })
}

fn ensure_can_modify(report: &Report, current: &CurrentAccount) -> Result<(), ApiError> {
    if current.is_admin() || report.is_owned_by(current.id()) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only the owner or an admin can modify this report"))
    }
}

/// POST /report - multipart, at most two images
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    multipart: Multipart,
) -> ApiResult<Populated<Report>> {
    let mut form = MultipartForm::read(multipart, ImagePolicy::REPORT.max).await?;
    let input = validate_new(&form)?;
    ensure_assignee_exists(&state, input.assigned_to_id.map(Some)).await?;

    let sync = ImageSynchronizer::new(state.media.as_ref(), ImagePolicy::REPORT);
    let images = sync
        .apply(&ImageCollection::new(), SyncRequest::add_only(form.take_files()))
        .await?;

    let new = NewReport {
        report_title: input.report_title,
        content: input.content,
        place: input.place,
        priority: input.priority,
        owner_id: current.id(),
        assigned_to_id: input.assigned_to_id,
        images,
    };

    let pool = state.db.pool();
    let report = match ReportRepository::new(pool).create(&new).await {
        Ok(report) => report,
        Err(err) => {
            warn!("Report insert failed, discarding {} uploaded images", new.images.len());
            sync.discard(new.images.as_slice()).await;
            return Err(err.into());
        }
    };

    info!(report_id = %report.id, owner_id = %current.id(), "Report created");
    Ok(ApiResponse::created(populate_one(pool, report).await?).message("Report created"))
}

/// GET /report/rapport - visible reports, `reportTitle` filter
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Populated<Report>>> {
    list_scoped(&state, Scope::visible_to(current.id(), current.role()), &params).await
}

pub(crate) async fn list_scoped(
    state: &AppState,
    scope: Scope,
    params: &ListParams,
) -> ApiResult<Vec<Populated<Report>>> {
    let pool = state.db.pool();
    let filters: Vec<_> = contains_filter("report_title", params.report_title.as_deref())
        .into_iter()
        .collect();

    let listing = ReportRepository::new(pool)
        .list(scope, &filters, Some(params.page_request()))
        .await?;

    let reports = populate(pool, listing.items).await?;
    Ok(ApiResponse::success(reports).paginated(listing.pagination))
}

/// GET /report/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> ApiResult<Populated<Report>> {
    let pool = state.db.pool();
    let report = ReportRepository::new(pool).get(parse_id(&id)?).await?;
    ensure_visible(&report, &current)?;

    Ok(ApiResponse::success(populate_one(pool, report).await?))
}

/// PUT /report/:id - multipart field changes plus `images` / `imagesToDelete`
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Populated<Report>> {
    let id = parse_id(&id)?;
    let pool = state.db.pool();
    let repo = ReportRepository::new(pool);

    let report = repo.get(id).await?;
    ensure_can_modify(&report, &current)?;

    let mut form = MultipartForm::read(multipart, ImagePolicy::REPORT.max).await?;
    let changes = validate_changes(&form)?;
    ensure_assignee_exists(&state, changes.assigned_to).await?;
    let request = SyncRequest::new(form.images_to_delete()?, form.take_files());

    let previous = report.images.0;
    let sync = ImageSynchronizer::new(state.media.as_ref(), ImagePolicy::REPORT);
    let images = sync.apply(&previous, request).await?;

    let saved = match repo.save(id, &changes, &previous, &images).await {
        Ok(saved) => saved,
        Err(err) => {
            sync.discard(&images.added_since(&previous)).await;
            return Err(err.into());
        }
    };

    info!(report_id = %id, images = saved.images.len(), "Report updated");
    Ok(ApiResponse::success(populate_one(pool, saved).await?).message("Report updated"))
}

/// DELETE /report/:id - removes the report and its remote images
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    let repo = ReportRepository::new(state.db.pool());

    let report = repo.get(id).await?;
    ensure_can_modify(&report, &current)?;

    let removed = repo.delete(id).await?;
    ImageSynchronizer::new(state.media.as_ref(), ImagePolicy::REPORT)
        .purge(&removed.images)
        .await;

    info!(report_id = %id, "Report deleted");
    Ok(ApiResponse::ok_message("Report deleted"))
}
