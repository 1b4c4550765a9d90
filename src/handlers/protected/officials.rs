use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::database::models::{Official, Populated};
use crate::database::repository::{populate, populate_one};
use crate::database::{OfficialRepository, Scope};
use crate::handlers::utils::{contains_filter, ensure_visible, ListParams};
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::state::AppState;
use crate::validation::parse_id;

/// GET /officials - visible documents, `documentName` filter
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Populated<Official>>> {
    let pool = state.db.pool();
    let filters: Vec<_> = contains_filter("document_name", params.document_name.as_deref())
        .into_iter()
        .collect();

    let listing = OfficialRepository::new(pool)
        .list(
            Scope::visible_to(current.id(), current.role()),
            &filters,
            Some(params.page_request()),
        )
        .await?;

    let officials = populate(pool, listing.items).await?;
    Ok(ApiResponse::success(officials).paginated(listing.pagination))
}

/// GET /officials/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> ApiResult<Populated<Official>> {
    let pool = state.db.pool();
    let official = OfficialRepository::new(pool).get(parse_id(&id)?).await?;
    ensure_visible(&official, &current)?;

    Ok(ApiResponse::success(populate_one(pool, official).await?))
}

/// GET /officials/my/assigned
pub async fn my_assigned(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> ApiResult<Vec<Populated<Official>>> {
    let pool = state.db.pool();
    let listing = OfficialRepository::new(pool)
        .list(Scope::AssignedTo(current.id()), &[], None)
        .await?;

    Ok(ApiResponse::success(populate(pool, listing.items).await?))
}
