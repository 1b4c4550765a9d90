use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::database::models::{Page, Populated};
use crate::database::repository::{populate, populate_one};
use crate::database::{PageRepository, Scope};
use crate::handlers::utils::{contains_filter, ensure_visible, ListParams};
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::state::AppState;
use crate::validation::parse_id;

/// GET /page - visible pages, newest first, `pageName` filter
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Populated<Page>>> {
    let pool = state.db.pool();
    let filters: Vec<_> = contains_filter("page_name", params.page_name.as_deref())
        .into_iter()
        .collect();

    let listing = PageRepository::new(pool)
        .list(
            Scope::visible_to(current.id(), current.role()),
            &filters,
            Some(params.page_request()),
        )
        .await?;

    let pages = populate(pool, listing.items).await?;
    Ok(ApiResponse::success(pages).paginated(listing.pagination))
}

/// GET /page/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> ApiResult<Populated<Page>> {
    let pool = state.db.pool();
    let page = PageRepository::new(pool).get(parse_id(&id)?).await?;
    ensure_visible(&page, &current)?;

    Ok(ApiResponse::success(populate_one(pool, page).await?))
}

/// GET /page/my/assigned
pub async fn my_assigned(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> ApiResult<Vec<Populated<Page>>> {
    let pool = state.db.pool();
    let listing = PageRepository::new(pool)
        .list(Scope::AssignedTo(current.id()), &[], None)
        .await?;

    Ok(ApiResponse::success(populate(pool, listing.items).await?))
}
