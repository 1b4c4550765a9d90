use axum::extract::{Query, State};

use crate::database::models::{Populated, Report};
use crate::database::Scope;
use crate::handlers::protected::reports::list_scoped;
use crate::handlers::utils::ListParams;
use crate::middleware::ApiResult;
use crate::state::AppState;

/// GET /admin/rapport - every report, `reportTitle` filter
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Populated<Report>>> {
    list_scoped(&state, Scope::All, &params).await
}
