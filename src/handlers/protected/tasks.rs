use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::database::models::{Populated, Task};
use crate::database::repository::{populate, populate_one};
use crate::database::{Filter, Scope, TaskRepository};
use crate::handlers::utils::{contains_filter, ensure_visible, ListParams};
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::state::AppState;
use crate::validation::parse_id;

fn task_filters(params: &ListParams) -> Vec<Filter> {
    let mut filters: Vec<Filter> = contains_filter("task_name", params.task_name.as_deref())
        .into_iter()
        .collect();
    if let Some(done) = params.done.as_deref() {
        filters.push(Filter::Bool("done", done.trim() == "true"));
    }
    filters
}

/// GET /task - visible tasks, `taskName` and `done` filters
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Populated<Task>>> {
    let pool = state.db.pool();
    let listing = TaskRepository::new(pool)
        .list(
            Scope::visible_to(current.id(), current.role()),
            &task_filters(&params),
            Some(params.page_request()),
        )
        .await?;

    let tasks = populate(pool, listing.items).await?;
    Ok(ApiResponse::success(tasks).paginated(listing.pagination))
}

/// GET /task/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> ApiResult<Populated<Task>> {
    let pool = state.db.pool();
    let task = TaskRepository::new(pool).get(parse_id(&id)?).await?;
    ensure_visible(&task, &current)?;

    Ok(ApiResponse::success(populate_one(pool, task).await?))
}

/// GET /task/my/assigned
pub async fn my_assigned(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> ApiResult<Vec<Populated<Task>>> {
    let pool = state.db.pool();
    let listing = TaskRepository::new(pool)
        .list(Scope::AssignedTo(current.id()), &[], None)
        .await?;

    Ok(ApiResponse::success(populate(pool, listing.items).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_filter_is_true_only_for_literal_true() {
        let params = ListParams {
            task_name: Some("api".into()),
            done: Some("true".into()),
            ..Default::default()
        };
        assert_eq!(
            task_filters(&params),
            vec![
                Filter::Contains("task_name", "api".into()),
                Filter::Bool("done", true)
            ]
        );

        let params = ListParams {
            done: Some("yes".into()),
            ..Default::default()
        };
        assert_eq!(task_filters(&params), vec![Filter::Bool("done", false)]);
        assert!(task_filters(&ListParams::default()).is_empty());
    }
}
