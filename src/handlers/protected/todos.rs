use axum::{
    extract::{Path, Query, State},
    Extension,
};
use tracing::info;

use crate::database::models::{Owned, Populated, Todo};
use crate::database::repository::{populate, populate_one};
use crate::database::{Filter, Scope, TodoRepository};
use crate::error::ApiError;
use crate::handlers::utils::{enum_filter, ListParams};
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::state::AppState;
use crate::types::{TodoPriority, TodoStatus};
use crate::validation::parse_id;

pub(crate) fn todo_filters(params: &ListParams) -> Result<Vec<Filter>, ApiError> {
    Ok(enum_filter::<TodoStatus>("status", params.status.as_deref())?
        .into_iter()
        .chain(enum_filter::<TodoPriority>("priority", params.priority.as_deref())?)
        .collect())
}

/// GET /ToDo/my-toDo - to-dos assigned to the caller, `status` and `priority` filters
pub async fn mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Populated<Todo>>> {
    let pool = state.db.pool();
    let listing = TodoRepository::new(pool)
        .list(
            Scope::AssignedTo(current.id()),
            &todo_filters(&params)?,
            Some(params.page_request()),
        )
        .await?;

    let todos = populate(pool, listing.items).await?;
    Ok(ApiResponse::success(todos).paginated(listing.pagination))
}

/// PATCH /ToDo/:id/validate - the assignee marks a pending to-do resolved
pub async fn validate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> ApiResult<Populated<Todo>> {
    let id = parse_id(&id)?;
    let pool = state.db.pool();
    let repo = TodoRepository::new(pool);

    let todo = repo.get(id).await?;
    if !todo.is_assigned_to(current.id()) {
        return Err(ApiError::forbidden("You can only validate to-dos assigned to you"));
    }
    if todo.status != TodoStatus::Pending {
        return Err(ApiError::bad_request("This to-do is already resolved"));
    }

    // a concurrent validation may have won between the read and the update
    let resolved = repo
        .resolve(id)
        .await?
        .ok_or_else(|| ApiError::bad_request("This to-do is already resolved"))?;

    info!(todo_id = %id, account_id = %current.id(), "ToDo validated");
    Ok(ApiResponse::success(populate_one(pool, resolved).await?).message("ToDo validated"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_parse_enums() {
        let params = ListParams {
            status: Some("pending".into()),
            priority: Some("urgent".into()),
            ..Default::default()
        };
        assert_eq!(
            todo_filters(&params).unwrap(),
            vec![
                Filter::Text("status", "pending".into()),
                Filter::Text("priority", "urgent".into())
            ]
        );

        let params = ListParams {
            priority: Some("peu important".into()),
            ..Default::default()
        };
        assert!(todo_filters(&params).is_err());
    }
}
