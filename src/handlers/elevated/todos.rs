use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::database::models::{Populated, Todo};
use crate::database::repository::{populate, populate_one};
use crate::database::todos::{NewTodo, TodoChanges};
use crate::database::{Scope, TodoRepository};
use crate::error::ApiError;
use crate::handlers::protected::todos::todo_filters;
use crate::handlers::utils::{ensure_assignee_exists, json_body, ListParams};
use crate::middleware::{ApiResponse, ApiResult, CurrentAccount};
use crate::state::AppState;
use crate::types::{TodoPriority, TodoStatus};
use crate::validation::{double_option, parse_assignment, parse_id, FieldErrors};

const TITLE_MAX: usize = 300;
const CONTENT_MAX: usize = 5000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoBody {
    #[serde(alias = "ToDoTitle")]
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl TodoBody {
    fn assignment(&self) -> Option<Option<&str>> {
        self.assigned_to.as_ref().map(|value| value.as_deref())
    }

    fn validate_new(&self, owner_id: uuid::Uuid) -> Result<NewTodo, ApiError> {
        let mut errors = FieldErrors::new();

        let title = errors.required("title", self.title.as_deref());
        errors.max_len("title", title.as_deref(), TITLE_MAX);
        let content = errors.required("content", self.content.as_deref());
        errors.max_len("content", content.as_deref(), CONTENT_MAX);
        let status = errors.parse::<TodoStatus>("status", self.status.as_deref());
        let priority = errors.parse::<TodoPriority>("priority", self.priority.as_deref());
        let assigned_to = parse_assignment(&mut errors, "assignedTo", self.assignment());

        errors.finish()?;
        match (title, content) {
            (Some(title), Some(content)) => Ok(NewTodo {
                title,
                content,
                owner_id,
                assigned_to_id: assigned_to.flatten(),
                status: status.unwrap_or_default(),
                priority: priority.unwrap_or_default(),
            }),
            _ => Err(ApiError::bad_request("title and content are required")),
        }
    }

    fn validate_changes(&self) -> Result<TodoChanges, ApiError> {
        let mut errors = FieldErrors::new();

        let title = errors.optional(self.title.as_deref());
        errors.max_len("title", title.as_deref(), TITLE_MAX);
        let content = errors.optional(self.content.as_deref());
        errors.max_len("content", content.as_deref(), CONTENT_MAX);
        let status = errors.parse::<TodoStatus>("status", self.status.as_deref());
        let priority = errors.parse::<TodoPriority>("priority", self.priority.as_deref());
        let assigned_to = parse_assignment(&mut errors, "assignedTo", self.assignment());

        errors.finish()?;
        Ok(TodoChanges {
            title,
            content,
            assigned_to,
            status,
            priority,
        })
    }
}

/// GET /admin/ToDo - every to-do, `status` and `priority` filters
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Populated<Todo>>> {
    let pool = state.db.pool();
    let listing = TodoRepository::new(pool)
        .list(Scope::All, &todo_filters(&params)?, Some(params.page_request()))
        .await?;

    let todos = populate(pool, listing.items).await?;
    Ok(ApiResponse::success(todos).paginated(listing.pagination))
}

/// POST /admin/ToDo - the calling admin becomes the owner
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    payload: Result<Json<TodoBody>, JsonRejection>,
) -> ApiResult<Populated<Todo>> {
    let new = json_body(payload)?.validate_new(current.id())?;
    ensure_assignee_exists(&state, new.assigned_to_id.map(Some)).await?;

    let pool = state.db.pool();
    let todo = TodoRepository::new(pool).create(&new).await?;

    info!(todo_id = %todo.id, owner_id = %current.id(), "ToDo created");
    Ok(ApiResponse::created(populate_one(pool, todo).await?).message("ToDo created"))
}

/// PUT /admin/ToDo/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TodoBody>, JsonRejection>,
) -> ApiResult<Populated<Todo>> {
    let id = parse_id(&id)?;
    let changes = json_body(payload)?.validate_changes()?;
    ensure_assignee_exists(&state, changes.assigned_to).await?;

    let pool = state.db.pool();
    let todo = TodoRepository::new(pool).update(id, &changes).await?;

    info!(todo_id = %id, "ToDo updated");
    Ok(ApiResponse::success(populate_one(pool, todo).await?).message("ToDo updated"))
}

/// DELETE /admin/ToDo/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id)?;
    TodoRepository::new(state.db.pool()).delete(id).await?;

    info!(todo_id = %id, "ToDo deleted");
    Ok(ApiResponse::ok_message("ToDo deleted"))
}
