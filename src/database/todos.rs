use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Todo;
use crate::database::repository::{self, Filter, Listing, PageRequest, Scope};
use crate::types::{TodoPriority, TodoStatus};

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub status: TodoStatus,
    pub priority: TodoPriority,
}

#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub assigned_to: Option<Option<Uuid>>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
}

pub struct TodoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TodoRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Todo, DatabaseError> {
        sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("ToDo not found".to_string()))
    }

    pub async fn list(
        &self,
        scope: Scope,
        filters: &[Filter],
        page: Option<PageRequest>,
    ) -> Result<Listing<Todo>, DatabaseError> {
        repository::list(self.pool, "todos", scope, filters, page).await
    }

    pub async fn create(&self, new: &NewTodo) -> Result<Todo, DatabaseError> {
        let todo = sqlx::query_as::<_, Todo>(
            "INSERT INTO todos (id, title, content, owner_id, assigned_to_id, status, priority) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.content)
        .bind(new.owner_id)
        .bind(new.assigned_to_id)
        .bind(new.status.as_str())
        .bind(new.priority.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(todo)
    }

    pub async fn update(&self, id: Uuid, changes: &TodoChanges) -> Result<Todo, DatabaseError> {
        sqlx::query_as::<_, Todo>(
            "UPDATE todos SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                assigned_to_id = CASE WHEN $4 THEN $5 ELSE assigned_to_id END, \
                status = COALESCE($6, status), \
                priority = COALESCE($7, priority) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(changes.assigned_to.is_some())
        .bind(changes.assigned_to.flatten())
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.priority.map(|p| p.as_str()))
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("ToDo not found".to_string()))
    }

    /// Mark a pending to-do resolved. `None` when it was not pending anymore.
    pub async fn resolve(&self, id: Uuid) -> Result<Option<Todo>, DatabaseError> {
        let todo = sqlx::query_as::<_, Todo>(
            "UPDATE todos SET status = 'resolved' WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(todo)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("ToDo not found".to_string()));
        }
        Ok(())
    }
}
