use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{DeploymentTarget, ProgressEntry, Task};
use crate::database::repository::{self, Filter, Listing, PageRequest, Scope};

#[derive(Debug, Clone)]
pub struct NewTask {
    pub task_name: String,
    pub description: String,
    pub duration: String,
    pub problem: Option<String>,
    pub done: bool,
    pub due_date: Option<String>,
    pub owner_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub site: DeploymentTarget,
    pub apk: DeploymentTarget,
    pub backend: DeploymentTarget,
}

pub struct TaskRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaskRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, DatabaseError> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Task not found".to_string()))
    }

    pub async fn list(
        &self,
        scope: Scope,
        filters: &[Filter],
        page: Option<PageRequest>,
    ) -> Result<Listing<Task>, DatabaseError> {
        repository::list(self.pool, "tasks", scope, filters, page).await
    }

    pub async fn create(&self, new: &NewTask) -> Result<Task, DatabaseError> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (id, task_name, description, duration, problem, done, due_date, \
                                owner_id, assigned_to_id, site, apk, backend) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.task_name)
        .bind(&new.description)
        .bind(&new.duration)
        .bind(&new.problem)
        .bind(new.done)
        .bind(&new.due_date)
        .bind(new.owner_id)
        .bind(new.assigned_to_id)
        .bind(Json(&new.site))
        .bind(Json(&new.apk))
        .bind(Json(&new.backend))
        .fetch_one(self.pool)
        .await?;
        Ok(task)
    }

    /// Write back every editable column of a task read earlier.
    pub async fn save(&self, task: &Task) -> Result<Task, DatabaseError> {
        sqlx::query_as::<_, Task>(
            "UPDATE tasks SET \
                task_name = $2, description = $3, duration = $4, problem = $5, done = $6, \
                due_date = $7, owner_id = $8, assigned_to_id = $9, site = $10, apk = $11, \
                backend = $12, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(task.id)
        .bind(&task.task_name)
        .bind(&task.description)
        .bind(&task.duration)
        .bind(&task.problem)
        .bind(task.done)
        .bind(&task.due_date)
        .bind(task.owner_id)
        .bind(task.assigned_to_id)
        .bind(Json(&task.site.0))
        .bind(Json(&task.apk.0))
        .bind(Json(&task.backend.0))
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Task not found".to_string()))
    }

    /// Append a progression entry stamped now.
    pub async fn push_progression(&self, id: Uuid, percentage: u8) -> Result<Task, DatabaseError> {
        let entry = ProgressEntry { date: Utc::now(), percentage };
        sqlx::query_as::<_, Task>(
            "UPDATE tasks SET progression = progression || $2, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(vec![entry]))
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Task not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Task not found".to_string()));
        }
        Ok(())
    }
}
