use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::database::models::{DeploymentTarget, Populated, TargetPatch, Task};
use crate::database::repository::populate_one;
use crate::database::tasks::NewTask;
use crate::database::TaskRepository;
use crate::error::ApiError;
use crate::handlers::utils::{ensure_account_exists, ensure_assignee_exists, json_body};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{double_option, parse_assignment, parse_id, parse_reference, FieldErrors};

const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 5000;
const PROBLEM_MAX: usize = 2000;

/// Task body; capitalized aliases are the field names older clients send.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBody {
    pub task_name: Option<String>,
    #[serde(alias = "Duration")]
    pub duration: Option<String>,
    #[serde(alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "Problem", deserialize_with = "double_option")]
    pub problem: Option<Option<String>>,
    #[serde(alias = "Done")]
    pub done: Option<bool>,
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    #[serde(alias = "Site")]
    pub site: Option<TargetPatch>,
    #[serde(alias = "Apk")]
    pub apk: Option<TargetPatch>,
    #[serde(alias = "Backend")]
    pub backend: Option<TargetPatch>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressionBody {
    pub percentage: Option<i64>,
}

fn patched(patch: Option<&TargetPatch>, now: chrono::DateTime<Utc>) -> DeploymentTarget {
    let mut target = DeploymentTarget::default();
    if let Some(patch) = patch {
        target.apply(patch, now);
    }
    target
}

impl TaskBody {
    fn assignment(&self) -> Option<Option<&str>> {
        self.assigned_to.as_ref().map(|value| value.as_deref())
    }

    fn check_lengths(&self, errors: &mut FieldErrors) {
        errors.max_len("taskName", self.task_name.as_deref().map(str::trim), NAME_MAX);
        errors.max_len("description", self.description.as_deref().map(str::trim), DESCRIPTION_MAX);
        errors.max_len("problem", self.problem.clone().flatten().as_deref(), PROBLEM_MAX);
    }

    fn validate_new(&self) -> Result<NewTask, ApiError> {
        let mut errors = FieldErrors::new();

        let task_name = errors.required("taskName", self.task_name.as_deref());
        let duration = errors.required("duration", self.duration.as_deref());
        let description = errors.required("description", self.description.as_deref());
        self.check_lengths(&mut errors);
        let owner_id = parse_reference(&mut errors, "owner", self.owner.as_deref());
        let assigned_to = parse_assignment(&mut errors, "assignedTo", self.assignment());

        errors.finish()?;
        let (Some(task_name), Some(duration), Some(description), Some(owner_id)) =
            (task_name, duration, description, owner_id)
        else {
            return Err(ApiError::bad_request(
                "taskName, duration, description and owner are required",
            ));
        };

        let now = Utc::now();
        Ok(NewTask {
            task_name,
            duration,
            description,
            problem: self.problem.clone().flatten(),
            done: self.done.unwrap_or(false),
            due_date: self.due_date.clone().flatten().filter(|d| !d.trim().is_empty()),
            owner_id,
            assigned_to_id: assigned_to.flatten(),
            site: patched(self.site.as_ref(), now),
            apk: patched(self.apk.as_ref(), now),
            backend: patched(self.backend.as_ref(), now),
        })
    }

    /// Apply the body to a loaded task; returns the owner to verify, if it changed.
    fn apply_to(&self, task: &mut Task) -> Result<Option<uuid::Uuid>, ApiError> {
        let mut errors = FieldErrors::new();

        self.check_lengths(&mut errors);
        let owner_id = match errors.optional(self.owner.as_deref()) {
            Some(owner) => parse_reference(&mut errors, "owner", Some(&owner)),
            None => None,
        };
        let assigned_to = parse_assignment(&mut errors, "assignedTo", self.assignment());
        errors.finish()?;

        let now = Utc::now();
        if let Some(name) = self.task_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            task.task_name = name.to_string();
        }
        if let Some(duration) = self.duration.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            task.duration = duration.to_string();
        }
        if let Some(description) = self.description.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            task.description = description.to_string();
        }
        if let Some(problem) = &self.problem {
            task.problem = problem.clone();
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone().filter(|d| !d.trim().is_empty());
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(assigned_to) = assigned_to {
            task.assigned_to_id = assigned_to;
        }
        if let Some(site) = &self.site {
            task.site.0.apply(site, now);
        }
        if let Some(apk) = &self.apk {
            task.apk.0.apply(apk, now);
        }
        if let Some(backend) = &self.backend {
            task.backend.0.apply(backend, now);
        }

        let changed_owner = owner_id.filter(|owner| *owner != task.owner_id);
        if let Some(owner) = changed_owner {
            task.owner_id = owner;
        }
        Ok(changed_owner)
    }
}

/// POST /admin/task
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<TaskBody>, JsonRejection>,
) -> ApiResult<Populated<Task>> {
    let new = json_body(payload)?.validate_new()?;
    ensure_account_exists(&state, new.owner_id, "Owner").await?;
    ensure_assignee_exists(&state, new.assigned_to_id.map(Some)).await?;

    let pool = state.db.pool();
    let task = TaskRepository::new(pool).create(&new).await?;

    info!(task_id = %task.id, "Task created");
    Ok(ApiResponse::created(populate_one(pool, task).await?).message("Task created"))
}

/// PUT /admin/task/:id - partial update; deployment slot changes stamp `updatedAt`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskBody>, JsonRejection>,
) -> ApiResult<Populated<Task>> {
    let id = parse_id(&id)?;
    let body = json_body(payload)?;
    let pool = state.db.pool();
    let repo = TaskRepository::new(pool);

    let mut task = repo.get(id).await?;
    if let Some(owner) = body.apply_to(&mut task)? {
        ensure_account_exists(&state, owner, "Owner").await?;
    }
    if body.assignment().is_some() {
        ensure_assignee_exists(&state, Some(task.assigned_to_id)).await?;
    }

    let saved = repo.save(&task).await?;
    info!(task_id = %id, "Task updated");
    Ok(ApiResponse::success(populate_one(pool, saved).await?).message("Task updated"))
}

/// PUT /admin/task/:id/progression - append a progression entry
pub async fn progression(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProgressionBody>, JsonRejection>,
) -> ApiResult<Populated<Task>> {
    let id = parse_id(&id)?;
    let percentage = json_body(payload)?
        .percentage
        .filter(|p| (0..=100).contains(p))
        .ok_or_else(|| ApiError::bad_request("Percentage required (0-100)"))?;

    let pool = state.db.pool();
    let task = TaskRepository::new(pool)
        .push_progression(id, percentage as u8)
        .await?;

    info!(task_id = %id, percentage, "Progression recorded");
    Ok(ApiResponse::success(populate_one(pool, task).await?).message("Progression updated"))
}

/// DELETE /admin/task/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id)?;
    TaskRepository::new(state.db.pool()).delete(id).await?;

    info!(task_id = %id, "Task deleted");
    Ok(ApiResponse::ok_message("Task deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::types::Json as SqlJson;
    use uuid::Uuid;

    fn task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            task_name: "API".into(),
            description: "Backend".into(),
            duration: "2 weeks".into(),
            progression: SqlJson(Vec::new()),
            problem: Some("Flaky CI".into()),
            done: false,
            due_date: None,
            owner_id: Uuid::new_v4(),
            assigned_to_id: Some(Uuid::new_v4()),
            site: SqlJson(DeploymentTarget::default()),
            apk: SqlJson(DeploymentTarget::default()),
            backend: SqlJson(DeploymentTarget::default()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn capitalized_aliases_are_accepted() {
        let owner = Uuid::new_v4();
        let body: TaskBody = serde_json::from_value(json!({
            "taskName": "Mobile app",
            "Duration": "1 month",
            "Description": "Android build",
            "Done": true,
            "owner": owner.to_string(),
            "Apk": { "dev": { "url": "https://dev.acme.io/app.apk", "version": "0.1" } }
        }))
        .unwrap();

        let new = body.validate_new().unwrap();
        assert_eq!(new.duration, "1 month");
        assert!(new.done);
        assert_eq!(new.owner_id, owner);
        assert_eq!(new.apk.dev.version.as_deref(), Some("0.1"));
        assert!(new.apk.dev.updated_at.is_some());
        assert_eq!(new.site, DeploymentTarget::default());
    }

    #[test]
    fn null_clears_problem_and_assignee() {
        let body: TaskBody =
            serde_json::from_value(json!({ "problem": null, "assignedTo": null })).unwrap();
        let mut task = task();
        let changed_owner = body.apply_to(&mut task).unwrap();

        assert_eq!(changed_owner, None);
        assert_eq!(task.problem, None);
        assert_eq!(task.assigned_to_id, None);
        assert_eq!(task.task_name, "API");
    }

    #[test]
    fn absent_fields_are_left_alone() {
        let body: TaskBody = serde_json::from_value(json!({ "done": true })).unwrap();
        let mut task = task();
        let assignee = task.assigned_to_id;
        body.apply_to(&mut task).unwrap();

        assert!(task.done);
        assert_eq!(task.problem.as_deref(), Some("Flaky CI"));
        assert_eq!(task.assigned_to_id, assignee);
    }

    #[test]
    fn slot_update_stamps_only_the_touched_slot() {
        let body: TaskBody = serde_json::from_value(json!({
            "site": { "official": { "url": "https://acme.io" } }
        }))
        .unwrap();
        let mut task = task();
        body.apply_to(&mut task).unwrap();

        assert_eq!(task.site.official.url.as_deref(), Some("https://acme.io"));
        assert!(task.site.official.updated_at.is_some());
        assert!(task.site.dev.updated_at.is_none());
    }

    #[test]
    fn owner_change_is_reported() {
        let mut task = task();
        let new_owner = Uuid::new_v4();
        let body: TaskBody =
            serde_json::from_value(json!({ "owner": new_owner.to_string() })).unwrap();

        assert_eq!(body.apply_to(&mut task).unwrap(), Some(new_owner));
        assert_eq!(task.owner_id, new_owner);
    }
}
