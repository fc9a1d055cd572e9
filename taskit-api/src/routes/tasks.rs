/// Task endpoints
///
/// All routes require authentication and only ever see the caller's own
/// tasks. A task owned by someone else answers exactly like a missing one.
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task
/// - `GET /tasks` - List tasks (`completed`, `sortBy`, `limit`, `skip`)
/// - `GET /tasks/:id` - Fetch one task
/// - `PATCH /tasks/:id` - Update `description` and/or `completed`
/// - `DELETE /tasks/:id` - Delete a task and return it

use super::payload::{json_body, not_blank, update_body};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use taskit_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, TaskQuery, TaskSort, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Fields a PATCH may touch
pub const UPDATABLE_FIELDS: &[&str] = &["description", "completed"];

/// Create task request
///
/// Unknown fields (including `owner`) are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(custom(function = "not_blank"))]
    pub description: String,

    #[serde(default)]
    pub completed: bool,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,

    pub completed: Option<bool>,
}

/// Query string of `GET /tasks`
///
/// Everything is taken as a raw string so that malformed values are
/// dropped instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub completed: Option<String>,

    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    pub limit: Option<String>,

    pub skip: Option<String>,
}

impl ListTasksParams {
    /// Translates the query string into list options
    ///
    /// - `completed=true` filters on done tasks; any other non-empty value
    ///   filters on open ones
    /// - `sortBy=field:desc` sorts descending, any other direction ascending;
    ///   unknown fields are ignored
    /// - non-numeric `limit`/`skip` are ignored
    pub fn to_query(&self) -> TaskQuery {
        let completed = self
            .completed
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(|value| value == "true");

        let sort = self.sort_by.as_deref().and_then(TaskSort::parse);

        TaskQuery {
            completed,
            sort,
            limit: parse_count(self.limit.as_deref()),
            skip: parse_count(self.skip.as_deref()),
        }
    }
}

fn parse_count(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

/// Path IDs that aren't UUIDs can't name any task
fn parse_task_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| task_not_found())
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body, blank description, non-boolean `completed`
/// - `401 Unauthorized`: Not authenticated
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let req = json_body(body)?;
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            owner: auth.user.id,
            description: req.description.trim().to_string(),
            completed: req.completed,
        },
    )
    .await
    .map_err(ApiError::from_write)?;

    tracing::info!(task_id = %task.id, owner = %task.owner, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
///
/// # Example
///
/// ```text
/// GET /tasks?completed=true&sortBy=createdAt:desc&limit=10&skip=20
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let query = params.to_query();
    tracing::debug!(user_id = %auth.user.id, ?query, "Listing tasks");

    let tasks = Task::list_for_owner(&state.db, auth.user.id, &query).await?;

    Ok(Json(tasks))
}

/// Fetch one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;

    let task = Task::find_owned(&state.db, id, auth.user.id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// Update one of the caller's tasks
///
/// Disallowed keys are rejected first; the body's values are only looked at
/// once the task is known to belong to the caller.
///
/// # Errors
///
/// - `400 Bad Request`: Field outside `description`/`completed`, or an invalid value
/// - `404 Not Found`: No such task owned by the caller
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let body = update_body(body, UPDATABLE_FIELDS)?;
    let id = parse_task_id(&id)?;

    Task::find_owned(&state.db, id, auth.user.id)
        .await?
        .ok_or_else(task_not_found)?;

    let req: UpdateTaskRequest = body.parse()?;
    req.validate()?;

    let update = UpdateTask {
        description: req.description.map(|d| d.trim().to_string()),
        completed: req.completed,
    };

    let task = Task::update_owned(&state.db, id, auth.user.id, update)
        .await
        .map_err(ApiError::from_write)?
        .ok_or_else(task_not_found)?;

    tracing::info!(task_id = %task.id, "Task updated");

    Ok(Json(task))
}

/// Delete one of the caller's tasks, returning it
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;

    let task = Task::delete_owned(&state.db, id, auth.user.id)
        .await?
        .ok_or_else(task_not_found)?;

    tracing::info!(task_id = %task.id, "Task deleted");

    Ok(Json(task))
}
