/// Task model and database operations
///
/// Tasks belong to exactly one user. Every API-facing lookup is
/// owner-scoped: it filters on both the task ID and the caller's user ID, so
/// a task owned by someone else is indistinguishable from a missing one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description TEXT NOT NULL CHECK (length(trim(description)) > 0),
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskit_shared::models::task::{CreateTask, Task, TaskQuery, TaskSort};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// Task::create(&pool, CreateTask {
///     owner,
///     description: "Buy milk".to_string(),
///     completed: false,
/// }).await?;
///
/// let open = Task::list_for_owner(&pool, owner, &TaskQuery {
///     completed: Some(false),
///     sort: TaskSort::parse("createdAt:desc"),
///     limit: Some(10),
///     skip: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, description, completed, owner, created_at, updated_at";

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// What needs doing
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// Owning user
    pub owner: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner: Uuid,
    pub description: String,
    pub completed: bool,
}

/// Input for updating a task; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Sortable task columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    Description,
    Completed,
    CreatedAt,
    UpdatedAt,
}

impl TaskSortField {
    /// Parses a field name as it appears in `sortBy`
    ///
    /// Accepts both the JSON (camelCase) and column (snake_case) spellings.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "description" => Some(Self::Description),
            "completed" => Some(Self::Completed),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "updatedAt" | "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    /// Column name used in `ORDER BY`
    pub fn column(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Completed => "completed",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

impl TaskSort {
    /// Parses `field:direction`
    ///
    /// Only `desc` sorts descending; a missing or unrecognized direction is
    /// ascending. Unknown fields yield `None` (no sort).
    pub fn parse(sort_by: &str) -> Option<Self> {
        let mut parts = sort_by.splitn(2, ':');
        let field = TaskSortField::parse(parts.next()?.trim())?;
        let direction = match parts.next().map(str::trim) {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };

        Some(Self { field, direction })
    }
}

/// Filter, sort and pagination options for listing a user's tasks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    /// Only tasks with this completion flag
    pub completed: Option<bool>,

    /// Sort key; insertion order when `None`
    pub sort: Option<TaskSort>,

    /// Maximum number of tasks (ignored unless positive)
    pub limit: Option<i64>,

    /// Number of tasks to skip (ignored unless positive)
    pub skip: Option<i64>,
}

impl TaskQuery {
    fn effective_limit(&self) -> Option<i64> {
        self.limit.filter(|limit| *limit > 0)
    }

    fn effective_skip(&self) -> Option<i64> {
        self.skip.filter(|skip| *skip > 0)
    }

    /// Builds the `SELECT` for this query
    ///
    /// Bind order: owner, then completed, limit and skip when present.
    pub fn to_sql(&self) -> String {
        let mut query = format!("SELECT {} FROM tasks WHERE owner = $1", TASK_COLUMNS);
        let mut bind_count = 1;

        if self.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND completed = ${}", bind_count));
        }

        query.push_str(" ORDER BY ");
        if let Some(sort) = self.sort {
            query.push_str(&format!(
                "{} {}, ",
                sort.field.column(),
                sort.direction.as_sql()
            ));
        }
        query.push_str("created_at ASC, id ASC");

        if self.effective_limit().is_some() {
            bind_count += 1;
            query.push_str(&format!(" LIMIT ${}", bind_count));
        }
        if self.effective_skip().is_some() {
            bind_count += 1;
            query.push_str(&format!(" OFFSET ${}", bind_count));
        }

        query
    }
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Fails with a database error when the owner doesn't exist or the
    /// description is blank (check constraint).
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (owner, description, completed) VALUES ($1, $2, $3) RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.owner)
            .bind(data.description)
            .bind(data.completed)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID regardless of owner
    ///
    /// Not for API handlers; use [`Task::find_owned`] there.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a task by ID, only if `owner` owns it
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND owner = $2",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    /// Lists the tasks of `owner` with filter, sort and pagination applied
    pub async fn list_for_owner(
        pool: &PgPool,
        owner: Uuid,
        options: &TaskQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = options.to_sql();

        let mut q = sqlx::query_as::<_, Task>(&query).bind(owner);

        if let Some(completed) = options.completed {
            q = q.bind(completed);
        }
        if let Some(limit) = options.effective_limit() {
            q = q.bind(limit);
        }
        if let Some(skip) = options.effective_skip() {
            q = q.bind(skip);
        }

        q.fetch_all(pool).await
    }

    /// Updates a task owned by `owner`
    ///
    /// Returns `None` when no such owned task exists.
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND owner = $2 RETURNING {}",
            TASK_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner);

        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task owned by `owner` and returns it
    pub async fn delete_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "DELETE FROM tasks WHERE id = $1 AND owner = $2 RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    /// Counts the tasks of `owner`
    pub async fn count_for_owner(pool: &PgPool, owner: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE owner = $1")
            .bind(owner)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(TaskSortField::parse("description"), Some(TaskSortField::Description));
        assert_eq!(TaskSortField::parse("completed"), Some(TaskSortField::Completed));
        assert_eq!(TaskSortField::parse("createdAt"), Some(TaskSortField::CreatedAt));
        assert_eq!(TaskSortField::parse("updated_at"), Some(TaskSortField::UpdatedAt));
        assert_eq!(TaskSortField::parse("owner; DROP TABLE tasks"), None);
        assert_eq!(TaskSortField::parse(""), None);
    }

    #[test]
    fn test_sort_parse_directions() {
        let sort = TaskSort::parse("description:asc").unwrap();
        assert_eq!(sort.field, TaskSortField::Description);
        assert_eq!(sort.direction, SortDirection::Asc);

        let sort = TaskSort::parse("completed:desc").unwrap();
        assert_eq!(sort.direction, SortDirection::Desc);

        // Anything that isn't "desc" sorts ascending
        assert_eq!(TaskSort::parse("createdAt").unwrap().direction, SortDirection::Asc);
        assert_eq!(TaskSort::parse("createdAt:DESC").unwrap().direction, SortDirection::Asc);
        assert_eq!(TaskSort::parse("createdAt:sideways").unwrap().direction, SortDirection::Asc);

        assert!(TaskSort::parse("nope:desc").is_none());
    }

    #[test]
    fn test_default_query_sql() {
        let sql = TaskQuery::default().to_sql();
        assert_eq!(
            sql,
            "SELECT id, description, completed, owner, created_at, updated_at FROM tasks \
             WHERE owner = $1 ORDER BY created_at ASC, id ASC"
        );
    }

    #[test]
    fn test_full_query_sql() {
        let query = TaskQuery {
            completed: Some(true),
            sort: TaskSort::parse("description:desc"),
            limit: Some(10),
            skip: Some(20),
        };

        let sql = query.to_sql();
        assert!(sql.contains("WHERE owner = $1 AND completed = $2"));
        assert!(sql.contains("ORDER BY description DESC, created_at ASC, id ASC"));
        assert!(sql.ends_with("LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn test_query_sql_skip_without_limit() {
        let query = TaskQuery {
            skip: Some(1),
            ..Default::default()
        };

        assert!(query.to_sql().ends_with("ORDER BY created_at ASC, id ASC OFFSET $2"));
    }

    #[test]
    fn test_non_positive_pagination_is_ignored() {
        let query = TaskQuery {
            limit: Some(0),
            skip: Some(-5),
            ..Default::default()
        };

        let sql = query.to_sql();
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("OFFSET"));
    }

    #[test]
    fn test_task_json_shape() {
        let task = Task {
            id: Uuid::new_v4(),
            description: "First task".to_string(),
            completed: false,
            owner: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["_id"], task.id.to_string());
        assert_eq!(json["description"], "First task");
        assert_eq!(json["completed"], false);
        assert_eq!(json["owner"], task.owner.to_string());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
