//! Data model for the task tracker.
//!
//! Enum values and wire field names match the dashboard API: statuses and
//! priorities travel as SCREAMING_SNAKE_CASE strings, record fields as
//! camelCase. The same string forms are stored in SQLite, so the enums
//! implement `ToSql`/`FromSql` directly.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Lifecycle status of a task.
///
/// Deliberately a free-standing field: there is no transition table, and
/// any authorized caller may set any value in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    OnHold,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::OnHold => "ON_HOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(Self::Todo),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "ON_HOLD" => Some(Self::OnHold),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| Self::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "URGENT" => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| Self::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

/// A registered user, as exposed through the API (no credential material).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A team. Task-team association is organizational only and never grants
/// access; visibility stays creator-or-assignee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Scalar task record, as stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether `user_id` may read, mutate, or comment on this task.
    pub fn visible_to(&self, user_id: Uuid) -> bool {
        super::policy::can_access(self.creator_id, self.assignee_id, user_id)
    }
}

/// Scalar comment record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task with its related records expanded, the shape the dashboard reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub creator: User,
    pub assignee: Option<User>,
    pub team: Option<Team>,
    pub comments: Vec<CommentDetail>,
}

/// Comment with its author expanded, as embedded in a [`TaskDetail`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetail {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: User,
}

/// Comment with both its author and its task expanded, the response shape
/// of `POST /tasks/:id/comments`. The task stays scalar here; expanding it
/// further would pull the comment list back in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithTask {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: User,
    pub task: Task,
}

/// Aggregate counts over a user's visible tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub completed_tasks: i64,
    pub high_priority_tasks: i64,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub team_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

/// Body of `PATCH /tasks/:id`. Absent fields are left unchanged. For the
/// two nullable references, an explicit JSON `null` clears the value, so
/// those fields are double-optional: outer `None` means "not mentioned",
/// `Some(None)` means "unset it".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

/// Wraps a present field (even a `null` one) in `Some`, so absent and
/// `null` deserialize differently.
fn double_option<'de, D>(de: D) -> std::result::Result<Option<Option<Uuid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Uuid>::deserialize(de).map(Some)
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.team_id.is_none()
            && self.assignee_id.is_none()
    }
}

/// Raw query string of `GET /tasks`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilterParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date_before: Option<String>,
    pub due_date_after: Option<String>,
    pub search: Option<String>,
}

impl TaskFilterParams {
    /// Validate the raw parameters into a typed filter.
    ///
    /// Empty strings count as absent. Malformed enum values or dates are
    /// rejected with `InvalidInput`.
    pub fn parse(self) -> Result<TaskFilter> {
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => Some(
                TaskStatus::parse(s)
                    .ok_or_else(|| Error::InvalidInput(format!("invalid status: {s}")))?,
            ),
            None => None,
        };

        let priority = match self.priority.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => Some(
                Priority::parse(s)
                    .ok_or_else(|| Error::InvalidInput(format!("invalid priority: {s}")))?,
            ),
            None => None,
        };

        let due_date_before = self
            .due_date_before
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_due_bound)
            .transpose()?;
        let due_date_after = self
            .due_date_after
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_due_bound)
            .transpose()?;

        Ok(TaskFilter {
            status,
            priority,
            due_date_before,
            due_date_after,
            search: self.search.filter(|s| !s.is_empty()),
        })
    }
}

/// Validated filter specification for task listings.
///
/// Present fields combine conjunctively; `search` matches title or
/// description case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date_before: Option<DateTime<Utc>>,
    pub due_date_after: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

/// Parse a due-date bound: RFC 3339, or a bare `YYYY-MM-DD` taken as
/// midnight UTC.
fn parse_due_bound(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
    }
    Err(Error::InvalidInput(format!("invalid date: {value}")))
}
