//! Task and comment queries.
//!
//! Every lookup is visibility-scoped at the SQL level: a task the caller
//! cannot access is reported as `NotFound`, the same as one that does not
//! exist. Update, delete, and comment creation run the scoped check and
//! the write inside one transaction.

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use uuid::Uuid;

use super::teams::{team_exists, team_row};
use super::users::{user_at, user_exists, user_row};
use super::{encode_ts, now, opt_uuid_col, ts_col, uuid_col};
use crate::error::{Error, Result};
use crate::tasks::policy::{visibility_params, VISIBILITY_SQL};
use crate::tasks::{
    Comment, CommentDetail, CommentWithTask, CreateTaskRequest, Task, TaskDetail, TaskFilter,
    TaskQuery, TaskStats, UpdateTaskRequest,
};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, creator_id, assignee_id, team_id, \
     created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: uuid_col(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        due_date: ts_col(row, 5)?,
        creator_id: uuid_col(row, 6)?,
        assignee_id: opt_uuid_col(row, 7)?,
        team_id: opt_uuid_col(row, 8)?,
        created_at: ts_col(row, 9)?,
        updated_at: ts_col(row, 10)?,
    })
}

/// Visibility-scoped single-task lookup. `None` means absent *or* not
/// visible; callers translate both to the same `NotFound`.
fn scoped_task(conn: &Connection, id: Uuid, user_id: Uuid) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND {VISIBILITY_SQL}");
    let [p1, p2] = visibility_params(user_id);
    conn.query_row(&sql, params![id.to_string(), p1, p2], task_from_row)
        .optional()
        .map_err(Into::into)
}

fn task_by_id(conn: &Connection, id: Uuid) -> Result<Task> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
    conn.query_row(&sql, params![id.to_string()], task_from_row)
        .map_err(Into::into)
}

/// Expand creator, assignee, team, and comments onto a task record.
fn expand(conn: &Connection, task: Task) -> Result<TaskDetail> {
    let creator =
        user_row(conn, task.creator_id)?.ok_or(Error::Storage(rusqlite::Error::QueryReturnedNoRows))?;
    let assignee = match task.assignee_id {
        Some(id) => user_row(conn, id)?,
        None => None,
    };
    let team = match task.team_id {
        Some(id) => team_row(conn, id)?,
        None => None,
    };
    let comments = comments_for_task(conn, task.id)?;
    Ok(TaskDetail {
        task,
        creator,
        assignee,
        team,
        comments,
    })
}

fn comments_for_task(conn: &Connection, task_id: Uuid) -> Result<Vec<CommentDetail>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.content, c.user_id, c.task_id, c.created_at, c.updated_at,
                u.id, u.email, u.name, u.created_at, u.updated_at
         FROM comments c JOIN users u ON u.id = c.user_id
         WHERE c.task_id = ? ORDER BY c.created_at ASC",
    )?;
    let rows = stmt.query_map(params![task_id.to_string()], |row| {
        Ok(CommentDetail {
            comment: Comment {
                id: uuid_col(row, 0)?,
                content: row.get(1)?,
                user_id: uuid_col(row, 2)?,
                task_id: uuid_col(row, 3)?,
                created_at: ts_col(row, 4)?,
                updated_at: ts_col(row, 5)?,
            },
            user: user_at(row, 6)?,
        })
    })?;
    let mut comments = Vec::new();
    for comment in rows {
        comments.push(comment?);
    }
    Ok(comments)
}

/// Reject references to users/teams that do not exist, before any write.
fn check_refs(conn: &Connection, assignee_id: Option<Uuid>, team_id: Option<Uuid>) -> Result<()> {
    if let Some(id) = assignee_id {
        if !user_exists(conn, id)? {
            return Err(Error::InvalidInput(format!("no user with ID {id}")));
        }
    }
    if let Some(id) = team_id {
        if !team_exists(conn, id)? {
            return Err(Error::InvalidInput(format!("no team with ID {id}")));
        }
    }
    Ok(())
}

fn count_scoped(conn: &Connection, user_id: Uuid, extra: &str) -> Result<i64> {
    let sql = if extra.is_empty() {
        format!("SELECT COUNT(*) FROM tasks WHERE {VISIBILITY_SQL}")
    } else {
        format!("SELECT COUNT(*) FROM tasks WHERE {VISIBILITY_SQL} AND {extra}")
    };
    conn.query_row(
        &sql,
        rusqlite::params_from_iter(visibility_params(user_id)),
        |row| row.get(0),
    )
    .map_err(Into::into)
}

impl super::Store {
    /// Create a task; the caller becomes its creator.
    pub async fn create_task(&self, user_id: Uuid, req: &CreateTaskRequest) -> Result<TaskDetail> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }

        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        check_refs(&tx, req.assignee_id, req.team_id)?;

        let id = Uuid::new_v4();
        let ts = encode_ts(now());
        tx.execute(
            "INSERT INTO tasks (id, title, description, status, priority, due_date,
                                creator_id, assignee_id, team_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                title,
                req.description,
                req.status,
                req.priority,
                encode_ts(req.due_date),
                user_id.to_string(),
                req.assignee_id.map(|a| a.to_string()),
                req.team_id.map(|t| t.to_string()),
                ts,
                ts,
            ],
        )?;

        let detail = expand(&tx, task_by_id(&tx, id)?)?;
        tx.commit()?;
        Ok(detail)
    }

    /// List the caller's visible tasks, filtered, ordered by due date.
    pub async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> Result<Vec<TaskDetail>> {
        let conn = self.lock().await;
        let query = TaskQuery::scoped(user_id).with_filter(filter);
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks {} {}",
            query.where_clause(),
            TaskQuery::ORDER_BY,
        );

        let mut stmt = conn.prepare(&sql)?;
        let query_params: Vec<&dyn ToSql> = query.params();
        let rows = stmt.query_map(query_params.as_slice(), task_from_row)?;
        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }

        tasks.into_iter().map(|task| expand(&conn, task)).collect()
    }

    /// Aggregate counts over the caller's visible tasks: four independent
    /// queries, each carrying the visibility predicate.
    pub async fn task_stats(&self, user_id: Uuid) -> Result<TaskStats> {
        let conn = self.lock().await;
        Ok(TaskStats {
            total_tasks: count_scoped(&conn, user_id, "")?,
            pending_tasks: count_scoped(&conn, user_id, "status IN ('TODO', 'IN_PROGRESS')")?,
            completed_tasks: count_scoped(&conn, user_id, "status = 'COMPLETED'")?,
            high_priority_tasks: count_scoped(&conn, user_id, "priority IN ('HIGH', 'URGENT')")?,
        })
    }

    pub async fn get_task(&self, user_id: Uuid, id: Uuid) -> Result<TaskDetail> {
        let conn = self.lock().await;
        let task = scoped_task(&conn, id, user_id)?.ok_or_else(|| Error::task_not_found(id))?;
        expand(&conn, task)
    }

    /// Apply a partial update. The visibility check and the write share a
    /// transaction, so a task reassigned away from the caller in the
    /// meantime is `NotFound` rather than silently mutated.
    pub async fn update_task(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &UpdateTaskRequest,
    ) -> Result<TaskDetail> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let task = scoped_task(&tx, id, user_id)?.ok_or_else(|| Error::task_not_found(id))?;

        if patch.is_empty() {
            let detail = expand(&tx, task)?;
            tx.commit()?;
            return Ok(detail);
        }

        check_refs(&tx, patch.assignee_id.flatten(), patch.team_id.flatten())?;

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::InvalidInput("title must not be empty".to_string()));
            }
            sets.push("title = ?");
            values.push(Box::new(title.to_string()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            values.push(Box::new(description.clone()));
        }
        if let Some(status) = patch.status {
            sets.push("status = ?");
            values.push(Box::new(status));
        }
        if let Some(priority) = patch.priority {
            sets.push("priority = ?");
            values.push(Box::new(priority));
        }
        if let Some(due_date) = patch.due_date {
            sets.push("due_date = ?");
            values.push(Box::new(encode_ts(due_date)));
        }
        // double-optional: mentioned-and-null clears the reference
        if let Some(team_id) = patch.team_id {
            sets.push("team_id = ?");
            values.push(Box::new(team_id.map(|t| t.to_string())));
        }
        if let Some(assignee_id) = patch.assignee_id {
            sets.push("assignee_id = ?");
            values.push(Box::new(assignee_id.map(|a| a.to_string())));
        }
        sets.push("updated_at = ?");
        values.push(Box::new(encode_ts(now())));
        values.push(Box::new(id.to_string()));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| &**v).collect();
        tx.execute(&sql, refs.as_slice())?;

        let detail = expand(&tx, task_by_id(&tx, id)?)?;
        tx.commit()?;
        Ok(detail)
    }

    /// Delete a visible task and return its record.
    pub async fn delete_task(&self, user_id: Uuid, id: Uuid) -> Result<Task> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let task = scoped_task(&tx, id, user_id)?.ok_or_else(|| Error::task_not_found(id))?;
        tx.execute("DELETE FROM tasks WHERE id = ?", params![id.to_string()])?;
        tx.commit()?;
        Ok(task)
    }

    /// Attach a comment to a visible task. The author is the acting user;
    /// once access is established, commenting is unconditional. Returns
    /// the comment with both its author and the task expanded.
    pub async fn add_comment(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        content: &str,
    ) -> Result<CommentWithTask> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let task =
            scoped_task(&tx, task_id, user_id)?.ok_or_else(|| Error::task_not_found(task_id))?;

        if content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "comment content must not be empty".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let ts = encode_ts(now());
        tx.execute(
            "INSERT INTO comments (id, content, user_id, task_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                content,
                user_id.to_string(),
                task_id.to_string(),
                ts,
                ts,
            ],
        )?;

        let (comment, user) = tx.query_row(
            "SELECT c.id, c.content, c.user_id, c.task_id, c.created_at, c.updated_at,
                    u.id, u.email, u.name, u.created_at, u.updated_at
             FROM comments c JOIN users u ON u.id = c.user_id WHERE c.id = ?",
            params![id.to_string()],
            |row| {
                Ok((
                    Comment {
                        id: uuid_col(row, 0)?,
                        content: row.get(1)?,
                        user_id: uuid_col(row, 2)?,
                        task_id: uuid_col(row, 3)?,
                        created_at: ts_col(row, 4)?,
                        updated_at: ts_col(row, 5)?,
                    },
                    user_at(row, 6)?,
                ))
            },
        )?;
        tx.commit()?;
        Ok(CommentWithTask {
            comment,
            user,
            task,
        })
    }

    /// Comments on a visible task, oldest first.
    pub async fn list_comments(&self, user_id: Uuid, task_id: Uuid) -> Result<Vec<CommentDetail>> {
        let conn = self.lock().await;
        scoped_task(&conn, task_id, user_id)?.ok_or_else(|| Error::task_not_found(task_id))?;
        comments_for_task(&conn, task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::Store;
    use crate::error::Error;
    use crate::tasks::{
        can_access, CreateTaskRequest, Priority, TaskFilter, TaskStatus, UpdateTaskRequest, User,
    };
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    async fn seed_user(store: &Store, email: &str) -> User {
        store.create_user(email, email, "hash").await.unwrap()
    }

    fn due(date: &str) -> DateTime<Utc> {
        format!("{date}T00:00:00Z").parse().unwrap()
    }

    fn new_task(title: &str, due_date: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: due(due_date),
            team_id: None,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_task_sets_creator() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        let detail = store
            .create_task(ada.id, &new_task("Write report", "2025-03-01"))
            .await
            .unwrap();
        assert_eq!(detail.task.creator_id, ada.id);
        assert_eq!(detail.creator.id, ada.id);
        assert!(detail.assignee.is_none());
        assert!(detail.comments.is_empty());
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        let err = store
            .create_task(ada.id, &new_task("   ", "2025-03-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_assignee_rejected() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        let mut req = new_task("Task", "2025-03-01");
        req.assignee_id = Some(Uuid::new_v4());
        let err = store.create_task(ada.id, &req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_listing_is_visibility_scoped() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        store
            .create_task(ada.id, &new_task("Ada's task", "2025-03-01"))
            .await
            .unwrap();
        let mut assigned = new_task("Assigned to Bob", "2025-03-02");
        assigned.assignee_id = Some(bob.id);
        store.create_task(ada.id, &assigned).await.unwrap();

        let ada_tasks = store
            .list_tasks(ada.id, &TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(ada_tasks.len(), 2);

        let bob_tasks = store
            .list_tasks(bob.id, &TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(bob_tasks.len(), 1);
        assert_eq!(bob_tasks[0].task.title, "Assigned to Bob");

        // listing agrees with the pure predicate on every returned row
        for detail in &bob_tasks {
            assert!(can_access(
                detail.task.creator_id,
                detail.task.assignee_id,
                bob.id
            ));
        }
    }

    #[tokio::test]
    async fn test_listing_ordered_by_due_date_ascending() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        store
            .create_task(ada.id, &new_task("Later", "2025-06-01"))
            .await
            .unwrap();
        store
            .create_task(ada.id, &new_task("Soon", "2025-01-15"))
            .await
            .unwrap();
        store
            .create_task(ada.id, &new_task("Middle", "2025-03-10"))
            .await
            .unwrap();

        let tasks = store
            .list_tasks(ada.id, &TaskFilter::default())
            .await
            .unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.task.title.as_str()).collect();
        assert_eq!(titles, vec!["Soon", "Middle", "Later"]);
    }

    #[tokio::test]
    async fn test_filters_narrow_and_never_add() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        let mut urgent = new_task("Urgent fix", "2025-02-01");
        urgent.priority = Priority::Urgent;
        store.create_task(ada.id, &urgent).await.unwrap();
        let mut done = new_task("Shipped", "2025-02-15");
        done.status = TaskStatus::Completed;
        store.create_task(ada.id, &done).await.unwrap();

        let all = store
            .list_tasks(ada.id, &TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store
            .list_tasks(
                ada.id,
                &TaskFilter {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].task.title, "Shipped");

        let filtered = store
            .list_tasks(
                ada.id,
                &TaskFilter {
                    priority: Some(Priority::Urgent),
                    due_date_before: Some(due("2025-02-10")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].task.title, "Urgent fix");

        let none = store
            .list_tasks(
                ada.id,
                &TaskFilter {
                    due_date_after: Some(due("2026-01-01")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_over_title_and_description() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        store
            .create_task(ada.id, &new_task("Fix LOGIN page", "2025-02-01"))
            .await
            .unwrap();
        let mut described = new_task("Cleanup", "2025-02-02");
        described.description = Some("remove stale login tokens".to_string());
        store.create_task(ada.id, &described).await.unwrap();
        store
            .create_task(ada.id, &new_task("Unrelated", "2025-02-03"))
            .await
            .unwrap();

        let found = store
            .list_tasks(
                ada.id,
                &TaskFilter {
                    search: Some("login".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let none = store
            .list_tasks(
                ada.id,
                &TaskFilter {
                    search: Some("billing".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_invisible_task_indistinguishable_from_missing() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        let detail = store
            .create_task(ada.id, &new_task("Private", "2025-02-01"))
            .await
            .unwrap();

        let hidden = store.get_task(bob.id, detail.task.id).await.unwrap_err();
        let missing = store.get_task(bob.id, Uuid::nil()).await.unwrap_err();
        assert!(matches!(hidden, Error::NotFound(_)));
        assert!(matches!(missing, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_assignee_can_update_any_status() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let cal = seed_user(&store, "cal@example.com").await;

        let mut req = new_task("Shared", "2025-02-01");
        req.status = TaskStatus::Completed;
        req.assignee_id = Some(cal.id);
        let detail = store.create_task(ada.id, &req).await.unwrap();

        // no transition table: COMPLETED back to TODO is allowed
        let updated = store
            .update_task(
                cal.id,
                detail.task.id,
                &UpdateTaskRequest {
                    status: Some(TaskStatus::Todo),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.task.status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_update_after_reassignment_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let cal = seed_user(&store, "cal@example.com").await;
        let dan = seed_user(&store, "dan@example.com").await;

        let mut req = new_task("Handed off", "2025-02-01");
        req.assignee_id = Some(cal.id);
        let detail = store.create_task(ada.id, &req).await.unwrap();

        // creator reassigns away from cal; cal's next mutation re-checks
        // current state and fails
        store
            .update_task(
                ada.id,
                detail.task.id,
                &UpdateTaskRequest {
                    assignee_id: Some(Some(dan.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = store
            .update_task(
                cal.id,
                detail.task.id,
                &UpdateTaskRequest {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_explicit_null_clears_assignee() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let cal = seed_user(&store, "cal@example.com").await;

        let mut req = new_task("Assigned", "2025-02-01");
        req.assignee_id = Some(cal.id);
        let detail = store.create_task(ada.id, &req).await.unwrap();

        // an update that never mentions the assignee leaves it alone
        let untouched = store
            .update_task(
                ada.id,
                detail.task.id,
                &serde_json::from_str(r#"{"title": "Renamed"}"#).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(untouched.task.assignee_id, Some(cal.id));

        // an explicit null unassigns, and the former assignee loses access
        let cleared = store
            .update_task(
                ada.id,
                detail.task.id,
                &serde_json::from_str(r#"{"assigneeId": null}"#).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(cleared.task.assignee_id, None);
        assert!(cleared.assignee.is_none());

        let err = store.get_task(cal.id, detail.task.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_case_folding_is_ascii_only() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        store
            .create_task(ada.id, &new_task("État des lieux", "2025-02-01"))
            .await
            .unwrap();

        let search = |term: &str| TaskFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };

        // ASCII case differences fold
        let found = store.list_tasks(ada.id, &search("ÉTAT")).await;
        assert_eq!(found.unwrap().len(), 1);
        // accented characters must match in case exactly
        let found = store.list_tasks(ada.id, &search("état")).await;
        assert!(found.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_record_and_removes_it() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        let detail = store
            .create_task(ada.id, &new_task("Temp", "2025-02-01"))
            .await
            .unwrap();
        let deleted = store.delete_task(ada.id, detail.task.id).await.unwrap();
        assert_eq!(deleted.id, detail.task.id);

        let err = store.get_task(ada.id, detail.task.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comments_require_visibility_and_content() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        let detail = store
            .create_task(ada.id, &new_task("Discussed", "2025-02-01"))
            .await
            .unwrap();
        let task_id = detail.task.id;

        let err = store.add_comment(bob.id, task_id, "hi").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = store.add_comment(ada.id, task_id, "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        // the rejected comment must not have been persisted
        assert!(store
            .list_comments(ada.id, task_id)
            .await
            .unwrap()
            .is_empty());

        let comment = store
            .add_comment(ada.id, task_id, "first")
            .await
            .unwrap();
        assert_eq!(comment.user.id, ada.id);
        // response carries the task expanded alongside the author
        assert_eq!(comment.task.id, task_id);
        assert_eq!(comment.task.title, "Discussed");
        store.add_comment(ada.id, task_id, "second").await.unwrap();

        let comments = store.list_comments(ada.id, task_id).await.unwrap();
        let contents: Vec<_> = comments
            .iter()
            .map(|c| c.comment.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);

        let err = store.list_comments(bob.id, task_id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stats_reflect_visible_set() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        let mut high = new_task("High", "2025-02-01");
        high.priority = Priority::High;
        store.create_task(ada.id, &high).await.unwrap();

        let mut urgent_done = new_task("Urgent done", "2025-02-02");
        urgent_done.priority = Priority::Urgent;
        urgent_done.status = TaskStatus::Completed;
        store.create_task(ada.id, &urgent_done).await.unwrap();

        let mut in_progress = new_task("Working", "2025-02-03");
        in_progress.status = TaskStatus::InProgress;
        store.create_task(ada.id, &in_progress).await.unwrap();

        let mut on_hold = new_task("Paused", "2025-02-04");
        on_hold.status = TaskStatus::OnHold;
        store.create_task(ada.id, &on_hold).await.unwrap();

        // bob's task is invisible to ada
        store
            .create_task(bob.id, &new_task("Bob's own", "2025-02-05"))
            .await
            .unwrap();

        let stats = store.task_stats(ada.id).await.unwrap();
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.pending_tasks, 2); // TODO + IN_PROGRESS
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.high_priority_tasks, 2); // HIGH + URGENT

        let bob_stats = store.task_stats(bob.id).await.unwrap();
        assert_eq!(bob_stats.total_tasks, 1);
    }

    /// End-to-end: create, deny an outsider, assign, let the assignee
    /// complete, watch stats move.
    #[tokio::test]
    async fn test_assignment_lifecycle() {
        let store = Store::open_in_memory().unwrap();
        let a = seed_user(&store, "a@example.com").await;
        let b = seed_user(&store, "b@example.com").await;
        let c = seed_user(&store, "c@example.com").await;

        let mut req = new_task("X", "2025-01-10");
        req.priority = Priority::High;
        let x = store.create_task(a.id, &req).await.unwrap();

        let err = store.get_task(b.id, x.task.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let before = store.task_stats(a.id).await.unwrap();
        assert_eq!(before.total_tasks, 1);
        assert_eq!(before.completed_tasks, 0);

        store
            .update_task(
                a.id,
                x.task.id,
                &UpdateTaskRequest {
                    assignee_id: Some(Some(c.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let seen = store.get_task(c.id, x.task.id).await.unwrap();
        assert_eq!(seen.task.id, x.task.id);
        assert_eq!(seen.assignee.as_ref().unwrap().id, c.id);

        store
            .update_task(
                c.id,
                x.task.id,
                &UpdateTaskRequest {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let after = store.task_stats(a.id).await.unwrap();
        assert_eq!(after.completed_tasks, 1);
    }
}
