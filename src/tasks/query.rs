//! Query composer for task listings.
//!
//! Builds the exact predicate the store executes: the visibility rule is
//! always the first condition, each present filter field ANDs one more
//! condition onto it, and results are ordered by ascending due date (a
//! contract the dashboard depends on).

use rusqlite::ToSql;
use uuid::Uuid;

use super::policy::{visibility_params, VISIBILITY_SQL};
use super::types::TaskFilter;
use crate::store::encode_ts;

/// Case-insensitive containment on title or description. `instr` keeps
/// `%` and `_` in the search term literal, unlike LIKE. SQLite's `lower()`
/// folds ASCII only, so non-ASCII characters in the term match
/// case-sensitively.
const SEARCH_SQL: &str =
    "(instr(lower(title), lower(?)) > 0 OR instr(lower(coalesce(description, '')), lower(?)) > 0)";

/// A composed WHERE clause plus its bound parameters.
pub struct TaskQuery {
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql + Send>>,
}

impl TaskQuery {
    /// Result ordering for every listing: earliest due first.
    pub const ORDER_BY: &'static str = "ORDER BY due_date ASC";

    /// Start from the base visibility predicate for `user_id`.
    pub fn scoped(user_id: Uuid) -> Self {
        let mut query = Self {
            conditions: vec![VISIBILITY_SQL.to_string()],
            params: Vec::new(),
        };
        for param in visibility_params(user_id) {
            query.params.push(Box::new(param));
        }
        query
    }

    /// AND each present filter field onto the predicate.
    pub fn with_filter(mut self, filter: &TaskFilter) -> Self {
        if let Some(status) = filter.status {
            self.push("status = ?", status.as_str().to_string());
        }
        if let Some(priority) = filter.priority {
            self.push("priority = ?", priority.as_str().to_string());
        }
        if let Some(before) = filter.due_date_before {
            self.push("due_date <= ?", encode_ts(before));
        }
        if let Some(after) = filter.due_date_after {
            self.push("due_date >= ?", encode_ts(after));
        }
        if let Some(search) = &filter.search {
            self.conditions.push(SEARCH_SQL.to_string());
            self.params.push(Box::new(search.clone()));
            self.params.push(Box::new(search.clone()));
        }
        self
    }

    fn push(&mut self, condition: &str, param: String) {
        self.conditions.push(condition.to_string());
        self.params.push(Box::new(param));
    }

    pub fn where_clause(&self) -> String {
        format!("WHERE {}", self.conditions.join(" AND "))
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| &**p as &dyn ToSql).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::{Priority, TaskStatus};

    #[test]
    fn test_unfiltered_query_is_visibility_only() {
        let query = TaskQuery::scoped(Uuid::new_v4()).with_filter(&TaskFilter::default());
        assert_eq!(
            query.where_clause(),
            "WHERE (creator_id = ? OR assignee_id = ?)"
        );
        assert_eq!(query.params().len(), 2);
    }

    #[test]
    fn test_each_filter_field_adds_one_condition() {
        let user = Uuid::new_v4();
        let filter = TaskFilter {
            status: Some(TaskStatus::Todo),
            priority: Some(Priority::Urgent),
            due_date_before: Some(chrono::Utc::now()),
            due_date_after: Some(chrono::Utc::now()),
            search: None,
        };
        let query = TaskQuery::scoped(user).with_filter(&filter);
        let clause = query.where_clause();
        assert!(clause.contains("status = ?"));
        assert!(clause.contains("priority = ?"));
        assert!(clause.contains("due_date <= ?"));
        assert!(clause.contains("due_date >= ?"));
        assert_eq!(clause.matches(" AND ").count(), 4);
        assert_eq!(query.params().len(), 6);
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let filter = TaskFilter {
            search: Some("foo".to_string()),
            ..Default::default()
        };
        let query = TaskQuery::scoped(Uuid::new_v4()).with_filter(&filter);
        let clause = query.where_clause();
        assert!(clause.contains("lower(title)"));
        assert!(clause.contains("lower(coalesce(description, ''))"));
        // visibility binds twice, search binds twice
        assert_eq!(query.params().len(), 4);
    }

    #[test]
    fn test_ordering_is_due_date_ascending() {
        assert_eq!(TaskQuery::ORDER_BY, "ORDER BY due_date ASC");
    }
}
