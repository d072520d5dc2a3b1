//! Task domain - data model, access policy, and query composition.
//!
//! The access rule for every task operation lives in [`policy`]: a task is
//! visible to a user iff that user is its creator or its assignee. The
//! [`query`] module turns a requester identity plus an optional filter set
//! into the exact SQL predicate the store executes.

pub mod policy;
pub mod query;
pub mod types;

pub use policy::can_access;
pub use query::TaskQuery;
pub use types::{
    Comment, CommentDetail, CommentWithTask, CreateTaskRequest, Priority, Task, TaskDetail,
    TaskFilter, TaskFilterParams, TaskStats, TaskStatus, Team, UpdateTaskRequest, User,
};
