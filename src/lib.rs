//! # Taskdeck
//!
//! A multi-user task tracking backend with JWT authentication.
//!
//! This library provides:
//! - An HTTP API for tasks, comments, teams, and users
//! - Per-user access control: a task is visible to its creator and its
//!   assignee, and to nobody else
//! - Filtered, searched, due-date-ordered task listings and dashboard
//!   statistics
//!
//! ## Request Flow
//! 1. Client authenticates via `/auth/register` or `/auth/login`
//! 2. `require_auth` middleware resolves the bearer token to a user
//! 3. Handlers delegate to [`store::Store`], which scopes every task
//!    query to the requesting user
//!
//! ## Modules
//! - `api`: axum routes, handlers, and JWT middleware
//! - `tasks`: domain types, the visibility rule, and query composition
//! - `store`: SQLite persistence

pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod tasks;

pub use config::Config;
pub use error::{Error, Result};
