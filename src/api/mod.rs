//! HTTP API: routing, auth middleware, and request handlers.

pub mod auth;
pub mod routes;
pub mod tasks;
pub mod teams;
pub mod types;
pub mod users;
