//! User listing endpoint, used by the dashboard's assignee picker.

use std::sync::Arc;

use axum::{extract::State, Json};

use super::routes::AppState;
use crate::error::Result;
use crate::tasks::User;

/// GET /users - all registered users, without credential material.
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>> {
    let users = state.store.list_users().await?;
    Ok(Json(users))
}
