//! Team management endpoints.
//!
//! Teams group users and can be attached to tasks for display purposes.
//! Membership gates these endpoints only; it never grants task access.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use crate::error::Result;
use crate::tasks::Team;

/// Create team routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/:id", get(get_team))
        .route("/:id/members", post(add_member))
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

/// GET /teams - teams the caller belongs to.
async fn list_teams(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Team>>> {
    let teams = state.store.teams_for_user(user.id).await?;
    Ok(Json(teams))
}

/// POST /teams - create a team; the caller becomes its first member.
async fn create_team(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>)> {
    let team = state.store.create_team(user.id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// GET /teams/:id - NotFound when absent or the caller is not a member.
async fn get_team(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Team>> {
    let team = state.store.get_team(id, user.id).await?;
    Ok(Json(team))
}

/// POST /teams/:id/members - add a user to a team the caller is in.
async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Team>> {
    let team = state.store.add_team_member(id, user.id, req.user_id).await?;
    Ok(Json(team))
}
