//! JWT auth for the task API (multi-user, database-backed).
//!
//! - Clients register or log in with email + password
//! - Server returns a JWT valid for `JWT_TTL_DAYS`
//! - All task, team, and user endpoints require `Authorization: Bearer <jwt>`
//!
//! Token verification resolves the subject against the user table, so
//! tokens for deleted accounts stop working. Handlers receive the
//! resolved identity as an [`AuthUser`] request extension and never see
//! the raw token.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use super::routes::AppState;
use super::types::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::{Error, Result};
use crate::tasks::User;

const PBKDF2_ROUNDS: u32 = 600_000;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    /// Subject: user id
    sub: String,
    /// Email (for display/auditing)
    #[serde(default)]
    usr: String,
    /// Issued-at unix seconds
    iat: i64,
    /// Expiration unix seconds
    exp: i64,
}

/// Resolved requester identity. Constructed once by [`require_auth`] and
/// passed by value into every protected handler.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for i in 0..a_bytes.len() {
        diff |= a_bytes[i] ^ b_bytes[i];
    }
    diff == 0
}

pub(crate) fn hash_password(password: &str) -> String {
    hash_with_rounds(password, PBKDF2_ROUNDS)
}

fn hash_with_rounds(password: &str, rounds: u32) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut derived);
    format!("{rounds}${}${}", hex::encode(salt), hex::encode(derived))
}

/// Check a password against a stored `rounds$salt$hash` string.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(rounds), Some(salt), Some(hash)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut derived);
    constant_time_eq(&hex::encode(derived), hash)
}

fn issue_jwt(secret: &str, ttl_days: i64, user: &User) -> Result<(String, i64)> {
    let now = Utc::now();
    let exp = now + Duration::days(ttl_days.max(1));
    let claims = Claims {
        sub: user.id.to_string(),
        usr: user.email.clone(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to issue token: {e}")))?;
    Ok((token, claims.exp))
}

fn verify_jwt(token: &str, secret: &str) -> Option<Claims> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// POST /auth/register - create an account and return a token.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::InvalidInput("a valid email is required".to_string()));
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()));
    }
    if req.password.len() < 8 {
        return Err(Error::InvalidInput(
            "password must be at least 8 characters".to_string(),
        ));
    }

    // Key derivation is CPU-bound; keep it off the async workers.
    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    let user = state.store.create_user(&email, &name, &hash).await?;
    tracing::info!("registered user {}", user.id);

    let (token, exp) = issue_jwt(&state.config.jwt_secret, state.config.jwt_ttl_days, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, exp, user })))
}

/// POST /auth/login - exchange credentials for a token.
///
/// Unknown email and wrong password produce the same generic error, and
/// the unknown-email path still runs a dummy verification so response
/// timing does not reveal which case occurred.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();
    let account = state.store.user_with_hash_by_email(&email).await?;

    let (user, stored) = match account {
        Some((user, hash)) => (Some(user), hash),
        None => (None, hash_with_rounds("dummy_password_for_timing", 1_000)),
    };

    let password = req.password;
    let matched = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    let user = match (user, matched) {
        (Some(user), true) => user,
        _ => {
            return Err(Error::Unauthorized(
                "Invalid email or password".to_string(),
            ))
        }
    };

    let (token, exp) = issue_jwt(&state.config.jwt_secret, state.config.jwt_ttl_days, &user)?;
    Ok(Json(AuthResponse { token, exp, user }))
}

/// Middleware guarding the protected routes.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .unwrap_or("");

    if token.is_empty() {
        return Error::Unauthorized("Missing Authorization header".to_string()).into_response();
    }

    let Some(claims) = verify_jwt(token, &state.config.jwt_secret) else {
        return Error::Unauthorized("Invalid or expired token".to_string()).into_response();
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return Error::Unauthorized("Invalid token subject".to_string()).into_response();
    };

    // The subject must still resolve to a live account.
    match state.store.user_by_id(user_id).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(AuthUser {
                id: user.id,
                email: user.email,
            });
            next.run(req).await
        }
        Ok(None) => Error::Unauthorized("Invalid user".to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}
