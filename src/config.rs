//! Server configuration loaded from environment variables.
//!
//! - `HOST` / `PORT` - listen address (defaults `0.0.0.0:3001`)
//! - `DATABASE_PATH` - SQLite database file (default `taskdeck.db`)
//! - `JWT_SECRET` - required; the server refuses to start without it
//! - `JWT_TTL_DAYS` - token lifetime (default 30)

use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET must be set")?;

        let port = match std::env::var("PORT") {
            Ok(v) => v.parse::<u16>().context("PORT must be a valid port number")?,
            Err(_) => 3001,
        };

        let jwt_ttl_days = match std::env::var("JWT_TTL_DAYS") {
            Ok(v) => v
                .parse::<i64>()
                .context("JWT_TTL_DAYS must be an integer")?,
            Err(_) => 30,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("taskdeck.db")),
            jwt_secret,
            jwt_ttl_days,
        })
    }
}
