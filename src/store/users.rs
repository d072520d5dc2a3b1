//! User rows.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{encode_ts, now, ts_col, uuid_col};
use crate::error::{Error, Result};
use crate::tasks::User;

const USER_COLUMNS: &str = "id, email, name, created_at, updated_at";

/// Map a user from a row starting at column `start` (lets joined queries
/// reuse the mapping).
pub(crate) fn user_at(row: &Row<'_>, start: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_col(row, start)?,
        email: row.get(start + 1)?,
        name: row.get(start + 2)?,
        created_at: ts_col(row, start + 3)?,
        updated_at: ts_col(row, start + 4)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    user_at(row, 0)
}

pub(crate) fn user_row(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
        params![id.to_string()],
        user_from_row,
    )
    .optional()
}

pub(crate) fn user_exists(conn: &Connection, id: Uuid) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE id = ?",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

impl super::Store {
    /// Insert a new user. The email must be unique.
    pub async fn create_user(&self, email: &str, name: &str, password_hash: &str) -> Result<User> {
        let conn = self.lock().await;
        let id = Uuid::new_v4();
        let ts = encode_ts(now());

        let inserted = conn.execute(
            "INSERT INTO users (id, email, name, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![id.to_string(), email, name, password_hash, ts, ts],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::InvalidInput("email already registered".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        user_row(&conn, id)?.ok_or(Error::Storage(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Look up a user and their password hash by email.
    pub async fn user_with_hash_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
        let conn = self.lock().await;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"),
            params![email],
            |row| Ok((user_from_row(row)?, row.get::<_, String>(5)?)),
        )
        .optional()
        .map_err(Into::into)
    }

    pub async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.lock().await;
        user_row(&conn, id).map_err(Into::into)
    }

    /// All registered users, for assignee selection. Never exposes hashes.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock().await;
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name ASC"))?;
        let rows = stmt.query_map([], user_from_row)?;
        let mut users = Vec::new();
        for user in rows {
            users.push(user?);
        }
        Ok(users)
    }
}
