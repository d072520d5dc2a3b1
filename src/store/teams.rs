//! Team rows and membership.
//!
//! Membership gates the teams API only. Task visibility never consults
//! it: being on a team does not grant access to the team's tasks.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{encode_ts, now, ts_col, uuid_col};
use crate::error::{Error, Result};
use crate::tasks::Team;

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        created_at: ts_col(row, 2)?,
    })
}

pub(crate) fn team_row(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Team>> {
    conn.query_row(
        "SELECT id, name, created_at FROM teams WHERE id = ?",
        params![id.to_string()],
        team_from_row,
    )
    .optional()
}

pub(crate) fn team_exists(conn: &Connection, id: Uuid) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM teams WHERE id = ?",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Scoped lookup: the team only resolves for its members, so outsiders
/// cannot distinguish a private team from a missing one.
fn team_for_member(conn: &Connection, team_id: Uuid, user_id: Uuid) -> Result<Team> {
    conn.query_row(
        "SELECT t.id, t.name, t.created_at FROM teams t
         JOIN team_members m ON m.team_id = t.id
         WHERE t.id = ? AND m.user_id = ?",
        params![team_id.to_string(), user_id.to_string()],
        team_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::team_not_found(team_id))
}

impl super::Store {
    /// Create a team; the creator becomes its first member.
    pub async fn create_team(&self, user_id: Uuid, name: &str) -> Result<Team> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("team name must not be empty".to_string()));
        }

        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO teams (id, name, created_at) VALUES (?, ?, ?)",
            params![id.to_string(), name, encode_ts(now())],
        )?;
        tx.execute(
            "INSERT INTO team_members (team_id, user_id) VALUES (?, ?)",
            params![id.to_string(), user_id.to_string()],
        )?;
        let team = team_row(&tx, id)?.ok_or(Error::Storage(rusqlite::Error::QueryReturnedNoRows))?;
        tx.commit()?;
        Ok(team)
    }

    /// Teams the user belongs to.
    pub async fn teams_for_user(&self, user_id: Uuid) -> Result<Vec<Team>> {
        let conn = self.lock().await;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.created_at FROM teams t
             JOIN team_members m ON m.team_id = t.id
             WHERE m.user_id = ? ORDER BY t.name ASC",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], team_from_row)?;
        let mut teams = Vec::new();
        for team in rows {
            teams.push(team?);
        }
        Ok(teams)
    }

    /// Fetch a team; `NotFound` when absent or the caller is not a member.
    pub async fn get_team(&self, team_id: Uuid, user_id: Uuid) -> Result<Team> {
        let conn = self.lock().await;
        team_for_member(&conn, team_id, user_id)
    }

    /// Add a member. The acting user must already be a member.
    pub async fn add_team_member(
        &self,
        team_id: Uuid,
        acting_user: Uuid,
        new_member: Uuid,
    ) -> Result<Team> {
        let mut conn = self.lock().await;
        let tx = conn.transaction()?;
        let team = team_for_member(&tx, team_id, acting_user)?;
        if !super::users::user_exists(&tx, new_member)? {
            return Err(Error::InvalidInput(format!(
                "no user with ID {new_member}"
            )));
        }
        tx.execute(
            "INSERT OR IGNORE INTO team_members (team_id, user_id) VALUES (?, ?)",
            params![team_id.to_string(), new_member.to_string()],
        )?;
        tx.commit()?;
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::super::Store;
    use crate::error::Error;
    use crate::tasks::User;

    async fn seed_user(store: &Store, email: &str) -> User {
        store.create_user(email, email, "hash").await.unwrap()
    }

    #[tokio::test]
    async fn test_creator_becomes_member() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;

        let team = store.create_team(ada.id, "Platform").await.unwrap();
        let mine = store.teams_for_user(ada.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, team.id);
    }

    #[tokio::test]
    async fn test_non_member_gets_not_found() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        let team = store.create_team(ada.id, "Platform").await.unwrap();
        let err = store.get_team(team.id, bob.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_member_can_add_member() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        let team = store.create_team(ada.id, "Platform").await.unwrap();
        store
            .add_team_member(team.id, ada.id, bob.id)
            .await
            .unwrap();
        assert!(store.get_team(team.id, bob.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_outsider_cannot_add_member() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        let team = store.create_team(ada.id, "Platform").await.unwrap();
        let err = store
            .add_team_member(team.id, bob.id, bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_team_name_rejected() {
        let store = Store::open_in_memory().unwrap();
        let ada = seed_user(&store, "ada@example.com").await;
        let err = store.create_team(ada.id, "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
