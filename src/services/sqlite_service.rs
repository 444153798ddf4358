use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{types::ValueRef, Connection, OptionalExtension};
use serde_json::Value;

use crate::errors::StoreResult;
use crate::models::{LeaderboardEntry, UserAttempt, UserProfile, UserSummary};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    username     TEXT NOT NULL UNIQUE,
    password     TEXT NOT NULL,           /* plaintext */
    role         TEXT DEFAULT 'student',
    full_name    TEXT,
    total_points INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_attempts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER,                  /* users.id, not enforced */
    question_id INTEGER,
    attempts    INTEGER,
    is_correct  INTEGER
);
";

/// Outcome of a profile update, decided inside one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileUpdate {
    Updated,
    UserMissing,
    UsernameTaken,
}

/// Handle to the single SQLite file shared by every handler.
///
/// Each method opens its own connection on the blocking pool and drops it
/// before returning, whether the statements succeeded or not.
pub struct SqliteService {
    db_path: Arc<PathBuf>,
}

impl SqliteService {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    async fn with_connection<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        let result = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(db_path.as_path())?;
            op(&conn)
        })
        .await?;

        Ok(result?)
    }

    pub async fn init_schema(&self) -> StoreResult<()> {
        tracing::info!("Ensuring schema in {}", self.db_path.display());
        self.with_connection(|conn| conn.execute_batch(SCHEMA)).await
    }

    /// Fails with a constraint error on a duplicate or NULL username.
    pub async fn insert_user(
        &self,
        username: Option<String>,
        password: Option<String>,
        role: String,
    ) -> StoreResult<()> {
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
                (&username, &password, &role),
            )
            .map(|_| ())
        })
        .await
    }

    pub async fn get_password(&self, username: &str) -> StoreResult<Option<String>> {
        let username = username.to_owned();
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT password FROM users WHERE username = ?1",
                [&username],
                |row| row.get(0),
            )
            .optional()
        })
        .await
    }

    pub async fn update_password(&self, username: &str, new_password: Option<String>) -> StoreResult<()> {
        let username = username.to_owned();
        self.with_connection(move |conn| {
            conn.execute(
                "UPDATE users SET password = ?1 WHERE username = ?2",
                (&new_password, &username),
            )
            .map(|_| ())
        })
        .await
    }

    pub async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT username, role FROM users")?;
            let rows = stmt.query_map([], |row| {
                Ok(UserSummary {
                    username: row.get(0)?,
                    role: row.get(1)?,  // NULL in databases created elsewhere
                })
            })?;
            rows.collect()
        })
        .await
    }

    /// Outer `None` when the user is missing, inner `None` for a NULL role.
    pub async fn get_role(&self, username: &str) -> StoreResult<Option<Option<String>>> {
        let username = username.to_owned();
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT role FROM users WHERE username = ?1",
                [&username],
                |row| row.get(0),
            )
            .optional()
        })
        .await
    }

    /// `None` when the user is missing. A NULL column reads as 0; other
    /// values are returned as stored.
    pub async fn get_total_points(&self, username: &str) -> StoreResult<Option<Value>> {
        let username = username.to_owned();
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT total_points FROM users WHERE username = ?1",
                [&username],
                |row| row.get_ref(0).map(points_to_json),
            )
            .optional()
        })
        .await
    }

    /// `None` when no such user exists.
    pub async fn get_attempts(&self, username: &str) -> StoreResult<Option<Vec<UserAttempt>>> {
        let username = username.to_owned();
        self.with_connection(move |conn| {
            let user_id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM users WHERE username = ?1",
                    [&username],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(user_id) = user_id else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT question_id, attempts, is_correct FROM user_attempts WHERE user_id = ?1",
            )?;
            // Columns are owned by the quiz subsystem; take them as stored.
            let rows = stmt.query_map([user_id], |row| {
                Ok(UserAttempt {
                    question_id: row.get_ref(0).map(value_to_json)?,
                    attempts: row.get_ref(1).map(value_to_json)?,
                    is_correct: row.get_ref(2).map(is_truthy)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map(Some)
        })
        .await
    }

    pub async fn get_profile(&self, username: &str) -> StoreResult<Option<UserProfile>> {
        let username = username.to_owned();
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT username, full_name FROM users WHERE username = ?1",
                [&username],
                |row| {
                    let full_name: Option<String> = row.get(1)?;
                    Ok(UserProfile {
                        username: row.get(0)?,
                        full_name: full_name.unwrap_or_default(),
                    })
                },
            )
            .optional()
        })
        .await
    }

    /// Renames and/or sets `full_name`. An empty or absent `new_username`
    /// keeps the current one; `full_name` is written as given, NULL included.
    pub async fn update_profile(
        &self,
        current_username: &str,
        new_username: Option<String>,
        full_name: Option<String>,
    ) -> StoreResult<ProfileUpdate> {
        let current_username = current_username.to_owned();
        self.with_connection(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT id FROM users WHERE username = ?1",
                    [&current_username],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !exists {
                return Ok(ProfileUpdate::UserMissing);
            }

            let new_username = new_username.filter(|name| !name.is_empty());
            if let Some(name) = new_username.as_deref().filter(|name| *name != current_username) {
                let taken = conn
                    .query_row(
                        "SELECT id FROM users WHERE username = ?1",
                        [name],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?
                    .is_some();
                if taken {
                    return Ok(ProfileUpdate::UsernameTaken);
                }
            }

            let target = new_username.unwrap_or_else(|| current_username.clone());
            conn.execute(
                "UPDATE users SET username = ?1, full_name = ?2 WHERE username = ?3",
                (&target, &full_name, &current_username),
            )?;
            Ok(ProfileUpdate::Updated)
        })
        .await
    }

    /// Every column of every user row, in table order, untyped.
    pub async fn dump_users(&self) -> StoreResult<Vec<Vec<Value>>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users")?;
            let column_count = stmt.column_count();
            let rows = stmt.query_map([], |row| {
                (0..column_count)
                    .map(|idx| row.get_ref(idx).map(value_to_json))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?;
            rows.collect()
        })
        .await
    }

    pub async fn leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT username, total_points FROM users ORDER BY total_points DESC")?;
            let rows = stmt.query_map([], |row| {
                Ok(LeaderboardEntry {
                    username: row.get(0)?,
                    total_points: row.get_ref(1).map(points_to_json)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    /// Returns the number of rows removed.
    pub async fn delete_user(&self, username: &str) -> StoreResult<usize> {
        let username = username.to_owned();
        self.with_connection(move |conn| {
            conn.execute("DELETE FROM users WHERE username = ?1", [&username])
        })
        .await
    }
}

impl Clone for SqliteService {
    fn clone(&self) -> Self {
        Self {
            db_path: self.db_path.clone()
        }
    }
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(text) => Value::from(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
    }
}

// Empty or zero points collapse to 0 like NULL does.
fn points_to_json(value: ValueRef<'_>) -> Value {
    if is_truthy(value) {
        value_to_json(value)
    } else {
        Value::from(0)
    }
}

fn is_truthy(value: ValueRef<'_>) -> bool {
    match value {
        ValueRef::Null => false,
        ValueRef::Integer(i) => i != 0,
        ValueRef::Real(f) => f != 0.0,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => !bytes.is_empty(),
    }
}
