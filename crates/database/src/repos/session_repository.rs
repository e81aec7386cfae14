//! Session repository for database operations.

use crate::entities::{AuthSession, CreateSessionRequest};
use crate::types::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Repository for bearer session database operations
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new session
    pub async fn create(&self, request: &CreateSessionRequest) -> DatabaseResult<AuthSession> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO auth_sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&request.token)
        .bind(request.user_id)
        .bind(&request.expires_at)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT id, token, user_id, expires_at, created_at FROM auth_sessions WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => session_from_row(&row),
            None => Err(DatabaseError::QueryError(
                "Failed to retrieve created session".to_string(),
            )),
        }
    }

    /// Find session by token
    pub async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<AuthSession>> {
        let row = sqlx::query(
            "SELECT id, token, user_id, expires_at, created_at FROM auth_sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    /// Delete session by token, returning whether a row was removed
    pub async fn delete_by_token(&self, token: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete expired sessions
    pub async fn delete_expired(&self) -> DatabaseResult<u64> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at < ?")
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn session_from_row(row: &SqliteRow) -> DatabaseResult<AuthSession> {
    Ok(AuthSession {
        id: row.try_get("id")?,
        token: row.try_get("token")?,
        user_id: row.try_get("user_id")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}
