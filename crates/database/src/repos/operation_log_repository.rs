//! Operation log repository for database operations.

use crate::entities::{CreateOperationLogRequest, OperationLog};
use crate::types::DatabaseResult;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Append-only store of audited operations
#[derive(Clone)]
pub struct OperationLogRepository {
    pool: SqlitePool,
}

impl OperationLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one operation, returning the new row id
    pub async fn record(&self, request: &CreateOperationLogRequest) -> DatabaseResult<i64> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO operation_logs
                (operation, actor_id, method, path, status, request_id, duration_ms, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.operation)
        .bind(request.actor_id)
        .bind(&request.method)
        .bind(&request.path)
        .bind(i64::from(request.status))
        .bind(&request.request_id)
        .bind(request.duration_ms)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent entries first
    pub async fn recent(&self, limit: i64) -> DatabaseResult<Vec<OperationLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, operation, actor_id, method, path, status, request_id, duration_ms, created_at
            FROM operation_logs
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(log_from_row).collect()
    }
}

fn log_from_row(row: &SqliteRow) -> DatabaseResult<OperationLog> {
    let status: i64 = row.try_get("status")?;

    Ok(OperationLog {
        id: row.try_get("id")?,
        operation: row.try_get("operation")?,
        actor_id: row.try_get("actor_id")?,
        method: row.try_get("method")?,
        path: row.try_get("path")?,
        status: u16::try_from(status).unwrap_or_default(),
        request_id: row.try_get("request_id")?,
        duration_ms: row.try_get("duration_ms")?,
        created_at: row.try_get("created_at")?,
    })
}
