//! Operation (audit) log entries

use serde::{Deserialize, Serialize};

/// One recorded business operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    pub id: i64,
    pub operation: String,
    pub actor_id: Option<i64>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub request_id: Option<String>,
    pub duration_ms: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOperationLogRequest {
    pub operation: String,
    pub actor_id: Option<i64>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub request_id: Option<String>,
    pub duration_ms: i64,
}
