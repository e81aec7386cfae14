//! Role entity definitions

use serde::{Deserialize, Serialize};

/// Role a user can be assigned. Roles are opaque ids to the user layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}
