//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

/// User-specific errors shared by the repository and service layers
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("{field} already registered")]
    Duplicate { field: String },

    #[error("Unknown role ids: {0:?}")]
    UnknownRoles(Vec<i64>),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl UserError {
    pub fn duplicate(field: impl Into<String>) -> Self {
        UserError::Duplicate {
            field: field.into(),
        }
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => UserError::UserNotFound,
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match unique_violation_field(message) {
                    Some(field) => UserError::duplicate(field),
                    None => UserError::DatabaseError(message.to_string()),
                }
            }
            _ => UserError::DatabaseError(err.to_string()),
        }
    }
}

/// Column named by a SQLite `UNIQUE constraint failed: users.<column>` message.
fn unique_violation_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("UNIQUE constraint failed: ")?;
    let column = rest.split(',').next()?.trim();
    Some(column.rsplit('.').next().unwrap_or(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(UserError::UserNotFound.to_string(), "User not found");
        assert_eq!(
            UserError::duplicate("username").to_string(),
            "username already registered"
        );
    }

    #[test]
    fn test_unique_violation_field() {
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: users.email"),
            Some("email")
        );
        assert_eq!(unique_violation_field("no such table: users"), None);
    }
}
