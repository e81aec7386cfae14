//! userdesk Database Crate
//!
//! Connection management, migrations, entities and repository
//! implementations for user accounts, role assignments, sessions and the
//! operation (audit) log.

use sqlx::SqlitePool;
use userdesk_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

// Re-export repositories
pub use repos::{OperationLogRepository, RoleRepository, SessionRepository, UserRepository};

// Re-export entities
pub use entities::{
    operation_log::{CreateOperationLogRequest, OperationLog},
    role::Role,
    session::{AuthSession, CreateSessionRequest},
    user::{CreateUserRequest, UpdateUserRequest, User, UserFilter, UserLookup},
};

// Re-export types
pub use types::{
    errors::{DatabaseError, UserError},
    DatabaseResult, UserResult,
};

pub use sqlx::SqlitePool as Pool;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
