//! Shared application state for the gateway

use std::sync::Arc;

use sqlx::SqlitePool;
use userdesk_auth::Authenticator;
use userdesk_config::AppConfig;
use userdesk_database::OperationLogRepository;
use userdesk_users::{SqliteUserStore, UserService};

use crate::error::{GatewayError, GatewayResult};

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    /// Database connection pool
    pub pool: SqlitePool,
    /// User service
    pub user_service: Arc<UserService<SqliteUserStore>>,
    /// Bearer session validation
    pub authenticator: Authenticator,
    /// Audit trail of recorded operations
    pub operation_logs: OperationLogRepository,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator, config: &AppConfig) -> Self {
        let user_service = Arc::new(UserService::new(pool.clone(), config.pagination.clone()));
        let operation_logs = OperationLogRepository::new(pool.clone());

        Self {
            pool,
            user_service,
            authenticator,
            operation_logs,
        }
    }

    /// Create gateway state from application configuration
    pub async fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        let pool = userdesk_database::initialize_database(&config.database)
            .await
            .map_err(|e| GatewayError::DatabaseError(format!("Failed to initialize database: {e}")))?;

        let authenticator = Authenticator::new(pool.clone(), config.auth.clone());
        Ok(Self::new(pool, authenticator, config))
    }

    pub fn user_service(&self) -> &UserService<SqliteUserStore> {
        &self.user_service
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn operation_logs(&self) -> &OperationLogRepository {
        &self.operation_logs
    }
}
