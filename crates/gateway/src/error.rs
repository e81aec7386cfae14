//! Error types for the gateway layer

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;
use userdesk_auth::AuthError;
use userdesk_database::DatabaseError;
use userdesk_users::{ApiResponse, ResultCode};

/// Gateway error types
///
/// Every variant renders as a failure envelope whose HTTP status follows its
/// result code.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl GatewayError {
    pub fn result_code(&self) -> ResultCode {
        match self {
            GatewayError::AuthenticationFailed(_) => ResultCode::Unauthenticated,
            GatewayError::InvalidRequest(_) => ResultCode::InvalidArgument,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                ResultCode::Internal
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.result_code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn public_message(&self) -> String {
        match self {
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ApiResponse::<()>::failure(self.result_code(), self.public_message());
        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Database(msg) => GatewayError::DatabaseError(msg),
            AuthError::PasswordHash(err) => GatewayError::InternalError(err.to_string()),
            other => GatewayError::AuthenticationFailed(other.to_string()),
        }
    }
}

impl From<DatabaseError> for GatewayError {
    fn from(error: DatabaseError) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl From<axum_extra::extract::QueryRejection> for GatewayError {
    fn from(rejection: axum_extra::extract::QueryRejection) -> Self {
        GatewayError::InvalidRequest(rejection.to_string())
    }
}
