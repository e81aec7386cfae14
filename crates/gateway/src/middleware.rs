//! Middleware for authentication, auditing and other cross-cutting concerns

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Instrument, Level};
use userdesk_auth::{AuthError, AuthenticatedUser};
use userdesk_database::CreateOperationLogRequest;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::state::GatewayState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier assigned to each request by [`logging_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Business operation a handler performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    /// Whether completed calls are written to the operation log.
    pub audited: bool,
}

impl Operation {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            audited: false,
        }
    }

    pub const fn audited(name: &'static str) -> Self {
        Self {
            name,
            audited: true,
        }
    }
}

/// State handed to [`operation_middleware`] for one route.
#[derive(Clone)]
pub struct OperationContext {
    pub state: Arc<GatewayState>,
    pub operation: Operation,
}

/// Authentication middleware that validates bearer session tokens
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = bearer_token(&request).ok_or_else(|| {
        GatewayError::AuthenticationFailed("Missing authentication token".to_string())
    })?;

    let (user, _session) = state
        .authenticator()
        .authenticate_token(token)
        .await
        .map_err(|e| match e {
            AuthError::Database(_) | AuthError::PasswordHash(_) => GatewayError::from(e),
            other => GatewayError::AuthenticationFailed(format!("Invalid token: {other}")),
        })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

/// Extract the authenticated caller from request extensions
pub fn extract_user(request: &Request) -> Option<&AuthenticatedUser> {
    request.extensions().get::<AuthenticatedUser>()
}

/// Tags the request with its operation and records audited operations
pub async fn operation_middleware(
    State(context): State<OperationContext>,
    request: Request,
    next: Next,
) -> Response {
    let operation = context.operation;
    let actor_id = extract_user(&request).map(|user| user.id);
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!("operation", name = operation.name, actor_id = ?actor_id);
    let start = Instant::now();
    let response = next.run(request).instrument(span).await;

    if operation.audited {
        let entry = CreateOperationLogRequest {
            operation: operation.name.to_string(),
            actor_id,
            method,
            path,
            status: response.status().as_u16(),
            request_id,
            duration_ms: i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX),
        };

        if let Err(e) = context.state.operation_logs().record(&entry).await {
            error!(operation = operation.name, error = %e, "failed to record operation");
        }
    }

    response
}

/// Create tracing middleware
pub fn create_trace_middleware(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG))
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4().to_string();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let start = Instant::now();
    let mut response = next.run(request).await;
    let duration = start.elapsed();

    info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
