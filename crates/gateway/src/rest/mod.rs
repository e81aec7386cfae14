//! REST API endpoints for the gateway

pub mod user;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use userdesk_users::ApiResponse;

use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    Router::new().merge(user::create_user_routes(state))
}

/// Service envelope returned unchanged, with the HTTP status its code implies
#[derive(Debug)]
pub struct Envelope<T>(pub ApiResponse<T>);

impl<T> IntoResponse for Envelope<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

pub use user::*;
