//! # Userdesk Gateway Crate
//!
//! HTTP layer of the user management service. It binds `/v1/user` requests,
//! authenticates them with bearer session tokens and hands them to the user
//! service, returning the service envelope unchanged.
//!
//! ## Architecture
//!
//! - **REST**: the `/v1/user` endpoints with OpenAPI documentation
//! - **State**: shared services behind an `Arc`
//! - **Middleware**: authentication, operation tagging, request ids and logging
//!
//! ## Usage
//!
//! ```rust,no_run
//! use userdesk_config::AppConfig;
//! use userdesk_gateway::{create_router, GatewayState};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let state = GatewayState::from_config(&config).await?;
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod docs;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;

pub use docs::ApiDoc;
pub use error::{GatewayError, GatewayResult};
pub use middleware::{auth_middleware, RequestId, REQUEST_ID_HEADER};
pub use state::GatewayState;

use axum::{http::Method, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(rest::create_rest_routes(arc_state.clone()))
        .with_state(arc_state);

    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers(Any),
        )
        .layer(middleware::create_trace_middleware())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
