//! Guru server - HTTP API for the teaching assistant
//!
//! Routes under `/api/v1`:
//! - `GET  /health` (no auth)
//! - `POST /sessions`, `GET /sessions/:id`
//! - `POST /chat/:id` - natural-language requests through the coordinator
//! - `POST /process-image/:id` - textbook photo to worksheets (multipart)
//! - `POST /assess-reading/:id` - read-aloud recording to feedback (multipart)
//! - `POST /worksheets`, `POST /differentiate`
//! - `GET  /grades`, `GET /capabilities`, `GET /audit`

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/sessions", post(routes::create_session))
        .route("/sessions/:id", get(routes::get_session))
        .route("/chat/:id", post(routes::chat))
        .route("/process-image/:id", post(routes::process_image))
        .route("/assess-reading/:id", post(routes::assess_reading))
        .route("/worksheets", post(routes::worksheets))
        .route("/differentiate", post(routes::differentiate))
        .route("/grades", get(routes::grades))
        .route("/capabilities", get(routes::capabilities))
        .route("/audit", get(routes::audit))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_auth,
        ));

    let api = Router::new()
        .route("/health", get(routes::health))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api)
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.max_image_bytes))
        .layer(axum::middleware::from_fn(middleware::request_context))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
