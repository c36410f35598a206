pub mod rest;
pub mod session;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, put},
    Router,
};
use std::sync::Arc;

use crate::web::state::AppState;

pub use session::{ensure_session, SessionIdentity, SESSION_COOKIE};

/// Builds the application router. Every route runs behind the session
/// middleware, so handlers can rely on a `SessionIdentity` extension being
/// present.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(rest::health_handler))
        .route("/api/session", get(rest::get_session_handler))
        .route(
            "/api/saved",
            get(rest::list_saved_handler).post(rest::add_saved_handler),
        )
        .route("/api/saved/{resource_id}", delete(rest::delete_saved_handler))
        .route("/api/progress", get(rest::list_progress_handler))
        .route(
            "/api/progress/{resource_id}",
            put(rest::upsert_progress_handler),
        )
        .route("/api/youtube/search", get(rest::search_videos_handler))
        .layer(axum_middleware::from_fn(session::ensure_session))
        .with_state(state)
}
