//! HTTP routes.
//!
//! `router` assembles the public routes and the token-guarded `/api`
//! routes into one axum `Router`.

pub mod collections;
pub mod login;
pub mod week;

use std::sync::Arc;

use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tracing::warn;

use crate::auth::require_auth;
use crate::error::ApiError;
use crate::AppState;

/// Builds the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/week/current", get(week::current_week))
        .route(
            "/api/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/api/collections/{id}",
            get(collections::get_collection)
                .put(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/login", post(login::login))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint.
async fn health_handler(State(state): State<Arc<AppState>>) -> Result<&'static str, ApiError> {
    if state.db.health_check().await {
        Ok("OK")
    } else {
        warn!("Health check failed: database unreachable");
        Err(ApiError::Unavailable)
    }
}
