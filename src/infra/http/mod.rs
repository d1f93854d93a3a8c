//! Thin HTTP surface over the cache: the reinitialize trigger plus a few
//! cache-backed reads.

mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::{
    application::{repos::CacheSource, reset::ResetService},
    cache::{EntityCaches, Icon},
};

#[derive(Clone)]
pub struct HttpState {
    pub caches: Arc<EntityCaches>,
    pub reset: Arc<ResetService>,
    pub store: Arc<dyn CacheSource>,
    /// Served for users without an uploaded icon.
    pub fallback_icon: Option<Arc<Icon>>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/initialize", post(handlers::initialize))
        .route("/api/health", get(handlers::health))
        .route("/api/tag", get(handlers::list_tags))
        .route("/api/user/{username}/icon", get(handlers::user_icon))
        .route(
            "/api/livestream/{livestream_id}/tags",
            get(handlers::livestream_tags),
        )
        .route(
            "/api/livestream/{livestream_id}/totals",
            get(handlers::livestream_totals),
        )
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .with_state(state)
}
