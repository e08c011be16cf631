use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{feed_session_middleware, make_span_with_session};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Feeds
        .route("/feed/home", post(handlers::home_feed))
        .route("/feed/shorts", post(handlers::shorts_feed))
        // Paginated listings
        .route("/videos/:id/related", get(handlers::related))
        .route("/videos/:id/comments", get(handlers::comments))
        .route("/channels/:id/videos", get(handlers::channel_videos))
        .route("/search", get(handlers::search))
        // Outermost first: the session is resolved before the trace span is made
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(feed_session_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_session)),
        )
        .with_state(state)
}
