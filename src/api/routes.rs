use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_span, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/api/categories", get(handlers::get_categories))
        // Genre lookup
        .route("/get_genres", get(handlers::get_genres))
        .route("/api/genres", get(handlers::get_genres))
        // Random pick
        .route("/random_item", get(handlers::random_item))
        .route("/random_book", get(handlers::random_book))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(CorsLayer::permissive()),
        )
}
