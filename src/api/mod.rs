mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::explorer::Explorer;

pub fn create_router(explorer: Arc<Explorer>) -> Router {
    let api = Router::new()
        // Data epochs
        .route("/status", get(handlers::get_status))
        .route("/refresh", post(handlers::refresh))
        // Views
        .route("/views/{view}", get(handlers::get_view))
        .route("/preferences", put(handlers::update_preferences))
        // Features
        .route("/features/{id}", get(handlers::get_feature))
        .route("/features/{id}/select", post(handlers::select_feature))
        .route("/features/{id}/scattering", get(handlers::get_scattering))
        .route("/features/{id}/highlight", post(handlers::highlight_feature))
        .route("/features/{id}/declaration", post(handlers::reveal_declaration))
        // Search
        .route("/search", get(handlers::search))
        // Timeline
        .route("/timeline/filter", post(handlers::filter_timeline))
        // Host
        .route("/open-path", post(handlers::open_path))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(explorer)
}
