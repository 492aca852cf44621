pub mod health;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::review::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public = ServeDir::new(&state.config.public_dir);

    // Review API, callable cross-origin with a bearer token
    let api = Router::new()
        .route("/api/v1/resumes/:id", get(handlers::handle_review_json))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health::health_handler))
        // Review page
        .route("/resume/:id", get(handlers::handle_review_page))
        .route("/objects/:token", get(handlers::handle_object))
        .merge(api)
        .fallback_service(public)
        .with_state(state)
}
