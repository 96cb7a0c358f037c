use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/news", get(handlers::fetch_news))
        .route("/api/places", get(handlers::search_places))
        .route("/api/locations/validate", get(handlers::validate_location))
        .route("/api/locations/suggestions", get(handlers::city_suggestions))
        .route("/api/locations/cities", get(handlers::fetch_cities))
        .route("/api/posts", post(handlers::register_post))
        .route("/api/posts/:id", get(handlers::get_post))
        .route("/api/posts/:id/likes", post(handlers::toggle_like))
        .route("/api/posts/:id/comments", post(handlers::add_comment))
        .route("/api/reports", get(handlers::open_reports).post(handlers::submit_report))
        .route("/api/reports/:id/resolve", post(handlers::resolve_report))
        .route("/api/moderation/suppression", post(handlers::suppression))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::AppState;
    pub use jh_core::{Error, Result};
}
