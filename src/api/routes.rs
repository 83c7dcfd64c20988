use axum::{
    Router,
    extract::State,
    http::Method,
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::api::response;

/// The one path the combined feed is served on.
pub const LINKS_PATH: &str = "/links";

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route(LINKS_PATH, get(links_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
        .with_state(app_state)
}

async fn links_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.cache.read();
    response::rss_document(&snapshot)
}
