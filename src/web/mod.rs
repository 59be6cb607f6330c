use axum::{Router, routing::any, routing::get};
use reqwest::Url;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::SearchService;
use crate::config::ClientConfig;

pub mod handlers;
pub mod page;

pub struct AppState {
    pub search: Arc<dyn SearchService>,
    pub proxy: reqwest::Client,
    pub proxy_target: Url,
}

impl AppState {
    pub fn new(search: Arc<dyn SearchService>, config: &ClientConfig) -> Self {
        Self {
            search,
            proxy: reqwest::Client::new(),
            proxy_target: config.proxy_target.clone(),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Search page
        .route("/", get(handlers::index_handler).post(handlers::search_form_handler))
        // Development proxy to the answer service
        .route("/api/*path", any(handlers::proxy_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
