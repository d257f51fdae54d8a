use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog
        .route("/shows", get(handlers::list_shows))
        .route("/shows/new", get(handlers::new_releases))
        .route("/shows/trending", get(handlers::trending))
        // Users
        .route("/users", post(handlers::create_user))
        .route("/users/:user_id/home", get(handlers::home))
        .route("/users/:user_id/list", get(handlers::my_list))
        .route("/users/:user_id/search", get(handlers::search))
        .route("/users/:user_id/shows/:show_id", get(handlers::show_page))
        .route("/users/:user_id/shows/:show_id/review", put(handlers::submit_review))
        // Watchlists
        .route(
            "/watchlists/:watchlist_id/shows/:show_id",
            put(handlers::change_status),
        )
        // Admin
        .route("/admin/shows", post(handlers::add_show))
        .route("/admin/shows/import", post(handlers::import_shows))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
