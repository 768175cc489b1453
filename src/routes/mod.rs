use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::Store,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{GenreService, RecommendationService},
};

pub mod genres;
pub mod json;
pub mod recommendations;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub genres: GenreService,
    pub recommendations: RecommendationService,
}

impl AppState {
    /// Wires both services to one store handle
    pub fn new(store: Arc<dyn Store>) -> Self {
        let genres = GenreService::new(store.clone());
        let recommendations = RecommendationService::new(store, genres.clone());
        Self {
            genres,
            recommendations,
        }
    }
}

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(genre_routes())
        .merge(recommendation_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

fn genre_routes() -> Router<AppState> {
    Router::new()
        .route("/genres", get(genres::list).post(genres::create))
        .route("/genres/:id", get(genres::get_by_id))
}

fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommendations::create))
        .route("/recommendations/random", get(recommendations::random))
        .route("/recommendations/top/:amount", get(recommendations::top))
        .route(
            "/recommendations/genres/:id/random",
            get(recommendations::random_by_genre),
        )
        .route("/recommendations/:id/upvote", post(recommendations::upvote))
        .route("/recommendations/:id/downvote", post(recommendations::downvote))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
