use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Genre, GenreId, GenreWithRecommendations},
};

use super::{json::AppJson, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateGenreRequest {
    pub name: Option<String>,
}

/// Handler for genre creation
pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<CreateGenreRequest>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let name = request.name.unwrap_or_default();
    tracing::info!(request_id = %request_id, name = %name, "Creating genre");

    let genre = state.genres.create(&name).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// Handler listing every genre
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.genres.get_all().await?;
    Ok(Json(genres))
}

/// Handler for a single genre with its recommendations
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<GenreId>,
) -> AppResult<Json<GenreWithRecommendations>> {
    state
        .genres
        .get_with_recommendations(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Genre not found".to_string()))
}
