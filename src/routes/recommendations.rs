use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{
        DownvoteOutcome, GenreId, RecommendationId, RecommendationWithGenres, TopRecommendation,
    },
    services::RecommendationService,
};

use super::{json::AppJson, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecommendationRequest {
    pub name: Option<String>,
    pub youtube_link: Option<String>,
    pub genres_ids: Option<Vec<GenreId>>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: i32,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DownvoteResponse {
    Scored { score: i32 },
    Deleted { deleted: bool },
}

impl From<DownvoteOutcome> for DownvoteResponse {
    fn from(outcome: DownvoteOutcome) -> Self {
        match outcome {
            DownvoteOutcome::Scored(score) => Self::Scored { score },
            DownvoteOutcome::Deleted => Self::Deleted { deleted: true },
        }
    }
}

/// Handler for recommendation creation
///
/// Duplicates are reported as 400 on this endpoint rather than 409.
pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<CreateRecommendationRequest>,
) -> AppResult<(StatusCode, Json<RecommendationWithGenres>)> {
    tracing::info!(
        request_id = %request_id,
        genre_count = request.genres_ids.as_ref().map_or(0, Vec::len),
        "Creating recommendation"
    );

    let created = state
        .recommendations
        .new_recommendation(
            request.name.as_deref(),
            request.youtube_link.as_deref(),
            request.genres_ids.as_deref(),
        )
        .await
        .map_err(|e| match e {
            AppError::Conflict(msg) => AppError::Validation(msg),
            other => other,
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for upvotes
pub async fn upvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<RecommendationId>,
) -> AppResult<Json<ScoreResponse>> {
    let score = state.recommendations.upvote_recommendation(id).await?;
    tracing::info!(request_id = %request_id, recommendation_id = id, score, "Upvoted");
    Ok(Json(ScoreResponse { score }))
}

/// Handler for downvotes
pub async fn downvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<RecommendationId>,
) -> AppResult<Json<DownvoteResponse>> {
    let outcome = state.recommendations.downvote_recommendation(id).await?;
    tracing::info!(request_id = %request_id, recommendation_id = id, ?outcome, "Downvoted");
    Ok(Json(outcome.into()))
}

/// Handler for a random recommendation across all genres
pub async fn random(State(state): State<AppState>) -> AppResult<Json<RecommendationWithGenres>> {
    let recommendation = state
        .recommendations
        .random_recommendation()
        .await?
        .ok_or_else(|| AppError::NotFound("No recommendations found".to_string()))?;

    Ok(Json(state.recommendations.with_genres(recommendation).await?))
}

/// Handler for the best-scored recommendations
pub async fn top(
    State(state): State<AppState>,
    Path(amount): Path<i64>,
) -> AppResult<Json<Vec<TopRecommendation>>> {
    let rows = state.recommendations.top_recommendations(amount).await?;
    Ok(Json(RecommendationService::top_recommendations_formatted(rows)))
}

/// Handler for a random recommendation within one genre
pub async fn random_by_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<GenreId>,
) -> AppResult<Json<RecommendationWithGenres>> {
    if genre_id <= 0 {
        return Err(AppError::Validation("Invalid genre id".to_string()));
    }
    if state.genres.get_by_id(genre_id).await?.is_none() {
        return Err(AppError::NotFound("Genre not found".to_string()));
    }

    let recommendation = state
        .recommendations
        .get_random_recommendation_by_genre_id(genre_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No recommendations found for this genre".to_string()))?;

    Ok(Json(state.recommendations.with_genres(recommendation).await?))
}
