use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        DownvoteOutcome, Genre, GenreId, NewRecommendation, Recommendation, RecommendationId,
        RecommendationWithGenres, TopRecommendation, TopRecommendationRow,
    },
};

use super::GenreService;

/// A downvote that takes the score to this value or below deletes the recommendation
pub const DOWNVOTE_DELETE_THRESHOLD: i32 = -5;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Recommendation lifecycle: creation, voting and selection
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn Store>,
    genres: GenreService,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn Store>, genres: GenreService) -> Self {
        Self { store, genres }
    }

    /// Checks a creation request without touching any recommendation
    ///
    /// Returns `Ok(false)` when the name or link is missing or blank, when no
    /// genre ids are given, or when any genre id is unknown. Only store
    /// failures are reported as errors.
    pub async fn valid_recommendation(
        &self,
        name: Option<&str>,
        link: Option<&str>,
        genre_ids: Option<&[GenreId]>,
    ) -> AppResult<bool> {
        Ok(self.validated_fields(name, link, genre_ids).await?.is_some())
    }

    /// Trimmed name and link plus the distinct genre ids, or `None` when the request is invalid
    async fn validated_fields<'a>(
        &self,
        name: Option<&'a str>,
        link: Option<&'a str>,
        genre_ids: Option<&[GenreId]>,
    ) -> AppResult<Option<(&'a str, &'a str, Vec<GenreId>)>> {
        let (Some(name), Some(link)) = (non_blank(name), non_blank(link)) else {
            return Ok(None);
        };
        let Some(genre_ids) = genre_ids.filter(|ids| !ids.is_empty()) else {
            return Ok(None);
        };

        let distinct: BTreeSet<GenreId> = genre_ids.iter().copied().collect();
        let ids: Vec<GenreId> = distinct.into_iter().collect();
        let existing = self.genres.find_existing(&ids).await?;

        Ok((existing.len() == ids.len()).then_some((name, link, ids)))
    }

    /// Existing recommendation sharing the link or the name, if any
    pub async fn find_by_link_or_name(
        &self,
        link: &str,
        name: &str,
    ) -> AppResult<Option<Recommendation>> {
        self.store.find_recommendation_by_link_or_name(link, name).await
    }

    /// Persists a recommendation with score 0 and one association per distinct genre
    ///
    /// Inputs are expected to have passed `valid_recommendation` and the duplicate check.
    pub async fn save_recommendation(
        &self,
        name: &str,
        link: &str,
        genre_ids: &[GenreId],
    ) -> AppResult<Recommendation> {
        let genre_ids: BTreeSet<GenreId> = genre_ids.iter().copied().collect();
        let new = NewRecommendation {
            name: name.to_string(),
            youtube_link: link.to_string(),
            genre_ids: genre_ids.into_iter().collect(),
        };

        let recommendation = self.store.insert_recommendation(&new).await?;
        tracing::info!(
            recommendation_id = recommendation.id,
            genre_count = new.genre_ids.len(),
            "Recommendation saved"
        );
        Ok(recommendation)
    }

    /// Validates, deduplicates and saves a new recommendation
    #[tracing::instrument(skip(self, genre_ids))]
    pub async fn new_recommendation(
        &self,
        name: Option<&str>,
        link: Option<&str>,
        genre_ids: Option<&[GenreId]>,
    ) -> AppResult<RecommendationWithGenres> {
        let Some((name, link, genre_ids)) = self.validated_fields(name, link, genre_ids).await?
        else {
            return Err(AppError::Validation(
                "Invalid name, youtube link or genre id".to_string(),
            ));
        };

        if let Some(existing) = self.find_by_link_or_name(link, name).await? {
            tracing::debug!(existing_id = existing.id, "Duplicate recommendation rejected");
            return Err(AppError::Conflict(
                "Recommendation with this name or youtube link already exists".to_string(),
            ));
        }

        let recommendation = self.save_recommendation(name, link, &genre_ids).await?;
        self.with_genres(recommendation).await
    }

    pub async fn find_by_id(&self, id: RecommendationId) -> AppResult<Option<Recommendation>> {
        self.store.find_recommendation_by_id(id).await
    }

    /// Adds one point and returns the new score
    pub async fn upvote_recommendation(&self, id: RecommendationId) -> AppResult<i32> {
        let score = self
            .store
            .increment_score(id, 1)
            .await?
            .ok_or_else(|| AppError::NotFound("No recommendation found".to_string()))?;

        tracing::debug!(recommendation_id = id, score, "Recommendation upvoted");
        Ok(score)
    }

    /// Removes one point, deleting the recommendation once the score reaches
    /// `DOWNVOTE_DELETE_THRESHOLD`
    pub async fn downvote_recommendation(&self, id: RecommendationId) -> AppResult<DownvoteOutcome> {
        let outcome = self
            .store
            .downvote(id, DOWNVOTE_DELETE_THRESHOLD)
            .await?
            .ok_or_else(|| AppError::NotFound("No recommendation found".to_string()))?;

        match outcome {
            DownvoteOutcome::Scored(score) => {
                tracing::debug!(recommendation_id = id, score, "Recommendation downvoted");
            }
            DownvoteOutcome::Deleted => {
                tracing::info!(recommendation_id = id, "Recommendation deleted after downvote");
            }
        }
        Ok(outcome)
    }

    /// A recommendation picked uniformly among all of them
    pub async fn random_recommendation(&self) -> AppResult<Option<Recommendation>> {
        self.store.random_recommendation(None).await
    }

    /// Genres a recommendation was filed under
    pub async fn get_genres_by_id(&self, id: RecommendationId) -> AppResult<Vec<Genre>> {
        self.store.genres_for_recommendation(id).await
    }

    /// A recommendation picked uniformly among those in one genre
    pub async fn get_random_recommendation_by_genre_id(
        &self,
        genre_id: GenreId,
    ) -> AppResult<Option<Recommendation>> {
        self.store.random_recommendation(Some(genre_id)).await
    }

    /// The `amount` best-scored recommendations as joined rows
    pub async fn top_recommendations(&self, amount: i64) -> AppResult<Vec<TopRecommendationRow>> {
        if amount <= 0 {
            return Err(AppError::Validation(
                "Amount must be a positive integer".to_string(),
            ));
        }
        self.store.top_recommendation_rows(amount).await
    }

    /// Groups joined top rows into one item per recommendation, keeping rank order
    pub fn top_recommendations_formatted(rows: Vec<TopRecommendationRow>) -> Vec<TopRecommendation> {
        let mut formatted: Vec<TopRecommendation> = Vec::new();

        for row in rows {
            let genre = match (row.genre_id, row.genre_name) {
                (Some(id), Some(name)) => Some(Genre { id, name }),
                _ => None,
            };

            match formatted.last_mut() {
                Some(last) if last.id == row.id => last.genres.extend(genre),
                _ => formatted.push(TopRecommendation {
                    id: row.id,
                    name: row.name,
                    youtube_link: row.youtube_link,
                    score: row.score,
                    genres: genre.into_iter().collect(),
                }),
            }
        }

        formatted
    }

    /// Attaches the genres of a recommendation for a response
    pub async fn with_genres(
        &self,
        recommendation: Recommendation,
    ) -> AppResult<RecommendationWithGenres> {
        let genres = self.get_genres_by_id(recommendation.id).await?;
        Ok(RecommendationWithGenres {
            recommendation,
            genres,
        })
    }
}
