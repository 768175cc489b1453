use crate::{
    error::AppResult,
    models::{
        DownvoteOutcome, Genre, GenreId, NewRecommendation, Recommendation, RecommendationId,
        TopRecommendationRow,
    },
};

/// Persistence capability the genre and recommendation services depend on
///
/// Implementations own uniqueness (a duplicate genre name or recommendation
/// name/link must fail with `AppError::Conflict`) and the atomicity of the
/// score mutations. Services never read-modify-write a score themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Insert a genre and return it with its assigned id
    async fn insert_genre(&self, name: &str) -> AppResult<Genre>;

    async fn find_genre_by_id(&self, id: GenreId) -> AppResult<Option<Genre>>;

    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>>;

    /// All genres in insertion order
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;

    /// Genres among `ids` that exist; unknown ids are silently skipped
    async fn find_genres_by_ids(&self, ids: &[GenreId]) -> AppResult<Vec<Genre>>;

    /// Insert a recommendation with score 0 and link it to each of its genres
    ///
    /// The row and its association rows are written together or not at all.
    async fn insert_recommendation(&self, new: &NewRecommendation) -> AppResult<Recommendation>;

    async fn find_recommendation_by_id(
        &self,
        id: RecommendationId,
    ) -> AppResult<Option<Recommendation>>;

    /// First recommendation whose link equals `link` or whose name equals `name`
    async fn find_recommendation_by_link_or_name(
        &self,
        link: &str,
        name: &str,
    ) -> AppResult<Option<Recommendation>>;

    /// Add `delta` to a score in place; `None` when the id is unknown
    async fn increment_score(&self, id: RecommendationId, delta: i32) -> AppResult<Option<i32>>;

    /// Decrement a score by one, deleting the row instead when the new score
    /// is `<= floor`. `None` when the id is unknown.
    ///
    /// Decrement, comparison and delete form one atomic step.
    async fn downvote(
        &self,
        id: RecommendationId,
        floor: i32,
    ) -> AppResult<Option<DownvoteOutcome>>;

    /// Uniformly random recommendation, optionally restricted to one genre
    async fn random_recommendation(
        &self,
        genre_id: Option<GenreId>,
    ) -> AppResult<Option<Recommendation>>;

    /// Recommendations associated with a genre, oldest first
    async fn recommendations_by_genre(&self, genre_id: GenreId) -> AppResult<Vec<Recommendation>>;

    /// The `amount` highest-scoring recommendations joined with their genres
    ///
    /// Rows are ordered by score descending, then id ascending, then genre id.
    /// A recommendation with no genres yields a single row with `None` genre columns.
    async fn top_recommendation_rows(&self, amount: i64) -> AppResult<Vec<TopRecommendationRow>>;

    /// Genres linked to a recommendation, ordered by genre id
    async fn genres_for_recommendation(&self, id: RecommendationId) -> AppResult<Vec<Genre>>;
}
