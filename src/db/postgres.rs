use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{
        DownvoteOutcome, Genre, GenreId, NewRecommendation, Recommendation, RecommendationId,
        TopRecommendationRow,
    },
};

use super::Store;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Translates a unique-constraint violation into a conflict, keeping every other error as is
fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn insert_genre(&self, name: &str) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Genre already exists"))
    }

    async fn find_genre_by_id(&self, id: GenreId) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn find_genres_by_ids(&self, ids: &[GenreId]) -> AppResult<Vec<Genre>> {
        let genres =
            sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(genres)
    }

    async fn insert_recommendation(&self, new: &NewRecommendation) -> AppResult<Recommendation> {
        let mut tx = self.pool.begin().await?;

        let recommendation = sqlx::query_as::<_, Recommendation>(
            "INSERT INTO recommendations (name, youtube_link)
             VALUES ($1, $2)
             RETURNING id, name, youtube_link, score",
        )
        .bind(&new.name)
        .bind(&new.youtube_link)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Recommendation already exists"))?;

        for genre_id in &new.genre_ids {
            sqlx::query(
                "INSERT INTO recommendation_genres (recommendation_id, genre_id)
                 VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(recommendation.id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(recommendation)
    }

    async fn find_recommendation_by_id(
        &self,
        id: RecommendationId,
    ) -> AppResult<Option<Recommendation>> {
        let recommendation = sqlx::query_as::<_, Recommendation>(
            "SELECT id, name, youtube_link, score FROM recommendations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recommendation)
    }

    async fn find_recommendation_by_link_or_name(
        &self,
        link: &str,
        name: &str,
    ) -> AppResult<Option<Recommendation>> {
        let recommendation = sqlx::query_as::<_, Recommendation>(
            "SELECT id, name, youtube_link, score
             FROM recommendations
             WHERE youtube_link = $1 OR name = $2
             ORDER BY id
             LIMIT 1",
        )
        .bind(link)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recommendation)
    }

    async fn increment_score(&self, id: RecommendationId, delta: i32) -> AppResult<Option<i32>> {
        let score: Option<i32> = sqlx::query_scalar(
            "UPDATE recommendations SET score = score + $2 WHERE id = $1 RETURNING score",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }

    async fn downvote(
        &self,
        id: RecommendationId,
        floor: i32,
    ) -> AppResult<Option<DownvoteOutcome>> {
        let mut tx = self.pool.begin().await?;

        // The UPDATE takes the row lock; a concurrent downvote waits here and
        // then sees either the new score or no row at all.
        let score: Option<i32> = sqlx::query_scalar(
            "UPDATE recommendations SET score = score - 1 WHERE id = $1 RETURNING score",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match score {
            None => None,
            Some(score) if score <= floor => {
                sqlx::query("DELETE FROM recommendations WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                Some(DownvoteOutcome::Deleted)
            }
            Some(score) => Some(DownvoteOutcome::Scored(score)),
        };

        tx.commit().await?;

        Ok(outcome)
    }

    async fn random_recommendation(
        &self,
        genre_id: Option<GenreId>,
    ) -> AppResult<Option<Recommendation>> {
        let recommendation = match genre_id {
            Some(genre_id) => {
                sqlx::query_as::<_, Recommendation>(
                    "SELECT r.id, r.name, r.youtube_link, r.score
                     FROM recommendations r
                     INNER JOIN recommendation_genres rg ON rg.recommendation_id = r.id
                     WHERE rg.genre_id = $1
                     ORDER BY random()
                     LIMIT 1",
                )
                .bind(genre_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Recommendation>(
                    "SELECT id, name, youtube_link, score
                     FROM recommendations
                     ORDER BY random()
                     LIMIT 1",
                )
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(recommendation)
    }

    async fn recommendations_by_genre(&self, genre_id: GenreId) -> AppResult<Vec<Recommendation>> {
        let recommendations = sqlx::query_as::<_, Recommendation>(
            "SELECT r.id, r.name, r.youtube_link, r.score
             FROM recommendations r
             INNER JOIN recommendation_genres rg ON rg.recommendation_id = r.id
             WHERE rg.genre_id = $1
             ORDER BY r.id",
        )
        .bind(genre_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(recommendations)
    }

    async fn top_recommendation_rows(&self, amount: i64) -> AppResult<Vec<TopRecommendationRow>> {
        let rows = sqlx::query_as::<_, TopRecommendationRow>(
            "SELECT r.id, r.name, r.youtube_link, r.score,
                    g.id AS genre_id, g.name AS genre_name
             FROM (
                 SELECT id, name, youtube_link, score
                 FROM recommendations
                 ORDER BY score DESC, id ASC
                 LIMIT $1
             ) r
             LEFT JOIN recommendation_genres rg ON rg.recommendation_id = r.id
             LEFT JOIN genres g ON g.id = rg.genre_id
             ORDER BY r.score DESC, r.id ASC, g.id ASC",
        )
        .bind(amount)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn genres_for_recommendation(&self, id: RecommendationId) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT g.id, g.name
             FROM genres g
             INNER JOIN recommendation_genres rg ON rg.genre_id = g.id
             WHERE rg.recommendation_id = $1
             ORDER BY g.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }
}
