use std::collections::BTreeMap;

use rand::seq::IteratorRandom;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{
        DownvoteOutcome, Genre, GenreId, NewRecommendation, Recommendation, RecommendationId,
        TopRecommendationRow,
    },
};

use super::Store;

/// Process-local store; every operation runs under a single lock
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    genres: BTreeMap<GenreId, Genre>,
    recommendations: BTreeMap<RecommendationId, Recommendation>,
    /// (recommendation_id, genre_id) pairs
    links: Vec<(RecommendationId, GenreId)>,
    next_genre_id: GenreId,
    next_recommendation_id: RecommendationId,
}

impl Tables {
    fn genre_ids_of(&self, recommendation_id: RecommendationId) -> Vec<GenreId> {
        let mut ids: Vec<GenreId> = self
            .links
            .iter()
            .filter(|(rec, _)| *rec == recommendation_id)
            .map(|(_, genre)| *genre)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn in_genre(&self, recommendation_id: RecommendationId, genre_id: GenreId) -> bool {
        self.links.contains(&(recommendation_id, genre_id))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn insert_genre(&self, name: &str) -> AppResult<Genre> {
        let mut tables = self.inner.write().await;
        if tables.genres.values().any(|g| g.name == name) {
            return Err(AppError::Conflict("Genre already exists".to_string()));
        }

        tables.next_genre_id += 1;
        let genre = Genre {
            id: tables.next_genre_id,
            name: name.to_string(),
        };
        tables.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn find_genre_by_id(&self, id: GenreId) -> AppResult<Option<Genre>> {
        let tables = self.inner.read().await;
        Ok(tables.genres.get(&id).cloned())
    }

    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        let tables = self.inner.read().await;
        Ok(tables.genres.values().find(|g| g.name == name).cloned())
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let tables = self.inner.read().await;
        Ok(tables.genres.values().cloned().collect())
    }

    async fn find_genres_by_ids(&self, ids: &[GenreId]) -> AppResult<Vec<Genre>> {
        let tables = self.inner.read().await;
        Ok(tables
            .genres
            .values()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn insert_recommendation(&self, new: &NewRecommendation) -> AppResult<Recommendation> {
        let mut tables = self.inner.write().await;
        let duplicate = tables
            .recommendations
            .values()
            .any(|r| r.name == new.name || r.youtube_link == new.youtube_link);
        if duplicate {
            return Err(AppError::Conflict(
                "Recommendation already exists".to_string(),
            ));
        }

        tables.next_recommendation_id += 1;
        let recommendation = Recommendation {
            id: tables.next_recommendation_id,
            name: new.name.clone(),
            youtube_link: new.youtube_link.clone(),
            score: 0,
        };
        tables
            .recommendations
            .insert(recommendation.id, recommendation.clone());
        for genre_id in &new.genre_ids {
            let link = (recommendation.id, *genre_id);
            if !tables.links.contains(&link) {
                tables.links.push(link);
            }
        }
        Ok(recommendation)
    }

    async fn find_recommendation_by_id(
        &self,
        id: RecommendationId,
    ) -> AppResult<Option<Recommendation>> {
        let tables = self.inner.read().await;
        Ok(tables.recommendations.get(&id).cloned())
    }

    async fn find_recommendation_by_link_or_name(
        &self,
        link: &str,
        name: &str,
    ) -> AppResult<Option<Recommendation>> {
        let tables = self.inner.read().await;
        Ok(tables
            .recommendations
            .values()
            .find(|r| r.youtube_link == link || r.name == name)
            .cloned())
    }

    async fn increment_score(&self, id: RecommendationId, delta: i32) -> AppResult<Option<i32>> {
        let mut tables = self.inner.write().await;
        let Some(recommendation) = tables.recommendations.get_mut(&id) else {
            return Ok(None);
        };

        recommendation.score = recommendation
            .score
            .checked_add(delta)
            .ok_or_else(|| AppError::Internal("Score out of range".to_string()))?;
        Ok(Some(recommendation.score))
    }

    async fn downvote(
        &self,
        id: RecommendationId,
        floor: i32,
    ) -> AppResult<Option<DownvoteOutcome>> {
        let mut tables = self.inner.write().await;
        let Some(recommendation) = tables.recommendations.get_mut(&id) else {
            return Ok(None);
        };

        let score = recommendation
            .score
            .checked_sub(1)
            .ok_or_else(|| AppError::Internal("Score out of range".to_string()))?;
        if score <= floor {
            tables.recommendations.remove(&id);
            tables.links.retain(|(rec, _)| *rec != id);
            return Ok(Some(DownvoteOutcome::Deleted));
        }

        recommendation.score = score;
        Ok(Some(DownvoteOutcome::Scored(score)))
    }

    async fn random_recommendation(
        &self,
        genre_id: Option<GenreId>,
    ) -> AppResult<Option<Recommendation>> {
        let tables = self.inner.read().await;
        let picked = tables
            .recommendations
            .values()
            .filter(|r| genre_id.map_or(true, |g| tables.in_genre(r.id, g)))
            .choose(&mut rand::thread_rng())
            .cloned();
        Ok(picked)
    }

    async fn recommendations_by_genre(&self, genre_id: GenreId) -> AppResult<Vec<Recommendation>> {
        let tables = self.inner.read().await;
        Ok(tables
            .recommendations
            .values()
            .filter(|r| tables.in_genre(r.id, genre_id))
            .cloned()
            .collect())
    }

    async fn top_recommendation_rows(&self, amount: i64) -> AppResult<Vec<TopRecommendationRow>> {
        let tables = self.inner.read().await;
        let mut ranked: Vec<&Recommendation> = tables.recommendations.values().collect();
        // BTreeMap iteration is by id, and the sort is stable, so ties keep insertion order
        ranked.sort_by(|a, b| b.score.cmp(&a.score));

        let limit = usize::try_from(amount).unwrap_or(0);
        let mut rows = Vec::new();
        for recommendation in ranked.into_iter().take(limit) {
            let genres: Vec<&Genre> = tables
                .genre_ids_of(recommendation.id)
                .into_iter()
                .filter_map(|id| tables.genres.get(&id))
                .collect();

            let row = |genre: Option<&Genre>| TopRecommendationRow {
                id: recommendation.id,
                name: recommendation.name.clone(),
                youtube_link: recommendation.youtube_link.clone(),
                score: recommendation.score,
                genre_id: genre.map(|g| g.id),
                genre_name: genre.map(|g| g.name.clone()),
            };

            if genres.is_empty() {
                rows.push(row(None));
            } else {
                rows.extend(genres.into_iter().map(|g| row(Some(g))));
            }
        }
        Ok(rows)
    }

    async fn genres_for_recommendation(&self, id: RecommendationId) -> AppResult<Vec<Genre>> {
        let tables = self.inner.read().await;
        Ok(tables
            .genre_ids_of(id)
            .into_iter()
            .filter_map(|genre_id| tables.genres.get(&genre_id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_recommendation(name: &str, link: &str, genre_ids: Vec<GenreId>) -> NewRecommendation {
        NewRecommendation {
            name: name.to_string(),
            youtube_link: link.to_string(),
            genre_ids,
        }
    }

    #[tokio::test]
    async fn test_ids_are_assigned_in_insertion_order() {
        let store = MemoryStore::new();
        let rock = store.insert_genre("Rock").await.unwrap();
        let jazz = store.insert_genre("Jazz").await.unwrap();
        assert_eq!(rock.id, 1);
        assert_eq!(jazz.id, 2);

        let names: Vec<String> = store
            .list_genres()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Rock", "Jazz"]);
    }

    #[tokio::test]
    async fn test_duplicate_genre_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_genre("Rock").await.unwrap();
        let err = store.insert_genre("Rock").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_downvote_at_floor_removes_links() {
        let store = MemoryStore::new();
        let genre = store.insert_genre("Rock").await.unwrap();
        let rec = store
            .insert_recommendation(&new_recommendation("a", "https://youtu.be/a", vec![genre.id]))
            .await
            .unwrap();

        let outcome = store.downvote(rec.id, 0).await.unwrap();
        assert_eq!(outcome, Some(DownvoteOutcome::Deleted));
        assert!(store.genres_for_recommendation(rec.id).await.unwrap().is_empty());
        assert!(store.recommendations_by_genre(genre.id).await.unwrap().is_empty());
        assert_eq!(store.downvote(rec.id, 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_random_respects_genre_filter() {
        let store = MemoryStore::new();
        let rock = store.insert_genre("Rock").await.unwrap();
        let jazz = store.insert_genre("Jazz").await.unwrap();
        let empty = store.insert_genre("Polka").await.unwrap();
        store
            .insert_recommendation(&new_recommendation("a", "https://youtu.be/a", vec![rock.id]))
            .await
            .unwrap();
        let b = store
            .insert_recommendation(&new_recommendation("b", "https://youtu.be/b", vec![jazz.id]))
            .await
            .unwrap();

        for _ in 0..20 {
            let picked = store.random_recommendation(Some(jazz.id)).await.unwrap();
            assert_eq!(picked.map(|r| r.id), Some(b.id));
        }
        assert!(store
            .random_recommendation(Some(empty.id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_top_rows_emit_one_row_per_genre() {
        let store = MemoryStore::new();
        let rock = store.insert_genre("Rock").await.unwrap();
        let jazz = store.insert_genre("Jazz").await.unwrap();
        let rec = store
            .insert_recommendation(&new_recommendation(
                "a",
                "https://youtu.be/a",
                vec![jazz.id, rock.id],
            ))
            .await
            .unwrap();

        let rows = store.top_recommendation_rows(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.id == rec.id));
        assert_eq!(rows[0].genre_id, Some(rock.id));
        assert_eq!(rows[1].genre_name.as_deref(), Some("Jazz"));
    }

    #[tokio::test]
    async fn test_score_overflow_is_an_error() {
        let store = MemoryStore::new();
        let genre = store.insert_genre("Rock").await.unwrap();
        let rec = store
            .insert_recommendation(&new_recommendation("a", "https://youtu.be/a", vec![genre.id]))
            .await
            .unwrap();

        assert_eq!(
            store.increment_score(rec.id, i32::MAX).await.unwrap(),
            Some(i32::MAX)
        );
        let err = store.increment_score(rec.id, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let stored = store.find_recommendation_by_id(rec.id).await.unwrap().unwrap();
        assert_eq!(stored.score, i32::MAX);
    }

    #[tokio::test]
    async fn test_top_rows_with_non_positive_amount_are_empty() {
        let store = MemoryStore::new();
        let rock = store.insert_genre("Rock").await.unwrap();
        store
            .insert_recommendation(&new_recommendation("a", "https://youtu.be/a", vec![rock.id]))
            .await
            .unwrap();
        assert!(store.top_recommendation_rows(0).await.unwrap().is_empty());
        assert!(store.top_recommendation_rows(-3).await.unwrap().is_empty());
    }
}
