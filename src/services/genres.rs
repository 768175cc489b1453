use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{Genre, GenreId, GenreWithRecommendations},
};

/// Genre creation and lookup
#[derive(Clone)]
pub struct GenreService {
    store: Arc<dyn Store>,
}

impl GenreService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a genre with a unique, non-blank name
    ///
    /// The name is checked up front, and the store's own uniqueness guarantee
    /// covers a concurrent insert of the same name.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, name: &str) -> AppResult<Genre> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        if self.store.find_genre_by_name(name).await?.is_some() {
            tracing::debug!(name, "Genre name already taken");
            return Err(AppError::Conflict("Genre already exists".to_string()));
        }

        let genre = self.store.insert_genre(name).await?;
        tracing::info!(genre_id = genre.id, name = %genre.name, "Genre created");
        Ok(genre)
    }

    pub async fn get_all(&self) -> AppResult<Vec<Genre>> {
        self.store.list_genres().await
    }

    /// Looks up a genre; absence is `Ok(None)`, not an error
    pub async fn get_by_id(&self, id: GenreId) -> AppResult<Option<Genre>> {
        self.store.find_genre_by_id(id).await
    }

    /// The genre with every recommendation filed under it
    pub async fn get_with_recommendations(
        &self,
        id: GenreId,
    ) -> AppResult<Option<GenreWithRecommendations>> {
        let Some(genre) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let recommendations = self.store.recommendations_by_genre(genre.id).await?;
        Ok(Some(GenreWithRecommendations::new(genre, recommendations)))
    }

    /// Genres among `ids` that exist
    pub(crate) async fn find_existing(&self, ids: &[GenreId]) -> AppResult<Vec<Genre>> {
        self.store.find_genres_by_ids(ids).await
    }
}
