use serde::{Deserialize, Serialize};

use super::Recommendation;

pub type GenreId = i64;

/// A named category recommendations can belong to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// A genre together with every recommendation filed under it
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenreWithRecommendations {
    pub id: GenreId,
    pub name: String,
    pub recommendations: Vec<Recommendation>,
}

impl GenreWithRecommendations {
    pub fn new(genre: Genre, recommendations: Vec<Recommendation>) -> Self {
        Self {
            id: genre.id,
            name: genre.name,
            recommendations,
        }
    }
}
