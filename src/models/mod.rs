mod genre;
mod recommendation;

pub use genre::{Genre, GenreId, GenreWithRecommendations};
pub use recommendation::{
    DownvoteOutcome, NewRecommendation, Recommendation, RecommendationId,
    RecommendationWithGenres, TopRecommendation, TopRecommendationRow,
};
