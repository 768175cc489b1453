pub mod genres;
pub mod recommendations;

pub use genres::GenreService;
pub use recommendations::{RecommendationService, DOWNVOTE_DELETE_THRESHOLD};
