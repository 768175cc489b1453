use serde::{Deserialize, Serialize};

use super::{Genre, GenreId};

pub type RecommendationId = i64;

/// A submitted song or video with its current score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: RecommendationId,
    pub name: String,
    pub youtube_link: String,
    pub score: i32,
}

/// Validated input for a recommendation insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecommendation {
    pub name: String,
    pub youtube_link: String,
    /// Distinct, already-validated genre ids
    pub genre_ids: Vec<GenreId>,
}

/// Recommendation enriched with its genres
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationWithGenres {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub genres: Vec<Genre>,
}

/// One joined row of a top-N query: a ranked recommendation and one of its genres
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TopRecommendationRow {
    pub id: RecommendationId,
    pub name: String,
    pub youtube_link: String,
    pub score: i32,
    pub genre_id: Option<GenreId>,
    pub genre_name: Option<String>,
}

/// Item of the top recommendations response
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopRecommendation {
    pub id: RecommendationId,
    pub name: String,
    pub youtube_link: String,
    pub score: i32,
    pub genres: Vec<Genre>,
}

/// What a downvote did to an existing recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownvoteOutcome {
    /// Score was decremented and stored
    Scored(i32),
    /// Score reached the floor and the recommendation was removed
    Deleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_uses_camel_case_link() {
        let recommendation = Recommendation {
            id: 1,
            name: "Falamansa - Xote dos Milagres".to_string(),
            youtube_link: "https://www.youtube.com/watch?v=chwyjJbcs1Y".to_string(),
            score: 3,
        };
        let json = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(json["youtubeLink"], "https://www.youtube.com/watch?v=chwyjJbcs1Y");
        assert!(json.get("youtube_link").is_none());
    }

    #[test]
    fn test_enriched_recommendation_is_flattened() {
        let enriched = RecommendationWithGenres {
            recommendation: Recommendation {
                id: 2,
                name: "Song".to_string(),
                youtube_link: "https://youtu.be/abc".to_string(),
                score: 0,
            },
            genres: vec![Genre {
                id: 1,
                name: "Rock".to_string(),
            }],
        };
        let json = serde_json::to_value(&enriched).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["score"], 0);
        assert_eq!(json["genres"][0]["name"], "Rock");
    }
}
