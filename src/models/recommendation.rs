use super::Book;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Retrieval strategy requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationMode {
    Content,
    Collaborative,
    #[default]
    Hybrid,
    Popular,
}

impl RecommendationMode {
    /// Parses the `type` query parameter. Unrecognised values select the
    /// popularity ranking.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "content" => RecommendationMode::Content,
            "collaborative" => RecommendationMode::Collaborative,
            "hybrid" => RecommendationMode::Hybrid,
            _ => RecommendationMode::Popular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationMode::Content => "content",
            RecommendationMode::Collaborative => "collaborative",
            RecommendationMode::Hybrid => "hybrid",
            RecommendationMode::Popular => "popular",
        }
    }
}

impl fmt::Display for RecommendationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationRequest {
    pub mode: RecommendationMode,
    pub user_id: Option<String>,
    pub book_id: Option<i32>,
    pub limit: Option<usize>,
}

/// A ranked entry with its score and a human-readable justification.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Recommendation {
    #[serde(flatten)]
    pub book: Book,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 0.9)]
    pub similarity_score: Option<f32>,
    /// Interaction aggregate, set for popularity-ranked results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
    #[schema(example = "Same author: Budi Santoso, Same genre: Technology")]
    pub recommendation_reason: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecommendationResponse {
    #[serde(rename = "type")]
    pub mode: RecommendationMode,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(RecommendationMode::parse("content"), RecommendationMode::Content);
        assert_eq!(
            RecommendationMode::parse("Collaborative"),
            RecommendationMode::Collaborative
        );
        assert_eq!(RecommendationMode::parse("hybrid"), RecommendationMode::Hybrid);
        assert_eq!(RecommendationMode::parse("trending"), RecommendationMode::Popular);
        assert_eq!(RecommendationMode::default(), RecommendationMode::Hybrid);
    }
}
