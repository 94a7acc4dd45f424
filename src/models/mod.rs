use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use analytics::{AuthorCount, CatalogAnalytics, GenreCount, InteractionCount, SearchTrend};
pub use book::{Book, BookDetail, CatalogFeed, FeedBook, NewBook, RelatedBook};
pub use interaction::{InteractionKind, InteractionRecord, RateRequest};
pub use recommendation::{
    Recommendation, RecommendationMode, RecommendationRequest, RecommendationResponse,
};
pub use relation::{ordered_pair, SimilarityEdge, SIMILAR_TO};
pub use search::{
    EntityBag, SearchHit, SearchIntent, SearchLogEntry, SearchResponse, SemanticQuery,
    SemanticTextRequest,
};

mod analytics;
mod book;
mod interaction;
mod recommendation;
mod relation;
mod search;

/// Pagination block of the book listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub page: i64,
    #[schema(example = 10)]
    pub limit: i64,
    #[schema(example = 42)]
    pub total: i64,
    #[schema(example = 5)]
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<Book>,
    pub pagination: Pagination,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Status of the service
    #[schema(example = "ok")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "Invalid input: Query is required")]
    pub error: String,
}
