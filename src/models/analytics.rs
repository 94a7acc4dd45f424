use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct GenreCount {
    pub genre: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct AuthorCount {
    pub author: String,
    pub book_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct SearchTrend {
    pub date: NaiveDate,
    pub search_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct InteractionCount {
    pub interaction_type: String,
    pub count: i64,
}

/// Aggregates for the analytics dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CatalogAnalytics {
    pub genres: Vec<GenreCount>,
    /// Top ten authors by catalog size
    pub authors: Vec<AuthorCount>,
    /// Searches per day over the last thirty days
    #[serde(rename = "searchTrends")]
    pub search_trends: Vec<SearchTrend>,
    pub interactions: Vec<InteractionCount>,
}
