use super::Book;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Vocabulary matches and keywords extracted from free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntityBag {
    #[schema(example = json!(["database"]))]
    pub topics: Vec<String>,
    #[schema(example = json!(["guide"]))]
    pub concepts: Vec<String>,
    #[schema(example = json!(["Database", "untuk", "Industri"]))]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    Learning,
    Reference,
    AuthorSearch,
    RecentBooks,
    GeneralSearch,
}

/// Derived view of a search string. Only persisted as an audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SemanticQuery {
    pub original: String,
    pub expanded: Vec<String>,
    pub entities: EntityBag,
    pub intent: SearchIntent,
}

/// A search result tagged with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SearchHit {
    #[serde(flatten)]
    pub book: Book,
    #[schema(example = 0.5)]
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub semantic_query: SemanticQuery,
    pub results: Vec<SearchHit>,
}

/// Audit-log row for `search_queries`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchLogEntry {
    pub query: String,
    pub semantic_query: SemanticQuery,
    pub results_count: i32,
    pub user_id: String,
}

/// Body of the `/api/semantic/*` endpoints.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SemanticTextRequest {
    #[schema(example = "A practical database tutorial")]
    pub text: String,
}
