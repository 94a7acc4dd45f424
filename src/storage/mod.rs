//! Persistence collaborator for the catalog, interactions and the
//! similarity graph.

use crate::error::Result;
use crate::models::{
    Book, CatalogAnalytics, InteractionRecord, NewBook, RelatedBook, SearchLogEntry,
    SimilarityEdge,
};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryCatalogStore;
pub use postgres::PgCatalogStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending id, the order scoring and popularity ties fall back to
    #[default]
    Id,
    NewestFirst,
}

/// Typed catalog filter. `genre` and `author` match case-insensitive
/// substrings, `year` matches exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub genre: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub sort: SortOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl BookFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Drops pagination, keeping only the predicates (used for counts).
    pub fn predicates_only(&self) -> Self {
        Self {
            genre: self.genre.clone(),
            author: self.author.clone(),
            year: self.year,
            ..Self::default()
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        fn contains_ci(field: Option<&str>, needle: &str) -> bool {
            field.is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
        }

        if let Some(genre) = &self.genre {
            if !contains_ci(book.genre.as_deref(), genre) {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if !contains_ci(Some(&book.author), author) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if book.publication_year != Some(year) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_entries(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    async fn count_entries(&self, filter: &BookFilter) -> Result<i64>;

    async fn get_entry(&self, id: i32) -> Result<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    async fn insert_entry(&self, book: NewBook) -> Result<Book>;

    /// All interactions, or only those against `book_id`, in insertion order.
    async fn list_interactions(&self, book_id: Option<i32>) -> Result<Vec<InteractionRecord>>;

    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()>;

    /// Returns `false` when an edge for the unordered pair already exists.
    async fn insert_edge(&self, edge: &SimilarityEdge) -> Result<bool>;

    /// Looks the pair up in either orientation.
    async fn find_edge(&self, a: i32, b: i32) -> Result<Option<SimilarityEdge>>;

    /// Neighbours of `id` in the similarity graph, strongest first.
    async fn related_entries(&self, id: i32, limit: i64) -> Result<Vec<RelatedBook>>;

    async fn record_search(&self, entry: &SearchLogEntry) -> Result<()>;

    async fn analytics(&self) -> Result<CatalogAnalytics>;
}
