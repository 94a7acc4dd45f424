use crate::error::{ApiError, Result};
use crate::models::{SearchLogEntry, SearchResponse};
use crate::services::{entities::EntityExtractor, relevance::RelevanceRanker};
use crate::storage::{BookFilter, CatalogStore};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Relevance-ranked catalog search with an optional audit trail.
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn CatalogStore>,
    extractor: EntityExtractor,
    ranker: RelevanceRanker,
}

impl SearchService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            extractor: EntityExtractor::new(),
            ranker: RelevanceRanker::new(),
        }
    }

    /// Rank the catalog against `query`, keeping only entries that match at
    /// all. When `user_id` is given the search is written to the audit log.
    pub async fn search(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("Query is required".to_string()));
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

        let semantic_query = self.extractor.semantic_query(query);
        let books = self.store.list_entries(&BookFilter::all()).await?;
        let results: Vec<_> = self
            .ranker
            .search_relevance(books, query)
            .into_iter()
            .filter(|hit| hit.relevance_score > 0.0)
            .take(limit)
            .collect();

        info!(
            "Search '{}' matched {} entries (intent {:?})",
            query,
            results.len(),
            semantic_query.intent
        );

        if let Some(user_id) = user_id.map(str::trim).filter(|id| !id.is_empty()) {
            let entry = SearchLogEntry {
                query: query.to_string(),
                semantic_query: semantic_query.clone(),
                results_count: results.len() as i32,
                user_id: user_id.to_string(),
            };
            if let Err(e) = self.store.record_search(&entry).await {
                warn!("Failed to record search for user {}: {}", user_id, e);
            }
        }

        Ok(SearchResponse {
            query: query.to_string(),
            semantic_query,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Book, CatalogAnalytics, InteractionRecord, NewBook, RelatedBook, SearchIntent,
        SimilarityEdge,
    };
    use crate::services::similarity::tests::book;
    use crate::storage::InMemoryCatalogStore;
    use async_trait::async_trait;

    /// Catalog that serves reads but rejects audit rows.
    struct NoAuditStore(Arc<InMemoryCatalogStore>);

    #[async_trait]
    impl CatalogStore for NoAuditStore {
        async fn list_entries(&self, filter: &BookFilter) -> Result<Vec<Book>> {
            self.0.list_entries(filter).await
        }
        async fn count_entries(&self, filter: &BookFilter) -> Result<i64> {
            self.0.count_entries(filter).await
        }
        async fn get_entry(&self, id: i32) -> Result<Option<Book>> {
            self.0.get_entry(id).await
        }
        async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
            self.0.find_by_isbn(isbn).await
        }
        async fn insert_entry(&self, book: NewBook) -> Result<Book> {
            self.0.insert_entry(book).await
        }
        async fn list_interactions(&self, book_id: Option<i32>) -> Result<Vec<InteractionRecord>> {
            self.0.list_interactions(book_id).await
        }
        async fn append_interaction(&self, record: &InteractionRecord) -> Result<()> {
            self.0.append_interaction(record).await
        }
        async fn insert_edge(&self, edge: &SimilarityEdge) -> Result<bool> {
            self.0.insert_edge(edge).await
        }
        async fn find_edge(&self, a: i32, b: i32) -> Result<Option<SimilarityEdge>> {
            self.0.find_edge(a, b).await
        }
        async fn related_entries(&self, id: i32, limit: i64) -> Result<Vec<RelatedBook>> {
            self.0.related_entries(id, limit).await
        }
        async fn record_search(&self, _: &SearchLogEntry) -> Result<()> {
            Err(ApiError::DatabaseError("search_queries is read-only".to_string()))
        }
        async fn analytics(&self) -> Result<CatalogAnalytics> {
            self.0.analytics().await
        }
    }

    fn store() -> Arc<InMemoryCatalogStore> {
        let mut first = book(1, "Budi", "Technology", "P", 2020);
        first.title = "Database untuk Industri".to_string();
        let mut second = book(2, "Siti", "Fiction", "P", 2019);
        second.title = "Laut Bercerita".to_string();
        let mut third = book(3, "Andi", "Technology", "P", 2021);
        third.title = "Belajar SQL".to_string();
        third.description = Some("Pengantar database relasional".to_string());

        Arc::new(InMemoryCatalogStore::with_books(vec![first, second, third]))
    }

    #[tokio::test]
    async fn test_search_filters_and_ranks() {
        let store = store();
        let service = SearchService::new(store.clone());

        let response = service.search("database", None, None).await.unwrap();

        let ids: Vec<i32> = response.results.iter().map(|h| h.book.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(response.results[0].relevance_score >= 0.5);
        assert_eq!(response.semantic_query.entities.topics, vec!["database"]);
        assert_eq!(store.search_count(), 0);
    }

    #[tokio::test]
    async fn test_search_with_user_is_audited() {
        let store = store();
        let service = SearchService::new(store.clone());

        let response = service
            .search("learn database", Some("u1"), Some(1))
            .await
            .unwrap();

        assert!(response.results.is_empty());
        assert_eq!(response.semantic_query.intent, SearchIntent::Learning);
        assert_eq!(store.search_count(), 1);
    }

    #[tokio::test]
    async fn test_audit_failure_still_returns_results() {
        let inner = store();
        let service = SearchService::new(Arc::new(NoAuditStore(inner.clone())));

        let response = service.search("database", Some("u1"), None).await.unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(inner.search_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let service = SearchService::new(store());

        assert!(matches!(
            service.search("  ", None, None).await,
            Err(ApiError::InvalidInput(_))
        ));
    }
}
