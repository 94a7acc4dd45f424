use crate::error::{ApiError, Result};
use crate::models::{
    Book, BookDetail, BookListResponse, CatalogAnalytics, CatalogFeed, InteractionKind,
    Pagination,
};
use crate::services::{
    entities::{to_json_ld, EntityExtractor},
    knowledge_graph::{build_knowledge_graph, KnowledgeGraph},
    recommendation::RecommendationEngine,
    relations::{BuildReport, RelationBuilder},
};
use crate::storage::{BookFilter, CatalogStore, SortOrder};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
const RELATED_LIMIT: i64 = 5;
const GRAPH_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SyncReport {
    #[schema(example = "Data synced successfully")]
    pub message: String,
    /// Records in the feed
    pub count: usize,
    /// Records that were new to the catalog
    pub inserted: usize,
    pub relations: BuildReport,
}

/// Catalog browsing, detail views and feed ingestion.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    engine: RecommendationEngine,
    relations: RelationBuilder,
    extractor: EntityExtractor,
    http: Client,
    sync_source_url: Option<String>,
    base_url: String,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        sync_source_url: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            engine: RecommendationEngine::new(store.clone()),
            relations: RelationBuilder::new(store.clone()),
            store,
            extractor: EntityExtractor::new(),
            http: Client::new(),
            sync_source_url,
            base_url: base_url.into(),
        }
    }

    /// One page of the catalog, newest first.
    pub async fn list_books(
        &self,
        filter: BookFilter,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<BookListResponse> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| ApiError::InvalidInput(format!("Page {} is out of range", page)))?;

        let total = self.store.count_entries(&filter.predicates_only()).await?;
        let paged = BookFilter {
            sort: SortOrder::NewestFirst,
            limit: Some(limit),
            offset: Some(offset),
            ..filter.predicates_only()
        };
        let books = self.store.list_entries(&paged).await?;

        Ok(BookListResponse {
            books,
            pagination: Pagination {
                page,
                limit,
                total,
                pages: (total + limit - 1) / limit,
            },
        })
    }

    async fn require_book(&self, id: i32) -> Result<Book> {
        self.store
            .get_entry(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", id)))
    }

    /// Entry with its strongest neighbours. A view is recorded for
    /// `user_id` on a best-effort basis.
    pub async fn get_book(&self, id: i32, user_id: Option<&str>) -> Result<BookDetail> {
        let book = self.require_book(id).await?;

        if let Some(user_id) = user_id.map(str::trim).filter(|u| !u.is_empty()) {
            self.engine
                .record_interaction(user_id, id, InteractionKind::View, None)
                .await;
        }

        let semantic_relations = self.store.related_entries(id, RELATED_LIMIT).await?;
        Ok(BookDetail {
            book,
            semantic_relations,
        })
    }

    pub async fn json_ld(&self, id: i32) -> Result<Value> {
        let book = self.require_book(id).await?;
        Ok(to_json_ld(&book, &self.base_url))
    }

    pub async fn knowledge_graph(&self) -> Result<KnowledgeGraph> {
        let filter = BookFilter {
            limit: Some(GRAPH_LIMIT),
            ..BookFilter::all()
        };
        let books = self.store.list_entries(&filter).await?;
        Ok(build_knowledge_graph(&books))
    }

    pub async fn analytics(&self) -> Result<CatalogAnalytics> {
        self.store.analytics().await
    }

    /// Recompute similarity edges over the whole catalog.
    pub async fn rebuild_relations(&self) -> Result<BuildReport> {
        let books = self.store.list_entries(&BookFilter::all()).await?;
        Ok(self.relations.build(&books).await)
    }

    /// Pull the configured feed and ingest it.
    pub async fn sync(&self) -> Result<SyncReport> {
        let url = self.sync_source_url.as_deref().ok_or_else(|| {
            ApiError::ExternalServiceError("No catalog sync source configured".to_string())
        })?;

        info!("Fetching catalog feed from {}", url);
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::ExternalServiceError(format!(
                "Catalog feed returned status {}",
                response.status()
            )));
        }
        let feed: CatalogFeed = response
            .json()
            .await
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;

        self.ingest(feed).await
    }

    /// Insert feed records whose ISBN is not yet catalogued and link each
    /// new entry into the similarity graph.
    pub async fn ingest(&self, feed: CatalogFeed) -> Result<SyncReport> {
        let count = feed.books.len();
        let mut catalog = self.store.list_entries(&BookFilter::all()).await?;
        let mut report = SyncReport {
            message: "Data synced successfully".to_string(),
            count,
            ..SyncReport::default()
        };

        for record in feed.books {
            if let Some(isbn) = record.isbn.as_deref().filter(|i| !i.trim().is_empty()) {
                if self.store.find_by_isbn(isbn).await?.is_some() {
                    debug!("Skipping already catalogued ISBN {}", isbn);
                    continue;
                }
            }

            let entities = self.extractor.extract(&record.annotation_text());
            let new_book = record.into_new_book(json!({ "entities": entities }));
            let title = new_book.title.clone();
            let book = match self.store.insert_entry(new_book).await {
                Ok(book) => book,
                Err(e) => {
                    warn!("Failed to insert '{}': {}", title, e);
                    continue;
                }
            };

            report
                .relations
                .merge(self.relations.link_entry(&book, &catalog).await);
            catalog.push(book);
            report.inserted += 1;
        }

        info!(
            "Catalog sync: {} records, {} inserted, {} new relations",
            report.count, report.inserted, report.relations.created
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::similarity::tests::book;
    use crate::storage::InMemoryCatalogStore;

    fn service(books: Vec<Book>) -> (CatalogService, Arc<InMemoryCatalogStore>) {
        let store = Arc::new(InMemoryCatalogStore::with_books(books));
        let service = CatalogService::new(store.clone(), None, "http://localhost:3001/books");
        (service, store)
    }

    #[tokio::test]
    async fn test_list_books_paginates() {
        let books = (1..=12).map(|i| book(i, "A", "G", "P", 2000)).collect();
        let (service, _) = service(books);

        let page = service
            .list_books(BookFilter::all(), Some(2), Some(5))
            .await
            .unwrap();

        assert_eq!(page.books.len(), 5);
        assert_eq!(
            page.pagination,
            Pagination {
                page: 2,
                limit: 5,
                total: 12,
                pages: 3
            }
        );
    }

    #[tokio::test]
    async fn test_list_books_rejects_huge_page() {
        let (service, _) = service(vec![book(1, "A", "G", "P", 2000)]);

        assert!(matches!(
            service.list_books(BookFilter::all(), Some(i64::MAX), Some(10)).await,
            Err(ApiError::InvalidInput(_))
        ));

        // far past the end but representable: an empty page
        let page = service
            .list_books(BookFilter::all(), Some(i64::MAX / 100), Some(10))
            .await
            .unwrap();
        assert!(page.books.is_empty());
        assert_eq!(page.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_get_book_records_view_and_relations() {
        let (service, store) = service(vec![
            book(1, "X", "Fiction", "Gramedia", 2000),
            book(2, "X", "Fiction", "Mizan", 2001),
        ]);
        service.rebuild_relations().await.unwrap();

        let detail = service.get_book(2, Some("reader")).await.unwrap();

        assert_eq!(detail.book.id, 2);
        assert_eq!(detail.semantic_relations.len(), 1);
        assert_eq!(detail.semantic_relations[0].id, 1);
        let interactions = store.list_interactions(Some(2)).await.unwrap();
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].kind, InteractionKind::View);
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let (service, _) = service(vec![]);

        assert!(matches!(
            service.get_book(9, None).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(service.json_ld(9).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sync_without_source_fails() {
        let (service, _) = service(vec![]);
        assert!(matches!(
            service.sync().await,
            Err(ApiError::ExternalServiceError(_))
        ));
    }

    #[tokio::test]
    async fn test_ingest_skips_known_isbns_and_links() {
        let mut existing = book(1, "Tere Liye", "Fiction", "Gramedia", 2019);
        existing.isbn = Some("111".to_string());
        let (service, store) = service(vec![existing]);

        let feed: CatalogFeed = serde_json::from_value(json!({
            "books": [
                { "title": "Bumi", "author": "Tere Liye", "ISBN": "111", "genre": "Fiction" },
                {
                    "title": "Bulan",
                    "author": "Tere Liye",
                    "ISBN": "222",
                    "publication_year": "2020",
                    "publisher": "Gramedia",
                    "genre": "Fiction",
                    "description": "A database tutorial in disguise"
                }
            ]
        }))
        .unwrap();

        let report = service.ingest(feed).await.unwrap();

        assert_eq!(report.count, 2);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.relations.created, 1);
        let added = store.find_by_isbn("222").await.unwrap().unwrap();
        assert_eq!(added.publication_year, Some(2020));
        assert_eq!(
            added.semantic_data.unwrap()["entities"]["topics"],
            json!(["database"])
        );
        assert!(store.find_edge(1, added.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_knowledge_graph_and_json_ld() {
        let (service, _) = service(vec![book(1, "Andi", "Technology", "P", 2020)]);

        let graph = service.knowledge_graph().await.unwrap();
        assert_eq!(graph.nodes.len(), 3);

        let doc = service.json_ld(1).await.unwrap();
        assert_eq!(doc["@id"], "http://localhost:3001/books/1");
    }
}
