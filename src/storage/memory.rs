use super::{BookFilter, CatalogStore, SortOrder};
use crate::error::{ApiError, Result};
use crate::models::{
    ordered_pair, AuthorCount, Book, CatalogAnalytics, GenreCount, InteractionCount, InteractionRecord,
    NewBook, RelatedBook, SearchLogEntry, SearchTrend, SimilarityEdge,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct MemoryState {
    books: Vec<Book>,
    next_id: i32,
    /// Keyed by the normalised pair
    edges: BTreeMap<(i32, i32), SimilarityEdge>,
    interactions: Vec<InteractionRecord>,
    searches: Vec<(SearchLogEntry, DateTime<Utc>)>,
}

/// Catalog store kept in process memory. Used when no database is
/// configured and throughout the test suite.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<MemoryState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing entries, keeping their ids
    pub fn with_books(mut books: Vec<Book>) -> Self {
        let next_id = books.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        books.sort_by_key(|b| b.id);

        Self {
            state: RwLock::new(MemoryState {
                books,
                next_id,
                ..MemoryState::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| ApiError::InternalError("catalog lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| ApiError::InternalError("catalog lock poisoned".to_string()))
    }

    pub fn edge_count(&self) -> usize {
        self.read().map(|state| state.edges.len()).unwrap_or(0)
    }

    pub fn search_count(&self) -> usize {
        self.read().map(|state| state.searches.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_entries(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let state = self.read()?;
        let mut books: Vec<Book> = state
            .books
            .iter()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect();

        if filter.sort == SortOrder::NewestFirst {
            books.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        }

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter
            .limit
            .map(|limit| limit.max(0) as usize)
            .unwrap_or(usize::MAX);
        Ok(books.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_entries(&self, filter: &BookFilter) -> Result<i64> {
        let state = self.read()?;
        Ok(state.books.iter().filter(|book| filter.matches(book)).count() as i64)
    }

    async fn get_entry(&self, id: i32) -> Result<Option<Book>> {
        let state = self.read()?;
        Ok(state.books.iter().find(|book| book.id == id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let state = self.read()?;
        Ok(state
            .books
            .iter()
            .find(|book| book.isbn.as_deref() == Some(isbn))
            .cloned())
    }

    async fn insert_entry(&self, book: NewBook) -> Result<Book> {
        let mut state = self.write()?;
        if let Some(isbn) = book.isbn.as_deref() {
            if state.books.iter().any(|b| b.isbn.as_deref() == Some(isbn)) {
                return Err(ApiError::DatabaseError(format!(
                    "duplicate isbn '{}'",
                    isbn
                )));
            }
        }

        let id = state.next_id.max(1);
        state.next_id = id + 1;
        let book = book.into_book(id, Utc::now());
        state.books.push(book.clone());
        Ok(book)
    }

    async fn list_interactions(&self, book_id: Option<i32>) -> Result<Vec<InteractionRecord>> {
        let state = self.read()?;
        Ok(state
            .interactions
            .iter()
            .filter(|record| book_id.map_or(true, |id| record.book_id == id))
            .cloned()
            .collect())
    }

    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let mut state = self.write()?;
        if !state.books.iter().any(|book| book.id == record.book_id) {
            return Err(ApiError::DatabaseError(format!(
                "book {} does not exist",
                record.book_id
            )));
        }
        state.interactions.push(record.clone());
        Ok(())
    }

    async fn insert_edge(&self, edge: &SimilarityEdge) -> Result<bool> {
        let mut state = self.write()?;
        let pair = edge.pair();
        if state.edges.contains_key(&pair) {
            return Ok(false);
        }
        state.edges.insert(pair, edge.clone());
        Ok(true)
    }

    async fn find_edge(&self, a: i32, b: i32) -> Result<Option<SimilarityEdge>> {
        let state = self.read()?;
        Ok(state
            .edges
            .get(&ordered_pair(a, b))
            .cloned())
    }

    async fn related_entries(&self, id: i32, limit: i64) -> Result<Vec<RelatedBook>> {
        let state = self.read()?;
        let mut related: Vec<RelatedBook> = state
            .edges
            .values()
            .filter(|edge| edge.from_id == id || edge.to_id == id)
            .filter_map(|edge| {
                let other = if edge.from_id == id {
                    edge.to_id
                } else {
                    edge.from_id
                };
                state.books.iter().find(|b| b.id == other).map(|book| RelatedBook {
                    id: book.id,
                    title: book.title.clone(),
                    author: book.author.clone(),
                    cover_url: book.cover_url.clone(),
                    predicate: edge.relation.clone(),
                    confidence_score: edge.confidence,
                })
            })
            .collect();

        related.sort_by(|a, b| {
            b.confidence_score
                .total_cmp(&a.confidence_score)
                .then(a.id.cmp(&b.id))
        });
        related.truncate(limit.max(0) as usize);
        Ok(related)
    }

    async fn record_search(&self, entry: &SearchLogEntry) -> Result<()> {
        let mut state = self.write()?;
        state.searches.push((entry.clone(), Utc::now()));
        Ok(())
    }

    async fn analytics(&self) -> Result<CatalogAnalytics> {
        let state = self.read()?;

        let mut genre_counts: HashMap<Option<String>, i64> = HashMap::new();
        let mut author_counts: HashMap<String, i64> = HashMap::new();
        for book in &state.books {
            *genre_counts.entry(book.genre.clone()).or_default() += 1;
            *author_counts.entry(book.author.clone()).or_default() += 1;
        }

        let mut genres: Vec<GenreCount> = genre_counts
            .into_iter()
            .map(|(genre, count)| GenreCount { genre, count })
            .collect();
        genres.sort_by(|a, b| b.count.cmp(&a.count).then(a.genre.cmp(&b.genre)));

        let mut authors: Vec<AuthorCount> = author_counts
            .into_iter()
            .map(|(author, book_count)| AuthorCount { author, book_count })
            .collect();
        authors.sort_by(|a, b| b.book_count.cmp(&a.book_count).then(a.author.cmp(&b.author)));
        authors.truncate(10);

        let since = Utc::now() - Duration::days(30);
        let mut trends: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
        for (_, at) in state.searches.iter().filter(|(_, at)| *at >= since) {
            *trends.entry(at.date_naive()).or_default() += 1;
        }

        let mut interaction_counts: BTreeMap<String, i64> = BTreeMap::new();
        for record in &state.interactions {
            *interaction_counts
                .entry(record.kind.as_str().to_string())
                .or_default() += 1;
        }

        Ok(CatalogAnalytics {
            genres,
            authors,
            search_trends: trends
                .into_iter()
                .map(|(date, search_count)| SearchTrend { date, search_count })
                .collect(),
            interactions: interaction_counts
                .into_iter()
                .map(|(interaction_type, count)| InteractionCount {
                    interaction_type,
                    count,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(title: &str, author: &str, genre: &str, year: i32) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: Some(genre.to_string()),
            publication_year: Some(year),
            ..NewBook::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryCatalogStore::new();
        let a = store.insert_entry(new_book("A", "X", "Fiction", 2000)).await.unwrap();
        let b = store.insert_entry(new_book("B", "Y", "Fiction", 2001)).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.count_entries(&BookFilter::all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive_substring() {
        let store = InMemoryCatalogStore::new();
        store.insert_entry(new_book("A", "Budi Santoso", "Technology", 2020)).await.unwrap();
        store.insert_entry(new_book("B", "Siti", "Fiction", 2020)).await.unwrap();
        store.insert_entry(new_book("C", "budi raharjo", "Tech", 2018)).await.unwrap();

        let filter = BookFilter {
            author: Some("BUDI".to_string()),
            ..BookFilter::default()
        };
        let books = store.list_entries(&filter).await.unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 3]);

        let filter = BookFilter {
            genre: Some("tech".to_string()),
            year: Some(2020),
            ..BookFilter::default()
        };
        let books = store.list_entries(&filter).await.unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = InMemoryCatalogStore::new();
        for i in 0..5 {
            store
                .insert_entry(new_book(&format!("Book {}", i), "A", "G", 2000))
                .await
                .unwrap();
        }

        let filter = BookFilter {
            limit: Some(2),
            offset: Some(2),
            ..BookFilter::default()
        };
        let books = store.list_entries(&filter).await.unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_edges_are_unique_per_unordered_pair() {
        let store = InMemoryCatalogStore::new();
        assert!(store
            .insert_edge(&SimilarityEdge::similar_to(1, 2, 0.5))
            .await
            .unwrap());
        assert!(!store
            .insert_edge(&SimilarityEdge::similar_to(2, 1, 0.9))
            .await
            .unwrap());

        let edge = store.find_edge(2, 1).await.unwrap().unwrap();
        assert_eq!(edge.confidence, 0.5);
        assert_eq!(store.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_rejected() {
        let store = InMemoryCatalogStore::new();
        let mut book = new_book("A", "X", "G", 2000);
        book.isbn = Some("123".to_string());
        store.insert_entry(book.clone()).await.unwrap();

        assert!(store.insert_entry(book).await.is_err());
        assert!(store.find_by_isbn("123").await.unwrap().is_some());
    }
}
