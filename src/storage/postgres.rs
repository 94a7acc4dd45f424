use super::{BookFilter, CatalogStore, SortOrder};
use crate::error::{ApiError, Result};
use crate::models::{
    AuthorCount, Book, CatalogAnalytics, GenreCount, InteractionCount, InteractionKind,
    InteractionRecord, NewBook, RelatedBook, SearchLogEntry, SearchTrend, SimilarityEdge,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info, warn};

const BOOK_COLUMNS: &str = "id, title, author, isbn, publication_year, publisher, page_count, \
     genre, description, cover_url, semantic_data, created_at";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS books (
        id SERIAL PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        author VARCHAR(255) NOT NULL,
        isbn VARCHAR(20) UNIQUE,
        publication_year INTEGER,
        publisher VARCHAR(255),
        page_count INTEGER,
        genre VARCHAR(100),
        description TEXT,
        cover_url VARCHAR(500),
        semantic_data JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS semantic_relations (
        id SERIAL PRIMARY KEY,
        subject_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        predicate VARCHAR(255) NOT NULL,
        object_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        confidence_score REAL NOT NULL CHECK (confidence_score >= 0 AND confidence_score <= 1),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CHECK (subject_id <> object_id)
    )",
    // One edge per unordered pair, whichever orientation was written first.
    "CREATE UNIQUE INDEX IF NOT EXISTS semantic_relations_pair_idx
        ON semantic_relations (LEAST(subject_id, object_id), GREATEST(subject_id, object_id))",
    "CREATE TABLE IF NOT EXISTS user_interactions (
        id SERIAL PRIMARY KEY,
        user_id VARCHAR(255) NOT NULL,
        book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        interaction_type VARCHAR(50) NOT NULL,
        rating INTEGER CHECK (rating >= 1 AND rating <= 5),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS user_interactions_book_idx ON user_interactions (book_id)",
    "CREATE TABLE IF NOT EXISTS search_queries (
        id SERIAL PRIMARY KEY,
        query TEXT NOT NULL,
        semantic_query JSONB,
        results_count INTEGER,
        user_id VARCHAR(255),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
];

#[derive(sqlx::FromRow)]
struct InteractionRow {
    user_id: String,
    book_id: i32,
    interaction_type: String,
    rating: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InteractionRow> for InteractionRecord {
    type Error = ApiError;

    fn try_from(row: InteractionRow) -> Result<Self> {
        let kind = row
            .interaction_type
            .parse::<InteractionKind>()
            .map_err(ApiError::DatabaseError)?;

        Ok(InteractionRecord {
            user_id: row.user_id,
            book_id: row.book_id,
            kind,
            rating: row.rating,
            created_at: row.created_at,
        })
    }
}

/// Rows with an interaction type this service does not know are skipped, so
/// one foreign row cannot fail every popularity query.
fn decode_interactions(rows: Vec<InteractionRow>) -> Vec<InteractionRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let (user_id, book_id) = (row.user_id.clone(), row.book_id);
            match InteractionRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        "Skipping interaction by {} on book {}: {}",
                        user_id, book_id, e
                    );
                    None
                }
            }
        })
        .collect()
}

/// PostgreSQL-backed catalog store
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to PostgreSQL ({} max connections)", max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is ready");
        Ok(())
    }

    fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
        if let Some(genre) = &filter.genre {
            builder
                .push(" AND genre ILIKE ")
                .push_bind(format!("%{}%", genre));
        }
        if let Some(author) = &filter.author {
            builder
                .push(" AND author ILIKE ")
                .push_bind(format!("%{}%", author));
        }
        if let Some(year) = filter.year {
            builder.push(" AND publication_year = ").push_bind(year);
        }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_entries(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books WHERE 1=1", BOOK_COLUMNS));
        Self::push_predicates(&mut builder, filter);

        match filter.sort {
            SortOrder::Id => builder.push(" ORDER BY id ASC"),
            SortOrder::NewestFirst => builder.push(" ORDER BY created_at DESC, id DESC"),
        };
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ").push_bind(offset);
        }

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        debug!("Loaded {} books", books.len());
        Ok(books)
    }

    async fn count_entries(&self, filter: &BookFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books WHERE 1=1");
        Self::push_predicates(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get_entry(&self, id: i32) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE isbn = $1",
            BOOK_COLUMNS
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn insert_entry(&self, book: NewBook) -> Result<Book> {
        let inserted = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (title, author, isbn, publication_year, publisher, page_count, \
             genre, description, cover_url, semantic_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(book.title)
        .bind(book.author)
        .bind(book.isbn)
        .bind(book.publication_year)
        .bind(book.publisher)
        .bind(book.page_count)
        .bind(book.genre)
        .bind(book.description)
        .bind(book.cover_url)
        .bind(book.semantic_data)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_interactions(&self, book_id: Option<i32>) -> Result<Vec<InteractionRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT user_id, book_id, interaction_type, rating, created_at \
             FROM user_interactions WHERE 1=1",
        );
        if let Some(book_id) = book_id {
            builder.push(" AND book_id = ").push_bind(book_id);
        }
        builder.push(" ORDER BY id ASC");

        let rows = builder
            .build_query_as::<InteractionRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(decode_interactions(rows))
    }

    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_interactions (user_id, book_id, interaction_type, rating, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.user_id)
        .bind(record.book_id)
        .bind(record.kind.as_str())
        .bind(record.rating)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_edge(&self, edge: &SimilarityEdge) -> Result<bool> {
        let (from_id, to_id) = edge.pair();
        let result = sqlx::query(
            "INSERT INTO semantic_relations (subject_id, predicate, object_id, confidence_score) \
             VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
        )
        .bind(from_id)
        .bind(&edge.relation)
        .bind(to_id)
        .bind(edge.confidence)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_edge(&self, a: i32, b: i32) -> Result<Option<SimilarityEdge>> {
        let edge = sqlx::query_as::<_, SimilarityEdge>(
            "SELECT subject_id AS from_id, object_id AS to_id, predicate AS relation, \
             confidence_score AS confidence FROM semantic_relations \
             WHERE (subject_id = $1 AND object_id = $2) OR (subject_id = $2 AND object_id = $1) \
             LIMIT 1",
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;
        Ok(edge)
    }

    async fn related_entries(&self, id: i32, limit: i64) -> Result<Vec<RelatedBook>> {
        let related = sqlx::query_as::<_, RelatedBook>(
            "SELECT b.id, b.title, b.author, b.cover_url, sr.predicate, sr.confidence_score \
             FROM semantic_relations sr \
             JOIN books b ON b.id = CASE WHEN sr.subject_id = $1 THEN sr.object_id ELSE sr.subject_id END \
             WHERE sr.subject_id = $1 OR sr.object_id = $1 \
             ORDER BY sr.confidence_score DESC, b.id ASC \
             LIMIT $2",
        )
        .bind(id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(related)
    }

    async fn record_search(&self, entry: &SearchLogEntry) -> Result<()> {
        let semantic_query = serde_json::to_value(&entry.semantic_query)?;
        sqlx::query(
            "INSERT INTO search_queries (query, semantic_query, results_count, user_id) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&entry.query)
        .bind(semantic_query)
        .bind(entry.results_count)
        .bind(&entry.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn analytics(&self) -> Result<CatalogAnalytics> {
        let genres = sqlx::query_as::<_, GenreCount>(
            "SELECT genre, COUNT(*) AS count FROM books GROUP BY genre ORDER BY count DESC, genre ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let authors = sqlx::query_as::<_, AuthorCount>(
            "SELECT author, COUNT(*) AS book_count FROM books GROUP BY author \
             ORDER BY book_count DESC, author ASC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await?;

        let search_trends = sqlx::query_as::<_, SearchTrend>(
            "SELECT created_at::date AS date, COUNT(*) AS search_count FROM search_queries \
             WHERE created_at >= NOW() - INTERVAL '30 days' \
             GROUP BY created_at::date ORDER BY date",
        )
        .fetch_all(&self.pool)
        .await?;

        let interactions = sqlx::query_as::<_, InteractionCount>(
            "SELECT interaction_type, COUNT(*) AS count FROM user_interactions \
             GROUP BY interaction_type ORDER BY interaction_type",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(CatalogAnalytics {
            genres,
            authors,
            search_trends,
            interactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: &str, book_id: i32, kind: &str, rating: Option<i32>) -> InteractionRow {
        InteractionRow {
            user_id: user_id.to_string(),
            book_id,
            interaction_type: kind.to_string(),
            rating,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unknown_interaction_types_are_skipped() {
        let records = decode_interactions(vec![
            row("u1", 1, "view", None),
            row("u2", 1, "bookmark", None),
            row("u3", 2, "rating", Some(4)),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, InteractionKind::View);
        assert_eq!(records[1].kind, InteractionKind::Rating);
        assert_eq!(records[1].rating, Some(4));
    }
}
