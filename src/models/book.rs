use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

fn deserialize_optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i32),
        Null,
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                i32::from_str(s)
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
        StringOrInt::Int(i) => Ok(Some(i)),
        StringOrInt::Null => Ok(None),
    }
}

/// A single catalog entry as stored in the `books` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Book {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Database untuk Industri")]
    pub title: String,
    #[schema(example = "Budi Santoso")]
    pub author: String,
    pub isbn: Option<String>,
    #[schema(example = 2021)]
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub page_count: Option<i32>,
    #[schema(example = "Technology")]
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    /// Extracted entities, stored as JSON
    #[schema(value_type = Option<Object>)]
    pub semantic_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a new catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub page_count: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub semantic_data: Option<serde_json::Value>,
}

impl NewBook {
    pub fn into_book(self, id: i32, created_at: DateTime<Utc>) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publication_year: self.publication_year,
            publisher: self.publisher,
            page_count: self.page_count,
            genre: self.genre,
            description: self.description,
            cover_url: self.cover_url,
            semantic_data: self.semantic_data,
            created_at,
        }
    }
}

/// Record shape of the external catalog feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedBook {
    pub title: String,
    pub author: String,
    #[serde(alias = "ISBN", default)]
    pub isbn: Option<String>,
    #[serde(
        alias = "publicationYear",
        default,
        deserialize_with = "deserialize_optional_i32"
    )]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(
        alias = "pageCount",
        default,
        deserialize_with = "deserialize_optional_i32"
    )]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "cover", default)]
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFeed {
    pub books: Vec<FeedBook>,
}

impl FeedBook {
    pub fn into_new_book(self, semantic_data: serde_json::Value) -> NewBook {
        NewBook {
            title: self.title,
            author: self.author,
            isbn: self.isbn.filter(|isbn| !isbn.trim().is_empty()),
            publication_year: self.publication_year,
            publisher: self.publisher,
            page_count: self.page_count,
            genre: self.genre,
            description: self.description,
            cover_url: self.cover_url,
            semantic_data: Some(semantic_data),
        }
    }

    /// Text the entity extractor runs over when annotating a new entry
    pub fn annotation_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.description.as_deref().unwrap_or(""),
            self.genre.as_deref().unwrap_or("")
        )
    }
}

/// A neighbour in the similarity graph, as shown on the book detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RelatedBook {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    #[schema(example = "similarTo")]
    pub predicate: String,
    #[schema(example = 0.9)]
    pub confidence_score: f32,
}

/// Book detail response: the entry plus its strongest relations.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub semantic_relations: Vec<RelatedBook>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_book_accepts_string_numbers() {
        let json = r#"{
            "title": "Belajar Python",
            "author": "Andi",
            "ISBN": "978-1",
            "publication_year": "2019",
            "page_count": 320,
            "genre": "Technology",
            "cover": "https://example.com/cover.jpg"
        }"#;

        let book: FeedBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.isbn.as_deref(), Some("978-1"));
        assert_eq!(book.publication_year, Some(2019));
        assert_eq!(book.page_count, Some(320));
        assert_eq!(
            book.cover_url.as_deref(),
            Some("https://example.com/cover.jpg")
        );
        assert!(book.publisher.is_none());
    }

    #[test]
    fn test_feed_book_empty_year_is_none() {
        let json = r#"{"title": "T", "author": "A", "publication_year": ""}"#;
        let book: FeedBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.publication_year, None);
    }
}
