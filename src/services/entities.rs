use crate::models::{Book, EntityBag, SearchIntent, SemanticQuery};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;

const TOPICS: &[&str] = &[
    "web development",
    "programming",
    "algorithm",
    "database",
    "ui/ux",
    "frontend",
    "backend",
    "javascript",
    "python",
    "java",
    "semantic web",
    "artificial intelligence",
];

const CONCEPTS: &[&str] = &["technology", "education", "tutorial", "guide", "reference"];

const SYNONYMS: &[(&str, &[&str])] = &[
    ("programming", &["coding", "development", "software"]),
    ("algorithm", &["algoritma", "computation", "logic"]),
    ("database", &["db", "data storage", "sql"]),
    ("web", &["website", "internet", "online"]),
];

const MAX_KEYWORDS: usize = 10;

static KEYWORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w{4,}\b").expect("keyword pattern is valid"));

/// Vocabulary-based entity extraction and query analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> EntityBag {
        let lower = text.to_lowercase();
        let vocabulary_hits = |vocabulary: &[&str]| -> Vec<String> {
            vocabulary
                .iter()
                .filter(|term| lower.contains(*term))
                .map(|term| term.to_string())
                .collect()
        };

        // the first ten matches, repeats dropped afterwards
        let mut seen = HashSet::new();
        let keywords = KEYWORD_PATTERN
            .find_iter(text)
            .take(MAX_KEYWORDS)
            .map(|m| m.as_str())
            .filter(|word| seen.insert(*word))
            .map(str::to_string)
            .collect();

        EntityBag {
            topics: vocabulary_hits(TOPICS),
            concepts: vocabulary_hits(CONCEPTS),
            keywords,
        }
    }

    /// First matching rule wins; "by" only counts as a standalone word.
    pub fn detect_intent(&self, query: &str) -> SearchIntent {
        let lower = query.to_lowercase();
        let has_word = |word: &str| lower.split_whitespace().any(|token| token == word);

        if lower.contains("tutorial") || lower.contains("learn") {
            SearchIntent::Learning
        } else if lower.contains("reference") || lower.contains("guide") {
            SearchIntent::Reference
        } else if lower.contains("author") || has_word("by") {
            SearchIntent::AuthorSearch
        } else if has_word("new") || lower.contains("latest") {
            SearchIntent::RecentBooks
        } else {
            SearchIntent::GeneralSearch
        }
    }

    pub fn expand(&self, query: &str) -> Vec<String> {
        query
            .to_lowercase()
            .split_whitespace()
            .filter_map(|word| SYNONYMS.iter().find(|(term, _)| *term == word))
            .flat_map(|(_, synonyms)| synonyms.iter().map(|s| s.to_string()))
            .collect()
    }

    pub fn semantic_query(&self, query: &str) -> SemanticQuery {
        SemanticQuery {
            original: query.to_string(),
            expanded: self.expand(query),
            entities: self.extract(query),
            intent: self.detect_intent(query),
        }
    }
}

/// Render a catalog entry as a schema.org `Book` JSON-LD document.
pub fn to_json_ld(book: &Book, base_url: &str) -> Value {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), book.id);

    json!({
        "@context": {
            "@vocab": "https://schema.org/",
            "book": "Book",
            "author": "author",
            "publisher": "publisher",
            "genre": "genre",
            "isbn": "isbn",
            "pageCount": "numberOfPages",
            "publicationYear": "datePublished",
            "description": "description",
            "coverImage": "image"
        },
        "@type": "Book",
        "@id": url,
        "name": book.title,
        "author": { "@type": "Person", "name": book.author },
        "publisher": { "@type": "Organization", "name": book.publisher },
        "isbn": book.isbn,
        "numberOfPages": book.page_count,
        "datePublished": book.publication_year.map(|year| year.to_string()),
        "genre": book.genre,
        "description": book.description,
        "image": book.cover_url,
        "url": url,
    })
}
