use crate::models::{Book, SearchHit};

const TITLE_WEIGHT: f32 = 0.5;
const AUTHOR_WEIGHT: f32 = 0.3;
const DESCRIPTION_WEIGHT: f32 = 0.2;
const GENRE_WEIGHT: f32 = 0.4;

/// Substring-based relevance of a catalog entry to a free-text query.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceRanker;

impl RelevanceRanker {
    pub fn new() -> Self {
        Self
    }

    /// Relevance in `[0, 1]`. Bonuses stack and are clamped once at the end.
    /// A blank query scores zero.
    pub fn relevance(&self, book: &Book, query: &str) -> f32 {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return 0.0;
        }
        let contains = |field: Option<&str>| {
            field.is_some_and(|value| value.to_lowercase().contains(&needle))
        };

        let mut score = 0.0;
        if contains(Some(&book.title)) {
            score += TITLE_WEIGHT;
        }
        if contains(Some(&book.author)) {
            score += AUTHOR_WEIGHT;
        }
        if contains(book.description.as_deref()) {
            score += DESCRIPTION_WEIGHT;
        }
        if book
            .genre
            .as_deref()
            .is_some_and(|genre| genre.trim().to_lowercase() == needle)
        {
            score += GENRE_WEIGHT;
        }

        f32::min(score, 1.0)
    }

    /// Tag every entry with its relevance and sort descending. Ties keep
    /// their input order.
    pub fn search_relevance(&self, books: Vec<Book>, query: &str) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = books
            .into_iter()
            .map(|book| {
                let relevance_score = self.relevance(&book, query);
                SearchHit {
                    book,
                    relevance_score,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        hits
    }
}
