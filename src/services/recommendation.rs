use crate::error::{ApiError, Result};
use crate::models::{
    Book, InteractionKind, InteractionRecord, Recommendation, RecommendationMode,
    RecommendationRequest,
};
use crate::services::similarity::SimilarityScorer;
use crate::storage::{BookFilter, CatalogStore};
use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, error, info};

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 100;

const POPULAR_REASON: &str = "Popular based on user interactions";
const COLLABORATIVE_REASON: &str = "Readers with similar interests also explored this book";

/// Builds ranked, explained recommendation lists on top of a catalog store.
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn CatalogStore>,
    scorer: SimilarityScorer,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            scorer: SimilarityScorer::new(),
        }
    }

    /// Dispatch on the requested mode.
    ///
    /// `content` needs a book id and `collaborative` needs a user id; both
    /// are rejected with `InvalidInput` when missing.
    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<Vec<Recommendation>> {
        let limit = request.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let user_id = request
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        info!(
            "Computing {} recommendations (user={:?}, book={:?}, limit={})",
            request.mode, user_id, request.book_id, limit
        );

        match request.mode {
            RecommendationMode::Content => {
                let book_id = request.book_id.ok_or_else(|| {
                    ApiError::InvalidInput(
                        "bookId is required for content-based recommendations".to_string(),
                    )
                })?;
                self.content_based(book_id, limit).await
            }
            RecommendationMode::Collaborative => {
                let user_id = user_id.ok_or_else(|| {
                    ApiError::InvalidInput(
                        "userId is required for collaborative recommendations".to_string(),
                    )
                })?;
                self.collaborative(user_id, limit).await
            }
            RecommendationMode::Hybrid => self.hybrid(user_id, request.book_id, limit).await,
            RecommendationMode::Popular => self.popular(limit).await,
        }
    }

    /// Entries most similar to `book_id`, best first. An unknown target
    /// yields an empty list.
    pub async fn content_based(&self, book_id: i32, limit: usize) -> Result<Vec<Recommendation>> {
        let Some(target) = self.store.get_entry(book_id).await? else {
            debug!("Content-based target {} not found", book_id);
            return Ok(Vec::new());
        };

        let candidates = self.store.list_entries(&BookFilter::all()).await?;
        let mut scored: Vec<Recommendation> = candidates
            .into_iter()
            .filter(|book| book.id != target.id)
            .map(|book| {
                let score = self.scorer.score(&target, &book);
                let reason = self.scorer.explain(&target, &book);
                scored_recommendation(book, score, reason)
            })
            .collect();

        scored.sort_by(|a, b| compare_scores_desc(a.similarity_score, b.similarity_score));
        scored.truncate(limit);
        Ok(scored)
    }

    /// Item co-occurrence over other readers' interactions. Defers to the
    /// popularity ranking when there is no overlap to learn from, and tops up
    /// short lists from it.
    pub async fn collaborative(&self, user_id: &str, limit: usize) -> Result<Vec<Recommendation>> {
        let interactions = self.store.list_interactions(None).await?;
        let candidates = co_occurrence_scores(&interactions, user_id);

        if candidates.is_empty() {
            debug!(
                "No interaction overlap for user {}, falling back to popularity",
                user_id
            );
            return self.popular(limit).await;
        }

        let mut results = Vec::with_capacity(limit);
        for (book_id, strength) in candidates.into_iter().take(limit) {
            if let Some(book) = self.store.get_entry(book_id).await? {
                results.push(scored_recommendation(
                    book,
                    strength,
                    COLLABORATIVE_REASON.to_string(),
                ));
            }
        }

        if results.len() < limit {
            let popular = self.popular(limit).await?;
            results = merge_unique(results.into_iter().chain(popular), limit);
        }
        Ok(results)
    }

    /// Content-based results for `book_id` (when given) followed by
    /// collaborative results, each asked for half the limit rounded up,
    /// deduplicated and truncated.
    pub async fn hybrid(
        &self,
        user_id: Option<&str>,
        book_id: Option<i32>,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let half = limit.div_ceil(2);

        let content = async {
            match book_id {
                Some(id) => self.content_based(id, half).await,
                None => Ok(Vec::new()),
            }
        };
        let collaborative = async {
            match user_id {
                Some(user) => self.collaborative(user, half).await,
                None => self.popular(half).await,
            }
        };

        let (content, collaborative) = futures::try_join!(content, collaborative)?;
        Ok(merge_unique(content.into_iter().chain(collaborative), limit))
    }

    pub async fn popular(&self, limit: usize) -> Result<Vec<Recommendation>> {
        let books = self.store.list_entries(&BookFilter::all()).await?;
        let interactions = self.store.list_interactions(None).await?;
        Ok(rank_by_popularity(books, &interactions, limit))
    }

    /// Best-effort append. Failures are logged and never surface to the
    /// caller.
    pub async fn record_interaction(
        &self,
        user_id: &str,
        book_id: i32,
        kind: InteractionKind,
        rating: Option<i32>,
    ) {
        let record = InteractionRecord::new(user_id, book_id, kind, rating);
        match self.store.append_interaction(&record).await {
            Ok(()) => debug!("Recorded {} by {} on book {}", kind, user_id, book_id),
            Err(e) => error!(
                "Failed to record {} interaction for user {} on book {}: {}",
                kind, user_id, book_id, e
            ),
        }
    }
}

fn scored_recommendation(book: Book, score: f32, reason: String) -> Recommendation {
    Recommendation {
        book,
        similarity_score: Some(score.clamp(0.0, 1.0)),
        interaction_count: None,
        avg_rating: None,
        recommendation_reason: reason,
    }
}

fn compare_scores_desc(a: Option<f32>, b: Option<f32>) -> Ordering {
    b.unwrap_or(0.0).total_cmp(&a.unwrap_or(0.0))
}

/// Higher ratings first; unrated entries after rated ones.
fn compare_ratings_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep the first occurrence of every book id, then truncate.
pub fn merge_unique(
    recommendations: impl IntoIterator<Item = Recommendation>,
    limit: usize,
) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    recommendations
        .into_iter()
        .filter(|rec| seen.insert(rec.book.id))
        .take(limit)
        .collect()
}

/// Rank entries by interaction count, then mean rating. Ties keep the
/// order of `books`.
pub fn rank_by_popularity(
    books: Vec<Book>,
    interactions: &[InteractionRecord],
    limit: usize,
) -> Vec<Recommendation> {
    #[derive(Default)]
    struct Tally {
        count: i64,
        rating_sum: i64,
        rated: i64,
    }

    let mut tallies: HashMap<i32, Tally> = HashMap::new();
    for record in interactions {
        let tally = tallies.entry(record.book_id).or_default();
        tally.count += 1;
        if let Some(rating) = record.rating {
            tally.rating_sum += i64::from(rating);
            tally.rated += 1;
        }
    }

    let mut ranked: Vec<Recommendation> = books
        .into_iter()
        .map(|book| {
            let (count, avg_rating) = match tallies.get(&book.id) {
                Some(t) if t.rated > 0 => (t.count, Some(t.rating_sum as f64 / t.rated as f64)),
                Some(t) => (t.count, None),
                None => (0, None),
            };
            Recommendation {
                book,
                similarity_score: None,
                interaction_count: Some(count),
                avg_rating,
                recommendation_reason: POPULAR_REASON.to_string(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.interaction_count
            .cmp(&a.interaction_count)
            .then_with(|| compare_ratings_desc(a.avg_rating, b.avg_rating))
    });
    ranked.truncate(limit);
    ranked
}

/// Co-occurrence strength of unseen entries for `user_id`, normalised so
/// the strongest candidate scores 1.0. Sorted by strength, then id.
pub fn co_occurrence_scores(interactions: &[InteractionRecord], user_id: &str) -> Vec<(i32, f32)> {
    let seen: HashSet<i32> = interactions
        .iter()
        .filter(|r| r.user_id == user_id)
        .map(|r| r.book_id)
        .collect();
    if seen.is_empty() {
        return Vec::new();
    }

    let neighbours: HashSet<&str> = interactions
        .iter()
        .filter(|r| r.user_id != user_id && seen.contains(&r.book_id))
        .map(|r| r.user_id.as_str())
        .collect();

    // each neighbour counts once per book
    let pairs: HashSet<(&str, i32)> = interactions
        .iter()
        .filter(|r| neighbours.contains(r.user_id.as_str()) && !seen.contains(&r.book_id))
        .map(|r| (r.user_id.as_str(), r.book_id))
        .collect();

    let mut counts: HashMap<i32, u32> = HashMap::new();
    for (_, book_id) in pairs {
        *counts.entry(book_id).or_default() += 1;
    }

    let Some(max) = counts.values().copied().max() else {
        return Vec::new();
    };

    let mut scored: Vec<(i32, f32)> = counts
        .into_iter()
        .map(|(book_id, count)| (book_id, count as f32 / max as f32))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
}
