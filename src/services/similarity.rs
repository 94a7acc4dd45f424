use crate::models::Book;

const AUTHOR_WEIGHT: f32 = 0.4;
const GENRE_WEIGHT: f32 = 0.3;
const PUBLISHER_WEIGHT: f32 = 0.1;
const YEAR_WEIGHT: f32 = 0.2;

/// Maximum publication-year gap that still counts as "close".
const YEAR_WINDOW: u32 = 3;

/// Which features two entries share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureMatches {
    pub author: bool,
    pub genre: bool,
    pub publisher: bool,
    /// Gap in years, set only when within the window
    pub year_gap: Option<u32>,
}

/// Fixed-weight additive similarity between two catalog entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

/// Equal and non-blank. Blank values never match, so two entries without a
/// publisher do not earn the publisher weight.
fn same_value(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => !a.trim().is_empty() && a == b,
        _ => false,
    }
}

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn matches(&self, a: &Book, b: &Book) -> FeatureMatches {
        let year_gap = match (a.publication_year, b.publication_year) {
            (Some(x), Some(y)) => Some(x.abs_diff(y)).filter(|gap| *gap <= YEAR_WINDOW),
            _ => None,
        };

        FeatureMatches {
            author: same_value(Some(&a.author), Some(&b.author)),
            genre: same_value(a.genre.as_deref(), b.genre.as_deref()),
            publisher: same_value(a.publisher.as_deref(), b.publisher.as_deref()),
            year_gap,
        }
    }

    /// Similarity in `[0, 1]`. Symmetric, never fails.
    pub fn score(&self, a: &Book, b: &Book) -> f32 {
        let matches = self.matches(a, b);
        let mut score = 0.0;

        if matches.author {
            score += AUTHOR_WEIGHT;
        }
        if matches.genre {
            score += GENRE_WEIGHT;
        }
        if matches.publisher {
            score += PUBLISHER_WEIGHT;
        }
        if matches.year_gap.is_some() {
            score += YEAR_WEIGHT;
        }

        f32::min(score, 1.0)
    }

    /// Human-readable justification for recommending `candidate` to a reader
    /// of `target`.
    pub fn explain(&self, target: &Book, candidate: &Book) -> String {
        let matches = self.matches(target, candidate);
        let mut reasons = Vec::new();

        if matches.author {
            reasons.push(format!("Same author: {}", target.author));
        }
        if matches.genre {
            reasons.push(format!(
                "Same genre: {}",
                target.genre.as_deref().unwrap_or_default()
            ));
        }
        if matches.publisher {
            reasons.push(format!(
                "Same publisher: {}",
                target.publisher.as_deref().unwrap_or_default()
            ));
        }
        if let Some(gap) = matches.year_gap {
            let unit = if gap == 1 { "year" } else { "years" };
            reasons.push(format!("Close publication year ({} {} apart)", gap, unit));
        }

        if reasons.is_empty() {
            return "Similar content based on semantic analysis".to_string();
        }
        reasons.join(", ")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn book(id: i32, author: &str, genre: &str, publisher: &str, year: i32) -> Book {
        Book {
            id,
            title: format!("Book {}", id),
            author: author.to_string(),
            isbn: None,
            publication_year: Some(year),
            publisher: Some(publisher.to_string()),
            page_count: Some(200),
            genre: Some(genre.to_string()),
            description: None,
            cover_url: None,
            semantic_data: None,
            created_at: Utc::now(),
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_same_author_genre_close_year() {
        let scorer = SimilarityScorer::new();
        let a = book(1, "X", "Fiction", "Gramedia", 2000);
        let b = book(2, "X", "Fiction", "Erlangga", 2001);

        assert!(approx(scorer.score(&a, &b), 0.9));
    }

    #[test]
    fn test_same_author_only() {
        let scorer = SimilarityScorer::new();
        let a = book(1, "X", "Fiction", "Gramedia", 2000);
        let b = book(2, "X", "SciFi", "Erlangga", 2010);

        assert!(approx(scorer.score(&a, &b), 0.4));
    }

    #[test]
    fn test_self_similarity_is_one() {
        let scorer = SimilarityScorer::new();
        let a = book(1, "X", "Fiction", "Gramedia", 2000);

        assert_eq!(scorer.score(&a, &a), 1.0);
    }

    #[test]
    fn test_symmetry_and_bounds() {
        let scorer = SimilarityScorer::new();
        let books = vec![
            book(1, "X", "Fiction", "Gramedia", 2000),
            book(2, "X", "SciFi", "Gramedia", 2003),
            book(3, "Y", "Fiction", "Erlangga", 1990),
            book(4, "Y", "Fiction", "", 2004),
        ];

        for a in &books {
            for b in &books {
                let ab = scorer.score(a, b);
                assert!((0.0..=1.0).contains(&ab));
                assert_eq!(ab, scorer.score(b, a));
            }
        }
    }

    #[test]
    fn test_missing_fields_never_match() {
        let scorer = SimilarityScorer::new();
        let mut a = book(1, "X", "Fiction", "", 2000);
        let mut b = book(2, "Y", "Drama", "", 2000);
        a.publication_year = None;
        b.genre = None;

        // blank publishers and a missing year contribute nothing
        assert_eq!(scorer.score(&a, &b), 0.0);

        a.genre = None;
        assert_eq!(scorer.score(&a, &b), 0.0);
    }

    #[test]
    fn test_year_window_boundary() {
        let scorer = SimilarityScorer::new();
        let a = book(1, "X", "G1", "P1", 2000);

        assert!(approx(scorer.score(&a, &book(2, "Y", "G2", "P2", 2003)), 0.2));
        assert_eq!(scorer.score(&a, &book(3, "Y", "G2", "P2", 2004)), 0.0);
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let scorer = SimilarityScorer::new();
        let min = book(1, "X", "G1", "P1", i32::MIN);
        let max = book(2, "Y", "G2", "P2", i32::MAX);
        let zero = book(3, "Z", "G3", "P3", 0);

        assert_eq!(scorer.score(&min, &zero), 0.0);
        assert_eq!(scorer.score(&min, &max), 0.0);
        assert_eq!(scorer.score(&max, &min), 0.0);
        assert_eq!(scorer.matches(&min, &max).year_gap, None);
        // two years apart at the lower bound
        assert!(approx(scorer.score(&min, &book(4, "W", "G4", "P4", i32::MIN + 2)), 0.2));
    }

    #[test]
    fn test_explanation_order_and_fallback() {
        let scorer = SimilarityScorer::new();
        let a = book(1, "X", "Fiction", "Gramedia", 2000);
        let b = book(2, "X", "Fiction", "Gramedia", 2002);

        assert_eq!(
            scorer.explain(&a, &b),
            "Same author: X, Same genre: Fiction, Same publisher: Gramedia, \
             Close publication year (2 years apart)"
        );

        let c = book(3, "Z", "Poetry", "Mizan", 1980);
        assert_eq!(
            scorer.explain(&a, &c),
            "Similar content based on semantic analysis"
        );
    }
}
