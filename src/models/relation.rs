use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Label of every edge written by the relation builder.
pub const SIMILAR_TO: &str = "similarTo";

/// Undirected, confidence-scored relation between two catalog entries.
///
/// The pair is stored normalised (`from_id < to_id`) so that `(a, b)` and
/// `(b, a)` describe the same edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SimilarityEdge {
    pub from_id: i32,
    pub to_id: i32,
    #[schema(example = "similarTo")]
    pub relation: String,
    #[schema(example = 0.7)]
    pub confidence: f32,
}

impl SimilarityEdge {
    pub fn similar_to(a: i32, b: i32, confidence: f32) -> Self {
        let (from_id, to_id) = ordered_pair(a, b);
        Self {
            from_id,
            to_id,
            relation: SIMILAR_TO.to_string(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn pair(&self) -> (i32, i32) {
        ordered_pair(self.from_id, self.to_id)
    }
}

pub fn ordered_pair(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_unordered() {
        let edge = SimilarityEdge::similar_to(7, 3, 0.5);
        assert_eq!((edge.from_id, edge.to_id), (3, 7));
        assert_eq!(edge.pair(), ordered_pair(7, 3));
        assert_eq!(edge.relation, SIMILAR_TO);
    }
}
