use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Rating,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Rating => "rating",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionKind::View),
            "rating" => Ok(InteractionKind::Rating),
            other => Err(format!("unknown interaction kind '{}'", other)),
        }
    }
}

/// An append-only user action against a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InteractionRecord {
    pub user_id: String,
    pub book_id: i32,
    pub kind: InteractionKind,
    /// 1..=5, only present for ratings
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    pub fn new(user_id: &str, book_id: i32, kind: InteractionKind, rating: Option<i32>) -> Self {
        Self {
            user_id: user_id.to_string(),
            book_id,
            kind,
            rating,
            created_at: Utc::now(),
        }
    }
}

/// Body of `POST /api/books/rate`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    #[schema(example = "reader-42")]
    pub user_id: Option<String>,
    #[schema(example = 1)]
    pub book_id: Option<i32>,
    #[schema(example = 5, minimum = 1, maximum = 5)]
    pub rating: Option<i32>,
}
