use crate::models::{Book, SimilarityEdge};
use crate::services::similarity::SimilarityScorer;
use crate::storage::CatalogStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Pairs must score strictly above this to be linked.
pub const RELATION_THRESHOLD: f32 = 0.3;

/// Outcome of a linking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BuildReport {
    /// Pairs scored
    pub compared: usize,
    /// New edges written
    pub created: usize,
    /// Pairs above the threshold that were already linked
    pub existing: usize,
    /// Pairs whose lookup or insert failed
    pub failed: usize,
}

impl BuildReport {
    pub fn merge(&mut self, other: BuildReport) {
        self.compared += other.compared;
        self.created += other.created;
        self.existing += other.existing;
        self.failed += other.failed;
    }
}

/// Materialises `similarTo` edges between sufficiently similar entries.
#[derive(Clone)]
pub struct RelationBuilder {
    store: Arc<dyn CatalogStore>,
    scorer: SimilarityScorer,
}

impl RelationBuilder {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            scorer: SimilarityScorer::new(),
        }
    }

    /// Link every unordered pair in `entries`. Safe to re-run: pairs that
    /// already have an edge are left alone.
    pub async fn build(&self, entries: &[Book]) -> BuildReport {
        info!("Building similarity graph over {} entries", entries.len());

        let mut report = BuildReport::default();
        for (i, entry) in entries.iter().enumerate() {
            report.merge(self.link_entry(entry, &entries[i + 1..]).await);
        }

        info!(
            "Similarity graph built: {} compared, {} created, {} existing, {} failed",
            report.compared, report.created, report.existing, report.failed
        );
        report
    }

    /// Compare one entry against `others` and insert the missing edges.
    /// Storage failures are logged and counted, never returned.
    pub async fn link_entry(&self, entry: &Book, others: &[Book]) -> BuildReport {
        let mut report = BuildReport::default();

        for other in others.iter().filter(|other| other.id != entry.id) {
            report.compared += 1;
            let score = self.scorer.score(entry, other);
            if score <= RELATION_THRESHOLD {
                continue;
            }

            match self.store.find_edge(entry.id, other.id).await {
                Ok(Some(_)) => {
                    report.existing += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "Edge lookup failed for ({}, {}): {}",
                        entry.id, other.id, e
                    );
                    report.failed += 1;
                    continue;
                }
            }

            let edge = SimilarityEdge::similar_to(entry.id, other.id, score);
            match self.store.insert_edge(&edge).await {
                Ok(true) => {
                    debug!(
                        "Linked {} <-> {} with confidence {:.2}",
                        edge.from_id, edge.to_id, edge.confidence
                    );
                    report.created += 1;
                }
                // lost a race with a concurrent writer
                Ok(false) => report.existing += 1,
                Err(e) => {
                    warn!(
                        "Failed to persist edge ({}, {}): {}",
                        entry.id, other.id, e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}
