pub mod catalog;
pub mod entities;
pub mod knowledge_graph;
pub mod recommendation;
pub mod relations;
pub mod relevance;
pub mod search;
pub mod similarity;

// Re-export public types
pub use catalog::{CatalogService, SyncReport};
pub use entities::{to_json_ld, EntityExtractor};
pub use knowledge_graph::{build_knowledge_graph, GraphEdge, GraphNode, KnowledgeGraph, NodeKind};
pub use recommendation::RecommendationEngine;
pub use relations::{BuildReport, RelationBuilder};
pub use relevance::RelevanceRanker;
pub use search::SearchService;
pub use similarity::{FeatureMatches, SimilarityScorer};
