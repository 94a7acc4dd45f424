use crate::models::Book;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum NodeKind {
    Book,
    Person,
    Genre,
}

/// Graph node for a book, author or genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GraphNode {
    #[schema(example = "book_1")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[schema(example = "Database untuk Industri")]
    pub label: String,
    /// Full entry, present on book nodes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Book>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GraphEdge {
    #[schema(example = "book_1")]
    pub source: String,
    #[schema(example = "author_Budi_Santoso")]
    pub target: String,
    #[schema(example = "writtenBy")]
    pub relation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

fn slug(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Build the book / author / genre graph for the given entries. Author and
/// genre nodes are shared between books; entries without a genre get no
/// genre node.
pub fn build_knowledge_graph(books: &[Book]) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::default();
    let mut seen = HashSet::new();

    for book in books {
        let book_id = format!("book_{}", book.id);
        if seen.insert(book_id.clone()) {
            graph.nodes.push(GraphNode {
                id: book_id.clone(),
                kind: NodeKind::Book,
                label: book.title.clone(),
                properties: Some(book.clone()),
            });
        }

        let author_id = format!("author_{}", slug(&book.author));
        if seen.insert(author_id.clone()) {
            graph.nodes.push(GraphNode {
                id: author_id.clone(),
                kind: NodeKind::Person,
                label: book.author.clone(),
                properties: None,
            });
        }
        graph.edges.push(GraphEdge {
            source: book_id.clone(),
            target: author_id,
            relation: "writtenBy".to_string(),
        });

        let Some(genre) = book.genre.as_deref().filter(|g| !g.trim().is_empty()) else {
            continue;
        };
        let genre_id = format!("genre_{}", slug(genre));
        if seen.insert(genre_id.clone()) {
            graph.nodes.push(GraphNode {
                id: genre_id.clone(),
                kind: NodeKind::Genre,
                label: genre.to_string(),
                properties: None,
            });
        }
        graph.edges.push(GraphEdge {
            source: book_id,
            target: genre_id,
            relation: "hasGenre".to_string(),
        });
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::similarity::tests::book;

    #[test]
    fn test_shared_nodes_are_deduplicated() {
        let books = vec![
            book(1, "Budi Santoso", "Science Fiction", "P", 2000),
            book(2, "Budi Santoso", "Science Fiction", "P", 2001),
            book(3, "Siti", "Poetry", "P", 2002),
        ];

        let graph = build_knowledge_graph(&books);

        assert_eq!(graph.nodes.len(), 3 + 2 + 2);
        assert_eq!(graph.edges.len(), 6);
        assert!(graph
            .nodes
            .iter()
            .any(|n| n.id == "author_Budi_Santoso" && n.kind == NodeKind::Person));
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source == "book_2" && e.target == "genre_Science_Fiction"));
    }

    #[test]
    fn test_missing_genre_has_no_genre_edge() {
        let mut entry = book(1, "A", "G", "P", 2000);
        entry.genre = None;

        let graph = build_knowledge_graph(&[entry]);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].relation, "writtenBy");
    }
}
