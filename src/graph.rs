//! Expression tree to node/edge graph conversion.
//!
//! Nodes are numbered in pre-order, `n0` for the root. The expression engine
//! numbers the entries of its evaluation result the same way, so the id of a
//! diagram node is also the key of its value in that result.

use serde::{Deserialize, Serialize};

use crate::ast::{node_id, Expr};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(140.0, 90.0)
    }
}

/// Top-left corner of a node.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Leaf,
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub size: Size,
    /// `None` until a layout pass has been applied.
    pub position: Option<Position>,
    pub has_incoming_edge: bool,
    pub has_outgoing_edge: bool,
}

impl GraphNode {
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}-{}", source, target),
            source,
            target,
        }
    }
}

/// A tree-shaped graph: `n` nodes, `n - 1` edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Builds the graph of `tree`, giving every node the same `size`.
    pub fn build(tree: &Expr, size: Size) -> Self {
        let mut nodes = Vec::with_capacity(tree.size());
        let mut edges = Vec::with_capacity(tree.size().saturating_sub(1));

        for visit in tree.preorder() {
            let id = node_id(visit.index);
            let is_leaf = visit.expr.is_leaf();
            if let Some(parent) = visit.parent {
                edges.push(GraphEdge::new(node_id(parent), id.clone()));
            }
            nodes.push(GraphNode {
                id,
                label: visit.expr.label().to_string(),
                kind: if is_leaf { NodeKind::Leaf } else { NodeKind::Internal },
                size,
                position: None,
                has_incoming_edge: visit.parent.is_some(),
                has_outgoing_edge: !is_leaf,
            });
        }

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.first()
    }

    /// Whether every node has been given a position.
    pub fn is_laid_out(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.iter().all(|node| node.position.is_some())
    }

    /// Current positions, in node order.
    pub fn positions(&self) -> Vec<Option<Position>> {
        self.nodes.iter().map(|node| node.position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ROOT_ID;

    fn shapes() -> Vec<Expr> {
        vec![
            Expr::var("A"),
            Expr::not(Expr::var("A")),
            Expr::and(Expr::var("A"), Expr::not(Expr::var("B"))),
            Expr::or(
                Expr::xor(Expr::var("A"), Expr::var("B")),
                Expr::not(Expr::not(Expr::and(Expr::var("C"), Expr::var("A")))),
            ),
        ]
    }

    #[test]
    fn test_root_is_n0() {
        for tree in shapes() {
            let graph = Graph::build(&tree, Size::default());
            let root = graph.root().unwrap();
            assert_eq!(root.id, ROOT_ID);
            assert_eq!(root.label, tree.label());
            assert!(!root.has_incoming_edge);
        }
    }

    #[test]
    fn test_edge_count() {
        for tree in shapes() {
            let graph = Graph::build(&tree, Size::default());
            assert_eq!(graph.nodes.len(), tree.size());
            assert_eq!(graph.edges.len(), tree.size() - 1);
        }
    }

    #[test]
    fn test_single_variable() {
        let graph = Graph::build(&Expr::var("A"), Size::default());
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        let node = &graph.nodes[0];
        assert_eq!(node.kind, NodeKind::Leaf);
        assert!(!node.has_incoming_edge);
        assert!(!node.has_outgoing_edge);
    }

    #[test]
    fn test_ids_and_flags() {
        // AND(A, NOT(B))
        let tree = Expr::and(Expr::var("A"), Expr::not(Expr::var("B")));
        let graph = Graph::build(&tree, Size::new(10.0, 5.0));

        let summary: Vec<_> = graph
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.label.as_str(), n.kind, n.has_incoming_edge, n.has_outgoing_edge))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("n0", "AND", NodeKind::Internal, false, true),
                ("n1", "A", NodeKind::Leaf, true, false),
                ("n2", "NOT", NodeKind::Internal, true, true),
                ("n3", "B", NodeKind::Leaf, true, false),
            ]
        );

        let edges: Vec<_> = graph.edges.iter().map(|e| (e.id.as_str(), e.source.as_str(), e.target.as_str())).collect();
        assert_eq!(edges, vec![("n0-n1", "n0", "n1"), ("n0-n2", "n0", "n2"), ("n2-n3", "n2", "n3")]);

        assert!(graph.nodes.iter().all(|n| n.size == Size::new(10.0, 5.0)));
        assert!(graph.nodes.iter().all(|n| n.position.is_none()));
        assert!(!graph.is_laid_out());
    }
}
