//! Graph to DOT (Graphviz) conversion.
//!
//! The generated DOT output follows these conventions:
//! - **Leaves** (variables) are rendered as circles in the bottom-most rank
//! - **Operators** are rendered as boxes labelled `AND`, `OR`, `XOR` or `NOT`
//! - **Colors** follow an [`Evaluation`], if one is given: green for true,
//!   red for false, grey for unknown
//! - **Positions**, once a layout has been applied, are emitted as pinned
//!   `pos` attributes so `neato -n` reproduces the diagram exactly
//!
//! # Examples
//!
//! ```
//! use logic_diagram::ast::Expr;
//! use logic_diagram::graph::{Graph, Size};
//!
//! let tree = Expr::and(Expr::var("A"), Expr::not(Expr::var("B")));
//! let graph = Graph::build(&tree, Size::default());
//!
//! let dot = graph.to_dot(None).unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("digraph {"));
//! ```

use std::fmt::Write as _;

use crate::eval::Evaluation;
use crate::graph::{Graph, NodeKind};

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for leaf nodes (default: "circle")
    pub leaf_shape: &'static str,
    /// Shape for operator nodes (default: "box")
    pub operator_shape: &'static str,
    /// Whether to emit pinned positions of laid-out nodes (default: true)
    pub pin_positions: bool,
    /// Points per layout unit when pinning positions (default: 1.0)
    pub scale: f64,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            leaf_shape: "circle",
            operator_shape: "box",
            pin_positions: true,
            scale: 1.0,
        }
    }
}

impl Graph {
    /// Converts the graph to DOT format, colored by `evaluation` if given.
    pub fn to_dot(&self, evaluation: Option<&Evaluation>) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(evaluation, &DotConfig::default())
    }

    pub fn to_dot_with_config(&self, evaluation: Option<&Evaluation>, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [style=filled];")?;

        for node in &self.nodes {
            let shape = match node.kind {
                NodeKind::Leaf => config.leaf_shape,
                NodeKind::Internal => config.operator_shape,
            };
            let style = evaluation.map(|e| e.style(&node.id)).unwrap_or_default();
            write!(
                dot,
                "{} [label=\"{}\", shape={}, fillcolor=\"{}\"",
                node.id,
                node.label,
                shape,
                style.fill()
            )?;
            if let (true, Some(pos)) = (config.pin_positions, node.position) {
                // Graphviz has y pointing up.
                write!(dot, ", pos=\"{},{}!\"", pos.x * config.scale, -pos.y * config.scale)?;
            }
            writeln!(dot, "];")?;
        }

        // Leaves share the bottom rank
        let leaves: Vec<&str> = self.nodes.iter().filter(|n| n.is_leaf()).map(|n| n.id.as_str()).collect();
        if leaves.len() > 1 {
            writeln!(dot, "{{ rank=sink; {}; }}", leaves.join("; "))?;
        }

        for edge in &self.edges {
            writeln!(dot, "{} -> {};", edge.source, edge.target)?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
