//! Boolean expression trees.
//!
//! An [`Expr`] is the normalized form of a tree received from an expression
//! engine. Raw trees arrive in a loosely-typed JSON shape where a leaf may be
//! either a bare string (`"A"`) or a tagged object (`{"type":"VAR","value":"A"}`).
//! Both are folded into [`Expr::Variable`] at deserialization time, so nothing
//! downstream ever looks at the raw shape again.
//!
//! ```
//! use logic_diagram::ast::Expr;
//!
//! let e: Expr = serde_json::from_str(r#"{"type":"AND","left":"A","right":{"type":"NOT","child":"B"}}"#).unwrap();
//! assert_eq!(e.to_string(), "AND(A,NOT(B))");
//! assert_eq!(e.size(), 4);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// Id of the root node in both the diagram and the evaluation result.
pub const ROOT_ID: &str = "n0";

/// Id of the `index`-th node in pre-order.
pub fn node_id(index: usize) -> String {
    format!("n{}", index)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryKind {
    And,
    Or,
    Xor,
}

impl BinaryKind {
    /// Operator choices in the order the enumerator indexes them.
    pub const ALL: [BinaryKind; 3] = [BinaryKind::And, BinaryKind::Or, BinaryKind::Xor];

    pub fn name(self) -> &'static str {
        match self {
            BinaryKind::And => "AND",
            BinaryKind::Or => "OR",
            BinaryKind::Xor => "XOR",
        }
    }

    pub fn apply(self, lhs: bool, rhs: bool) -> bool {
        match self {
            BinaryKind::And => lhs && rhs,
            BinaryKind::Or => lhs || rhs,
            BinaryKind::Xor => lhs ^ rhs,
        }
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BinaryKind {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(BinaryKind::And),
            "OR" => Ok(BinaryKind::Or),
            "XOR" => Ok(BinaryKind::Xor),
            _ => Err(TreeError::UnknownType(s.to_string())),
        }
    }
}

/// A boolean expression tree. Finite, acyclic, and never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum Expr {
    Variable(String),
    Not(Box<Expr>),
    BinaryOp(BinaryKind, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    /// Negation. Unlike a simplifying constructor, `NOT(NOT(x))` is kept as is:
    /// every operator occupies its own diagram node.
    pub fn not(child: Self) -> Self {
        Expr::Not(Box::new(child))
    }

    pub fn binary(kind: BinaryKind, lhs: Self, rhs: Self) -> Self {
        Expr::BinaryOp(kind, Box::new(lhs), Box::new(rhs))
    }

    pub fn and(lhs: Self, rhs: Self) -> Self {
        Self::binary(BinaryKind::And, lhs, rhs)
    }

    pub fn or(lhs: Self, rhs: Self) -> Self {
        Self::binary(BinaryKind::Or, lhs, rhs)
    }

    pub fn xor(lhs: Self, rhs: Self) -> Self {
        Self::binary(BinaryKind::Xor, lhs, rhs)
    }

    /// Parses a raw JSON tree.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        // An `Expr` always maps onto a plain JSON value.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Expr::Variable(_))
    }

    /// Variable name for leaves, operator name for internal nodes.
    pub fn label(&self) -> &str {
        match self {
            Expr::Variable(name) => name,
            Expr::Not(_) => "NOT",
            Expr::BinaryOp(kind, _, _) => kind.name(),
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Variable(_) => vec![],
            Expr::Not(child) => vec![child.as_ref()],
            Expr::BinaryOp(_, lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Variable(_) => 1,
            Expr::Not(child) => 1 + child.size(),
            Expr::BinaryOp(_, lhs, rhs) => 1 + lhs.size() + rhs.size(),
        }
    }

    /// Depth of the tree (0 for a single leaf).
    pub fn depth(&self) -> usize {
        match self {
            Expr::Variable(_) => 0,
            Expr::Not(child) => 1 + child.depth(),
            Expr::BinaryOp(_, lhs, rhs) => 1 + lhs.depth().max(rhs.depth()),
        }
    }

    /// Pre-order traversal. The `index` of each visit is the node's position in
    /// the `n0, n1, ...` numbering shared by the diagram and evaluation results.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            stack: vec![(self, None)],
            next: 0,
        }
    }

    /// Value of the whole expression, or `None` if some variable it needs is unassigned.
    pub fn eval<F>(&self, lookup: &F) -> Option<bool>
    where
        F: Fn(&str) -> Option<bool>,
    {
        match self {
            Expr::Variable(name) => lookup(name),
            Expr::Not(child) => child.eval(lookup).map(|v| !v),
            Expr::BinaryOp(kind, lhs, rhs) => {
                let a = lhs.eval(lookup);
                let b = rhs.eval(lookup);
                a.zip(b).map(|(a, b)| kind.apply(a, b))
            }
        }
    }

    /// Value of every subexpression, indexed in pre-order.
    pub fn eval_all<F>(&self, lookup: &F) -> Vec<Option<bool>>
    where
        F: Fn(&str) -> Option<bool>,
    {
        fn go<F: Fn(&str) -> Option<bool>>(e: &Expr, lookup: &F, out: &mut Vec<Option<bool>>) -> Option<bool> {
            let i = out.len();
            out.push(None);
            let value = match e {
                Expr::Variable(name) => lookup(name),
                Expr::Not(child) => go(child, lookup, out).map(|v| !v),
                Expr::BinaryOp(kind, lhs, rhs) => {
                    let a = go(lhs, lookup, out);
                    let b = go(rhs, lookup, out);
                    a.zip(b).map(|(a, b)| kind.apply(a, b))
                }
            };
            out[i] = value;
            value
        }

        let mut out = Vec::with_capacity(self.size());
        go(self, lookup, &mut out);
        out
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Not(child) => write!(f, "NOT({})", child),
            Expr::BinaryOp(kind, lhs, rhs) => write!(f, "{}({},{})", kind, lhs, rhs),
        }
    }
}

/// One step of a pre-order walk.
#[derive(Debug, Copy, Clone)]
pub struct Visit<'a> {
    pub index: usize,
    pub parent: Option<usize>,
    pub expr: &'a Expr,
}

pub struct Preorder<'a> {
    stack: Vec<(&'a Expr, Option<usize>)>,
    next: usize,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (expr, parent) = self.stack.pop()?;
        let index = self.next;
        self.next += 1;
        for child in expr.children().into_iter().rev() {
            self.stack.push((child, Some(index)));
        }
        Some(Visit { index, parent, expr })
    }
}

/// A tree as returned by an engine, paired with its display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub expr: String,
    pub tree: Expr,
}

// Wire shape of a tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawNode {
    Name(String),
    Tagged(RawTagged),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTagged {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    child: Option<Box<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    left: Option<Box<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    right: Option<Box<RawNode>>,
}

impl TryFrom<RawNode> for Expr {
    type Error = TreeError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let node = match raw {
            RawNode::Name(name) => return Ok(Expr::Variable(name)),
            RawNode::Tagged(node) => node,
        };
        let field = |slot: Option<Box<RawNode>>, name: &'static str| -> Result<Expr, TreeError> {
            let raw = slot.ok_or_else(|| TreeError::MissingField(node.kind.clone(), name))?;
            Expr::try_from(*raw)
        };
        match node.kind.as_str() {
            "VAR" => {
                let name = node.value.ok_or_else(|| TreeError::MissingField(node.kind.clone(), "value"))?;
                Ok(Expr::Variable(name))
            }
            "NOT" => Ok(Expr::not(field(node.child, "child")?)),
            other => {
                let kind = other.parse::<BinaryKind>()?;
                let lhs = field(node.left, "left")?;
                let rhs = field(node.right, "right")?;
                Ok(Expr::binary(kind, lhs, rhs))
            }
        }
    }
}

impl From<Expr> for RawNode {
    fn from(expr: Expr) -> Self {
        let tagged = |kind: &str| RawTagged {
            kind: kind.to_string(),
            value: None,
            child: None,
            left: None,
            right: None,
        };
        match expr {
            Expr::Variable(name) => RawNode::Name(name),
            Expr::Not(child) => RawNode::Tagged(RawTagged {
                child: Some(Box::new(RawNode::from(*child))),
                ..tagged("NOT")
            }),
            Expr::BinaryOp(kind, lhs, rhs) => RawNode::Tagged(RawTagged {
                left: Some(Box::new(RawNode::from(*lhs))),
                right: Some(Box::new(RawNode::from(*rhs))),
                ..tagged(kind.name())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Expr {
        // AND(A, NOT(B))
        Expr::and(Expr::var("A"), Expr::not(Expr::var("B")))
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "AND(A,NOT(B))");
        assert_eq!(Expr::var("C").to_string(), "C");
        assert_eq!(Expr::xor(Expr::var("A"), Expr::var("AB")).to_string(), "XOR(A,AB)");
    }

    #[test]
    fn test_size_depth() {
        assert_eq!(Expr::var("A").size(), 1);
        assert_eq!(Expr::var("A").depth(), 0);
        assert_eq!(sample().size(), 4);
        assert_eq!(sample().depth(), 2);
    }

    #[test]
    fn test_double_negation_is_kept() {
        let e = Expr::not(Expr::not(Expr::var("A")));
        assert_eq!(e.size(), 3);
        assert_eq!(e.to_string(), "NOT(NOT(A))");
    }

    #[test]
    fn test_parse_bare_and_tagged_leaves() {
        let bare = Expr::from_json(r#"{"type":"OR","left":"A","right":"B"}"#).unwrap();
        let tagged = Expr::from_json(
            r#"{"type":"OR","left":{"type":"VAR","value":"A"},"right":{"type":"VAR","value":"B"}}"#,
        )
        .unwrap();
        assert_eq!(bare, tagged);
        assert_eq!(bare, Expr::or(Expr::var("A"), Expr::var("B")));
    }

    #[test]
    fn test_parse_bare_root() {
        assert_eq!(Expr::from_json(r#""A""#).unwrap(), Expr::var("A"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Expr::from_json(r#"{"type":"NAND","left":"A","right":"B"}"#).is_err());
        assert!(Expr::from_json(r#"{"type":"NOT"}"#).is_err());
        assert!(Expr::from_json(r#"{"type":"AND","left":"A"}"#).is_err());
        assert!(Expr::from_json(r#"{"type":"VAR"}"#).is_err());
        assert!(Expr::from_json("42").is_err());
    }

    #[test]
    fn test_json_uses_minimal_shape() {
        let json = sample().to_json();
        assert_eq!(json, r#"{"type":"AND","left":"A","right":{"type":"NOT","child":"B"}}"#);
        assert_eq!(Expr::from_json(&json).unwrap(), sample());
    }

    #[test]
    fn test_tree_document() {
        let doc: TreeDocument = serde_json::from_str(r#"{"expr":"NOT(A)","tree":{"type":"NOT","child":"A"}}"#).unwrap();
        assert_eq!(doc.expr, "NOT(A)");
        assert_eq!(doc.tree, Expr::not(Expr::var("A")));
    }

    #[test]
    fn test_preorder() {
        let visits: Vec<_> = sample().preorder().map(|v| (v.index, v.parent, v.expr.label().to_string())).collect();
        assert_eq!(
            visits,
            vec![
                (0, None, "AND".to_string()),
                (1, Some(0), "A".to_string()),
                (2, Some(0), "NOT".to_string()),
                (3, Some(2), "B".to_string()),
            ]
        );
    }

    #[test]
    fn test_eval() {
        let e = sample();
        let lookup = |name: &str| match name {
            "A" => Some(true),
            "B" => Some(false),
            _ => None,
        };
        assert_eq!(e.eval(&lookup), Some(true));
        assert_eq!(e.eval_all(&lookup), vec![Some(true), Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn test_eval_unassigned() {
        let e = sample();
        let lookup = |name: &str| if name == "A" { Some(true) } else { None };
        assert_eq!(e.eval(&lookup), None);
        assert_eq!(e.eval_all(&lookup), vec![None, Some(true), None, None]);
    }
}
