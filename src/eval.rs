//! Evaluation of the current assignment.
//!
//! The pipeline asks the expression engine for the value of every node under
//! one [`Assignment`], and derives from the answer the style of each diagram
//! node and the single [`TruthTableRow`] for that assignment. It never fails:
//! whatever goes wrong, the caller gets an [`Evaluation`], at worst a neutral one.

use std::collections::BTreeMap;

use log::{debug, warn};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::ast::ROOT_ID;
use crate::engine::ExpressionEngine;
use crate::error::EvalError;
use crate::graph::Graph;

/// A value for every variable of the current tree.
///
/// Values are immutable: toggling produces a new assignment, so a changed
/// assignment is always observable by comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment(BTreeMap<String, bool>);

impl Assignment {
    /// Every variable set to `true`.
    pub fn all_true<S: AsRef<str>>(variables: &[S]) -> Self {
        Self(variables.iter().map(|v| (v.as_ref().to_string(), true)).collect())
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// A copy with `name` flipped, or `None` if `name` is not a variable of this assignment.
    pub fn toggled(&self, name: &str) -> Option<Self> {
        let value = self.get(name)?;
        let mut next = self.0.clone();
        next.insert(name.to_string(), !value);
        Some(Self(next))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Style class of a diagram node.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum NodeStyle {
    /// Value unknown.
    #[default]
    Neutral,
    True,
    False,
}

impl NodeStyle {
    pub fn from_value(value: Option<bool>) -> Self {
        match value {
            None => NodeStyle::Neutral,
            Some(true) => NodeStyle::True,
            Some(false) => NodeStyle::False,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            NodeStyle::Neutral => "neutral",
            NodeStyle::True => "true",
            NodeStyle::False => "false",
        }
    }

    /// Background color.
    pub fn fill(self) -> &'static str {
        match self {
            NodeStyle::Neutral => "#eee",
            NodeStyle::True => "#d4edda",
            NodeStyle::False => "#f8d7da",
        }
    }
}

/// The current assignment and the overall value it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruthTableRow {
    pub inputs: Assignment,
    pub output: Option<bool>,
}

/// Node values for one assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    values: BTreeMap<String, bool>,
    row: Option<TruthTableRow>,
}

impl Evaluation {
    /// No values, no row: every node neutral.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn new(values: BTreeMap<String, bool>, inputs: &Assignment) -> Self {
        let output = values.get(ROOT_ID).copied();
        Self {
            values,
            row: Some(TruthTableRow {
                inputs: inputs.clone(),
                output,
            }),
        }
    }

    pub fn value(&self, id: &str) -> Option<bool> {
        self.values.get(id).copied()
    }

    pub fn style(&self, id: &str) -> NodeStyle {
        NodeStyle::from_value(self.value(id))
    }

    /// Value of the whole expression.
    pub fn output(&self) -> Option<bool> {
        self.value(ROOT_ID)
    }

    pub fn truth_table_row(&self) -> Option<&TruthTableRow> {
        self.row.as_ref()
    }

    pub fn is_neutral(&self) -> bool {
        self.values.is_empty() && self.row.is_none()
    }
}

/// Decodes an engine answer for the nodes of `graph`.
///
/// Keys must be ids of nodes in `graph`; anything else means the answer is
/// not about this tree. A `null` value is an undetermined node, same as a
/// missing key.
pub fn decode_result(raw: &str, graph: &Graph) -> Result<BTreeMap<String, bool>, EvalError> {
    let values: BTreeMap<String, Option<bool>> = serde_json::from_str(raw)?;
    if let Some(stray) = values.keys().find(|id| graph.node(id).is_none()) {
        return Err(EvalError::Decode(serde::de::Error::custom(format!(
            "unknown node id `{}`",
            stray
        ))));
    }
    Ok(values.into_iter().filter_map(|(id, value)| Some((id, value?))).collect())
}

/// Evaluates `assignment` for the expression at `index`, propagating failures.
pub fn try_evaluate(
    engine: &dyn ExpressionEngine,
    index: &BigUint,
    graph: &Graph,
    assignment: &Assignment,
) -> Result<Evaluation, EvalError> {
    let raw = engine.evaluate(index, &assignment.to_json())?;
    let values = decode_result(&raw, graph)?;
    debug!("evaluate({}): {} of {} nodes determined", index, values.len(), graph.nodes.len());
    Ok(Evaluation::new(values, assignment))
}

/// Evaluates `assignment` for the expression at `index`.
///
/// Any failure is logged and yields [`Evaluation::neutral`].
pub fn evaluate(engine: &dyn ExpressionEngine, index: &BigUint, graph: &Graph, assignment: &Assignment) -> Evaluation {
    try_evaluate(engine, index, graph, assignment).unwrap_or_else(|e| {
        warn!("evaluation of expression {} failed: {}", index, e);
        Evaluation::neutral()
    })
}
