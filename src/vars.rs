//! Variable extraction.
//!
//! The control strip and the assignment map both list the variables of the
//! current tree. Their order is a fixed contract chosen by [`VariableOrder`].

use std::collections::HashSet;

use serde::Deserialize;

use crate::ast::Expr;

/// Display order of extracted variables.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableOrder {
    /// Order of first occurrence in a left-to-right pre-order walk.
    #[default]
    FirstSeen,
    /// Shorter names first, then lexicographic (`A, B, ..., Z, AA, AB, ...`).
    LengthThenLex,
}

/// Unique variable names referenced by `tree`, in the given order.
///
/// An absent tree has no variables.
pub fn extract_variables(tree: Option<&Expr>, order: VariableOrder) -> Vec<String> {
    let Some(tree) = tree else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut vars: Vec<String> = tree
        .preorder()
        .filter_map(|visit| match visit.expr {
            Expr::Variable(name) if seen.insert(name.as_str()) => Some(name.clone()),
            _ => None,
        })
        .collect();

    if order == VariableOrder::LengthThenLex {
        vars.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    }
    vars
}
