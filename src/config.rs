//! Diagram configuration.

use serde::Deserialize;

use crate::graph::Size;
use crate::layout::LayoutConfig;
use crate::vars::VariableOrder;

/// Configuration of one diagram.
///
/// Every field has a default, so a host only spells out what it changes:
///
/// ```
/// use logic_diagram::config::DiagramConfig;
/// use logic_diagram::vars::VariableOrder;
///
/// let config = DiagramConfig::from_json(r#"{"variable_order": "length-then-lex", "layout": {"between_layers": 60}}"#).unwrap();
/// assert_eq!(config.variable_order, VariableOrder::LengthThenLex);
/// assert_eq!(config.layout.between_layers, 60.0);
/// assert_eq!(config.layout.same_layer, 120.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Size of every node.
    pub node_size: Size,
    pub layout: LayoutConfig,
    /// Order of variables in the control strip and the assignment.
    pub variable_order: VariableOrder,
}

impl DiagramConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
