//! Error types.
//!
//! Every failure in this crate degrades to an inert state at the
//! [`controller`][crate::controller] boundary; these enums carry the reason
//! far enough to be logged.

use thiserror::Error;

/// Failures reported by an [`ExpressionEngine`][crate::engine::ExpressionEngine].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The requested expression index is out of range or not a number.
    #[error("invalid index: {0}")]
    InvalidIndex(String),
    /// The engine could not be initialized.
    #[error("engine failed to load: {0}")]
    Load(String),
    /// A request or response payload could not be decoded.
    #[error("malformed engine payload: {0}")]
    Decode(String),
}

/// A raw tree that does not fit the `VAR`/`NOT`/binary shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown node type `{0}`")]
    UnknownType(String),
    #[error("node `{0}` is missing field `{1}`")]
    MissingField(String, &'static str),
}

/// Failures of a layout pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("edge references unknown node `{0}`")]
    UnknownNode(String),
    #[error("layout returned no position for node `{0}`")]
    MissingPosition(String),
    #[error("layout engine failed: {0}")]
    Engine(String),
    #[error("layout request was dropped before completion")]
    Cancelled,
}

/// Failures inside the evaluation pipeline. Never escapes
/// [`evaluate`][crate::eval::evaluate].
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("malformed evaluation result: {0}")]
    Decode(#[from] serde_json::Error),
}
