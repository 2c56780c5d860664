//! The expression engine contract.
//!
//! An engine owns the space of expressions: it knows how many there are,
//! renders any of them by index, hands out its parsed tree, and evaluates it
//! under a variable assignment. [`Enumerator`][crate::enumerate::Enumerator]
//! is the built-in implementation; hosts may plug in their own.
//!
//! Engines are often expensive to bring up. [`EngineLoader`] turns a loading
//! routine into a one-shot, shared handle: the first [`acquire`][EngineLoader::acquire]
//! starts the load, every concurrent caller awaits the same in-flight load, and
//! [`teardown`][EngineLoader::teardown] releases it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use log::debug;
use num_bigint::BigUint;

use crate::ast::TreeDocument;
use crate::error::EngineError;

/// Placeholder shown in place of an expression that does not exist.
pub const INVALID_INDEX: &str = "Invalid index";

pub trait ExpressionEngine {
    /// Total number of expressions.
    fn count(&self) -> BigUint;

    /// Text of the expression at `index`.
    fn expression_text(&self, index: &BigUint) -> Result<String, EngineError>;

    /// Text and tree of the expression at `index`.
    fn expression_tree(&self, index: &BigUint) -> Result<TreeDocument, EngineError>;

    /// Evaluates the expression at `index`.
    ///
    /// `assignment` is a JSON object mapping variable names to booleans. The
    /// answer is a JSON object mapping pre-order node ids (`"n0"` for the root)
    /// to booleans; nodes whose value cannot be determined are left out.
    fn evaluate(&self, index: &BigUint, assignment: &str) -> Result<String, EngineError>;
}

/// Reference-counted engine handle.
pub type EngineHandle = Rc<dyn ExpressionEngine>;

/// Parses a user-entered index. Only plain decimal digits are accepted,
/// with no sign and no surrounding whitespace.
pub fn parse_index(input: &str) -> Option<BigUint> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

/// Text of the expression at `index`, or [`INVALID_INDEX`].
pub fn describe(engine: &dyn ExpressionEngine, index: &BigUint) -> String {
    match engine.expression_text(index) {
        Ok(text) => text,
        Err(e) => {
            debug!("describe({}): {}", index, e);
            INVALID_INDEX.to_string()
        }
    }
}

/// Like [`describe`], for raw user input.
pub fn describe_input(engine: &dyn ExpressionEngine, input: &str) -> String {
    match parse_index(input) {
        Some(index) => describe(engine, &index),
        None => INVALID_INDEX.to_string(),
    }
}

type LoadFuture = Shared<LocalBoxFuture<'static, Result<EngineHandle, EngineError>>>;
type LoadFn = dyn Fn() -> LocalBoxFuture<'static, Result<EngineHandle, EngineError>>;

/// One-shot, shared engine initialization.
pub struct EngineLoader {
    load: Box<LoadFn>,
    slot: RefCell<Option<LoadFuture>>,
}

impl EngineLoader {
    pub fn new<F>(load: F) -> Self
    where
        F: Fn() -> LocalBoxFuture<'static, Result<EngineHandle, EngineError>> + 'static,
    {
        Self {
            load: Box::new(load),
            slot: RefCell::new(None),
        }
    }

    /// Loader for an engine that is ready immediately.
    pub fn ready(engine: EngineHandle) -> Self {
        Self::new(move || futures::future::ready(Ok(engine.clone())).boxed_local())
    }

    /// Returns the engine, loading it first if nobody has yet.
    ///
    /// A failed load is forgotten, so the next call tries again.
    pub async fn acquire(&self) -> Result<EngineHandle, EngineError> {
        let pending = self.pending();
        let result = pending.clone().await;
        if result.is_err() {
            let mut slot = self.slot.borrow_mut();
            // Only forget the load we awaited, not a newer one.
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
                *slot = None;
            }
        }
        result
    }

    fn pending(&self) -> LoadFuture {
        let mut slot = self.slot.borrow_mut();
        slot.get_or_insert_with(|| {
            debug!("loading expression engine");
            (self.load)().shared()
        })
        .clone()
    }

    /// Whether a load has been started and not torn down.
    pub fn is_loaded(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Drops the cached engine. Handles already given out stay valid.
    pub fn teardown(&self) {
        if self.slot.borrow_mut().take().is_some() {
            debug!("expression engine released");
        }
    }
}

impl fmt::Debug for EngineLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLoader").field("loaded", &self.is_loaded()).finish()
    }
}
