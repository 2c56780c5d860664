//! # logic-diagram: Interactive Boolean Expression Diagrams
//!
//! **`logic-diagram`** turns a boolean expression into a node-and-edge diagram and keeps that diagram
//! colored by the expression's value as the user flips variables on and off.
//!
//! ## How it fits together
//!
//! An expression is addressed by its **index** in an enumerated space of expressions.
//! An [`ExpressionEngine`][crate::engine::ExpressionEngine] resolves the index into a tree,
//! and the rest of the pipeline is driven from there:
//!
//! - **Variables**: the distinct variable names of the tree, in a stable order ([`vars`]).
//! - **Graph**: one node per tree node, ids `n0`, `n1`, ... in pre-order, one edge per parent/child pair ([`graph`]).
//! - **Layout**: positions from an asynchronous [`LayoutEngine`][crate::layout::LayoutEngine];
//!   stale results are discarded ([`layout`]).
//! - **Evaluation**: node values for the current assignment, shown as green (true), red (false) or grey (unknown) ([`eval`]).
//! - **Interaction**: a small state machine that ties the above together and handles toggles ([`controller`]).
//!
//! Every variable starts out `true`. Toggling a variable recolors the diagram; it never moves a node.
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use num_bigint::BigUint;
//! use logic_diagram::config::DiagramConfig;
//! use logic_diagram::controller::{Diagram, LayoutOutcome};
//! use logic_diagram::enumerate::Enumerator;
//! use logic_diagram::layout::LayeredLayout;
//!
//! let diagram = Diagram::new(Rc::new(Enumerator::with_limits(8, 8)), Rc::new(LayeredLayout), DiagramConfig::default());
//!
//! // Expression #16 is AND(A,NOT(B))
//! let outcome = futures::executor::block_on(diagram.show(&BigUint::from(16u32)));
//! assert_eq!(outcome, Ok(LayoutOutcome::Applied));
//! assert_eq!(diagram.controller().output(), Some(false));
//!
//! // B = false makes NOT(B) true, and so the whole expression
//! diagram.toggle("B");
//! assert_eq!(diagram.controller().output(), Some(true));
//! ```
//!
//! ## Core Components
//!
//! - **[`ast`]**: The expression tree and its JSON form.
//! - **[`enumerate`]**: The built-in engine, ranking every expression up to a size bound.
//! - **[`controller`]**: [`DiagramController`][crate::controller::DiagramController] and its async driver.
//! - **[`dot`]**: Exporting the diagram to Graphviz.

pub mod ast;
pub mod config;
pub mod controller;
pub mod dot;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod eval;
pub mod graph;
pub mod layout;
pub mod vars;
