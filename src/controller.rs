//! Interaction controller.
//!
//! A [`DiagramController`] owns everything one diagram shows: the tree, its
//! graph, node positions, the variable assignment and the current evaluation.
//! It is a small state machine:
//!
//! ```text
//!            begin                 finish_layout (live, ok)
//!   Idle ───────────▶ Building ─────────────────────────▶ Ready
//!    ▲                 │   ▲ begin (cancels the            │
//!    │ finish_layout   │   │ in-flight layout)             │ begin
//!    │ (failed)        │   └───────────────────────────────┘
//!    └─────────────────┘
//!
//!   any state ── teardown ──▶ Terminated
//! ```
//!
//! - `begin` (a new tree) rebuilds the graph, resets every variable to `true`
//!   and hands out a [`LayoutJob`]. The previous job's [`Liveness`] is
//!   cancelled, so its result is discarded whenever it arrives.
//! - `finish_layout` applies positions only for the live job. Positions stay
//!   fixed until the next `begin`.
//! - `toggle`/`click` replace the assignment. In `Ready` the evaluation is
//!   recomputed at once; in `Building` it is computed when layout completes,
//!   for whatever the assignment is by then. Toggles never request a layout.
//!
//! [`Diagram`] drives a controller from async code: it fetches the tree,
//! submits the layout, awaits it without holding the controller, and feeds the
//! result back. After an applied layout it runs the host's center-viewport
//! hook, again without holding the controller, so the hook may read it.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use log::{debug, error, warn};
use num_bigint::BigUint;

use crate::ast::{Expr, TreeDocument};
use crate::config::DiagramConfig;
use crate::engine::{EngineHandle, INVALID_INDEX};
use crate::error::{EngineError, LayoutError};
use crate::eval::{self, Assignment, Evaluation, NodeStyle, TruthTableRow};
use crate::graph::{Graph, GraphEdge, GraphNode, NodeKind, Position, Size};
use crate::layout::{LayoutEngine, LayoutRequest, Liveness, Positions};
use crate::vars::extract_variables;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DiagramState {
    /// No tree loaded.
    Idle,
    /// Waiting for the layout of the current tree.
    Building,
    /// Positions fixed; toggles re-evaluate.
    Ready,
    /// Torn down; nothing is applied anymore.
    Terminated,
}

/// A layout request for one tree, with the flag that says whether its result is still wanted.
#[derive(Debug, Clone)]
pub struct LayoutJob {
    pub request: LayoutRequest,
    liveness: Liveness,
}

impl LayoutJob {
    pub fn is_live(&self) -> bool {
        self.liveness.is_alive()
    }
}

/// What happened to a finished layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LayoutOutcome {
    /// Positions applied; the diagram is ready.
    Applied,
    /// The job was stale; nothing changed.
    Discarded,
    /// The layout failed; the diagram was cleared.
    Failed,
}

/// A click on a diagram node, as reported by the rendering layer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NodeClick {
    pub id: String,
    pub label: String,
    pub has_incoming_edge: bool,
    pub has_outgoing_edge: bool,
}

impl From<&GraphNode> for NodeClick {
    fn from(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
            has_incoming_edge: node.has_incoming_edge,
            has_outgoing_edge: node.has_outgoing_edge,
        }
    }
}

/// A node as handed to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub position: Option<Position>,
    pub size: Size,
    pub style: NodeStyle,
}

impl RenderNode {
    pub fn style_class(&self) -> &'static str {
        self.style.class()
    }
}

/// One button of the control strip.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Control {
    pub variable: String,
    pub value: bool,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, if self.value { "ON" } else { "OFF" })
    }
}

type ViewportHook = Box<dyn FnMut(&Graph)>;

pub struct DiagramController {
    engine: EngineHandle,
    config: DiagramConfig,
    state: DiagramState,
    liveness: Option<Liveness>,
    index: Option<BigUint>,
    text: Option<String>,
    tree: Option<Expr>,
    variables: Vec<String>,
    graph: Graph,
    assignment: Assignment,
    evaluation: Evaluation,
    /// Assignment the current `evaluation` was computed for.
    evaluated: Option<Assignment>,
}

impl DiagramController {
    pub fn new(engine: EngineHandle, config: DiagramConfig) -> Self {
        Self {
            engine,
            config,
            state: DiagramState::Idle,
            liveness: None,
            index: None,
            text: None,
            tree: None,
            variables: Vec::new(),
            graph: Graph::default(),
            assignment: Assignment::default(),
            evaluation: Evaluation::neutral(),
            evaluated: None,
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn state(&self) -> DiagramState {
        self.state
    }

    pub fn index(&self) -> Option<&BigUint> {
        self.index.as_ref()
    }

    /// Expression text, or the invalid-index placeholder after a rejected index.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn tree(&self) -> Option<&Expr> {
        self.tree.as_ref()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.graph.edges
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Value of the whole expression under the current assignment.
    pub fn output(&self) -> Option<bool> {
        self.evaluation.output()
    }

    pub fn truth_table_row(&self) -> Option<&TruthTableRow> {
        self.evaluation.truth_table_row()
    }

    pub fn render_nodes(&self) -> Vec<RenderNode> {
        self.graph
            .nodes
            .iter()
            .map(|node| RenderNode {
                id: node.id.clone(),
                label: node.label.clone(),
                kind: node.kind,
                position: node.position,
                size: node.size,
                style: self.evaluation.style(&node.id),
            })
            .collect()
    }

    /// The control strip: one entry per variable, in extraction order.
    pub fn controls(&self) -> Vec<Control> {
        self.variables
            .iter()
            .map(|v| Control {
                variable: v.clone(),
                value: self.assignment.get(v).unwrap_or(false),
            })
            .collect()
    }

    /// Whether clicking this node toggles a variable: a leaf below some
    /// operator whose label is a known variable.
    pub fn is_click_toggleable(&self, click: &NodeClick) -> bool {
        !click.has_outgoing_edge && click.has_incoming_edge && self.assignment.contains(&click.label)
    }

    /// Loads a new tree. Returns the layout to run for it, or `None` once torn down.
    pub fn begin(&mut self, index: BigUint, document: TreeDocument) -> Option<LayoutJob> {
        if self.state == DiagramState::Terminated {
            debug!("begin({}): diagram is torn down", index);
            return None;
        }
        self.cancel_pending();

        let TreeDocument { expr: text, tree } = document;
        let variables = extract_variables(Some(&tree), self.config.variable_order);
        let graph = Graph::build(&tree, self.config.node_size);
        let request = LayoutRequest::from_graph(&graph, &self.config.layout);
        let liveness = Liveness::new();

        debug!(
            "begin({}): {} nodes, {} edges, variables {:?}; {:?} -> Building",
            index,
            graph.nodes.len(),
            graph.edges.len(),
            variables,
            self.state
        );
        self.assignment = Assignment::all_true(&variables);
        self.variables = variables;
        self.graph = graph;
        self.tree = Some(tree);
        self.text = Some(text);
        self.index = Some(index);
        self.evaluation = Evaluation::neutral();
        self.evaluated = None;
        self.liveness = Some(liveness.clone());
        self.state = DiagramState::Building;

        Some(LayoutJob { request, liveness })
    }

    /// Handles an index the engine does not know: clears the diagram and shows the placeholder.
    pub fn reject(&mut self, index: BigUint) {
        if self.state == DiagramState::Terminated {
            return;
        }
        debug!("reject({}): {:?} -> Idle", index, self.state);
        self.clear();
        self.index = Some(index);
        self.text = Some(INVALID_INDEX.to_string());
    }

    /// Handles an engine failure other than an unknown index: clears the
    /// diagram without claiming the index is invalid.
    pub fn fail(&mut self, index: BigUint, error: &EngineError) {
        if self.state == DiagramState::Terminated {
            return;
        }
        error!("expression {} could not be loaded: {}", index, error);
        self.clear();
        self.index = Some(index);
    }

    /// Applies the result of `job` if it is still the current one.
    ///
    /// [`LayoutOutcome::Applied`] means the viewport is due to be centered.
    pub fn finish_layout(&mut self, job: &LayoutJob, result: Result<Positions, LayoutError>) -> LayoutOutcome {
        if self.state != DiagramState::Building || !job.is_live() {
            debug!("discarding stale layout ({:?})", self.state);
            return LayoutOutcome::Discarded;
        }

        let positions = result.and_then(|positions| {
            // All or nothing: a node without position voids the whole result.
            self.graph
                .nodes
                .iter()
                .map(|node| {
                    positions
                        .get(&node.id)
                        .copied()
                        .ok_or_else(|| LayoutError::MissingPosition(node.id.clone()))
                })
                .collect::<Result<Vec<Position>, LayoutError>>()
        });

        match positions {
            Ok(positions) => {
                for (node, position) in self.graph.nodes.iter_mut().zip(positions) {
                    node.position = Some(position);
                }
                self.liveness = None;
                self.state = DiagramState::Ready;
                debug!("layout applied to {} nodes; Building -> Ready", self.graph.nodes.len());
                self.refresh();
                LayoutOutcome::Applied
            }
            Err(e) => {
                match self.index.as_ref() {
                    Some(index) => error!("layout of expression {} failed: {}", index, e),
                    None => error!("layout failed: {}", e),
                }
                let index = self.index.take();
                let text = self.text.take();
                self.clear();
                self.index = index;
                self.text = text;
                LayoutOutcome::Failed
            }
        }
    }

    /// Flips `variable` from the control strip. Returns whether anything changed.
    pub fn toggle(&mut self, variable: &str) -> bool {
        if matches!(self.state, DiagramState::Idle | DiagramState::Terminated) {
            debug!("toggle({}) ignored in {:?}", variable, self.state);
            return false;
        }
        match self.assignment.toggled(variable) {
            Some(next) => {
                self.assignment = next;
                self.refresh();
                true
            }
            None => {
                warn!("toggle({}): not a variable of the current expression", variable);
                false
            }
        }
    }

    /// Handles a click on a diagram node.
    pub fn click(&mut self, click: &NodeClick) -> bool {
        if !self.is_click_toggleable(click) {
            debug!("click on {} ({}) is not a toggle", click.id, click.label);
            return false;
        }
        self.toggle(&click.label)
    }

    /// Stops the diagram. In-flight layouts are discarded when they finish.
    pub fn teardown(&mut self) {
        debug!("teardown: {:?} -> Terminated", self.state);
        self.cancel_pending();
        self.state = DiagramState::Terminated;
    }

    /// Re-evaluates if the assignment changed since the last evaluation.
    fn refresh(&mut self) {
        if self.state != DiagramState::Ready || self.evaluated.as_ref() == Some(&self.assignment) {
            return;
        }
        let Some(index) = self.index.as_ref() else {
            return;
        };
        self.evaluation = eval::evaluate(self.engine.as_ref(), index, &self.graph, &self.assignment);
        self.evaluated = Some(self.assignment.clone());
    }

    fn cancel_pending(&mut self) {
        if let Some(liveness) = self.liveness.take() {
            liveness.cancel();
        }
    }

    fn clear(&mut self) {
        self.cancel_pending();
        self.index = None;
        self.text = None;
        self.tree = None;
        self.variables.clear();
        self.graph = Graph::default();
        self.assignment = Assignment::default();
        self.evaluation = Evaluation::neutral();
        self.evaluated = None;
        self.state = DiagramState::Idle;
    }
}

impl fmt::Debug for DiagramController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramController")
            .field("state", &self.state)
            .field("index", &self.index)
            .field("text", &self.text)
            .field("assignment", &self.assignment)
            .finish_non_exhaustive()
    }
}

/// Async driver for one diagram. Clones share the same diagram.
#[derive(Clone)]
pub struct Diagram {
    controller: Rc<RefCell<DiagramController>>,
    layout: Rc<dyn LayoutEngine>,
    center_viewport: Rc<RefCell<Option<ViewportHook>>>,
}

impl Diagram {
    pub fn new(engine: EngineHandle, layout: Rc<dyn LayoutEngine>, config: DiagramConfig) -> Self {
        Self {
            controller: Rc::new(RefCell::new(DiagramController::new(engine, config))),
            layout,
            center_viewport: Rc::new(RefCell::new(None)),
        }
    }

    /// Read access to the controller. Do not hold across an `.await`.
    pub fn controller(&self) -> Ref<'_, DiagramController> {
        self.controller.borrow()
    }

    /// Sets the side effect run once after every applied layout.
    ///
    /// The hook gets the laid-out graph and may freely use this diagram.
    pub fn on_layout_applied<F>(&self, hook: F)
    where
        F: FnMut(&Graph) + 'static,
    {
        *self.center_viewport.borrow_mut() = Some(Box::new(hook));
    }

    /// Shows the expression at `index`: loads its tree, lays it out, evaluates it.
    ///
    /// An unknown index clears the diagram to the invalid-index placeholder and
    /// is reported as an error; any other engine error clears it without a
    /// placeholder. If another `show` starts before this one's layout
    /// finishes, this one resolves to [`LayoutOutcome::Discarded`].
    pub async fn show(&self, index: &BigUint) -> Result<LayoutOutcome, EngineError> {
        let engine = self.controller.borrow().engine().clone();
        let document = match engine.expression_tree(index) {
            Ok(document) => document,
            Err(e) => {
                let mut controller = self.controller.borrow_mut();
                match e {
                    EngineError::InvalidIndex(_) => controller.reject(index.clone()),
                    _ => controller.fail(index.clone(), &e),
                }
                return Err(e);
            }
        };

        let Some(job) = self.controller.borrow_mut().begin(index.clone(), document) else {
            return Ok(LayoutOutcome::Discarded);
        };
        let result = self.layout.layout(job.request.clone()).await;
        let outcome = self.controller.borrow_mut().finish_layout(&job, result);
        if outcome == LayoutOutcome::Applied {
            self.center_viewport();
        }
        Ok(outcome)
    }

    fn center_viewport(&self) {
        // Taken out of its slot while running, so the hook may replace itself.
        let Some(mut hook) = self.center_viewport.borrow_mut().take() else {
            return;
        };
        let graph = self.controller.borrow().graph().clone();
        hook(&graph);
        let mut slot = self.center_viewport.borrow_mut();
        if slot.is_none() {
            *slot = Some(hook);
        }
    }

    pub fn toggle(&self, variable: &str) -> bool {
        self.controller.borrow_mut().toggle(variable)
    }

    pub fn click(&self, click: &NodeClick) -> bool {
        self.controller.borrow_mut().click(click)
    }

    pub fn teardown(&self) {
        self.controller.borrow_mut().teardown();
    }
}

impl fmt::Debug for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Diagram").field(&*self.controller.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::enumerate::Enumerator;
    use crate::layout::LayeredLayout;

    use test_log::test;

    fn controller() -> DiagramController {
        DiagramController::new(Rc::new(Enumerator::with_limits(8, 8)), DiagramConfig::default())
    }

    fn load(c: &mut DiagramController, index: u32) -> LayoutJob {
        let index = BigUint::from(index);
        let doc = c.engine().expression_tree(&index).unwrap();
        c.begin(index, doc).unwrap()
    }

    fn laid_out(job: &LayoutJob) -> Result<Positions, LayoutError> {
        LayeredLayout.compute(&job.request)
    }

    #[test]
    fn test_idle_initially() {
        let c = controller();
        assert_eq!(c.state(), DiagramState::Idle);
        assert!(c.graph().is_empty());
        assert!(c.render_nodes().is_empty());
        assert!(c.controls().is_empty());
        assert_eq!(c.output(), None);
    }

    #[test]
    fn test_begin_then_finish() {
        let mut c = controller();
        // AND(A,NOT(B))
        let job = load(&mut c, 16);
        assert_eq!(c.state(), DiagramState::Building);
        assert_eq!(c.text(), Some("AND(A,NOT(B))"));
        assert_eq!(c.variables(), ["A", "B"]);
        assert_eq!(c.assignment(), &Assignment::all_true(&["A", "B"]));
        assert!(c.evaluation().is_neutral());
        assert_eq!(job.request.nodes.len(), 4);

        assert_eq!(c.finish_layout(&job, laid_out(&job)), LayoutOutcome::Applied);
        assert_eq!(c.state(), DiagramState::Ready);
        assert!(c.graph().is_laid_out());
        assert_eq!(c.output(), Some(false));
        assert_eq!(c.render_nodes()[0].style_class(), "false");
    }

    #[test]
    fn test_accessors_follow_the_loaded_tree() {
        let mut c = controller();
        assert_eq!(c.config(), &DiagramConfig::default());
        assert!(c.tree().is_none());
        assert!(c.index().is_none());

        let job = load(&mut c, 16);
        assert_eq!(c.index(), Some(&BigUint::from(16u32)));
        assert_eq!(c.tree(), Some(&Expr::and(Expr::var("A"), Expr::not(Expr::var("B")))));
        assert_eq!(job.request.config, c.config().layout);

        let count = c.engine().count();
        c.reject(count.clone());
        assert!(c.tree().is_none());
        assert_eq!(c.index(), Some(&count));
    }

    #[test]
    fn test_stale_layout_is_discarded() {
        let mut c = controller();
        let first = load(&mut c, 5);
        let second = load(&mut c, 6);
        assert!(!first.is_live());
        assert!(second.is_live());

        assert_eq!(c.finish_layout(&first, laid_out(&first)), LayoutOutcome::Discarded);
        assert_eq!(c.state(), DiagramState::Building);
        assert!(!c.graph().is_laid_out());

        assert_eq!(c.finish_layout(&second, laid_out(&second)), LayoutOutcome::Applied);
        assert_eq!(c.text(), Some("XOR(A,A)"));
        // Late duplicate of an applied job.
        assert_eq!(c.finish_layout(&second, laid_out(&second)), LayoutOutcome::Discarded);
    }

    #[test]
    fn test_layout_failure_clears() {
        let mut c = controller();
        let job = load(&mut c, 16);
        let outcome = c.finish_layout(&job, Err(LayoutError::Engine("boom".to_string())));
        assert_eq!(outcome, LayoutOutcome::Failed);
        assert_eq!(c.state(), DiagramState::Idle);
        assert!(c.graph().is_empty());
        assert!(c.evaluation().is_neutral());
        assert!(!c.toggle("A"));
    }

    #[test]
    fn test_partial_positions_are_rejected() {
        let mut c = controller();
        let job = load(&mut c, 16);
        let mut positions = laid_out(&job).unwrap();
        positions.remove("n3");
        assert_eq!(c.finish_layout(&job, Ok(positions)), LayoutOutcome::Failed);
        assert!(c.graph().nodes.iter().all(|n| n.position.is_none()));
    }

    #[test]
    fn test_toggle_recolors_without_moving() {
        let mut c = controller();
        let job = load(&mut c, 16);
        c.finish_layout(&job, laid_out(&job));
        let before = c.graph().positions();

        assert!(c.toggle("B"));
        assert_eq!(c.state(), DiagramState::Ready);
        assert_eq!(c.output(), Some(true));
        assert_eq!(c.graph().positions(), before);
        assert_eq!(c.controls()[1].to_string(), "B: OFF");
    }

    #[test]
    fn test_toggle_unknown_variable() {
        let mut c = controller();
        let job = load(&mut c, 16);
        c.finish_layout(&job, laid_out(&job));
        let before = c.assignment().clone();
        assert!(!c.toggle("Z"));
        assert_eq!(c.assignment(), &before);
    }

    #[test]
    fn test_toggle_while_building() {
        let mut c = controller();
        let job = load(&mut c, 16);
        assert!(c.toggle("B"));
        assert!(c.toggle("A"));
        assert!(c.evaluation().is_neutral());

        c.finish_layout(&job, laid_out(&job));
        let row = c.truth_table_row().unwrap();
        let expected: Assignment = [("A", false), ("B", false)].into_iter().collect();
        assert_eq!(row.inputs, expected);
        assert_eq!(row.output, Some(false));
    }

    #[test]
    fn test_click() {
        let mut c = controller();
        let job = load(&mut c, 16);
        c.finish_layout(&job, laid_out(&job));

        let nodes = c.graph().nodes.clone();
        // The AND and NOT nodes are not toggles.
        assert!(!c.click(&NodeClick::from(&nodes[0])));
        assert!(!c.click(&NodeClick::from(&nodes[2])));
        // Leaf B is.
        assert!(c.click(&NodeClick::from(&nodes[3])));
        assert_eq!(c.assignment().get("B"), Some(false));
    }

    #[test]
    fn test_single_variable_is_strip_only() {
        let mut c = controller();
        let job = load(&mut c, 0);
        c.finish_layout(&job, laid_out(&job));
        assert_eq!(c.graph().nodes.len(), 1);
        assert!(c.edges().is_empty());

        let only = NodeClick::from(&c.graph().nodes[0]);
        assert!(!c.is_click_toggleable(&only));
        assert!(!c.click(&only));
        assert_eq!(c.output(), Some(true));

        assert!(c.toggle("A"));
        assert_eq!(c.output(), Some(false));
    }

    #[test]
    fn test_reject() {
        let mut c = controller();
        let job = load(&mut c, 16);
        let count = c.engine().count();
        c.reject(count);
        assert!(!job.is_live());
        assert_eq!(c.state(), DiagramState::Idle);
        assert_eq!(c.text(), Some(INVALID_INDEX));
        assert!(c.graph().is_empty());
    }

    #[test]
    fn test_engine_failure_clears_without_placeholder() {
        let mut c = controller();
        let job = load(&mut c, 16);
        c.fail(BigUint::from(16u32), &EngineError::Load("boom".to_string()));
        assert!(!job.is_live());
        assert_eq!(c.state(), DiagramState::Idle);
        assert_eq!(c.text(), None);
        assert!(c.graph().is_empty());
    }

    #[test]
    fn test_teardown() {
        let mut c = controller();
        let job = load(&mut c, 16);
        c.teardown();
        assert_eq!(c.state(), DiagramState::Terminated);
        assert!(!job.is_live());
        assert_eq!(c.finish_layout(&job, laid_out(&job)), LayoutOutcome::Discarded);
        assert!(!c.toggle("A"));

        let index = BigUint::from(3u32);
        let doc = c.engine().expression_tree(&index).unwrap();
        assert!(c.begin(index, doc).is_none());
    }

    #[test]
    fn test_diagram_show() {
        let diagram = Diagram::new(
            Rc::new(Enumerator::with_limits(8, 8)),
            Rc::new(LayeredLayout),
            DiagramConfig::default(),
        );
        let outcome = futures::executor::block_on(diagram.show(&BigUint::from(16u32)));
        assert_eq!(outcome, Ok(LayoutOutcome::Applied));
        assert_eq!(diagram.controller().output(), Some(false));

        assert!(diagram.toggle("B"));
        assert_eq!(diagram.controller().output(), Some(true));

        let bad = diagram.controller().engine().count();
        let outcome = futures::executor::block_on(diagram.show(&bad));
        assert!(matches!(outcome, Err(EngineError::InvalidIndex(_))));
        assert_eq!(diagram.controller().text(), Some(INVALID_INDEX));
    }

    fn diagram() -> Diagram {
        Diagram::new(
            Rc::new(Enumerator::with_limits(8, 8)),
            Rc::new(LayeredLayout),
            DiagramConfig::default(),
        )
    }

    #[test]
    fn test_viewport_hook_runs_once_per_layout() {
        let diagram = diagram();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        diagram.on_layout_applied(move |graph| {
            assert!(graph.is_laid_out());
            seen.set(seen.get() + 1);
        });

        futures::executor::block_on(diagram.show(&BigUint::from(16u32))).unwrap();
        diagram.toggle("A");
        diagram.toggle("B");
        assert_eq!(calls.get(), 1);

        futures::executor::block_on(diagram.show(&BigUint::from(3u32))).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_viewport_hook_may_read_the_diagram() {
        let diagram = diagram();
        let fitted = Rc::new(Cell::new(0));
        let (seen, inner) = (fitted.clone(), diagram.clone());
        diagram.on_layout_applied(move |_| {
            let c = inner.controller();
            assert_eq!(c.state(), DiagramState::Ready);
            assert!(c.render_nodes().iter().all(|n| n.position.is_some()));
            seen.set(c.render_nodes().len());
        });

        let outcome = futures::executor::block_on(diagram.show(&BigUint::from(16u32)));
        assert_eq!(outcome, Ok(LayoutOutcome::Applied));
        assert_eq!(fitted.get(), 4);
    }
}
