//! Node placement.
//!
//! Positions come from a [`LayoutEngine`]. The engine is asynchronous: a
//! request may be answered long after it was submitted, by which time the tree
//! it was computed for may already have been replaced. Requests are therefore
//! paired with a [`Liveness`] flag, and a result whose flag has been cancelled
//! is discarded instead of applied (see [`controller`][crate::controller]).
//!
//! [`LayeredLayout`] is the built-in engine: a deterministic Sugiyama-style
//! layered layout.
//!
//!   1. Rank assignment (longest path from sources)
//!   2. Ordering within ranks (barycenter crossing minimization)
//!   3. Coordinate assignment (spacing-driven, each rank centered)

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use log::debug;
use serde::Deserialize;

use crate::error::LayoutError;
use crate::graph::{Graph, GraphEdge, Position, Size};

/// Node positions keyed by node id.
pub type Positions = HashMap<String, Position>;

/// Direction in which layers are stacked.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Down,
    Up,
    Right,
    Left,
}

impl Direction {
    fn is_vertical(self) -> bool {
        matches!(self, Direction::Down | Direction::Up)
    }
}

/// Spacing constants for a layered layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub direction: Direction,
    /// Minimal distance between any two nodes.
    pub node_node: f64,
    /// Distance between consecutive layers.
    pub between_layers: f64,
    /// Distance between neighbours in the same layer.
    pub same_layer: f64,
    pub edge_node: f64,
    pub edge_edge: f64,
    /// Crossing-minimization sweeps before giving up on improvement.
    pub max_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Down,
            node_node: 80.0,
            between_layers: 120.0,
            same_layer: 120.0,
            edge_node: 20.0,
            edge_edge: 10.0,
            max_iterations: 24,
        }
    }
}

impl LayoutConfig {
    /// The configuration as ELK layout options, for engines that speak them.
    pub fn elk_options(&self) -> Vec<(&'static str, String)> {
        let direction = match self.direction {
            Direction::Down => "DOWN",
            Direction::Up => "UP",
            Direction::Right => "RIGHT",
            Direction::Left => "LEFT",
        };
        vec![
            ("elk.algorithm", "layered".to_string()),
            ("elk.direction", direction.to_string()),
            ("elk.spacing.nodeNode", self.node_node.to_string()),
            ("elk.layered.spacing.nodeNodeBetweenLayers", self.between_layers.to_string()),
            ("elk.layered.spacing.nodeNodeSameLayer", self.same_layer.to_string()),
            ("elk.spacing.edgeNode", self.edge_node.to_string()),
            ("elk.spacing.edgeEdge", self.edge_edge.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub size: Size,
}

/// Everything a layout engine needs: nodes with sizes, edges, spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<GraphEdge>,
    pub config: LayoutConfig,
}

impl LayoutRequest {
    pub fn from_graph(graph: &Graph, config: &LayoutConfig) -> Self {
        Self {
            nodes: graph
                .nodes
                .iter()
                .map(|node| LayoutNode {
                    id: node.id.clone(),
                    size: node.size,
                })
                .collect(),
            edges: graph.edges.clone(),
            config: config.clone(),
        }
    }
}

/// An external layered-graph layout engine.
///
/// The returned future must not borrow the engine: it may outlive the call
/// site and be polled while other work proceeds.
pub trait LayoutEngine {
    fn layout(&self, request: LayoutRequest) -> LocalBoxFuture<'static, Result<Positions, LayoutError>>;
}

/// Shared flag telling an in-flight layout whether its result is still wanted.
///
/// Cancelling does not abort the computation; it only makes its result inert.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub fn cancel(&self) {
        self.0.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in deterministic layered layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayout;

impl LayoutEngine for LayeredLayout {
    fn layout(&self, request: LayoutRequest) -> LocalBoxFuture<'static, Result<Positions, LayoutError>> {
        future::ready(self.compute(&request)).boxed_local()
    }
}

// Adjacency lists over node indices; index order is the request's node order.
struct LayoutGraph {
    n: usize,
    adj: Vec<Vec<usize>>,
    rev: Vec<Vec<usize>>,
}

impl LayoutGraph {
    fn from_request(request: &LayoutRequest) -> Result<Self, LayoutError> {
        let n = request.nodes.len();
        let index: HashMap<&str, usize> = request.nodes.iter().enumerate().map(|(i, node)| (node.id.as_str(), i)).collect();
        let lookup = |id: &str| index.get(id).copied().ok_or_else(|| LayoutError::UnknownNode(id.to_string()));

        let mut adj = vec![vec![]; n];
        let mut rev = vec![vec![]; n];
        for edge in &request.edges {
            let u = lookup(&edge.source)?;
            let v = lookup(&edge.target)?;
            adj[u].push(v);
            rev[v].push(u);
        }
        Ok(Self { n, adj, rev })
    }
}

impl LayeredLayout {
    /// Computes positions synchronously.
    pub fn compute(&self, request: &LayoutRequest) -> Result<Positions, LayoutError> {
        let graph = LayoutGraph::from_request(request)?;
        let ranks = assign_ranks(&graph);
        let mut rank_order = build_rank_buckets(&ranks);
        let (iterations, crossings) = minimize_crossings(&mut rank_order, &graph, request.config.max_iterations);
        debug!(
            "layered layout: {} nodes, {} ranks, {} crossings after {} iterations",
            graph.n,
            rank_order.len(),
            crossings,
            iterations
        );

        let coords = assign_coordinates(&rank_order, request);
        Ok(request
            .nodes
            .iter()
            .zip(coords)
            .map(|(node, position)| (node.id.clone(), position))
            .collect())
    }
}

/// Longest-path layering: sources get rank 0, every other node sits one rank
/// below its deepest predecessor. Nodes on a cycle go below everything else.
fn assign_ranks(graph: &LayoutGraph) -> Vec<usize> {
    let n = graph.n;
    let mut in_degree: Vec<usize> = graph.rev.iter().map(|preds| preds.len()).collect();
    let mut queue: Vec<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    let mut ranks = vec![0usize; n];
    let mut visited = vec![false; n];

    let mut head = 0;
    while head < queue.len() {
        let u = queue[head];
        head += 1;
        visited[u] = true;
        for &v in &graph.adj[u] {
            ranks[v] = ranks[v].max(ranks[u] + 1);
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                queue.push(v);
            }
        }
    }

    if queue.len() < n {
        let max_rank = ranks.iter().copied().max().unwrap_or(0);
        for v in (0..n).filter(|&v| !visited[v]) {
            ranks[v] = max_rank + 1;
        }
    }
    ranks
}

fn build_rank_buckets(ranks: &[usize]) -> Vec<Vec<usize>> {
    let Some(&max_rank) = ranks.iter().max() else {
        return vec![];
    };
    let mut buckets = vec![vec![]; max_rank + 1];
    for (v, &r) in ranks.iter().enumerate() {
        buckets[r].push(v);
    }
    buckets
}

fn barycenter(order: &[usize], neighbors: &[usize]) -> Option<f64> {
    let positions: Vec<usize> = neighbors.iter().filter_map(|nb| order.iter().position(|x| x == nb)).collect();
    if positions.is_empty() {
        None
    } else {
        Some(positions.iter().sum::<usize>() as f64 / positions.len() as f64)
    }
}

/// Reorders `rank` by the barycenter of each node's neighbours in `fixed`.
/// Nodes without neighbours there keep their relative place at the end.
fn sweep(rank: &mut Vec<usize>, fixed: &[usize], neighbors: &[Vec<usize>]) {
    let mut scored: Vec<(usize, Option<f64>)> = rank.iter().map(|&v| (v, barycenter(fixed, &neighbors[v]))).collect();
    scored.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });
    *rank = scored.into_iter().map(|(v, _)| v).collect();
}

fn count_crossings(rank_a: &[usize], rank_b: &[usize], graph: &LayoutGraph) -> usize {
    let mut pos_b = vec![usize::MAX; graph.n];
    for (i, &v) in rank_b.iter().enumerate() {
        pos_b[v] = i;
    }

    let mut edges: Vec<(usize, usize)> = Vec::new();
    for (i, &u) in rank_a.iter().enumerate() {
        for &v in &graph.adj[u] {
            if pos_b[v] != usize::MAX {
                edges.push((i, pos_b[v]));
            }
        }
    }

    let mut crossings = 0;
    for i in 0..edges.len() {
        for j in (i + 1)..edges.len() {
            let (a1, b1) = edges[i];
            let (a2, b2) = edges[j];
            if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

fn total_crossings(rank_order: &[Vec<usize>], graph: &LayoutGraph) -> usize {
    rank_order.windows(2).map(|w| count_crossings(&w[0], &w[1], graph)).sum()
}

/// Alternating down/up barycenter sweeps, keeping the best ordering seen.
fn minimize_crossings(rank_order: &mut Vec<Vec<usize>>, graph: &LayoutGraph, max_iterations: usize) -> (usize, usize) {
    let mut best_crossings = total_crossings(rank_order, graph);
    if rank_order.len() <= 1 || best_crossings == 0 {
        return (0, best_crossings);
    }
    let mut best_order = rank_order.clone();
    let mut iterations = 0;

    for _ in 0..max_iterations {
        iterations += 1;
        for r in 1..rank_order.len() {
            let (above, rest) = rank_order.split_at_mut(r);
            sweep(&mut rest[0], &above[r - 1], &graph.rev);
        }
        for r in (0..rank_order.len() - 1).rev() {
            let (upto, below) = rank_order.split_at_mut(r + 1);
            sweep(&mut upto[r], &below[0], &graph.adj);
        }

        let crossings = total_crossings(rank_order, graph);
        if crossings < best_crossings {
            best_crossings = crossings;
            best_order = rank_order.clone();
            if crossings == 0 {
                break;
            }
        } else {
            break;
        }
    }

    *rank_order = best_order;
    (iterations, best_crossings)
}

/// Places ranks along the layer axis and nodes along the order axis, then
/// centers every rank against the widest one.
fn assign_coordinates(rank_order: &[Vec<usize>], request: &LayoutRequest) -> Vec<Position> {
    let config = &request.config;
    let vertical = config.direction.is_vertical();
    // (extent along the order axis, extent along the layer axis)
    let extent = |v: usize| {
        let size = request.nodes[v].size;
        if vertical {
            (size.width, size.height)
        } else {
            (size.height, size.width)
        }
    };
    let gap = config.same_layer.max(config.node_node);

    let mut coords = vec![(0.0, 0.0); request.nodes.len()];
    let mut rank_widths = Vec::with_capacity(rank_order.len());
    let mut layer = 0.0;
    for nodes in rank_order {
        let mut offset = 0.0;
        let mut thickness: f64 = 0.0;
        for (i, &v) in nodes.iter().enumerate() {
            if i > 0 {
                offset += gap;
            }
            let (along, across) = extent(v);
            coords[v] = (offset, layer);
            offset += along;
            thickness = thickness.max(across);
        }
        rank_widths.push(offset);
        layer += thickness + config.between_layers;
    }
    let total_depth = (layer - config.between_layers).max(0.0);

    let max_width = rank_widths.iter().copied().fold(0.0_f64, f64::max);
    for (r, nodes) in rank_order.iter().enumerate() {
        let shift = (max_width - rank_widths[r]) / 2.0;
        for &v in nodes {
            coords[v].0 += shift;
        }
    }

    coords
        .into_iter()
        .enumerate()
        .map(|(v, (along, across))| {
            let (_, thickness) = extent(v);
            match config.direction {
                Direction::Down => Position::new(along, across),
                Direction::Up => Position::new(along, total_depth - across - thickness),
                Direction::Right => Position::new(across, along),
                Direction::Left => Position::new(total_depth - across - thickness, along),
            }
        })
        .collect()
}
