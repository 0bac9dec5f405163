//! Shortest-path search: uniform-cost (Dijkstra) and heuristic-guided (A*).
//!
//! # Pluggability
//!
//! Callers pick an algorithm through the closed [`Algorithm`] enum, or hold
//! a [`PathFinder`] implementation directly when they need a custom
//! [`Heuristic`].  Both algorithms share one best-first core; Dijkstra is
//! the zero-heuristic case.
//!
//! # Contract
//!
//! - `start == end` yields `[start]` at cost 0.
//! - No path (disconnected, unknown node, empty graph) yields
//!   [`Route::unreachable`]: empty path, cost `+inf`.  This is a normal
//!   outcome, not an error.
//! - A node is settled the first time it is popped and never expanded
//!   again, so cycles and self-loops terminate.
//! - Cost ties pop in discovery order (a per-search sequence number), so a
//!   deterministic graph always yields the same path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use tracing::debug;

use rq_core::NodeId;

use crate::graph::WeightedGraph;
use crate::GraphError;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a search: visited nodes in order and the summed edge weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Nodes from start to end inclusive.  Empty when unreachable.
    pub nodes: Vec<NodeId>,
    /// Total weight, `f64::INFINITY` when unreachable.
    pub cost: f64,
}

impl Route {
    /// The "no path" sentinel.
    pub fn unreachable() -> Self {
        Self { nodes: Vec::new(), cost: f64::INFINITY }
    }

    /// A zero-length route that starts and ends at `node`.
    pub fn trivial(node: NodeId) -> Self {
        Self { nodes: vec![node], cost: 0.0 }
    }

    pub fn is_reachable(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Resolve node ids to their keys.  Ids unknown to `graph` are skipped.
    pub fn keys<'g>(&self, graph: &'g WeightedGraph) -> Vec<&'g str> {
        self.nodes.iter().filter_map(|&n| graph.key(n)).collect()
    }
}

// ── Heuristics ────────────────────────────────────────────────────────────────

/// Estimate of the remaining cost from `node` to `goal`.
///
/// Must never overestimate the true remaining cost, or A* loses optimality.
pub trait Heuristic: Sync {
    fn estimate(&self, graph: &WeightedGraph, node: NodeId, goal: NodeId) -> f64;
}

/// Straight-line distance between node positions in lat/lon space; 0 when
/// either position is missing.
///
/// Only admissible when edge weights are at least the planar distance
/// between their endpoints.  For jam-factor weights over city-scale
/// coordinates (deltas of ~1e-3 degrees) that holds by a wide margin.
#[derive(Copy, Clone, Debug, Default)]
pub struct Euclidean;

impl Heuristic for Euclidean {
    #[inline]
    fn estimate(&self, graph: &WeightedGraph, node: NodeId, goal: NodeId) -> f64 {
        match (graph.position(node), graph.position(goal)) {
            (Some(a), Some(b)) => a.planar_distance(b),
            _ => 0.0,
        }
    }
}

/// Always 0.  Turns A* into uniform-cost search.
#[derive(Copy, Clone, Debug, Default)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    #[inline]
    fn estimate(&self, _: &WeightedGraph, _: NodeId, _: NodeId) -> f64 {
        0.0
    }
}

impl<F> Heuristic for F
where
    F: Fn(&WeightedGraph, NodeId, NodeId) -> f64 + Sync,
{
    #[inline]
    fn estimate(&self, graph: &WeightedGraph, node: NodeId, goal: NodeId) -> f64 {
        self(graph, node, goal)
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable search engine.
///
/// Implementations must be `Send + Sync` so one finder can serve concurrent
/// searches against a [`SharedGraph`](crate::SharedGraph).
pub trait PathFinder: Send + Sync {
    fn find(&self, graph: &WeightedGraph, start: NodeId, end: NodeId) -> Route;
}

/// Uniform-cost search keyed by accumulated cost.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraFinder;

impl PathFinder for DijkstraFinder {
    fn find(&self, graph: &WeightedGraph, start: NodeId, end: NodeId) -> Route {
        dijkstra(graph, start, end)
    }
}

/// A* keyed by `accumulated cost + heuristic(node, end)`.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarFinder<H = Euclidean> {
    heuristic: H,
}

impl AStarFinder<Euclidean> {
    pub fn new() -> Self {
        Self { heuristic: Euclidean }
    }
}

impl<H: Heuristic> AStarFinder<H> {
    pub fn with_heuristic(heuristic: H) -> Self {
        Self { heuristic }
    }
}

impl<H: Heuristic + Send> PathFinder for AStarFinder<H> {
    fn find(&self, graph: &WeightedGraph, start: NodeId, end: NodeId) -> Route {
        a_star_with(graph, start, end, &self.heuristic)
    }
}

// ── Algorithm selector ────────────────────────────────────────────────────────

/// The search algorithms a caller can select by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Dijkstra, Algorithm::AStar];

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::AStar    => "astar",
        }
    }

    /// Run this algorithm with its default configuration.
    pub fn run(self, graph: &WeightedGraph, start: NodeId, end: NodeId) -> Route {
        match self {
            Algorithm::Dijkstra => dijkstra(graph, start, end),
            Algorithm::AStar    => a_star(graph, start, end),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dijkstra" | "ucs" => Ok(Algorithm::Dijkstra),
            "astar" | "a*" | "a_star" | "a-star" => Ok(Algorithm::AStar),
            other => Err(GraphError::UnknownAlgorithm(other.to_owned())),
        }
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Uniform-cost shortest path from `start` to `end`.
pub fn dijkstra(graph: &WeightedGraph, start: NodeId, end: NodeId) -> Route {
    best_first(graph, start, end, &ZeroHeuristic)
}

/// A* with the default [`Euclidean`] heuristic.
pub fn a_star(graph: &WeightedGraph, start: NodeId, end: NodeId) -> Route {
    best_first(graph, start, end, &Euclidean)
}

/// A* with a caller-supplied heuristic.
pub fn a_star_with<H: Heuristic + ?Sized>(
    graph: &WeightedGraph,
    start: NodeId,
    end: NodeId,
    heuristic: &H,
) -> Route {
    best_first(graph, start, end, heuristic)
}

// ── Best-first internals ──────────────────────────────────────────────────────

/// Frontier entry: (priority, discovery sequence, node).  `Reverse` turns the
/// max-heap into a min-heap; the sequence number breaks cost ties FIFO.
type Entry = Reverse<(OrderedFloat<f64>, u64, NodeId)>;

fn best_first<H: Heuristic + ?Sized>(
    graph: &WeightedGraph,
    start: NodeId,
    end: NodeId,
    heuristic: &H,
) -> Route {
    if start == end {
        return Route::trivial(start);
    }
    if !graph.contains(start) || !graph.contains(end) {
        return Route::unreachable();
    }

    let n = graph.node_count();
    // dist[v] = best known accumulated cost to v.
    let mut dist    = vec![f64::INFINITY; n];
    let mut prev    = vec![NodeId::INVALID; n];
    let mut settled = vec![false; n];

    let mut heap: BinaryHeap<Entry> = BinaryHeap::new();
    let mut seq: u64 = 0;

    dist[start.index()] = 0.0;
    heap.push(Reverse((OrderedFloat(heuristic.estimate(graph, start, end)), seq, start)));

    let mut expanded = 0usize;
    while let Some(Reverse((_, _, node))) = heap.pop() {
        // Settle once; later (worse) frontier copies are dropped here.
        if settled[node.index()] {
            continue;
        }
        settled[node.index()] = true;
        let cost = dist[node.index()];

        if node == end {
            debug!(expanded, cost, "search reached goal");
            return reconstruct(&prev, end, cost);
        }
        expanded += 1;

        for edge in graph.neighbors(node) {
            let next = edge.to;
            if settled[next.index()] {
                continue;
            }
            let new_cost = cost + edge.weight;
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev[next.index()] = node;
                seq += 1;
                let priority = new_cost + heuristic.estimate(graph, next, end);
                heap.push(Reverse((OrderedFloat(priority), seq, next)));
            }
        }
    }

    debug!(expanded, "frontier exhausted without reaching goal");
    Route::unreachable()
}

fn reconstruct(prev: &[NodeId], end: NodeId, cost: f64) -> Route {
    let mut nodes = vec![end];
    let mut cur = end;
    while prev[cur.index()] != NodeId::INVALID {
        cur = prev[cur.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    Route { nodes, cost }
}
