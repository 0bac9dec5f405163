//! Congestion hotspot detection and hotspot-avoiding detours.
//!
//! A hotspot is an edge whose weight meets or exceeds a threshold.  The
//! detour search removes every hotspot edge, runs uniform-cost search on
//! what is left, and puts every removed edge back exactly where it was.
//! Restoration is tied to a guard's `Drop`, so it happens on every exit
//! path, unwinding included.
//!
//! Falling back to an unrestricted route when the detour is unreachable is
//! the caller's decision; [`suggest_alternate_path`] just reports
//! [`Route::unreachable`].

use tracing::debug;

use rq_core::config::DEFAULT_CONGESTION_THRESHOLD;
use rq_core::{EdgeId, NodeId};

use crate::graph::{DetachedEdge, EdgeRef, WeightedGraph};
use crate::search::{dijkstra, Route};

/// An edge at or above the congestion threshold.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hotspot {
    pub edge:   EdgeId,
    pub from:   NodeId,
    pub to:     NodeId,
    pub weight: f64,
}

impl From<EdgeRef> for Hotspot {
    fn from(e: EdgeRef) -> Self {
        Self { edge: e.id, from: e.from, to: e.to, weight: e.weight }
    }
}

/// All edges with `weight >= threshold`, in [`WeightedGraph::edges`] order.
pub fn find_hotspots(graph: &WeightedGraph, threshold: f64) -> Vec<Hotspot> {
    graph
        .edges()
        .filter(|e| e.weight >= threshold)
        .map(Hotspot::from)
        .collect()
}

/// Shortest path from `start` to `end` that uses no hotspot edge.
///
/// The graph is mutated for the duration of the call and left with the same
/// edges, weights, and adjacency order it had on entry.  Callers sharing the
/// graph must hold exclusive access for the whole call;
/// [`SharedGraph::alternate_path`](crate::SharedGraph::alternate_path) does
/// that.
pub fn suggest_alternate_path(
    graph: &mut WeightedGraph,
    start: NodeId,
    end: NodeId,
    threshold: f64,
) -> Route {
    let hotspots = find_hotspots(graph, threshold);
    let detour = Detour::detach(graph, &hotspots);
    debug!(removed = detour.removed.len(), threshold, "searching around hotspots");
    let route = dijkstra(&*detour.graph, start, end);
    drop(detour);
    route
}

// ── Detour guard ──────────────────────────────────────────────────────────────

/// Holds a graph with some edges detached; reattaches them on drop.
struct Detour<'g> {
    graph: &'g mut WeightedGraph,
    removed: Vec<DetachedEdge>,
}

impl<'g> Detour<'g> {
    fn detach(graph: &'g mut WeightedGraph, hotspots: &[Hotspot]) -> Self {
        let removed = hotspots
            .iter()
            .filter_map(|h| graph.detach_edge(h.edge))
            .collect();
        Self { graph, removed }
    }
}

impl Drop for Detour<'_> {
    fn drop(&mut self) {
        // Reverse order so every slot index is valid again when reinserted.
        while let Some(edge) = self.removed.pop() {
            self.graph.reattach(edge);
        }
    }
}

// ── CongestionAnalyzer ────────────────────────────────────────────────────────

/// Threshold-carrying front end for hotspot queries.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CongestionAnalyzer {
    threshold: f64,
}

impl Default for CongestionAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_CONGESTION_THRESHOLD)
    }
}

impl CongestionAnalyzer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn is_hotspot(&self, weight: f64) -> bool {
        weight >= self.threshold
    }

    pub fn hotspots(&self, graph: &WeightedGraph) -> Vec<Hotspot> {
        find_hotspots(graph, self.threshold)
    }

    pub fn alternate_path(&self, graph: &mut WeightedGraph, start: NodeId, end: NodeId) -> Route {
        suggest_alternate_path(graph, start, end, self.threshold)
    }
}
