//! Concurrency wrapper shared by the live updater and foreground searches.
//!
//! # Locking discipline
//!
//! One `parking_lot::RwLock` guards the whole [`WeightedGraph`]:
//!
//! | Operation                          | Lock  | Held for                      |
//! |------------------------------------|-------|-------------------------------|
//! | `route`, `route_with`, `hotspots`  | read  | the whole search / scan       |
//! | `update_outgoing`                  | write | one node's adjacency updates  |
//! | `update_edge_weight`               | write | one edge                      |
//! | `alternate_path`                   | write | remove + search + restore     |
//!
//! Any number of searches run side by side; writers wait for them and they
//! wait for writers.  A reader can never see a half-written adjacency list
//! because no `&WeightedGraph` exists while a write guard is alive.
//!
//! # Consistency
//!
//! The only promise made to a search is that every weight it reads was the
//! edge's weight at some moment during the search.  There is no ordering
//! between a search and a concurrent update: the search may see the old or
//! the new value.  Today a search holds its read guard from start to finish
//! and so sees one snapshot, but callers should not rely on more than the
//! per-edge guarantee.
//!
//! `alternate_path` blocks updates for its whole critical section, so the
//! weights it restores are always current.
//!
//! # Async callers
//!
//! `parking_lot` guards are `!Send`; a guard cannot be held across an
//! `.await` in a spawned task.  Every method here acquires and releases its
//! guard before returning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use rq_core::{EdgeId, GeoPoint, NodeId, Segment};

use crate::congestion::{find_hotspots, suggest_alternate_path, Hotspot};
use crate::graph::WeightedGraph;
use crate::search::{Algorithm, PathFinder, Route};
use crate::{GraphError, GraphResult};

/// Cloneable handle to one graph shared across threads and tasks.
#[derive(Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<WeightedGraph>>,
}

impl From<WeightedGraph> for SharedGraph {
    fn from(graph: WeightedGraph) -> Self {
        Self::new(graph)
    }
}

impl SharedGraph {
    pub fn new(graph: WeightedGraph) -> Self {
        Self { inner: Arc::new(RwLock::new(graph)) }
    }

    /// Shared read access.  Keep the guard short-lived.
    pub fn read(&self) -> RwLockReadGuard<'_, WeightedGraph> {
        self.inner.read()
    }

    /// Exclusive access.  Keep the guard short-lived.
    pub fn write(&self) -> RwLockWriteGuard<'_, WeightedGraph> {
        self.inner.write()
    }

    /// `true` while any reader or writer holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Deep copy of the current state.
    pub fn snapshot(&self) -> WeightedGraph {
        self.read().clone()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn node(&self, key: &str) -> Option<NodeId> {
        self.read().node(key)
    }

    pub fn key(&self, id: NodeId) -> Option<String> {
        self.read().key(id).map(str::to_owned)
    }

    pub fn nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.read().nearest_node(pos)
    }

    pub fn to_segments(&self) -> Vec<Segment> {
        self.read().to_segments()
    }

    // ── Searches (read lock) ──────────────────────────────────────────────

    pub fn route(&self, algorithm: Algorithm, start: NodeId, end: NodeId) -> Route {
        algorithm.run(&self.read(), start, end)
    }

    pub fn route_with<F: PathFinder + ?Sized>(&self, finder: &F, start: NodeId, end: NodeId) -> Route {
        finder.find(&self.read(), start, end)
    }

    /// Hotspots from one consistent view of the edge set.
    pub fn hotspots(&self, threshold: f64) -> Vec<Hotspot> {
        find_hotspots(&self.read(), threshold)
    }

    /// Run Dijkstra and A* side by side and wait for both.
    pub fn compare(&self, start: NodeId, end: NodeId) -> Comparison {
        let (dijkstra, a_star) = rayon::join(
            || Timed::measure(|| self.route(Algorithm::Dijkstra, start, end)),
            || Timed::measure(|| self.route(Algorithm::AStar, start, end)),
        );
        Comparison { dijkstra, a_star }
    }

    // ── Mutations (write lock) ────────────────────────────────────────────

    /// Hotspot-avoiding route.  Updates are blocked until every removed edge
    /// is back in place.
    pub fn alternate_path(&self, start: NodeId, end: NodeId, threshold: f64) -> Route {
        let mut graph = self.write();
        suggest_alternate_path(&mut graph, start, end, threshold)
    }

    pub fn update_edge_weight(&self, from: NodeId, to: NodeId, weight: f64) -> GraphResult<Option<EdgeId>> {
        self.write().update_edge_weight(from, to, weight)
    }

    /// Apply several weight updates to `from`'s outgoing edges atomically:
    /// no reader sees some of them applied and others not.
    ///
    /// All weights are validated before the lock is taken; one bad weight
    /// rejects the whole batch.  Returns how many updates matched an edge.
    pub fn update_outgoing(&self, from: NodeId, updates: &[(NodeId, f64)]) -> GraphResult<usize> {
        if let Some(&(to, weight)) = updates.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(GraphError::InvalidWeight { edge: format!("{from} -> {to}"), weight });
        }
        let mut graph = self.write();
        let mut matched = 0;
        for &(to, weight) in updates {
            if graph.update_edge_weight(from, to, weight)?.is_some() {
                matched += 1;
            }
        }
        drop(graph);
        debug!(%from, requested = updates.len(), matched, "applied outgoing weight updates");
        Ok(matched)
    }
}

// ── Comparison results ────────────────────────────────────────────────────────

/// A route plus the wall time it took to compute.
#[derive(Debug, Clone)]
pub struct Timed {
    pub route: Route,
    pub elapsed: Duration,
}

impl Timed {
    fn measure(f: impl FnOnce() -> Route) -> Self {
        let t0 = Instant::now();
        let route = f();
        Self { route, elapsed: t0.elapsed() }
    }
}

/// Both algorithms' answers for the same query.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub dijkstra: Timed,
    pub a_star: Timed,
}

impl Comparison {
    /// `true` when both agree on the optimal cost (paths may differ on ties).
    pub fn costs_agree(&self) -> bool {
        let (a, b) = (self.dijkstra.route.cost, self.a_star.route.cost);
        a == b || (a - b).abs() <= 1e-9 * a.abs().max(1.0)
    }
}
