//! Weighted directed road graph with live-mutable edge weights.
//!
//! # Data layout
//!
//! Node keys (strings from the traffic feed) are interned to dense
//! `NodeId`s on first sight.  Outgoing edges live in one `Vec<Edge>` per
//! node, kept in insertion order:
//!
//! ```text
//! adjacency[n] = [ Edge { id, to, weight }, ... ]
//! ```
//!
//! Unlike a CSR layout the lists can be mutated in place, which is what the
//! live updater and the hotspot detour need.  Searches still walk a
//! contiguous slice per node.
//!
//! Parallel edges between the same ordered pair are kept as separate
//! entries, each with its own `EdgeId`.  Address an edge by id whenever the
//! pair alone is ambiguous.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to positioned nodes.  Used to
//! snap coordinate input to the nearest intersection.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use rq_core::{EdgeId, GeoPoint, NodeId, Segment};

use crate::{GraphError, GraphResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[lat, lon]` point with
/// the associated `NodeId`.
#[derive(Clone, PartialEq)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Edge views ────────────────────────────────────────────────────────────────

/// One outgoing adjacency entry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    pub id:     EdgeId,
    pub to:     NodeId,
    pub weight: f64,
}

/// A full `(from, to, weight)` view of an edge, as yielded by
/// [`WeightedGraph::edges`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeRef {
    pub id:     EdgeId,
    pub from:   NodeId,
    pub to:     NodeId,
    pub weight: f64,
}

/// An edge taken out of its adjacency list, remembering where it sat.
#[derive(Copy, Clone, Debug)]
pub(crate) struct DetachedEdge {
    from: NodeId,
    slot: usize,
    edge: Edge,
}

// ── WeightedGraph ─────────────────────────────────────────────────────────────

/// Directed road graph with congestion weights and optional node positions.
///
/// Every edge endpoint is a node; inserting an edge inserts its endpoints.
/// Weights are always finite and non-negative: every mutating operation
/// validates before touching the graph.
///
/// `WeightedGraph` itself is single-threaded.  Share it between the live
/// updater and searches through [`SharedGraph`](crate::SharedGraph).
#[derive(Clone, Default)]
pub struct WeightedGraph {
    /// Node key by `NodeId`.
    keys: Vec<String>,
    index: FxHashMap<String, NodeId>,
    /// Position by `NodeId`; `None` is a valid state.
    positions: Vec<Option<GeoPoint>>,
    /// Order in which each node first got a position.  Overwriting a
    /// position keeps the node's original rank.
    position_rank: Vec<Option<u32>>,
    next_rank: u32,
    /// Outgoing edges by `NodeId`, insertion order.
    adjacency: Vec<Vec<Edge>>,
    /// Source node by `EdgeId`.  Never shrinks; detached edges keep their slot.
    edge_from: Vec<NodeId>,
    live_edges: usize,
    spatial_idx: RTree<NodeEntry>,
}

impl WeightedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an initial traffic batch.
    ///
    /// Positions come from the segment records; a later record for the same
    /// node overwrites an earlier position.
    pub fn from_segments(segments: &[Segment]) -> GraphResult<Self> {
        let mut graph = Self::new();
        for s in segments {
            graph.add_node(&s.from, s.from_pos);
            graph.add_node(&s.to, s.to_pos);
            graph.add_edge(&s.from, &s.to, s.weight)?;
        }
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built road graph from {} segments",
            segments.len()
        );
        Ok(graph)
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.keys.len()
    }

    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    /// Insert `key` if absent and return its id.  Idempotent.
    ///
    /// A `Some` position sets or overwrites the node's position; `None`
    /// leaves any existing position untouched.
    pub fn add_node(&mut self, key: &str, position: Option<GeoPoint>) -> NodeId {
        let id = self.intern(key);
        if let Some(pos) = position {
            self.set_position(id, pos);
        }
        id
    }

    fn intern(&mut self, key: &str) -> NodeId {
        if let Some(&id) = self.index.get(key) {
            return id;
        }
        let id = NodeId(self.keys.len() as u32);
        self.keys.push(key.to_owned());
        self.index.insert(key.to_owned(), id);
        self.positions.push(None);
        self.position_rank.push(None);
        self.adjacency.push(Vec::new());
        id
    }

    fn set_position(&mut self, id: NodeId, pos: GeoPoint) {
        if !pos.is_finite() {
            warn!(node = %self.keys[id.index()], %pos, "ignoring non-finite node position");
            return;
        }
        match self.positions[id.index()] {
            Some(old) => {
                self.spatial_idx.remove(&NodeEntry { point: [old.lat, old.lon], id });
            }
            None => {
                self.position_rank[id.index()] = Some(self.next_rank);
                self.next_rank += 1;
            }
        }
        self.positions[id.index()] = Some(pos);
        self.spatial_idx.insert(NodeEntry { point: [pos.lat, pos.lon], id });
    }

    /// Look up a node by key.
    pub fn node(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Key of `id`, or `None` for ids this graph never issued.
    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.keys.get(id.index()).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.keys.len()
    }

    pub fn position(&self, id: NodeId) -> Option<GeoPoint> {
        self.positions.get(id.index()).copied().flatten()
    }

    /// All node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.keys.len()).map(|i| NodeId(i as u32))
    }

    /// Positioned nodes in insertion order.
    pub fn positions(&self) -> impl Iterator<Item = (NodeId, GeoPoint)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (NodeId(i as u32), p)))
    }

    // ── Edges ─────────────────────────────────────────────────────────────

    /// Append a directed edge, inserting both endpoints if needed.  The
    /// `to` node gets no position from this call.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f64) -> GraphResult<EdgeId> {
        check_weight(weight, || format!("{from} -> {to}"))?;
        let from_id = self.intern(from);
        let to_id = self.intern(to);
        Ok(self.push_edge(from_id, to_id, weight))
    }

    fn push_edge(&mut self, from: NodeId, to: NodeId, weight: f64) -> EdgeId {
        let id = EdgeId(self.edge_from.len() as u32);
        self.edge_from.push(from);
        self.adjacency[from.index()].push(Edge { id, to, weight });
        self.live_edges += 1;
        id
    }

    /// Replace the weight of the edge `from → to`.
    ///
    /// With parallel edges the **first match in insertion order** is updated
    /// and the others are left alone; the ambiguity is logged at `warn`.  Use
    /// [`set_edge_weight`](Self::set_edge_weight) to address one edge
    /// exactly.  Returns `Ok(None)` (a no-op) when no such edge exists.
    pub fn update_edge_weight(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
    ) -> GraphResult<Option<EdgeId>> {
        check_weight(weight, || self.describe(from, to))?;
        let Some(list) = self.adjacency.get_mut(from.index()) else {
            return Ok(None);
        };
        let mut matches = list.iter_mut().filter(|e| e.to == to);
        let Some(first) = matches.next() else {
            return Ok(None);
        };
        first.weight = weight;
        let id = first.id;
        let extra = matches.count();
        if extra > 0 {
            warn!(
                edge = %self.describe(from, to),
                parallel = extra + 1,
                updated = %id,
                "ambiguous weight update on parallel edges; updated first match only"
            );
        }
        Ok(Some(id))
    }

    /// Replace the weight of one specific edge.  Returns `Ok(false)` if the
    /// edge is unknown or currently detached.
    pub fn set_edge_weight(&mut self, edge: EdgeId, weight: f64) -> GraphResult<bool> {
        check_weight(weight, || edge.to_string())?;
        let Some(&from) = self.edge_from.get(edge.index()) else {
            return Ok(false);
        };
        match self.adjacency[from.index()].iter_mut().find(|e| e.id == edge) {
            Some(e) => {
                e.weight = weight;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Outgoing edges of `node`.  Empty for unknown or leaf nodes.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> &[Edge] {
        self.adjacency
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up one edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<EdgeRef> {
        let from = *self.edge_from.get(id.index())?;
        self.adjacency[from.index()]
            .iter()
            .find(|e| e.id == id)
            .map(|e| EdgeRef { id, from, to: e.to, weight: e.weight })
    }

    /// Every edge, grouped by source node in `NodeId` order, each group in
    /// insertion order.  Deterministic for a deterministic build.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(i, list)| {
            let from = NodeId(i as u32);
            list.iter().map(move |e| EdgeRef { id: e.id, from, to: e.to, weight: e.weight })
        })
    }

    /// Export the current edge set as traffic records (positions included
    /// where known).
    pub fn to_segments(&self) -> Vec<Segment> {
        self.edges()
            .map(|e| Segment {
                from:     self.keys[e.from.index()].clone(),
                to:       self.keys[e.to.index()].clone(),
                weight:   e.weight,
                from_pos: self.position(e.from),
                to_pos:   self.position(e.to),
            })
            .collect()
    }

    // ── Transient removal (hotspot detours) ───────────────────────────────

    pub(crate) fn detach_edge(&mut self, id: EdgeId) -> Option<DetachedEdge> {
        let from = *self.edge_from.get(id.index())?;
        let list = &mut self.adjacency[from.index()];
        let slot = list.iter().position(|e| e.id == id)?;
        let edge = list.remove(slot);
        self.live_edges -= 1;
        Some(DetachedEdge { from, slot, edge })
    }

    /// Put a detached edge back at its old slot.  Edges must be reattached
    /// in reverse detach order for the slots to line up.
    pub(crate) fn reattach(&mut self, detached: DetachedEdge) {
        let list = &mut self.adjacency[detached.from.index()];
        let slot = detached.slot.min(list.len());
        list.insert(slot, detached.edge);
        self.live_edges += 1;
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The positioned node closest to `pos` (Euclidean in lat/lon space).
    ///
    /// Equidistant candidates resolve to the node that was positioned first,
    /// which need not be the node that was inserted first.
    /// Returns `None` when no node has a position.
    pub fn nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        let query = [pos.lat, pos.lon];
        let best = self.spatial_idx.nearest_neighbor(&query)?;
        let radius_2 = best.distance_2(&query);
        self.spatial_idx
            .locate_within_distance(query, radius_2)
            .map(|e| e.id)
            .min_by_key(|id| self.position_rank[id.index()])
            .or(Some(best.id))
    }

    fn describe(&self, from: NodeId, to: NodeId) -> String {
        let name = |id: NodeId| self.key(id).map(str::to_owned).unwrap_or_else(|| id.to_string());
        format!("{} -> {}", name(from), name(to))
    }
}

fn check_weight(weight: f64, edge: impl FnOnce() -> String) -> GraphResult<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidWeight { edge: edge(), weight })
    }
}
