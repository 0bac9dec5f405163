//! `rq-graph`: live-weighted road graph, routing, and congestion analysis.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`graph`]      | `WeightedGraph` (adjacency lists + R-tree), `Edge`         |
//! | [`search`]     | `dijkstra`, `a_star`, `PathFinder`, `Heuristic`, `Route`   |
//! | [`congestion`] | `find_hotspots`, `suggest_alternate_path`, `CongestionAnalyzer` |
//! | [`shared`]     | `SharedGraph` (RwLock handle), `Comparison`                |
//! | [`error`]      | `GraphError`, `GraphResult<T>`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `rq-core` types.        |

pub mod congestion;
pub mod error;
pub mod graph;
pub mod search;
pub mod shared;

#[cfg(test)]
mod tests;

pub use congestion::{find_hotspots, suggest_alternate_path, CongestionAnalyzer, Hotspot};
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, EdgeRef, WeightedGraph};
pub use search::{
    a_star, a_star_with, dijkstra, AStarFinder, Algorithm, DijkstraFinder, Euclidean, Heuristic,
    PathFinder, Route, ZeroHeuristic,
};
pub use shared::{Comparison, SharedGraph, Timed};
