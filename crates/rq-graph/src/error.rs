//! Graph-subsystem error type.
//!
//! Only malformed input is an error here.  "No path" and "no such edge" are
//! ordinary return values (`Route::unreachable()`, `Ok(None)`).

use thiserror::Error;

/// Errors produced by `rq-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid weight {weight} on edge {edge}: weights must be finite and non-negative")]
    InvalidWeight { edge: String, weight: f64 },

    #[error("unknown algorithm {0:?}: expected \"dijkstra\" or \"astar\"")]
    UnknownAlgorithm(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
