//! `rq-core`: foundational types for the RouteIQ routing workspace.
//!
//! This crate is a dependency of every other `rq-*` crate.  It intentionally
//! has no `rq-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`ids`]       | `NodeId`, `EdgeId`                                      |
//! | [`geo`]       | `GeoPoint`, `BoundingBox`, planar + haversine distance  |
//! | [`segment`]   | `Segment` traffic record, `AreaSelector`                |
//! | [`config`]    | `RoutingConfig`                                         |
//! | [`error`]     | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types; required by `rq-store`. |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod segment;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::RoutingConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{BoundingBox, GeoPoint};
pub use ids::{EdgeId, NodeId};
pub use segment::{AreaSelector, Segment};
