//! `rq-store`: flat-file persistence for user alerts and traffic history.
//!
//! Both stores are a single JSON document rewritten in full on every
//! change.  A missing file is an empty store, not an error.
//!
//! | Module      | Contents                                        |
//! |-------------|-------------------------------------------------|
//! | [`alerts`]  | `AlertBook`, `AlertRule`, `AlertMessage`        |
//! | [`history`] | `TrafficHistory`, `average_congestion`          |
//! | [`error`]   | `StoreError`, `StoreResult<T>`                  |

pub mod alerts;
pub mod error;
pub mod history;

mod file;


pub use alerts::{AlertBook, AlertMessage, AlertRule, DEFAULT_ALERTS_FILE};
pub use error::{StoreError, StoreResult};
pub use history::{average_congestion, TrafficHistory, DEFAULT_HISTORY_FILE};
