//! `rq-live`: traffic providers and the background live-weight updater.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`source`]   | `TrafficFeed`, `TrafficSource`, `MockTraffic`, `CsvFeed`, `FallbackSource` |
//! | [`updater`]  | `apply_segments`, `LiveWeightUpdater`, `UpdaterHandle`       |
//! | [`observer`] | `UpdateObserver` per-round hook                              |
//! | [`error`]    | `LiveError`, `LiveResult<T>`                                 |
//!
//! The updater runs on tokio.  Provider calls are synchronous and are moved
//! onto the blocking pool, so a slow feed never stalls the runtime or holds
//! the graph lock.

pub mod error;
pub mod observer;
pub mod source;
pub mod updater;


pub use error::{LiveError, LiveResult};
pub use observer::{NoopObserver, UpdateObserver};
pub use source::{
    default_segments, fetch_areas, read_segments, CsvFeed, FallbackSource, MockTraffic,
    TrafficFeed, TrafficSource,
};
pub use updater::{apply_segments, LiveWeightUpdater, UpdateReport, UpdateSummary, UpdaterHandle};
