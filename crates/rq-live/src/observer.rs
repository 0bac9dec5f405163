//! Updater observer trait for alert checks and history recording.

use rq_core::Segment;

use crate::updater::{UpdateReport, UpdateSummary};

/// Callbacks invoked by the live updater task after each refresh round.
///
/// All methods have default no-op implementations.  Observers run on the
/// updater task with no graph lock held, so they may do file I/O.
///
/// # Example: alert printer
///
/// ```rust,ignore
/// struct Printer { threshold: f64 }
///
/// impl UpdateObserver for Printer {
///     fn on_round(&mut self, round: u64, segments: &[Segment], _report: &UpdateReport) {
///         for s in segments.iter().filter(|s| s.weight >= self.threshold) {
///             println!("round {round}: {} -> {} at {}", s.from, s.to, s.weight);
///         }
///     }
/// }
/// ```
pub trait UpdateObserver: Send {
    /// Called after a fetched batch has been applied to the graph.
    fn on_round(&mut self, _round: u64, _segments: &[Segment], _report: &UpdateReport) {}

    /// Called once when the updater stops, cancelled or finished.
    fn on_stop(&mut self, _summary: &UpdateSummary) {}
}

/// An [`UpdateObserver`] that does nothing.
pub struct NoopObserver;

impl UpdateObserver for NoopObserver {}
