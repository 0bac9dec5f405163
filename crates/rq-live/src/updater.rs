//! Background refresh of edge weights from a traffic source.
//!
//! # Round structure
//!
//! ```text
//! tick ─► fetch (spawn_blocking, no lock) ─► apply_segments (write lock per
//!         source node) ─► observer.on_round ─► wait for next tick
//! ```
//!
//! Fetching may block on I/O and never holds the graph lock.  Applying takes
//! one short write-lock acquisition per source node, so a search waits at
//! most for one node's adjacency updates.
//!
//! The updater only refreshes weights of edges already in the graph.
//! Segments naming unknown nodes or edges are counted as ignored; the
//! topology of the initial batch never grows.
//!
//! # Cancellation
//!
//! The task stops at the next `.await` after its `CancellationToken` fires.
//! No lock guard ever lives across an `.await`, so cancellation can never
//! leave the graph locked.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rq_core::config::DEFAULT_POLL_INTERVAL_SECS;
use rq_core::{AreaSelector, NodeId, Segment};
use rq_graph::SharedGraph;

use crate::observer::{NoopObserver, UpdateObserver};
use crate::source::TrafficSource;
use crate::{LiveError, LiveResult};

// ── Reports ───────────────────────────────────────────────────────────────────

/// Outcome of applying one batch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Segments that matched an existing edge and replaced its weight.
    pub applied: usize,
    /// Segments naming an unknown node or edge, or carrying an invalid weight.
    pub ignored: usize,
}

/// Totals over the lifetime of one updater task.
///
/// `rounds` counts every round, including the `failed` ones whose fetch
/// task panicked.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub rounds:  u64,
    pub failed:  u64,
    pub applied: usize,
    pub ignored: usize,
}

impl UpdateSummary {
    fn record(&mut self, report: UpdateReport) {
        self.rounds += 1;
        self.applied += report.applied;
        self.ignored += report.ignored;
    }

    fn record_failure(&mut self) {
        self.rounds += 1;
        self.failed += 1;
    }
}

// ── apply_segments ────────────────────────────────────────────────────────────

/// Apply a batch of weight updates to existing edges.
///
/// Updates are grouped by source node and each group is applied under one
/// write-lock acquisition, so readers see a node's outgoing edges either all
/// before or all after the batch.  Parallel edges follow the graph's
/// first-match policy.
pub fn apply_segments(graph: &SharedGraph, segments: &[Segment]) -> UpdateReport {
    let mut report = UpdateReport::default();
    let mut by_source: BTreeMap<NodeId, Vec<(NodeId, f64)>> = BTreeMap::new();

    {
        let g = graph.read();
        for s in segments {
            match (g.node(&s.from), g.node(&s.to)) {
                (Some(from), Some(to)) if s.weight.is_finite() && s.weight >= 0.0 => {
                    by_source.entry(from).or_default().push((to, s.weight));
                }
                (Some(_), Some(_)) => {
                    warn!(edge = %s.edge_key(), weight = s.weight, "ignoring invalid live weight");
                    report.ignored += 1;
                }
                _ => report.ignored += 1,
            }
        }
    }

    for (from, updates) in by_source {
        match graph.update_outgoing(from, &updates) {
            Ok(matched) => {
                report.applied += matched;
                report.ignored += updates.len() - matched;
            }
            Err(e) => {
                warn!(%from, error = %e, "rejected live update group");
                report.ignored += updates.len();
            }
        }
    }
    report
}

// ── LiveWeightUpdater ─────────────────────────────────────────────────────────

/// Configures and spawns the background refresh task.
///
/// ```rust,ignore
/// let cancel = CancellationToken::new();
/// let handle = LiveWeightUpdater::new(graph.clone(), source, config.selector())
///     .interval(config.poll_interval())
///     .spawn(cancel.clone());
/// // ... foreground searches ...
/// let summary = handle.shutdown().await?;
/// ```
pub struct LiveWeightUpdater<S: ?Sized, O = NoopObserver> {
    graph:      SharedGraph,
    source:     Arc<S>,
    area:       AreaSelector,
    interval:   Duration,
    max_rounds: Option<u64>,
    observer:   O,
}

impl<S: TrafficSource + ?Sized + 'static> LiveWeightUpdater<S, NoopObserver> {
    pub fn new(graph: SharedGraph, source: Arc<S>, area: AreaSelector) -> Self {
        Self {
            graph,
            source,
            area,
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_rounds: None,
            observer: NoopObserver,
        }
    }
}

impl<S, O> LiveWeightUpdater<S, O>
where
    S: TrafficSource + ?Sized + 'static,
    O: UpdateObserver + 'static,
{
    /// Time between rounds.  The first round runs one interval after spawn;
    /// the initial batch is expected to be in the graph already.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Stop on its own after `rounds` rounds.  Unlimited by default.
    pub fn max_rounds(mut self, rounds: u64) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Replace the observer.
    pub fn observer<P: UpdateObserver + 'static>(self, observer: P) -> LiveWeightUpdater<S, P> {
        LiveWeightUpdater {
            graph:      self.graph,
            source:     self.source,
            area:       self.area,
            interval:   self.interval,
            max_rounds: self.max_rounds,
            observer,
        }
    }

    /// Fetch and apply one batch on the calling thread.
    pub fn refresh_now(&self) -> (Vec<Segment>, UpdateReport) {
        let segments = self.source.fetch(&self.area);
        let report = apply_segments(&self.graph, &segments);
        (segments, report)
    }

    /// Start the refresh loop on the current tokio runtime.
    ///
    /// Must be called from within a runtime context.
    pub fn spawn(self, cancel: CancellationToken) -> UpdaterHandle {
        info!(
            area = %self.area,
            interval_ms = self.interval.as_millis() as u64,
            max_rounds = ?self.max_rounds,
            "starting live weight updater"
        );
        let join = tokio::spawn(self.run(cancel.clone()));
        UpdaterHandle { cancel, join }
    }

    async fn run(mut self, cancel: CancellationToken) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        while self.max_rounds.is_none_or(|max| summary.rounds < max) {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let source = Arc::clone(&self.source);
            let area = self.area.clone();
            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                res = tokio::task::spawn_blocking(move || source.fetch(&area)) => res,
            };
            let segments = match fetched {
                Ok(segments) => segments,
                Err(e) => {
                    summary.record_failure();
                    warn!(round = summary.rounds, error = %e, "traffic fetch task failed; skipping round");
                    continue;
                }
            };

            let report = apply_segments(&self.graph, &segments);
            summary.record(report);
            debug!(round = summary.rounds, applied = report.applied, ignored = report.ignored, "live round applied");
            self.observer.on_round(summary.rounds, &segments, &report);
        }

        info!(rounds = summary.rounds, failed = summary.failed, applied = summary.applied, ignored = summary.ignored, "live weight updater stopped");
        self.observer.on_stop(&summary);
        summary
    }
}

// ── UpdaterHandle ─────────────────────────────────────────────────────────────

/// Owner's handle to a running updater task.
pub struct UpdaterHandle {
    cancel: CancellationToken,
    join:   JoinHandle<UpdateSummary>,
}

impl UpdaterHandle {
    /// Request a stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel and wait for the task to finish.
    pub async fn shutdown(self) -> LiveResult<UpdateSummary> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for the task to finish on its own (see
    /// [`LiveWeightUpdater::max_rounds`]).
    pub async fn join(self) -> LiveResult<UpdateSummary> {
        self.join.await.map_err(|e| LiveError::Task(e.to_string()))
    }
}
