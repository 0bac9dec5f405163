//! Per-batch side effects: alert checks and history recording.

use tracing::{debug, warn};

use rq_core::Segment;
use rq_live::{UpdateObserver, UpdateReport, UpdateSummary};
use rq_store::{AlertBook, TrafficHistory};

use crate::output;

pub struct CliObserver {
    alerts:          AlertBook,
    history:         Option<TrafficHistory>,
    alert_threshold: f64,
}

impl CliObserver {
    pub fn new(alerts: AlertBook, history: Option<TrafficHistory>, alert_threshold: f64) -> Self {
        Self { alerts, history, alert_threshold }
    }

    /// Print triggered alerts for `segments` and append them to the history.
    pub fn observe(&mut self, segments: &[Segment]) {
        output::print_alerts(&self.alerts.check(segments, self.alert_threshold));
        if let Some(history) = &mut self.history {
            if let Err(e) = history.record(segments) {
                warn!(path = %history.path().display(), error = %e, "could not record traffic snapshot");
            }
        }
    }
}

impl UpdateObserver for CliObserver {
    fn on_round(&mut self, round: u64, segments: &[Segment], report: &UpdateReport) {
        debug!(round, applied = report.applied, ignored = report.ignored, "live traffic refreshed");
        self.observe(segments);
    }

    fn on_stop(&mut self, _summary: &UpdateSummary) {
        if let Some(history) = &self.history {
            output::print_averages(history.len(), &history.average_per_edge());
        }
    }
}
