//! Historical traffic snapshots and per-edge averages.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use rq_core::Segment;

use crate::file::{load_or_default, save};
use crate::StoreResult;

pub const DEFAULT_HISTORY_FILE: &str = "historical_traffic.json";

/// Every recorded batch, oldest first, persisted as one JSON array of arrays.
#[derive(Debug)]
pub struct TrafficHistory {
    path:      PathBuf,
    snapshots: Vec<Vec<Segment>>,
}

impl TrafficHistory {
    /// Load the history at `path`.  A missing file is an empty history.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let snapshots: Vec<Vec<Segment>> = load_or_default(&path)?;
        debug!(path = %path.display(), snapshots = snapshots.len(), "opened traffic history");
        Ok(Self { path, snapshots })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one batch and rewrite the file.
    pub fn record(&mut self, segments: &[Segment]) -> StoreResult<()> {
        self.snapshots.push(segments.to_vec());
        save(&self.path, &self.snapshots)
    }

    pub fn snapshots(&self) -> &[Vec<Segment>] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Mean weight per `"from->to"` key over every recorded snapshot.
    pub fn average_per_edge(&self) -> BTreeMap<String, f64> {
        average_congestion(&self.snapshots)
    }
}

/// Mean weight per `"from->to"` key.  Each occurrence counts once, so an
/// edge reported twice in one snapshot weighs twice.
pub fn average_congestion(snapshots: &[Vec<Segment>]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for segment in snapshots.iter().flatten() {
        let entry = sums.entry(segment.edge_key()).or_insert((0.0, 0));
        entry.0 += segment.weight;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, n))| (key, sum / f64::from(n)))
        .collect()
}
