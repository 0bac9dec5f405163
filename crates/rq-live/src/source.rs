//! Traffic providers.
//!
//! Two layers:
//!
//! | Trait           | Failure mode                    | Used by                  |
//! |-----------------|---------------------------------|--------------------------|
//! | [`TrafficFeed`] | `LiveResult<Vec<Segment>>`      | concrete providers       |
//! | [`TrafficSource`] | never fails, never empty      | graph build, updater     |
//!
//! [`FallbackSource`] turns any feed into a source by remembering the last
//! good batch and falling back to [`default_segments`] before the first one.
//!
//! # CSV format
//!
//! One row per directed segment.  Position columns may be left empty; a
//! position is only attached when both its latitude and longitude are set.
//!
//! ```csv
//! from,to,weight,from_lat,from_lon,to_lat,to_lon
//! A,B,5,52.5200,13.4050,52.5205,13.4060
//! B,C,3,,,,
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use rq_core::{AreaSelector, GeoPoint, Segment};

use crate::{LiveError, LiveResult};

// ── Traits ────────────────────────────────────────────────────────────────────

/// A provider that may fail: remote APIs, files, scripted test data.
pub trait TrafficFeed: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    fn fetch(&self, area: &AreaSelector) -> LiveResult<Vec<Segment>>;
}

impl<F: TrafficFeed + ?Sized> TrafficFeed for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, area: &AreaSelector) -> LiveResult<Vec<Segment>> {
        (**self).fetch(area)
    }
}

/// A provider that always answers with at least one segment.
///
/// Graph construction and the live updater only ever talk to this trait, so
/// provider failures never reach the search layer.
pub trait TrafficSource: Send + Sync {
    fn fetch(&self, area: &AreaSelector) -> Vec<Segment>;
}

/// Fetch several areas in parallel, one batch per selector, in input order.
pub fn fetch_areas<S: TrafficSource + ?Sized>(source: &S, areas: &[AreaSelector]) -> Vec<Vec<Segment>> {
    areas.par_iter().map(|area| source.fetch(area)).collect()
}

// ── Built-in batch ────────────────────────────────────────────────────────────

/// The ten-segment downtown Berlin batch used when nothing better is
/// available.  Weights are jam factors (0–10, 15 for a closed link).
pub fn default_segments() -> Vec<Segment> {
    const A: GeoPoint = GeoPoint { lat: 52.5200, lon: 13.4050 };
    const B: GeoPoint = GeoPoint { lat: 52.5205, lon: 13.4060 };
    const C: GeoPoint = GeoPoint { lat: 52.5210, lon: 13.4070 };
    const D: GeoPoint = GeoPoint { lat: 52.5215, lon: 13.4080 };
    const E: GeoPoint = GeoPoint { lat: 52.5220, lon: 13.4090 };
    const F: GeoPoint = GeoPoint { lat: 52.5225, lon: 13.4100 };

    [
        ("A", A, "B", B, 5.0),
        ("B", B, "C", C, 3.0),
        ("A", A, "C", C, 10.0),
        ("B", B, "D", D, 8.0),
        ("C", C, "D", D, 2.0),
        ("D", D, "E", E, 4.0),
        ("E", E, "F", F, 6.0),
        ("C", C, "F", F, 12.0),
        ("A", A, "E", E, 15.0),
        ("B", B, "E", E, 7.0),
    ]
    .into_iter()
    .map(|(from, fp, to, tp, w)| Segment::new(from, to, w).with_positions(fp, tp))
    .collect()
}

// ── MockTraffic ───────────────────────────────────────────────────────────────

/// In-process provider serving [`default_segments`].
///
/// With jitter enabled every fetch scales each weight by a random factor in
/// `[1 - amplitude, 1 + amplitude]`, rounded to one decimal, so the live
/// updater has something to apply.  The selector is ignored.
pub struct MockTraffic {
    jitter: Option<Jitter>,
}

struct Jitter {
    amplitude: f64,
    rng: Mutex<SmallRng>,
}

impl Default for MockTraffic {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTraffic {
    /// Fixed weights on every fetch.
    pub fn new() -> Self {
        Self { jitter: None }
    }

    /// Seeded random jitter; the same seed gives the same weight sequence.
    pub fn with_jitter(amplitude: f64, seed: u64) -> Self {
        Self {
            jitter: Some(Jitter {
                amplitude: amplitude.clamp(0.0, 1.0),
                rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            }),
        }
    }
}

impl TrafficFeed for MockTraffic {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(&self, _area: &AreaSelector) -> LiveResult<Vec<Segment>> {
        let mut segments = default_segments();
        if let Some(j) = &self.jitter {
            let mut rng = j.rng.lock();
            for s in &mut segments {
                let factor = 1.0 + rng.gen_range(-j.amplitude..=j.amplitude);
                s.weight = (s.weight * factor * 10.0).round().max(0.0) / 10.0;
            }
        }
        Ok(segments)
    }
}

// ── CsvFeed ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SegmentRecord {
    from:     String,
    to:       String,
    weight:   f64,
    #[serde(default)]
    from_lat: Option<f64>,
    #[serde(default)]
    from_lon: Option<f64>,
    #[serde(default)]
    to_lat:   Option<f64>,
    #[serde(default)]
    to_lon:   Option<f64>,
}

impl From<SegmentRecord> for Segment {
    fn from(r: SegmentRecord) -> Self {
        let point = |lat: Option<f64>, lon: Option<f64>| Some(GeoPoint::new(lat?, lon?));
        Segment {
            from_pos: point(r.from_lat, r.from_lon),
            to_pos:   point(r.to_lat, r.to_lon),
            from:     r.from,
            to:       r.to,
            weight:   r.weight,
        }
    }
}

/// Provider that re-reads a CSV file on every fetch.
///
/// Rows outside the selector's bounding box are dropped.  A file that
/// yields no rows for the area is reported as [`LiveError::Empty`] so that
/// a [`FallbackSource`] takes over.
#[derive(Clone, Debug)]
pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrafficFeed for CsvFeed {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, area: &AreaSelector) -> LiveResult<Vec<Segment>> {
        let file = std::fs::File::open(&self.path)?;
        let segments: Vec<Segment> = read_segments(file)?
            .into_iter()
            .filter(|s| area.accepts(s))
            .collect();
        if segments.is_empty() {
            return Err(LiveError::Empty { feed: self.path.display().to_string(), area: area.to_string() });
        }
        debug!(path = %self.path.display(), rows = segments.len(), "read traffic CSV");
        Ok(segments)
    }
}

/// Parse segment rows from any `Read` source.
pub fn read_segments<R: Read>(reader: R) -> LiveResult<Vec<Segment>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    csv_reader
        .deserialize::<SegmentRecord>()
        .map(|row| row.map(Segment::from).map_err(|e| LiveError::Parse(e.to_string())))
        .collect()
}

// ── FallbackSource ────────────────────────────────────────────────────────────

/// Wraps a [`TrafficFeed`] so that fetching never fails.
///
/// On a failed or empty fetch the last good batch is served again; before
/// the first success the built-in [`default_segments`] are served.
pub struct FallbackSource<F> {
    feed: F,
    last_good: Mutex<Option<Vec<Segment>>>,
}

impl<F: TrafficFeed> FallbackSource<F> {
    pub fn new(feed: F) -> Self {
        Self { feed, last_good: Mutex::new(None) }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// `true` once the wrapped feed has answered successfully at least once.
    pub fn has_live_data(&self) -> bool {
        self.last_good.lock().is_some()
    }
}

impl<F: TrafficFeed> TrafficSource for FallbackSource<F> {
    fn fetch(&self, area: &AreaSelector) -> Vec<Segment> {
        let error = match self.feed.fetch(area) {
            Ok(segments) if !segments.is_empty() => {
                *self.last_good.lock() = Some(segments.clone());
                return segments;
            }
            Ok(_) => LiveError::Empty { feed: self.feed.name().to_owned(), area: area.to_string() },
            Err(e) => e,
        };

        match self.last_good.lock().as_ref() {
            Some(last) => {
                warn!(feed = self.feed.name(), %error, "traffic fetch failed; reusing last good batch");
                last.clone()
            }
            None => {
                warn!(feed = self.feed.name(), %error, "traffic fetch failed; using built-in batch");
                default_segments()
            }
        }
    }
}
