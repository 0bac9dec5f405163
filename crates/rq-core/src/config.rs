//! Routing session configuration.

use std::time::Duration;

use crate::geo::BoundingBox;
use crate::segment::AreaSelector;
use crate::{CoreError, CoreResult};

/// Default congestion threshold: edges at or above this weight are hotspots.
pub const DEFAULT_CONGESTION_THRESHOLD: f64 = 7.0;

/// Default live-traffic polling interval.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Top-level configuration for one routing session.
///
/// Typically assembled from command-line flags by the application crate, or
/// loaded from a JSON file when the `serde` feature is enabled.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingConfig {
    /// Edges with weight ≥ this value are hotspots.  Default: 7.0.
    pub congestion_threshold: f64,

    /// Registered alerts fire when their edge weight reaches this value.
    /// Default: same as the congestion threshold.
    pub alert_threshold: f64,

    /// Seconds between live-traffic refreshes.  Must be > 0.
    pub poll_interval_secs: u64,

    /// City name passed to the traffic provider.
    pub city: String,

    /// Optional area restriction for the traffic provider.
    pub area: Option<BoundingBox>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            congestion_threshold: DEFAULT_CONGESTION_THRESHOLD,
            alert_threshold:      DEFAULT_CONGESTION_THRESHOLD,
            poll_interval_secs:   DEFAULT_POLL_INTERVAL_SECS,
            city:                 "Berlin".to_owned(),
            area:                 None,
        }
    }
}

impl RoutingConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Provider selector derived from `city` and `area`.
    pub fn selector(&self) -> AreaSelector {
        let sel = AreaSelector::city(self.city.clone());
        match self.area {
            Some(bbox) => sel.with_bbox(bbox),
            None => sel,
        }
    }

    /// Reject values that would make the session meaningless.
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("congestion_threshold", self.congestion_threshold),
            ("alert_threshold", self.alert_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.poll_interval_secs == 0 {
            return Err(CoreError::Config("poll_interval_secs must be > 0".into()));
        }
        if let Some(bbox) = self.area {
            if bbox.min_lat > bbox.max_lat || bbox.min_lon > bbox.max_lon {
                return Err(CoreError::Config(format!("inverted bounding box {bbox}")));
            }
        }
        Ok(())
    }
}
