//! Traffic segment records exchanged with data providers and stores.

use crate::geo::{BoundingBox, GeoPoint};

/// One directed road segment as reported by a traffic provider.
///
/// `weight` is the current congestion-adjusted traversal cost (for the HERE
/// feed this is the jam factor, 0–10).  Positions are optional; providers
/// that only know topology leave them empty.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub from:     String,
    pub to:       String,
    pub weight:   f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub from_pos: Option<GeoPoint>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub to_pos:   Option<GeoPoint>,
}

impl Segment {
    /// A segment without positions.
    pub fn new(from: impl Into<String>, to: impl Into<String>, weight: f64) -> Self {
        Self {
            from:     from.into(),
            to:       to.into(),
            weight,
            from_pos: None,
            to_pos:   None,
        }
    }

    /// Attach endpoint positions.
    pub fn with_positions(mut self, from_pos: GeoPoint, to_pos: GeoPoint) -> Self {
        self.from_pos = Some(from_pos);
        self.to_pos = Some(to_pos);
        self
    }

    /// Canonical `"from->to"` key used by history aggregation.
    pub fn edge_key(&self) -> String {
        format!("{}->{}", self.from, self.to)
    }

    /// `true` when both endpoint positions are known and inside `bbox`.
    pub fn within(&self, bbox: &BoundingBox) -> bool {
        match (self.from_pos, self.to_pos) {
            (Some(a), Some(b)) => bbox.contains(a) && bbox.contains(b),
            _ => false,
        }
    }
}

// ── AreaSelector ──────────────────────────────────────────────────────────────

/// Which part of the world a provider should report on.
///
/// The city name is always present; the bounding box narrows the query when
/// the trip is given as coordinates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaSelector {
    pub city: String,
    pub bbox: Option<BoundingBox>,
}

impl AreaSelector {
    pub fn city(city: impl Into<String>) -> Self {
        Self { city: city.into(), bbox: None }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// `true` if `segment` falls inside the selected area.  City-only
    /// selectors accept everything.
    pub fn accepts(&self, segment: &Segment) -> bool {
        match &self.bbox {
            None => true,
            Some(bbox) => segment.within(bbox),
        }
    }
}

impl std::fmt::Display for AreaSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.bbox {
            None => f.write_str(&self.city),
            Some(bbox) => write!(f, "{} [{}]", self.city, bbox),
        }
    }
}
