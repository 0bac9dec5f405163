//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Traffic feeds report segment
//! endpoints to 4–7 decimal places, and the A* heuristic compares
//! coordinate deltas of ~1e-4 degrees, so single precision would lose the
//! signal entirely.

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Straight-line distance in raw (lat, lon) degree space.
    ///
    /// This is the metric used for nearest-node lookup and the default A*
    /// heuristic.  It is not a physical distance.
    #[inline]
    pub fn planar_distance(self, other: GeoPoint) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }

    /// `true` when both coordinates are finite numbers.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// Axis-aligned lat/lon rectangle used to scope traffic queries.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self { min_lat, min_lon, max_lat, max_lon }
    }

    /// Smallest box containing both points (e.g. a trip's origin and
    /// destination).
    pub fn spanning(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            min_lat: a.lat.min(b.lat),
            min_lon: a.lon.min(b.lon),
            max_lat: a.lat.max(b.lat),
            max_lon: a.lon.max(b.lon),
        }
    }


    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat
            && p.lon >= self.min_lon && p.lon <= self.max_lon
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.4},{:.4};{:.4},{:.4}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = crate::CoreError;

    /// Parse the `min_lat,min_lon;max_lat,max_lon` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || crate::CoreError::Parse(format!(
            "invalid bounding box {s:?}: expected \"min_lat,min_lon;max_lat,max_lon\""
        ));
        let (lo, hi) = s.split_once(';').ok_or_else(bad)?;
        let pair = |part: &str| -> Result<(f64, f64), crate::CoreError> {
            let (a, b) = part.split_once(',').ok_or_else(bad)?;
            let a = a.trim().parse::<f64>().map_err(|_| bad())?;
            let b = b.trim().parse::<f64>().map_err(|_| bad())?;
            Ok((a, b))
        };
        let (min_lat, min_lon) = pair(lo)?;
        let (max_lat, max_lon) = pair(hi)?;
        Ok(Self::new(min_lat, min_lon, max_lat, max_lon))
    }
}
