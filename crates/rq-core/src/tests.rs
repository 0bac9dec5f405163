//! Unit tests for rq-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert_eq!(NodeId::default(), NodeId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(EdgeId(7).to_string(), "EdgeId(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::{BoundingBox, GeoPoint};

    #[test]
    fn planar_distance_is_euclidean() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(3.0, 4.0);
        assert_eq!(a.planar_distance(b), 5.0);
        assert_eq!(b.planar_distance(a), 5.0);
    }

    #[test]
    fn berlin_haversine_approx() {
        // Alexanderplatz → Brandenburger Tor, roughly 2.6 km.
        let alex = GeoPoint::new(52.5219, 13.4132);
        let gate = GeoPoint::new(52.5163, 13.3777);
        let d = alex.distance_m(gate);
        assert!((d - 2_500.0).abs() < 300.0, "got {d}");
    }

    #[test]
    fn bbox_spanning_and_contains() {
        let bbox = BoundingBox::spanning(GeoPoint::new(52.53, 13.40), GeoPoint::new(52.52, 13.41));
        assert_eq!(bbox.min_lat, 52.52);
        assert_eq!(bbox.max_lon, 13.41);
        assert!(bbox.contains(GeoPoint::new(52.525, 13.405)));
        assert!(bbox.contains(GeoPoint::new(52.52, 13.40))); // inclusive edge
        assert!(!bbox.contains(GeoPoint::new(52.54, 13.405)));
    }

    #[test]
    fn bbox_parse_display_agree() {
        let bbox: BoundingBox = "52.5,13.4;52.6,13.5".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(52.5, 13.4, 52.6, 13.5));
        assert_eq!(bbox.to_string(), "52.5000,13.4000;52.6000,13.5000");
        assert!("52.5,13.4".parse::<BoundingBox>().is_err());
        assert!("a,b;c,d".parse::<BoundingBox>().is_err());
    }
}

#[cfg(test)]
mod segment {
    use crate::{AreaSelector, BoundingBox, GeoPoint, Segment};

    #[test]
    fn edge_key_format() {
        assert_eq!(Segment::new("A", "B", 5.0).edge_key(), "A->B");
    }

    #[test]
    fn selector_without_bbox_accepts_unpositioned() {
        let sel = AreaSelector::city("Berlin");
        assert!(sel.accepts(&Segment::new("A", "B", 1.0)));
    }

    #[test]
    fn selector_with_bbox_filters() {
        let sel = AreaSelector::city("Berlin")
            .with_bbox(BoundingBox::new(52.0, 13.0, 53.0, 14.0));
        let inside = Segment::new("A", "B", 1.0)
            .with_positions(GeoPoint::new(52.5, 13.4), GeoPoint::new(52.6, 13.5));
        let outside = Segment::new("A", "C", 1.0)
            .with_positions(GeoPoint::new(52.5, 13.4), GeoPoint::new(48.1, 11.6));
        assert!(sel.accepts(&inside));
        assert!(!sel.accepts(&outside));
        // Unpositioned segments cannot be placed inside a box.
        assert!(!sel.accepts(&Segment::new("A", "B", 1.0)));
    }
}

#[cfg(test)]
mod config {
    use std::time::Duration;

    use crate::{BoundingBox, CoreError, RoutingConfig};

    #[test]
    fn defaults_are_valid() {
        let cfg = RoutingConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.congestion_threshold, 7.0);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(60));
        assert_eq!(cfg.selector().city, "Berlin");
        assert!(cfg.selector().bbox.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = RoutingConfig { poll_interval_secs: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));

        let cfg = RoutingConfig { congestion_threshold: f64::NAN, ..Default::default() };
        assert!(cfg.validate().is_err());

        let cfg = RoutingConfig { alert_threshold: -1.0, ..Default::default() };
        assert!(cfg.validate().is_err());

        let cfg = RoutingConfig {
            area: Some(BoundingBox::new(53.0, 13.0, 52.0, 14.0)),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn selector_carries_area() {
        let bbox = BoundingBox::new(52.0, 13.0, 53.0, 14.0);
        let cfg = RoutingConfig { area: Some(bbox), ..Default::default() };
        assert_eq!(cfg.selector().bbox, Some(bbox));
    }
}
