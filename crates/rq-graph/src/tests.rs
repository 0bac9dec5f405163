//! Unit tests for rq-graph.
//!
//! All tests use hand-built graphs so they run without any traffic feed.

#[cfg(test)]
mod helpers {
    use rq_core::{GeoPoint, Segment};
    use crate::WeightedGraph;

    /// The ten-segment downtown Berlin batch.
    ///
    /// ```text
    /// A→B 5   B→C 3   A→C 10  B→D 8   C→D 2
    /// D→E 4   E→F 6   C→F 12  A→E 15  B→E 7
    /// ```
    ///
    /// Shortest A→D is A→B→C→D = 10, not A→B→D = 13.
    pub fn berlin_segments() -> Vec<Segment> {
        let pos = |k: &str| match k {
            "A" => GeoPoint::new(52.5200, 13.4050),
            "B" => GeoPoint::new(52.5205, 13.4060),
            "C" => GeoPoint::new(52.5210, 13.4070),
            "D" => GeoPoint::new(52.5215, 13.4080),
            "E" => GeoPoint::new(52.5220, 13.4090),
            _   => GeoPoint::new(52.5225, 13.4100),
        };
        [
            ("A", "B", 5.0), ("B", "C", 3.0), ("A", "C", 10.0), ("B", "D", 8.0),
            ("C", "D", 2.0), ("D", "E", 4.0), ("E", "F", 6.0), ("C", "F", 12.0),
            ("A", "E", 15.0), ("B", "E", 7.0),
        ]
        .into_iter()
        .map(|(f, t, w)| Segment::new(f, t, w).with_positions(pos(f), pos(t)))
        .collect()
    }

    pub fn berlin() -> WeightedGraph {
        WeightedGraph::from_segments(&berlin_segments()).unwrap()
    }

    /// Look up a set of keys that must exist.
    pub fn ids<const N: usize>(g: &WeightedGraph, keys: [&str; N]) -> [rq_core::NodeId; N] {
        keys.map(|k| g.node(k).unwrap())
    }

    /// `(from, to, weight)` triples as a sorted bag, for before/after checks.
    pub fn edge_bag(g: &WeightedGraph) -> Vec<(String, String, u64)> {
        let mut bag: Vec<_> = g
            .edges()
            .map(|e| {
                (
                    g.key(e.from).unwrap().to_owned(),
                    g.key(e.to).unwrap().to_owned(),
                    e.weight.to_bits(),
                )
            })
            .collect();
        bag.sort();
        bag
    }

    /// Deterministic pseudo-random graph: `n` nodes on a unit-degree grid,
    /// integer weights in `[2, 20)`.  Weights always exceed the planar
    /// distance between endpoints, so the Euclidean heuristic is consistent.
    pub fn random_graph(n: usize, edges: usize, seed: u64) -> WeightedGraph {
        let mut state = seed.max(1);
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        let mut g = WeightedGraph::new();
        for i in 0..n {
            let lat = (next() % 1_000) as f64 / 1_000.0;
            let lon = (next() % 1_000) as f64 / 1_000.0;
            g.add_node(&format!("n{i}"), Some(GeoPoint::new(lat, lon)));
        }
        for _ in 0..edges {
            let a = next() as usize % n;
            let b = next() as usize % n;
            let w = (2 + next() % 18) as f64;
            g.add_edge(&format!("n{a}"), &format!("n{b}"), w).unwrap();
        }
        g
    }
}

// ── Graph structure ───────────────────────────────────────────────────────────

#[cfg(test)]
mod graph {
    use rq_core::{EdgeId, GeoPoint, NodeId};
    use crate::{GraphError, WeightedGraph};

    #[test]
    fn empty_graph() {
        let g = WeightedGraph::new();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.is_empty());
        assert!(g.neighbors(NodeId(0)).is_empty());
    }

    #[test]
    fn from_segments_counts() {
        let g = super::helpers::berlin();
        assert_eq!(g.node_count(), 6);
        assert_eq!(g.edge_count(), 10);
        assert_eq!(g.to_segments().len(), 10);
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut g = WeightedGraph::new();
        let a = g.add_node("A", None);
        assert_eq!(g.add_node("A", None), a);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.key(a), Some("A"));
        assert_eq!(g.position(a), None);
    }

    #[test]
    fn add_node_overwrites_position_only_when_given() {
        let mut g = WeightedGraph::new();
        let a = g.add_node("A", Some(GeoPoint::new(1.0, 1.0)));
        g.add_node("A", None);
        assert_eq!(g.position(a), Some(GeoPoint::new(1.0, 1.0)));
        g.add_node("A", Some(GeoPoint::new(2.0, 2.0)));
        assert_eq!(g.position(a), Some(GeoPoint::new(2.0, 2.0)));
        // The spatial index follows the move.
        assert_eq!(g.nearest_node(GeoPoint::new(2.0, 2.1)), Some(a));
        assert_eq!(g.positions().count(), 1);
    }

    #[test]
    fn add_edge_inserts_endpoints_without_position() {
        let mut g = WeightedGraph::new();
        g.add_edge("X", "Y", 1.5).unwrap();
        let [x, y] = super::helpers::ids(&g, ["X", "Y"]);
        assert_eq!(g.neighbors(x).len(), 1);
        assert_eq!(g.neighbors(x)[0].to, y);
        assert_eq!(g.neighbors(x)[0].weight, 1.5);
        assert!(g.neighbors(y).is_empty());
        assert_eq!(g.position(y), None);
    }

    #[test]
    fn invalid_weights_rejected() {
        let mut g = WeightedGraph::new();
        assert!(matches!(g.add_edge("A", "B", f64::NAN), Err(GraphError::InvalidWeight { .. })));
        assert!(g.add_edge("A", "B", -1.0).is_err());
        assert!(g.add_edge("A", "B", f64::INFINITY).is_err());
        assert_eq!(g.edge_count(), 0);

        g.add_edge("A", "B", 2.0).unwrap();
        let [a, b] = super::helpers::ids(&g, ["A", "B"]);
        assert!(g.update_edge_weight(a, b, -3.0).is_err());
        assert_eq!(g.neighbors(a)[0].weight, 2.0);
    }

    #[test]
    fn zero_weight_is_valid() {
        let mut g = WeightedGraph::new();
        assert!(g.add_edge("A", "B", 0.0).is_ok());
    }

    #[test]
    fn update_edge_weight_replaces_weight() {
        let mut g = super::helpers::berlin();
        let [a, b] = super::helpers::ids(&g, ["A", "B"]);
        let edge = g.update_edge_weight(a, b, 9.0).unwrap();
        assert!(edge.is_some());
        assert_eq!(g.edge(edge.unwrap()).unwrap().weight, 9.0);
        assert_eq!(g.edge_count(), 10);
    }

    #[test]
    fn update_missing_edge_is_noop() {
        let mut g = super::helpers::berlin();
        let [d, a] = super::helpers::ids(&g, ["D", "A"]);
        let before = super::helpers::edge_bag(&g);
        assert_eq!(g.update_edge_weight(d, a, 1.0).unwrap(), None);
        assert_eq!(g.update_edge_weight(NodeId(999), a, 1.0).unwrap(), None);
        assert_eq!(super::helpers::edge_bag(&g), before);
    }

    #[test]
    fn parallel_edges_first_match_policy() {
        let mut g = WeightedGraph::new();
        let first = g.add_edge("A", "B", 5.0).unwrap();
        let second = g.add_edge("A", "B", 5.0).unwrap();
        assert_ne!(first, second);
        assert_eq!(g.edge_count(), 2);

        let [a, b] = super::helpers::ids(&g, ["A", "B"]);
        assert_eq!(g.update_edge_weight(a, b, 1.0).unwrap(), Some(first));
        assert_eq!(g.edge(first).unwrap().weight, 1.0);
        assert_eq!(g.edge(second).unwrap().weight, 5.0);

        // Exact addressing reaches the second edge.
        assert!(g.set_edge_weight(second, 2.0).unwrap());
        assert_eq!(g.edge(second).unwrap().weight, 2.0);
        assert!(!g.set_edge_weight(EdgeId(77), 2.0).unwrap());
    }

    #[test]
    fn edges_iterate_by_source_then_insertion() {
        let g = super::helpers::berlin();
        let order: Vec<(&str, &str)> = g
            .edges()
            .map(|e| (g.key(e.from).unwrap(), g.key(e.to).unwrap()))
            .collect();
        assert_eq!(&order[..3], &[("A", "B"), ("A", "C"), ("A", "E")]);
        assert_eq!(order.last(), Some(&("E", "F")));
    }

    #[test]
    fn segments_roundtrip_preserves_edges() {
        let g = super::helpers::berlin();
        let again = WeightedGraph::from_segments(&g.to_segments()).unwrap();
        assert_eq!(super::helpers::edge_bag(&again), super::helpers::edge_bag(&g));
    }
}

// ── Spatial lookup ────────────────────────────────────────────────────────────

#[cfg(test)]
mod nearest {
    use rq_core::GeoPoint;
    use crate::WeightedGraph;

    #[test]
    fn exact_and_nearby_positions() {
        let g = super::helpers::berlin();
        let [a, f] = super::helpers::ids(&g, ["A", "F"]);
        assert_eq!(g.nearest_node(GeoPoint::new(52.5200, 13.4050)), Some(a));
        assert_eq!(g.nearest_node(GeoPoint::new(52.5300, 13.4200)), Some(f));
    }

    #[test]
    fn no_positions_returns_none() {
        let mut g = WeightedGraph::new();
        g.add_edge("A", "B", 1.0).unwrap();
        assert!(g.nearest_node(GeoPoint::new(0.0, 0.0)).is_none());
        assert!(WeightedGraph::new().nearest_node(GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn ties_go_to_first_positioned() {
        let mut g = WeightedGraph::new();
        let q = g.add_node("Q", Some(GeoPoint::new(0.0, 2.0)));
        let p = g.add_node("P", Some(GeoPoint::new(0.0, 0.0)));
        // (0, 1) is exactly between P and Q.
        assert_eq!(g.nearest_node(GeoPoint::new(0.0, 1.0)), Some(q));
        assert_eq!(g.nearest_node(GeoPoint::new(0.0, 0.9)), Some(p));
    }

    #[test]
    fn late_position_ranks_after_earlier_ones() {
        let mut g = WeightedGraph::new();
        g.add_edge("X", "Y", 1.0).unwrap();
        let z = g.add_node("Z", Some(GeoPoint::new(0.0, 0.0)));
        let y = g.add_node("Y", Some(GeoPoint::new(0.0, 2.0)));
        // Y has the lower id but got its position after Z.
        assert!(y < z);
        assert_eq!(g.nearest_node(GeoPoint::new(0.0, 1.0)), Some(z));
    }

    #[test]
    fn moving_a_node_keeps_its_rank() {
        let mut g = WeightedGraph::new();
        let m = g.add_node("M", Some(GeoPoint::new(5.0, 5.0)));
        let n = g.add_node("N", Some(GeoPoint::new(0.0, 2.0)));
        g.add_node("M", Some(GeoPoint::new(0.0, 0.0)));
        assert_eq!(g.nearest_node(GeoPoint::new(0.0, 1.0)), Some(m));
        assert_eq!(g.nearest_node(GeoPoint::new(0.0, 1.5)), Some(n));
    }

    #[test]
    fn unpositioned_nodes_are_skipped() {
        let mut g = WeightedGraph::new();
        g.add_node("far", Some(GeoPoint::new(10.0, 10.0)));
        g.add_node("blind", None);
        let far = g.node("far").unwrap();
        assert_eq!(g.nearest_node(GeoPoint::new(0.0, 0.0)), Some(far));
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod search {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rq_core::NodeId;
    use crate::{
        a_star, a_star_with, dijkstra, AStarFinder, Algorithm, DijkstraFinder, GraphError,
        PathFinder, Route, WeightedGraph, ZeroHeuristic,
    };

    #[test]
    fn dijkstra_prefers_cheaper_longer_path() {
        let g = super::helpers::berlin();
        let [a, b, c, d] = super::helpers::ids(&g, ["A", "B", "C", "D"]);
        let r = dijkstra(&g, a, d);
        assert_eq!(r.nodes, vec![a, b, c, d]);
        assert_eq!(r.cost, 10.0);
        assert_eq!(r.hops(), 3);
        assert_eq!(r.keys(&g), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn a_star_matches_dijkstra_on_berlin() {
        let g = super::helpers::berlin();
        for from in g.nodes() {
            for to in g.nodes() {
                let d = dijkstra(&g, from, to);
                let a = a_star(&g, from, to);
                assert_eq!(d.cost, a.cost, "{from} -> {to}");
                assert_eq!(d.is_reachable(), a.is_reachable());
            }
        }
    }

    #[test]
    fn a_star_matches_dijkstra_on_random_graphs() {
        for seed in [1u64, 7, 42, 1234] {
            let g = super::helpers::random_graph(40, 160, seed);
            for from in g.nodes().step_by(5) {
                for to in g.nodes() {
                    let d = dijkstra(&g, from, to);
                    let a = a_star(&g, from, to);
                    assert_eq!(d.cost, a.cost, "seed {seed}: {from} -> {to}");
                    if d.is_reachable() {
                        assert_eq!(d.nodes.first(), Some(&from));
                        assert_eq!(d.nodes.last(), Some(&to));
                        assert_eq!(a.nodes.last(), Some(&to));
                    }
                }
            }
        }
    }

    #[test]
    fn same_start_and_end() {
        let g = super::helpers::berlin();
        for x in g.nodes() {
            assert_eq!(dijkstra(&g, x, x), Route::trivial(x));
            assert_eq!(a_star(&g, x, x), Route { nodes: vec![x], cost: 0.0 });
        }
    }

    #[test]
    fn unreachable_returns_sentinel() {
        let g = super::helpers::berlin();
        let [a, f] = super::helpers::ids(&g, ["A", "F"]);
        // Directed: nothing leaves F.
        for algo in Algorithm::ALL {
            let r = algo.run(&g, f, a);
            assert_eq!(r.nodes, Vec::<NodeId>::new());
            assert_eq!(r.cost, f64::INFINITY);
            assert!(!r.is_reachable());
        }
    }

    #[test]
    fn unknown_nodes_are_unreachable() {
        let g = super::helpers::berlin();
        let [a] = super::helpers::ids(&g, ["A"]);
        assert_eq!(dijkstra(&g, a, NodeId(99)), Route::unreachable());
        assert_eq!(a_star(&g, NodeId(99), a), Route::unreachable());
        assert_eq!(dijkstra(&WeightedGraph::new(), NodeId(0), NodeId(1)), Route::unreachable());
    }

    #[test]
    fn cycles_self_loops_and_islands_terminate() {
        let mut g = WeightedGraph::new();
        g.add_edge("A", "A", 1.0).unwrap();
        g.add_edge("A", "B", 1.0).unwrap();
        g.add_edge("B", "A", 1.0).unwrap();
        g.add_edge("B", "C", 1.0).unwrap();
        g.add_edge("C", "B", 0.0).unwrap();
        g.add_edge("X", "Y", 1.0).unwrap(); // separate component
        let [a, c, x] = super::helpers::ids(&g, ["A", "C", "X"]);

        for algo in Algorithm::ALL {
            assert_eq!(algo.run(&g, a, c).cost, 2.0);
            assert!(!algo.run(&g, c, x).is_reachable());
            assert!(!algo.run(&g, x, a).is_reachable());
        }
    }

    #[test]
    fn ties_are_deterministic() {
        // Two equal-cost routes S→L→T and S→R→T.
        let mut g = WeightedGraph::new();
        g.add_edge("S", "L", 1.0).unwrap();
        g.add_edge("S", "R", 1.0).unwrap();
        g.add_edge("L", "T", 1.0).unwrap();
        g.add_edge("R", "T", 1.0).unwrap();
        let [s, t] = super::helpers::ids(&g, ["S", "T"]);
        let first = dijkstra(&g, s, t);
        for _ in 0..10 {
            assert_eq!(dijkstra(&g, s, t), first);
        }
        assert_eq!(first.cost, 2.0);
        assert_eq!(first.keys(&g), vec!["S", "L", "T"]);
    }

    #[test]
    fn injectable_heuristic_is_called() {
        let g = super::helpers::berlin();
        let [a, d] = super::helpers::ids(&g, ["A", "D"]);
        let calls = AtomicUsize::new(0);
        let counting = |_: &WeightedGraph, _: NodeId, _: NodeId| {
            calls.fetch_add(1, Ordering::Relaxed);
            0.0
        };
        let r = a_star_with(&g, a, d, &counting);
        assert_eq!(r.cost, 10.0);
        assert!(calls.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn finders_agree_through_trait_objects() {
        let g = super::helpers::berlin();
        let [a, e] = super::helpers::ids(&g, ["A", "E"]);
        let finders: Vec<Box<dyn PathFinder>> = vec![
            Box::new(DijkstraFinder),
            Box::new(AStarFinder::new()),
            Box::new(AStarFinder::with_heuristic(ZeroHeuristic)),
        ];
        for f in &finders {
            // A→B→E = 12 beats A→B→C→D→E = 14 and A→E = 15.
            assert_eq!(f.find(&g, a, e).cost, 12.0);
        }
    }

    #[test]
    fn algorithm_parse_and_display() {
        assert_eq!("dijkstra".parse::<Algorithm>().unwrap(), Algorithm::Dijkstra);
        assert_eq!("AStar".parse::<Algorithm>().unwrap(), Algorithm::AStar);
        assert_eq!("a*".parse::<Algorithm>().unwrap(), Algorithm::AStar);
        assert!(matches!("bfs".parse::<Algorithm>(), Err(GraphError::UnknownAlgorithm(_))));
        assert_eq!(Algorithm::AStar.to_string(), "astar");
        assert_eq!(Algorithm::default(), Algorithm::Dijkstra);
    }
}

// ── Congestion ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod congestion {
    use crate::{dijkstra, find_hotspots, suggest_alternate_path, CongestionAnalyzer, WeightedGraph};

    fn hotspot_keys(g: &WeightedGraph, threshold: f64) -> Vec<(String, String, f64)> {
        find_hotspots(g, threshold)
            .into_iter()
            .map(|h| (g.key(h.from).unwrap().to_owned(), g.key(h.to).unwrap().to_owned(), h.weight))
            .collect()
    }

    #[test]
    fn berlin_hotspots_at_seven() {
        let g = super::helpers::berlin();
        let found = hotspot_keys(&g, 7.0);
        let expected: Vec<(String, String, f64)> = [
            ("A", "C", 10.0), ("A", "E", 15.0), ("B", "D", 8.0), ("B", "E", 7.0), ("C", "F", 12.0),
        ]
        .into_iter()
        .map(|(f, t, w)| (f.to_owned(), t.to_owned(), w))
        .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn hotspots_are_exactly_edges_at_or_above_threshold() {
        let g = super::helpers::random_graph(30, 120, 9);
        for t in [0.0, 2.0, 7.0, 7.5, 19.0, 25.0] {
            let hs = find_hotspots(&g, t);
            assert!(hs.iter().all(|h| h.weight >= t));
            assert_eq!(hs.len(), g.edges().filter(|e| e.weight >= t).count());
        }
    }

    #[test]
    fn raising_threshold_never_grows_result() {
        let g = super::helpers::random_graph(30, 120, 3);
        let mut last = usize::MAX;
        for t in 0..25 {
            let n = find_hotspots(&g, t as f64).len();
            assert!(n <= last);
            last = n;
        }
    }

    #[test]
    fn berlin_alternate_path_matches_unrestricted() {
        let mut g = super::helpers::berlin();
        let [a, b, c, d] = super::helpers::ids(&g, ["A", "B", "C", "D"]);
        let before = super::helpers::edge_bag(&g);
        let r = suggest_alternate_path(&mut g, a, d, 7.0);
        assert_eq!(r.nodes, vec![a, b, c, d]);
        assert_eq!(r.cost, 10.0);
        assert_eq!(super::helpers::edge_bag(&g), before);
        assert_eq!(g.edge_count(), 10);
    }

    #[test]
    fn detour_is_strictly_longer_when_hotspot_was_optimal() {
        let mut g = WeightedGraph::new();
        g.add_edge("S", "T", 8.0).unwrap(); // hotspot, but the cheapest way
        g.add_edge("S", "M", 5.0).unwrap();
        g.add_edge("M", "T", 5.0).unwrap();
        let [s, m, t] = super::helpers::ids(&g, ["S", "M", "T"]);

        assert_eq!(dijkstra(&g, s, t).cost, 8.0);
        let detour = suggest_alternate_path(&mut g, s, t, 7.0);
        assert_eq!(detour.nodes, vec![s, m, t]);
        assert_eq!(detour.cost, 10.0);
        // And the hotspot is usable again afterwards.
        assert_eq!(dijkstra(&g, s, t).nodes, vec![s, t]);
    }

    #[test]
    fn unreachable_detour_still_restores() {
        let mut g = WeightedGraph::new();
        g.add_edge("S", "T", 9.0).unwrap();
        g.add_edge("T", "U", 1.0).unwrap();
        let [s, t] = super::helpers::ids(&g, ["S", "T"]);
        let before = super::helpers::edge_bag(&g);
        let order_before: Vec<_> = g.edges().collect();

        let r = suggest_alternate_path(&mut g, s, t, 7.0);
        assert!(!r.is_reachable());
        assert_eq!(r.cost, f64::INFINITY);
        assert_eq!(super::helpers::edge_bag(&g), before);
        assert_eq!(g.edges().collect::<Vec<_>>(), order_before);
    }

    #[test]
    fn restoration_keeps_adjacency_order() {
        let mut g = super::helpers::berlin();
        let order_before: Vec<_> = g.edges().collect();
        for (from, to) in [("A", "F"), ("B", "F"), ("F", "A")] {
            let [x, y] = super::helpers::ids(&g, [from, to]);
            suggest_alternate_path(&mut g, x, y, 5.0);
            assert_eq!(g.edges().collect::<Vec<_>>(), order_before);
        }
    }

    #[test]
    fn restoration_survives_random_graphs() {
        for seed in [5u64, 11, 99] {
            let mut g = super::helpers::random_graph(25, 100, seed);
            let before = super::helpers::edge_bag(&g);
            let nodes: Vec<_> = g.nodes().collect();
            for (i, &from) in nodes.iter().enumerate().take(8) {
                let to = nodes[(i * 7 + 3) % nodes.len()];
                let r = suggest_alternate_path(&mut g, from, to, 10.0);
                // No hotspot edge appears on the detour.
                for pair in r.nodes.windows(2) {
                    assert!(g.neighbors(pair[0]).iter().any(|e| e.to == pair[1] && e.weight < 10.0));
                }
                assert_eq!(super::helpers::edge_bag(&g), before);
            }
        }
    }

    #[test]
    fn analyzer_uses_its_threshold() {
        let mut g = super::helpers::berlin();
        let analyzer = CongestionAnalyzer::default();
        assert_eq!(analyzer.threshold(), 7.0);
        assert!(analyzer.is_hotspot(7.0));
        assert!(!analyzer.is_hotspot(6.99));
        assert_eq!(analyzer.hotspots(&g).len(), 5);
        assert_eq!(CongestionAnalyzer::new(12.0).hotspots(&g).len(), 2);

        let [a, f] = super::helpers::ids(&g, ["A", "F"]);
        // Without hotspots: A→B→C→D→E→F = 20.
        assert_eq!(analyzer.alternate_path(&mut g, a, f).cost, 20.0);
    }
}

// ── SharedGraph & concurrency ─────────────────────────────────────────────────

#[cfg(test)]
mod shared {
    use std::sync::atomic::{AtomicBool, Ordering};

    use rq_core::NodeId;
    use crate::{Algorithm, GraphError, SharedGraph, WeightedGraph};

    #[test]
    fn routes_through_the_lock() {
        let shared = SharedGraph::new(super::helpers::berlin());
        let a = shared.node("A").unwrap();
        let d = shared.node("D").unwrap();
        assert_eq!(shared.route(Algorithm::Dijkstra, a, d).cost, 10.0);
        assert_eq!(shared.route(Algorithm::AStar, a, d).cost, 10.0);
        assert_eq!(shared.hotspots(7.0).len(), 5);
        assert_eq!(shared.alternate_path(a, d, 7.0).cost, 10.0);
        assert_eq!(shared.key(a).as_deref(), Some("A"));
        assert!(!shared.is_locked());
    }

    #[test]
    fn compare_runs_both() {
        let shared = SharedGraph::new(super::helpers::berlin());
        let a = shared.node("A").unwrap();
        let f = shared.node("F").unwrap();
        let cmp = shared.compare(a, f);
        assert!(cmp.costs_agree());
        // A→B→E→F = 18 beats A→B→C→D→E→F = 20.
        assert_eq!(cmp.dijkstra.route.cost, 18.0);
        assert!(cmp.a_star.route.is_reachable());

        let unreachable = shared.compare(f, a);
        assert!(unreachable.costs_agree());
        assert!(!unreachable.dijkstra.route.is_reachable());
    }

    #[test]
    fn update_outgoing_counts_matches_and_validates() {
        let shared = SharedGraph::new(super::helpers::berlin());
        let [a, b, c, d] = ["A", "B", "C", "D"].map(|k| shared.node(k).unwrap());
        assert_eq!(shared.update_outgoing(a, &[(b, 1.0), (c, 1.0), (d, 1.0)]).unwrap(), 2);

        let err = shared.update_outgoing(a, &[(b, 2.0), (c, f64::NAN)]);
        assert!(matches!(err, Err(GraphError::InvalidWeight { .. })));
        // The valid half of the rejected batch was not applied.
        assert_eq!(shared.read().neighbors(a)[0].weight, 1.0);
    }

    #[test]
    fn clones_share_state() {
        let shared = SharedGraph::new(super::helpers::berlin());
        let other = shared.clone();
        let a = shared.node("A").unwrap();
        let b = shared.node("B").unwrap();
        other.update_edge_weight(a, b, 0.5).unwrap();
        assert_eq!(shared.read().neighbors(a)[0].weight, 0.5);
        assert_eq!(SharedGraph::from(WeightedGraph::new()).snapshot().node_count(), 0);
    }

    /// Hub `H` fans out to `X0..X{width}`, each of which reaches `T` at cost 1.
    /// A direct `H→T` edge at 1e6 is never optimal and always a hotspot at
    /// threshold 1e5.
    fn fan_graph(width: usize) -> WeightedGraph {
        let mut g = WeightedGraph::new();
        for i in 0..width {
            g.add_edge("H", &format!("X{i}"), 1.0).unwrap();
            g.add_edge(&format!("X{i}"), "T", 1.0).unwrap();
        }
        g.add_edge("H", "T", 1e6).unwrap();
        g
    }

    #[test]
    fn stress_updates_against_concurrent_searches() {
        const WIDTH: usize = 8;
        const GENERATIONS: u32 = 400;
        const READERS: usize = 4;

        let shared = SharedGraph::new(fan_graph(WIDTH));
        let before = super::helpers::edge_bag(&shared.read());
        let hub = shared.node("H").unwrap();
        let sink = shared.node("T").unwrap();
        let fan: Vec<NodeId> = (0..WIDTH).map(|i| shared.node(&format!("X{i}")).unwrap()).collect();
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            // Writer: every generation rewrites all fan edges to the same value.
            scope.spawn(|| {
                for generation in 1..=GENERATIONS {
                    let updates: Vec<(NodeId, f64)> =
                        fan.iter().map(|&x| (x, generation as f64)).collect();
                    assert_eq!(shared.update_outgoing(hub, &updates).unwrap(), WIDTH);
                }
                done.store(true, Ordering::Release);
            });

            // Readers: the torn-read sentinel is "all fan weights equal".
            for r in 0..READERS {
                let (shared, fan, done) = (&shared, &fan, &done);
                scope.spawn(move || {
                    let mut rounds = 0u32;
                    while !done.load(Ordering::Acquire) || rounds < 10 {
                        {
                            let g = shared.read();
                            let weights: Vec<f64> = g
                                .neighbors(hub)
                                .iter()
                                .filter(|e| fan.contains(&e.to))
                                .map(|e| e.weight)
                                .collect();
                            assert_eq!(weights.len(), WIDTH);
                            assert!(weights.windows(2).all(|w| w[0] == w[1]), "torn read: {weights:?}");
                        }
                        let algo = Algorithm::ALL[r % 2];
                        let route = shared.route(algo, hub, sink);
                        assert_eq!(route.hops(), 2);
                        assert!(route.cost >= 2.0 && route.cost <= GENERATIONS as f64 + 1.0);

                        let detour = shared.alternate_path(hub, sink, 1e5);
                        assert_eq!(detour.hops(), 2, "detour must avoid the direct hotspot");
                        rounds += 1;
                    }
                });
            }
        });

        // Every fan edge ends on the last generation; nothing else moved.
        let g = shared.read();
        assert!(g.neighbors(hub).iter().filter(|e| e.to != sink).all(|e| e.weight == GENERATIONS as f64));
        assert_eq!(g.edge_count(), 2 * WIDTH + 1);
        let after = super::helpers::edge_bag(&g);
        assert_eq!(after.len(), before.len());
        drop(g);
        assert!(!shared.is_locked());
    }
}
