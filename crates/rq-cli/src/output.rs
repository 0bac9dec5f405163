//! Plain-text result printing.  Everything here goes to stdout; logs go to
//! stderr.

use std::collections::BTreeMap;

use rq_graph::{Comparison, Hotspot, Route, WeightedGraph};
use rq_store::AlertMessage;
use tracing::warn;

/// `A -> B -> C`, or an empty string for an unreachable route.
pub fn path_string(graph: &WeightedGraph, route: &Route) -> String {
    route.keys(graph).join(" -> ")
}

pub fn print_route(graph: &WeightedGraph, route: &Route) {
    println!("Path: {}", path_string(graph, route));
    println!("Total cost: {}", route.cost);
}

pub fn print_hotspots(graph: &WeightedGraph, hotspots: &[Hotspot]) {
    if hotspots.is_empty() {
        println!("No congestion hotspots detected.");
        return;
    }
    println!("Congestion hotspots:");
    for h in hotspots {
        let key = |id| graph.key(id).unwrap_or("?");
        println!("  {} -> {} (weight: {})", key(h.from), key(h.to), h.weight);
    }
}

pub fn print_comparison(graph: &WeightedGraph, cmp: &Comparison) {
    println!("\n--- Parallel Pathfinding Results ---");
    for (label, timed) in [("Dijkstra:", &cmp.dijkstra), ("A*:     ", &cmp.a_star)] {
        println!(
            "{label} Path: {}, Cost: {}, Time: {:.4}s",
            path_string(graph, &timed.route),
            timed.route.cost,
            timed.elapsed.as_secs_f64(),
        );
    }
    if !cmp.costs_agree() {
        warn!(
            dijkstra = cmp.dijkstra.route.cost,
            a_star = cmp.a_star.route.cost,
            "algorithms disagree on cost; the A* heuristic overestimates on this network"
        );
    }
}

pub fn print_alerts(alerts: &[AlertMessage]) {
    for alert in alerts {
        println!("{alert}");
    }
}

pub fn print_averages(snapshots: usize, averages: &BTreeMap<String, f64>) {
    if averages.is_empty() {
        return;
    }
    println!("\nAverage congestion over {snapshots} snapshot(s):");
    for (edge, avg) in averages {
        println!("  {edge}: {avg:.2}");
    }
}
