//! routeiq: least-congested routes through a city road network whose edge
//! weights refresh from a live traffic feed while the tool runs.
//!
//! ```text
//! routeiq --from A --to D --avoid-hotspots
//! routeiq --from-lat 52.5200 --from-lon 13.4050 --to-lat 52.5225 --to-lon 13.4100 --algorithm astar
//! routeiq --from A --to F --compare-algorithms --live-rounds 3 --poll-interval 1 --mock-jitter 0.3
//! ```
//!
//! Traffic comes from `--traffic-csv` when given, else from the built-in
//! mock feed.  Either way a failed fetch falls back to the last good batch.

mod observer;
mod output;


use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rq_core::config::{DEFAULT_CONGESTION_THRESHOLD, DEFAULT_POLL_INTERVAL_SECS};
use rq_core::{BoundingBox, GeoPoint, NodeId, RoutingConfig};
use rq_graph::{Algorithm, Comparison, Route, SharedGraph, Timed, WeightedGraph};
use rq_live::{CsvFeed, FallbackSource, LiveWeightUpdater, MockTraffic, TrafficFeed, TrafficSource};
use rq_store::{AlertBook, AlertRule, TrafficHistory, DEFAULT_ALERTS_FILE, DEFAULT_HISTORY_FILE};

use observer::CliObserver;

// ── Arguments ─────────────────────────────────────────────────────────────────

/// Find the shortest, least-congested path in a city.
#[derive(Parser)]
#[command(name = "routeiq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Start node key
    #[arg(long = "from", value_name = "NODE")]
    start: Option<String>,

    /// End node key
    #[arg(long = "to", value_name = "NODE")]
    end: Option<String>,

    /// Start latitude (alternative to --from)
    #[arg(long, allow_negative_numbers = true)]
    from_lat: Option<f64>,

    /// Start longitude (alternative to --from)
    #[arg(long, allow_negative_numbers = true)]
    from_lon: Option<f64>,

    /// End latitude (alternative to --to)
    #[arg(long, allow_negative_numbers = true)]
    to_lat: Option<f64>,

    /// End longitude (alternative to --to)
    #[arg(long, allow_negative_numbers = true)]
    to_lon: Option<f64>,

    /// Pathfinding algorithm (dijkstra, astar)
    #[arg(long, default_value_t = Algorithm::Dijkstra)]
    algorithm: Algorithm,

    /// Avoid congestion hotspots if possible
    #[arg(long)]
    avoid_hotspots: bool,

    /// Edges at or above this weight are hotspots and trigger alerts
    #[arg(long, default_value_t = DEFAULT_CONGESTION_THRESHOLD)]
    threshold: f64,

    /// Run Dijkstra and A* side by side and compare them
    #[arg(long)]
    compare_algorithms: bool,

    /// City name passed to the traffic provider
    #[arg(long, default_value = "Berlin")]
    city: String,

    /// Restrict traffic to "min_lat,min_lon;max_lat,max_lon"
    #[arg(long, value_name = "BBOX")]
    bbox: Option<BoundingBox>,

    /// Seconds between live traffic refreshes
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval: u64,

    /// Wait for this many live refreshes, then route again (0 = exit at once)
    #[arg(long, value_name = "N", default_value_t = 0)]
    live_rounds: u64,

    /// Read traffic segments from a CSV file instead of the mock feed
    #[arg(long, value_name = "PATH")]
    traffic_csv: Option<PathBuf>,

    /// Random weight jitter of the mock feed per refresh (0.3 = ±30 %)
    #[arg(long, default_value_t = 0.0)]
    mock_jitter: f64,

    /// Seed for the mock feed's jitter
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Alert book location
    #[arg(long, value_name = "PATH", default_value = DEFAULT_ALERTS_FILE)]
    alerts_file: PathBuf,

    /// Register an alert on a directed edge (repeatable)
    #[arg(long = "watch", value_name = "FROM:TO", value_parser = parse_rule)]
    watch: Vec<AlertRule>,

    /// Append every traffic batch to a history file (bare flag uses the default file)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_HISTORY_FILE)]
    history_file: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn parse_rule(s: &str) -> Result<AlertRule, String> {
    match s.split_once(':') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok(AlertRule::new(from.trim(), to.trim()))
        }
        _ => Err(format!("expected FROM:TO, got {s:?}")),
    }
}

/// How the user named the trip's endpoints.
#[derive(Clone, Debug, PartialEq)]
enum Endpoints {
    Keys(String, String),
    Coords(GeoPoint, GeoPoint),
}

impl Cli {
    fn endpoints(&self) -> Result<Endpoints> {
        if let (Some(a), Some(b), Some(c), Some(d)) = (self.from_lat, self.from_lon, self.to_lat, self.to_lon) {
            return Ok(Endpoints::Coords(GeoPoint::new(a, b), GeoPoint::new(c, d)));
        }
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => Ok(Endpoints::Keys(s.clone(), e.clone())),
            _ => bail!(
                "provide either --from and --to (node keys) or \
                 --from-lat, --from-lon, --to-lat, --to-lon (coordinates)"
            ),
        }
    }

    /// Coordinate trips scope the traffic query to the box they span.
    fn config(&self, endpoints: &Endpoints) -> RoutingConfig {
        let area = match endpoints {
            Endpoints::Coords(a, b) => Some(BoundingBox::spanning(*a, *b)),
            Endpoints::Keys(..) => self.bbox,
        };
        RoutingConfig {
            congestion_threshold: self.threshold,
            alert_threshold:      self.threshold,
            poll_interval_secs:   self.poll_interval,
            city:                 self.city.clone(),
            area,
        }
    }

    fn feed(&self) -> Box<dyn TrafficFeed> {
        match &self.traffic_csv {
            Some(path) => Box::new(CsvFeed::new(path)),
            None if self.mock_jitter > 0.0 => Box::new(MockTraffic::with_jitter(self.mock_jitter, self.seed)),
            None => Box::new(MockTraffic::new()),
        }
    }
}

// ── Trip resolution ───────────────────────────────────────────────────────────

/// Resolved endpoints.  An unknown key stays `None` and routes as
/// unreachable.
#[derive(Copy, Clone, Debug)]
struct Trip {
    start: Option<NodeId>,
    end:   Option<NodeId>,
}

impl Trip {
    fn ids(self) -> Option<(NodeId, NodeId)> {
        Some((self.start?, self.end?))
    }
}

fn resolve(graph: &SharedGraph, endpoints: &Endpoints) -> Option<Trip> {
    match endpoints {
        Endpoints::Keys(s, e) => {
            let lookup = |key: &str| {
                let id = graph.node(key);
                if id.is_none() {
                    warn!(node = key, "unknown node key");
                }
                id
            };
            Some(Trip { start: lookup(s), end: lookup(e) })
        }
        Endpoints::Coords(a, b) => Some(Trip {
            start: Some(graph.nearest_node(*a)?),
            end:   Some(graph.nearest_node(*b)?),
        }),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let endpoints = cli.endpoints()?;
    let config = cli.config(&endpoints);
    config.validate()?;

    // ── Initial batch and graph ───────────────────────────────────────────
    let source = Arc::new(FallbackSource::new(cli.feed()));
    let selector = config.selector();
    let initial = source.fetch(&selector);
    let graph = SharedGraph::new(
        WeightedGraph::from_segments(&initial).context("initial traffic batch is malformed")?,
    );

    // ── Stores ────────────────────────────────────────────────────────────
    let mut alerts = AlertBook::open(&cli.alerts_file)
        .with_context(|| format!("opening alert book {}", cli.alerts_file.display()))?;
    for rule in &cli.watch {
        if alerts.add(&rule.from, &rule.to)? {
            info!(%rule, "registered alert");
        }
    }
    let history = match &cli.history_file {
        Some(path) => Some(
            TrafficHistory::open(path)
                .with_context(|| format!("opening traffic history {}", path.display()))?,
        ),
        None => None,
    };
    let mut observer = CliObserver::new(alerts, history, config.alert_threshold);
    observer.observe(&initial);

    let Some(trip) = resolve(&graph, &endpoints) else {
        println!("Could not find nearest nodes for the provided coordinates.");
        return Ok(());
    };

    // ── Live updates ──────────────────────────────────────────────────────
    let mut updater = LiveWeightUpdater::new(graph.clone(), Arc::clone(&source), selector)
        .interval(config.poll_interval())
        .observer(observer);
    if cli.live_rounds > 0 {
        updater = updater.max_rounds(cli.live_rounds);
    }
    let handle = updater.spawn(CancellationToken::new());

    report(&cli, &graph, trip);

    if cli.live_rounds > 0 {
        let summary = handle.join().await?;
        println!("\n--- After {} live update round(s) ---", summary.rounds);
        report(&cli, &graph, trip);
    } else {
        handle.shutdown().await?;
    }
    Ok(())
}

/// Route and print results for the current graph state.
fn report(cli: &Cli, graph: &SharedGraph, trip: Trip) {
    if cli.compare_algorithms {
        let comparison = match trip.ids() {
            Some((s, e)) => graph.compare(s, e),
            None => {
                let none = Timed { route: Route::unreachable(), elapsed: Duration::ZERO };
                Comparison { dijkstra: none.clone(), a_star: none }
            }
        };
        output::print_comparison(&graph.read(), &comparison);
        return;
    }

    let avoid = cli.avoid_hotspots.then_some(cli.threshold);
    let choice = choose_route(graph, trip, cli.algorithm, avoid);
    if choice.fell_back {
        println!("No alternate path found avoiding hotspots. Showing best available route.");
    }
    let route = choice.route;
    let hotspots = graph.hotspots(cli.threshold);
    let g = graph.read();
    output::print_route(&g, &route);
    output::print_hotspots(&g, &hotspots);
}

/// Outcome of [`choose_route`].
#[derive(Debug)]
struct RouteChoice {
    route:     Route,
    /// Hotspot avoidance found no path and `route` ignores hotspots.
    fell_back: bool,
}

/// With `avoid_threshold` set, try the hotspot-free detour first and fall
/// back to an unrestricted search with `algorithm` when it is unreachable.
fn choose_route(graph: &SharedGraph, trip: Trip, algorithm: Algorithm, avoid_threshold: Option<f64>) -> RouteChoice {
    let Some((s, e)) = trip.ids() else {
        return RouteChoice { route: Route::unreachable(), fell_back: false };
    };
    match avoid_threshold {
        Some(threshold) => {
            let detour = graph.alternate_path(s, e, threshold);
            if detour.is_reachable() {
                RouteChoice { route: detour, fell_back: false }
            } else {
                RouteChoice { route: graph.route(algorithm, s, e), fell_back: true }
            }
        }
        None => RouteChoice { route: graph.route(algorithm, s, e), fell_back: false },
    }
}
