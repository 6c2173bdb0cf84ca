//! PeakFinder CLI - Command-line interface
//!
//! This binary provides a command-line interface to the PeakFinder
//! library: it runs one search and prints the ranked peak list,
//! streaming partial results while tiles complete.

use std::process;

use clap::Parser;
use peakfinder::geo::{Point, METERS_PER_MILE};
use peakfinder::logging::{default_log_dir, default_log_file, init_logging};
use peakfinder::provider::{OverpassClient, ReqwestClient};
use peakfinder::search::{SearchConfig, SearchOrchestrator, SearchPhase, SearchState};

#[derive(Parser)]
#[command(name = "peakfinder")]
#[command(version = peakfinder::VERSION)]
#[command(about = "Find the highest mountain peaks around a location", long_about = None)]
struct Args {
    /// Latitude in decimal degrees
    #[arg(long)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long)]
    lon: f64,

    /// Search radius in miles
    #[arg(long, default_value = "50")]
    radius_miles: f64,

    /// Number of peaks to report
    #[arg(long, default_value = "5")]
    count: usize,

    /// Overpass endpoint override (repeatable; tried in order)
    #[arg(long = "endpoint")]
    endpoints: Vec<String>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Disable log file output
    #[arg(long)]
    no_log_file: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if !(-90.0..=90.0).contains(&args.lat) {
        eprintln!("Error: Latitude must be between -90 and 90");
        process::exit(1);
    }
    if args.radius_miles <= 0.0 {
        eprintln!("Error: Radius must be greater than zero");
        process::exit(1);
    }
    if args.count == 0 {
        eprintln!("Error: Count must be at least 1");
        process::exit(1);
    }

    let _guard = if args.no_log_file {
        None
    } else {
        match init_logging(default_log_dir(), default_log_file()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error initializing logging: {}", e);
                process::exit(1);
            }
        }
    };

    let http_client = match ReqwestClient::with_timeout(args.timeout_secs) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            process::exit(1);
        }
    };

    let provider = if args.endpoints.is_empty() {
        OverpassClient::new(http_client)
    } else {
        OverpassClient::with_endpoints(http_client, args.endpoints.clone())
    };

    let config = SearchConfig::default().with_result_limit(args.count);
    let mut orchestrator = SearchOrchestrator::new(provider, config);

    println!("Searching for peaks:");
    println!("  Location: {}, {}", args.lat, args.lon);
    println!("  Radius: {} miles", args.radius_miles);
    println!();

    orchestrator.pick_location(Point::new(args.lat, args.lon));
    orchestrator.confirm_location();
    orchestrator.set_radius(args.radius_miles);

    let mut rx = orchestrator.subscribe();
    let start = std::time::Instant::now();
    orchestrator.start_search();

    loop {
        if rx.changed().await.is_err() {
            eprintln!("Error: Search state channel closed");
            process::exit(1);
        }
        let state = rx.borrow_and_update().clone();
        match state.phase {
            SearchPhase::Searching => {
                if let Some(progress) = state.progress {
                    println!(
                        "  Tiles: {}/{} ({} peaks so far)",
                        progress.done,
                        progress.total,
                        state.results.len()
                    );
                }
            }
            SearchPhase::Completed => {
                let elapsed = start.elapsed();
                println!();
                println!("Completed in {:.2}s", elapsed.as_secs_f64());
                print_results(&state);
                return;
            }
            SearchPhase::Failed => {
                eprintln!(
                    "Error: {}",
                    state.error.as_deref().unwrap_or("search failed")
                );
                process::exit(1);
            }
            _ => {}
        }
    }
}

fn print_results(state: &SearchState) {
    if state.results.is_empty() {
        println!("No peaks found in this area.");
        return;
    }
    for (rank, peak) in state.results.iter().enumerate() {
        let elevation = match peak.elevation_m {
            Some(m) => format!("{:.0} m", m),
            None => "unknown elevation".to_string(),
        };
        let distance = match peak.distance_m {
            Some(m) => format!("{:.1} mi", m / METERS_PER_MILE),
            None => String::new(),
        };
        println!("{}. {} - {} ({})", rank + 1, peak.name, elevation, distance);
    }
}
