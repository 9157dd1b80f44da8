//! CLI for the rtdb real-time point store.
//!
//! Provides commands for filtering a point feed through the store's change
//! detection and for benchmarking the write path.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use clap::{Parser, Subcommand};
use rtdb::{FilterConfig, IsoTimestamp, Point, PointStore, Priority, StoreConfig};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// rtdb — In-memory real-time point store CLI.
#[derive(Parser)]
#[command(name = "rtdb", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Pass a JSON-lines point feed through change detection.
    ///
    /// Each input line is `{"Key": <u64>, "Point": {...}}`. Lines judged a
    /// change are written to stdout in the same shape, carrying the point as
    /// the store holds it.
    Filter {
        /// Input file; stdin when omitted or "-".
        input: Option<PathBuf>,

        /// Change rule: 1/value-quality, 2/value-quality-timestamp,
        /// 0/deadband.
        #[arg(long)]
        priority: Option<Priority>,

        /// Deadband aperture (deadband rule only).
        #[arg(long)]
        aperture: Option<f64>,

        /// JSON file with `priority` and `aperture`; flags override it.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Store points with the freshness flag exactly as supplied.
        #[arg(long)]
        no_freshness: bool,

        /// Stamp points without a receipt time with the current time.
        #[arg(long)]
        stamp_received: bool,
    },

    /// Run a concurrent write-path benchmark.
    Bench {
        /// Number of updates to submit in total.
        #[arg(long, default_value = "1000000")]
        points: u64,

        /// Number of distinct keys.
        #[arg(long, default_value = "1000")]
        keys: u64,

        /// Number of writer threads sharing the store.
        #[arg(long, default_value = "4")]
        threads: u64,

        /// Deadband aperture applied to every update.
        #[arg(long, default_value = "0.5")]
        aperture: f64,
    },
}

/// One line of the filter feed.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Update {
    key: u64,
    point: Point,
}

/// Counters reported after a filter run.
#[derive(Debug, Default, PartialEq, Eq)]
struct FilterSummary {
    read: u64,
    changed: u64,
    suppressed: u64,
    rejected: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Filter {
            input,
            priority,
            aperture,
            config,
            no_freshness,
            stamp_received,
        } => {
            let store_config = StoreConfig {
                track_freshness: !no_freshness,
                stamp_received,
            };
            cmd_filter(
                input.as_deref(),
                priority,
                aperture,
                config.as_deref(),
                store_config,
            )
        }
        Commands::Bench {
            points,
            keys,
            threads,
            aperture,
        } => cmd_bench(points, keys, threads, aperture),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Resolves the filter from an optional config file and flag overrides.
fn resolve_filter(
    priority: Option<Priority>,
    aperture: Option<f64>,
    config: Option<&Path>,
) -> rtdb::Result<FilterConfig> {
    let base = match config {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };
    FilterConfig::new(
        priority.unwrap_or(base.priority),
        aperture.or(base.aperture),
    )
}

/// Implements `rtdb filter [input]`.
fn cmd_filter(
    input: Option<&Path>,
    priority: Option<Priority>,
    aperture: Option<f64>,
    config: Option<&Path>,
    store_config: StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = resolve_filter(priority, aperture, config)?;
    let store = PointStore::with_config(store_config);

    tracing::info!(
        priority = %filter.priority,
        aperture = ?filter.aperture,
        "filtering point feed"
    );

    let reader: Box<dyn BufRead> = match input {
        Some(path) if path != Path::new("-") => Box::new(BufReader::new(File::open(path)?)),
        _ => Box::new(io::stdin().lock()),
    };
    let mut writer = BufWriter::new(io::stdout().lock());

    let fallbacks_before = rtdb::timestamp::parse_fallbacks();
    let summary = run_filter(&store, &filter, reader, &mut writer)?;
    writer.flush()?;

    tracing::info!(
        read = summary.read,
        changed = summary.changed,
        suppressed = summary.suppressed,
        rejected = summary.rejected,
        keys = store.len(),
        timestamp_fallbacks = rtdb::timestamp::parse_fallbacks() - fallbacks_before,
        "filter complete"
    );

    Ok(())
}

/// Runs every line of `reader` through the store, writing changes to `writer`.
///
/// Each change is echoed as stored, so the store's freshness and receipt
/// stamping show up in the output.
///
/// Blank lines are skipped. Lines that are not valid updates are logged and
/// counted as rejected.
fn run_filter<R: BufRead, W: Write>(
    store: &PointStore,
    filter: &FilterConfig,
    reader: R,
    writer: &mut W,
) -> io::Result<FilterSummary> {
    let mut summary = FilterSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        summary.read += 1;

        let update: Update = match serde_json::from_str(&line) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "rejecting malformed update");
                summary.rejected += 1;
                continue;
            }
        };

        let Update { key, point } = update;
        if store.is_point_changed_with(key, point, filter) {
            summary.changed += 1;
            if let Some(point) = store.get(key) {
                serde_json::to_writer(&mut *writer, &Update { key, point })?;
                writer.write_all(b"\n")?;
            }
        } else {
            summary.suppressed += 1;
        }
    }

    Ok(summary)
}

/// Implements `rtdb bench`.
#[allow(clippy::cast_precision_loss)] // Benchmark stats are fine with f64 precision
fn cmd_bench(
    points: u64,
    keys: u64,
    threads: u64,
    aperture: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    if keys == 0 || threads == 0 {
        return Err("--keys and --threads must be greater than zero".into());
    }
    let filter = FilterConfig::new(Priority::Deadband, Some(aperture))?;

    println!("rtdb change-detection benchmark");
    println!("  Points: {points}");
    println!("  Keys: {keys}");
    println!("  Threads: {threads}");
    println!("  Aperture: {aperture}");
    println!();

    let store = PointStore::new();
    let changed = AtomicU64::new(0);
    let ts = IsoTimestamp::now();
    let points_per_thread = points / threads;

    let start = Instant::now();

    std::thread::scope(|s| {
        for t in 0..threads {
            let store = &store;
            let changed = &changed;
            let filter = &filter;
            s.spawn(move || {
                let mut local = 0u64;
                for i in 0..points_per_thread {
                    let key = (t * points_per_thread + i) % keys;
                    // sawtooth so roughly every other update crosses the deadband
                    let value = (i % 4) as f64 * aperture * 0.75;
                    if store.is_point_changed_with(key, Point::new(value, 0, ts), filter) {
                        local += 1;
                    }
                }
                changed.fetch_add(local, Ordering::Relaxed);
            });
        }
    });

    let elapsed = start.elapsed();
    let total = points_per_thread * threads;
    let changed = changed.load(Ordering::Relaxed);
    let ns_per_update = elapsed.as_nanos() as f64 / total.max(1) as f64;
    let updates_per_sec = total as f64 / elapsed.as_secs_f64();

    println!("Results:");
    println!("  Total updates: {total}");
    println!("  Changed: {changed}");
    println!("  Suppressed: {}", total - changed);
    println!("  Keys stored: {}", store.len());
    println!("  Elapsed: {elapsed:.3?}");
    println!("  Avg latency: {ns_per_update:.1} ns/update");
    println!("  Throughput: {updates_per_sec:.0} updates/sec");

    Ok(())
}
