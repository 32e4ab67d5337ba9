//! `pstreets` — simulate vehicles on a street graph, optionally partitioned
//! into vertical strips driven by separate ranks.
//!
//! ```text
//! pstreets -g apps/pstreets/assets/grid.json -n 500 --distributed -p 4
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ps_core::{ExecutionMode, SimConfig};
use ps_graph::GraphDocument;

#[derive(Parser, Debug)]
#[command(name = "pstreets", version, about = "Partitioned street-vehicle simulator")]
struct Args {
    /// Number of vehicles to seed
    #[arg(short = 'n', long, env = "PSTREETS_VEHICLES", default_value_t = 100)]
    vehicles: usize,

    /// Drive vehicles concurrently on the full graph
    #[arg(long, env = "PSTREETS_CONCURRENT")]
    concurrent: bool,

    /// Lower bound of the uniform vehicle speed draw
    #[arg(long, env = "PSTREETS_MIN_SPEED", default_value_t = 1.0)]
    min_speed: f64,

    /// Upper bound of the uniform vehicle speed draw
    #[arg(long, env = "PSTREETS_MAX_SPEED", default_value_t = 10.0)]
    max_speed: f64,

    /// Graph description (JSON)
    #[arg(short, long, env = "PSTREETS_GRAPH")]
    graph: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, env = "PSTREETS_DEBUG")]
    debug: bool,

    /// Number of vertical strips in distributed mode
    #[arg(short, long, env = "PSTREETS_PARTITIONS", default_value_t = 1)]
    partitions: usize,

    /// Partition the graph and run one rank per strip plus the root
    #[arg(long, env = "PSTREETS_DISTRIBUTED", conflicts_with = "concurrent")]
    distributed: bool,

    /// Seed for origin/destination, speed and id draws
    #[arg(long, env = "PSTREETS_SEED", default_value_t = 42)]
    seed: u64,

    /// Worker threads per pool (default: one per core)
    #[arg(long, env = "PSTREETS_THREADS")]
    threads: Option<usize>,
}

impl Args {
    fn mode(&self) -> ExecutionMode {
        if self.distributed {
            ExecutionMode::Distributed
        } else if self.concurrent {
            ExecutionMode::Concurrent
        } else {
            ExecutionMode::Sequential
        }
    }

    fn config(&self) -> SimConfig {
        SimConfig {
            vehicles:    self.vehicles,
            min_speed:   self.min_speed,
            max_speed:   self.max_speed,
            partitions:  self.partitions,
            mode:        self.mode(),
            seed:        self.seed,
            num_threads: self.threads,
            ..SimConfig::default()
        }
    }
}

fn init_logging(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = args.config();
    config.validate().context("invalid configuration")?;

    let doc = GraphDocument::load(&args.graph)
        .with_context(|| format!("failed to load graph from {}", args.graph.display()))?;

    info!(
        vehicles = config.vehicles,
        mode = %config.mode,
        partitions = config.partitions,
        seed = config.seed,
        "starting simulation"
    );
    let report = ps_dist::run(&config, &doc).context("simulation failed")?;
    println!("{report}");
    Ok(())
}
