//! Command-line front-end for the parallel floorplanner.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use parafloor::io::{append_summary, read_blocks, write_placement};
use parafloor::sa::SaConfig;
use parafloor::search::{ConvergenceLog, ParallelSearch, SearchConfig, Strategy};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "parafloor", version)]
#[command(about = "Parallel simulated-annealing floorplanner for analog module placement")]
struct Args {
    /// Input block file.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Output placement file.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: PathBuf,

    /// Parallelization strategy.
    #[arg(short = 's', long, value_enum, default_value_t = StrategyArg::MultiStart)]
    strategy: StrategyArg,

    /// Wall-clock time limit in seconds.
    #[arg(short = 't', long, default_value = "595", value_name = "SECS")]
    time_limit: u64,

    /// Worker thread count (default: logical cores).
    #[arg(short = 'j', long, value_name = "NUM")]
    threads: Option<usize>,

    /// Convergence log path.
    #[arg(long, default_value = "convergence_log.csv", value_name = "FILE")]
    log: PathBuf,

    /// Append a per-run summary row to this CSV.
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Override the initial temperature.
    #[arg(long, value_name = "TEMP")]
    t_start: Option<f64>,

    /// Override the stop temperature.
    #[arg(long, value_name = "TEMP")]
    t_min: Option<f64>,

    /// Override the geometric cooling rate.
    #[arg(long, value_name = "RATE")]
    cooling_rate: Option<f64>,

    /// Override the moves-per-temperature factor.
    #[arg(long, value_name = "FACTOR")]
    steps_factor: Option<f64>,

    /// Fix the base RNG seed for reproducible runs.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Enable verbose (debug-level) output.
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Independent annealing restarts per worker (coarse-grained).
    MultiStart,
    /// Replica exchange across a temperature ladder (medium-grained).
    Tempering,
    /// Parallel candidate batches per SA step (fine-grained).
    Moves,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::MultiStart => Strategy::MultiStart,
            StrategyArg::Tempering => Strategy::ParallelTempering,
            StrategyArg::Moves => Strategy::ParallelMoves,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let model = read_blocks(&args.input)
        .with_context(|| format!("failed to read block file {}", args.input.display()))?;

    let strategy = Strategy::from(args.strategy);
    let mut sa = SaConfig::for_strategy(strategy);
    if let Some(t) = args.t_start {
        sa = sa.with_t_start(t);
    }
    if let Some(t) = args.t_min {
        sa = sa.with_t_min(t);
    }
    if let Some(r) = args.cooling_rate {
        sa = sa.with_cooling_rate(r);
    }
    if let Some(f) = args.steps_factor {
        sa = sa.with_steps_per_temp_factor(f);
    }
    sa.validate().map_err(anyhow::Error::msg)?;

    let mut config = SearchConfig::new(Duration::from_secs(args.time_limit), sa);
    if let Some(threads) = args.threads {
        config = config.with_workers(threads);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    log::info!("modules: {}", model.len());
    log::info!("strategy: {strategy}, workers: {}", config.workers);
    log::info!(
        "time limit: {}s, t_start: {}, t_min: {}, cooling: {}, steps factor: {}",
        args.time_limit,
        sa.t_start,
        sa.t_min,
        sa.cooling_rate,
        sa.steps_per_temp_factor
    );

    let convergence = ConvergenceLog::create(&args.log)
        .with_context(|| format!("failed to open convergence log {}", args.log.display()))?;
    let search = ParallelSearch::new(&model, config, convergence);
    let report = search.run(strategy);

    log::info!(
        "best cost {:.6}: {:.2} x {:.2} (area {:.4}), inl {:.2}",
        report.best.cost,
        report.best.chip_width,
        report.best.chip_height,
        report.best.chip_area,
        report.best.inl
    );
    log::info!(
        "{} moves, {} accepted ({:.1}%), {} sa runs in {:.2}s",
        report.moves_total,
        report.moves_accepted,
        100.0 * report.accept_ratio(),
        report.sa_runs,
        report.wall_time.as_secs_f64()
    );

    write_placement(&args.output, &report.best, &model)
        .with_context(|| format!("failed to write placement {}", args.output.display()))?;
    log::info!("placement written to {}", args.output.display());

    if let Some(summary) = &args.summary {
        append_summary(summary, &report)
            .with_context(|| format!("failed to append summary {}", summary.display()))?;
    }

    Ok(())
}
