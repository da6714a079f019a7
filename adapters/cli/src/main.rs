#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates a dungeon level and plays it headless.

mod config;
mod layout_transfer;
mod render;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Settings;
use layout_transfer::DungeonLayoutSnapshot;
use simulation::Simulation;

const DEFAULT_SEED: u64 = 0x5EED;
const DEFAULT_TICKS: u64 = 240;
const DEFAULT_TICK_MS: u64 = 100;

/// Generates a dungeon level, plays it headless and prints the outcome.
#[derive(Debug, Parser)]
#[command(name = "crawler", version)]
struct Args {
    /// TOML file with [maze], [enemy], [loot], [level], [player] and [traps] tables.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Master seed every random stream derives from.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of maze columns.
    #[arg(long)]
    width: Option<u32>,
    /// Number of maze rows.
    #[arg(long)]
    height: Option<u32>,
    /// Chance in percent that an eligible cell spawns an enemy.
    #[arg(long, value_name = "PCT", value_parser = clap::value_parser!(u32).range(0..=100))]
    enemies: Option<u32>,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = DEFAULT_TICKS)]
    ticks: u64,
    /// Length of one tick in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TICK_MS, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Plays a layout previously printed with --export-layout.
    #[arg(long, value_name = "STR")]
    import_layout: Option<String>,
    /// Prints the layout transfer string after the run.
    #[arg(long)]
    export_layout: bool,
    /// Log filter, e.g. `debug` or `crawler_system_loot=debug`. Defaults to
    /// `RUST_LOG`, then `info`.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

/// Entry point for the dungeon crawler command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(width) = args.width {
        settings.maze.width = width;
    }
    if let Some(height) = args.height {
        settings.maze.height = height;
    }
    if let Some(enemies) = args.enemies {
        settings.maze.enemy_percentage = enemies;
    }

    let imported = args
        .import_layout
        .as_deref()
        .map(DungeonLayoutSnapshot::decode)
        .transpose()
        .context("failed to import layout")?;
    if let Some(snapshot) = &imported {
        settings.maze.width = snapshot.grid.columns();
        settings.maze.height = snapshot.grid.rows();
        settings.maze.cell_size = snapshot.cell_size;
    }

    let seed = args.seed.or(settings.seed).unwrap_or(DEFAULT_SEED);
    let tuning = settings.tuning().context("invalid configuration")?;
    info!(seed, ticks = args.ticks, tick_ms = args.tick_ms, "starting run");

    let mut simulation = Simulation::new(
        tuning,
        seed,
        imported.map(DungeonLayoutSnapshot::into_layout),
    );
    let ran = simulation.run(args.ticks, Duration::from_millis(args.tick_ms));
    info!(ticks = ran, "run finished");

    println!(
        "{}",
        render::render(simulation.layout(), simulation.world())
    );
    println!();
    println!("{}", simulation.summary());

    for request in simulation.drain_sync_requests() {
        let json =
            serde_json::to_string(&request).context("failed to serialise progress update")?;
        println!("sync: {json}");
    }

    if args.export_layout {
        let encoded = DungeonLayoutSnapshot::from_layout(simulation.layout())
            .encode()
            .context("failed to export layout")?;
        println!("{encoded}");
    }

    Ok(())
}

fn init_logging(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("failed to install log subscriber")
}
