use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use roadspace_common::PieceKind;
use roadspace_gen::{GeneratorConfig, PieceTemplates, SpawnScheduler};
use roadspace_kernel::Scene;
use roadspace_session::{DEFAULT_ROOM, LocalRelay, RoomManager, SessionState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roadspace-cli", about = "Endless corridor generator tools")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Drive an observer along the corridor and report what was generated
    Simulate {
        /// YAML generator config (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// RNG seed, overrides the config file
        #[arg(short, long)]
        seed: Option<u64>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.016666")]
        dt: f64,
        /// Observer speed in units per second
        #[arg(long, default_value = "40.0")]
        speed: f32,
        /// Tick at which the observer disappears
        #[arg(long)]
        drop_from: Option<u64>,
        /// Tick at which the observer comes back
        #[arg(long)]
        drop_until: Option<u64>,
        /// Print the final stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the default config as YAML
    Config,
    /// Validate a YAML config file
    Validate {
        /// Path to the config file
        path: PathBuf,
    },
    /// Run the relay handshake against an in-process relay
    Session {
        /// Room to join or create
        #[arg(short, long, default_value = DEFAULT_ROOM)]
        room: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("roadspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("gen: {}", roadspace_gen::crate_info());
        }
        Commands::Simulate {
            config,
            seed,
            ticks,
            dt,
            speed,
            drop_from,
            drop_until,
            json,
        } => {
            let mut config = match config {
                Some(path) => GeneratorConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => GeneratorConfig::default(),
            };
            if seed.is_some() {
                config.seed = seed;
            }

            let mut scene = Scene::new();
            let mut scheduler =
                SpawnScheduler::from_config(config, PieceTemplates::default(), &mut scene)?;

            let dropped = |tick: u64| match (drop_from, drop_until) {
                (Some(from), Some(until)) => tick >= from && tick < until,
                (Some(from), None) => tick >= from,
                _ => false,
            };

            let mut observer = Vec3::ZERO;
            let step = speed * dt as f32;
            for tick in 0..ticks {
                if dropped(tick) {
                    scheduler.tick(None, dt, &mut scene);
                    continue;
                }
                let to_spawn = scheduler.spawn_point() - observer;
                observer += to_spawn.clamp_length_max(step);
                let report = scheduler.tick(Some(observer), dt, &mut scene);
                if let Some(seg) = report.built {
                    tracing::debug!(
                        tick,
                        delta = seg.curvature_delta,
                        curve = seg.target_curvature,
                        subs = seg.sub_segments,
                        "segment"
                    );
                }
            }

            let stats = scheduler.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(stats)?);
            } else {
                let state = scheduler.state();
                println!("Simulated {ticks} ticks ({:.1}s)", scheduler.now());
                println!(
                    "Segments: built={}, destroyed={}, live={}",
                    stats.segments_built, stats.segments_destroyed, stats.live_segments
                );
                println!(
                    "Pieces: road={}, terrain={}",
                    scene.count_kind(PieceKind::Road),
                    scene.count_kind(PieceKind::TerrainLeft)
                        + scene.count_kind(PieceKind::TerrainRight)
                );
                println!("Skipped ticks: {}", stats.skipped_ticks);
                println!(
                    "Spawn point: ({:.2}, {:.2}, {:.2}), curvature={:.2}",
                    state.position.x,
                    state.position.y,
                    state.position.z,
                    state.accumulated_curvature
                );
                println!("Scene hash: {:#x}", scene.state_hash());
            }
        }
        Commands::Config => {
            print!("{}", GeneratorConfig::default().to_yaml_string()?);
        }
        Commands::Validate { path } => {
            GeneratorConfig::load(&path)
                .with_context(|| format!("validating {}", path.display()))?;
            println!("{}: OK", path.display());
        }
        Commands::Session { room } => {
            let mut relay = LocalRelay::new();
            let mut manager = RoomManager::new(room);
            manager.start(&mut relay)?;
            manager.pump(&mut relay)?;
            match manager.state() {
                SessionState::InRoom { name, session } => {
                    println!("Joined room {name} (session {session})");
                }
                other => anyhow::bail!("handshake stalled: {other}"),
            }
        }
    }

    Ok(())
}
