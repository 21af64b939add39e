//! `fusetrack` CLI: scenario runs, replay import/export, counter dumps.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fusion_core::{EngineConfig, EngineError, FusionEngine, MemoryStore, TrackState, TrackStore};
use sim::replay::{load_log, save_log, ReportLog, TimedFrame};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fusetrack", about = "Multi-source track fusion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named scenario through the engine and output counters.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Track store capacity
        #[arg(long, default_value_t = 4096)]
        capacity: usize,
        /// Output counters to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the generated report stream
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Re-run a previously recorded report stream.
    Replay {
        /// Path to replay JSON file
        input: PathBuf,
        /// Track store capacity
        #[arg(long, default_value_t = 4096)]
        capacity: usize,
        /// Output counters to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            capacity,
            output,
            save_replay,
        } => {
            run_scenario(scenario, seed, capacity, output.as_deref(), save_replay.as_deref())?;
        }
        Commands::Replay {
            input,
            capacity,
            output,
        } => {
            run_replay(&input, capacity, output.as_deref())?;
        }
    }

    Ok(())
}

/// Feed a timed frame stream through the engine, sweeping the lifecycle
/// once per simulated second.
fn drive(
    engine: &mut FusionEngine<MemoryStore>,
    frames: &[TimedFrame],
) -> (u64, u64) {
    let mut rejected = 0u64;
    let mut last_sweep_ms = 0u64;
    for timed in frames {
        while timed.now_ms >= last_sweep_ms + 1_000 {
            last_sweep_ms += 1_000;
            engine.sweep(last_sweep_ms);
        }
        match engine.process_report(&timed.frame, timed.now_ms) {
            Ok(_) => {}
            Err(err @ EngineError::LatencyBudgetExceeded { .. }) => {
                // Fatal by contract: stop feeding, not an ordinary rejection.
                eprintln!("FATAL at t={} ms: {err}; feed stopped", timed.now_ms);
                break;
            }
            Err(_) => rejected += 1,
        }
    }
    let final_ms = frames.last().map(|f| f.now_ms).unwrap_or(0);
    (rejected, final_ms)
}

fn report_summary(engine: &FusionEngine<MemoryStore>, rejected: u64) {
    let counters = engine.counters();
    println!(
        "Done: {} created, {} fused, {} rejected ({} counted by engine), {} latency violations",
        counters.new_tracks_created,
        counters.fusions_performed,
        rejected,
        counters.reports_rejected,
        counters.latency_violations,
    );
    let tracks = engine.store().all();
    println!(
        "Tracks alive: {} ({} confirmed, {} tentative, {} stale)",
        tracks.len(),
        tracks.iter().filter(|t| t.state == TrackState::Confirmed).count(),
        tracks.iter().filter(|t| t.state == TrackState::Tentative).count(),
        tracks.iter().filter(|t| t.state == TrackState::Stale).count(),
    );
}

fn save_counters(
    engine: &FusionEngine<MemoryStore>,
    name: &str,
    seed: u64,
    elapsed_s: f64,
    path: &std::path::Path,
) -> Result<()> {
    let counters = engine.counters();
    let json = serde_json::json!({
        "scenario": name,
        "seed": seed,
        "elapsed_s": elapsed_s,
        "new_tracks_created": counters.new_tracks_created,
        "fusions_performed": counters.fusions_performed,
        "reports_rejected": counters.reports_rejected,
        "latency_violations": counters.latency_violations,
        "emissions": counters.emissions,
        "tracks_alive": engine.store().len(),
    });
    std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    println!("Counters saved to {}", path.display());
    Ok(())
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    capacity: usize,
    output: Option<&std::path::Path>,
    replay_path: Option<&std::path::Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed);
    let frames = scenario.generate();
    println!(
        "Running scenario '{}' (seed={}, {} reports)...",
        scenario.name,
        seed,
        frames.len()
    );

    let mut engine = FusionEngine::new(EngineConfig::default(), MemoryStore::new(capacity));
    let start = std::time::Instant::now();
    let (rejected, _) = drive(&mut engine, &frames);
    let elapsed = start.elapsed();

    report_summary(&engine, rejected);
    println!("Elapsed: {:.2}s", elapsed.as_secs_f64());

    if let Some(rpath) = replay_path {
        let log = ReportLog {
            scenario_name: scenario.name.clone(),
            seed,
            frames,
        };
        save_log(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }

    if let Some(opath) = output {
        save_counters(&engine, &scenario.name, seed, elapsed.as_secs_f64(), opath)?;
    }

    Ok(())
}

fn run_replay(input: &std::path::Path, capacity: usize, output: Option<&std::path::Path>) -> Result<()> {
    let log = load_log(input)?;
    println!(
        "Replaying '{}' ({} reports)...",
        log.scenario_name,
        log.frames.len()
    );

    let mut engine = FusionEngine::new(EngineConfig::default(), MemoryStore::new(capacity));
    let start = std::time::Instant::now();
    let (rejected, _) = drive(&mut engine, &log.frames);
    let elapsed = start.elapsed();

    report_summary(&engine, rejected);

    if let Some(opath) = output {
        save_counters(&engine, &log.scenario_name, log.seed, elapsed.as_secs_f64(), opath)?;
    }

    Ok(())
}
