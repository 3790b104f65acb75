//! `rlstate` CLI: decode scenario runs or recorded packet logs and report.

use anyhow::{Context, Result};
use bot_packet::{FieldInfo, GamePacket};
use clap::{Parser, Subcommand};
use sim::replay::{load_log, save_log, PacketLog};
use sim::scenarios::{Scenario, ScenarioKind};
use state_core::{DecoderConfig, Frame, GameState};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "rlstate", about = "Game state decoder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a named scenario, decode it and output a summary.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Ticks between packets; overrides the scenario and config value
        #[arg(long)]
        tick_skip: Option<u32>,
        /// Decoder configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the generated packet log
        #[arg(long)]
        save_log: Option<PathBuf>,
    },
    /// Decode a previously recorded packet log.
    Replay {
        /// Path to packet log JSON file
        input: PathBuf,
        /// Decoder configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output metrics to a JSON file
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
            tick_skip,
            config,
            output,
            save_log: log_path,
        } => {
            let config = load_config(config.as_deref(), tick_skip)?;
            run_scenario(scenario, seed, config, output.as_deref(), log_path.as_deref())?;
        }
        Commands::Replay {
            input,
            config,
            output,
        } => {
            run_replay(&input, config.as_deref(), output.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, tick_skip: Option<u32>) -> Result<DecoderConfig> {
    let mut config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => DecoderConfig::default(),
    };
    if let Some(n) = tick_skip {
        config.tick_skip = n as usize;
    }
    config.validate()?;
    Ok(config)
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    config: DecoderConfig,
    output_path: Option<&Path>,
    log_path: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed).with_tick_skip(config.tick_skip as u32);

    println!(
        "Running scenario '{}' (seed={}, tick_skip={}, duration={} ticks)...",
        scenario.name, seed, scenario.tick_skip, scenario.duration_ticks
    );

    let packets = scenario.packets();
    let summary = decode_stream(&scenario.field, config, &packets)?;
    summary.print();

    // Save log if requested
    if let Some(lpath) = log_path {
        let log = PacketLog {
            scenario_name: scenario.name.clone(),
            seed,
            tick_skip: scenario.tick_skip,
            field: scenario.field.clone(),
            packets,
        };
        save_log(&log, lpath)?;
        println!("Packet log saved to {}", lpath.display());
    }

    if let Some(opath) = output_path {
        write_metrics(opath, &scenario.name, seed, &summary)?;
    }

    Ok(())
}

fn run_replay(input: &Path, config_path: Option<&Path>, output_path: Option<&Path>) -> Result<()> {
    let log = load_log(input).with_context(|| format!("loading log {}", input.display()))?;
    println!(
        "Replaying '{}' ({} packets)...",
        log.scenario_name,
        log.packets.len()
    );

    let config = load_config(config_path, Some(log.tick_skip))?;
    let summary = decode_stream(&log.field, config, &log.packets)?;
    summary.print();

    if let Some(opath) = output_path {
        write_metrics(opath, &log.scenario_name, log.seed, &summary)?;
    }

    Ok(())
}

/// Aggregate results of decoding one packet stream.
struct Summary {
    frames: usize,
    elapsed_s: f64,
    capacity: usize,
    tracked: usize,
    max_ticks_elapsed: u32,
    flip_frames: usize,
    touch_frames: usize,
    last: Option<Frame>,
}

fn decode_stream(
    field: &FieldInfo,
    config: DecoderConfig,
    packets: &[GamePacket],
) -> Result<Summary> {
    let mut state = GameState::new(field, config)?;
    let start = std::time::Instant::now();
    let mut summary = Summary {
        frames: 0,
        elapsed_s: 0.0,
        capacity: 0,
        tracked: 0,
        max_ticks_elapsed: 0,
        flip_frames: 0,
        touch_frames: 0,
        last: None,
    };

    for packet in packets {
        let frame = state.decode(packet)?;
        summary.frames += 1;
        summary.max_ticks_elapsed = summary.max_ticks_elapsed.max(frame.ticks_elapsed);
        summary.flip_frames += frame.players.values().filter(|p| p.car.is_flipping()).count();
        summary.touch_frames += frame.players.values().filter(|p| p.ball_touched).count();
        summary.last = Some(frame);
    }

    summary.elapsed_s = start.elapsed().as_secs_f64();
    summary.capacity = state.capacity();
    summary.tracked = state.tracked_count();
    info!(frames = summary.frames, tracked = summary.tracked, "stream decoded");
    Ok(summary)
}

impl Summary {
    fn print(&self) {
        println!(
            "Done: {} frames, {} cars tracked (capacity {}), max gap {} ticks, elapsed={:.3}s",
            self.frames, self.tracked, self.capacity, self.max_ticks_elapsed, self.elapsed_s,
        );
        let Some(last) = &self.last else {
            return;
        };
        println!(
            "Score {}-{}, last touch {}",
            last.blue_score,
            last.orange_score,
            last.last_touch
                .map_or_else(|| "none".to_string(), |id| id.to_string()),
        );
        for (id, p) in last.players.iter().take(8) {
            println!(
                "  {id}: {:?} {} boost={:.2} pickups={} jump={} flip={}",
                p.car.team,
                p.car.hitbox_type,
                p.car.boost_amount,
                p.boost_pickups,
                p.has_jump(),
                p.has_flip(),
            );
        }
        if last.players.len() > 8 {
            println!("  ... {} more", last.players.len() - 8);
        }
    }
}

fn write_metrics(path: &Path, scenario: &str, seed: u64, summary: &Summary) -> Result<()> {
    let pickups: u32 = summary
        .last
        .as_ref()
        .map(|f| f.players.values().map(|p| p.boost_pickups).sum())
        .unwrap_or(0);
    let json = serde_json::json!({
        "scenario": scenario,
        "seed": seed,
        "elapsed_s": summary.elapsed_s,
        "frames": summary.frames,
        "tracked_cars": summary.tracked,
        "capacity": summary.capacity,
        "max_ticks_elapsed": summary.max_ticks_elapsed,
        "flip_frames": summary.flip_frames,
        "touch_frames": summary.touch_frames,
        "boost_pickups": pickups,
        "blue_score": summary.last.as_ref().map(|f| f.blue_score),
        "orange_score": summary.last.as_ref().map(|f| f.orange_score),
    });
    std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    println!("Metrics saved to {}", path.display());
    Ok(())
}
