//! Balance Walk replay tool
//!
//! Replays a JSON-lines frame recording through the engine and prints every
//! action edge as a JSON line. Useful for tuning configurations against
//! captured sessions.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use balance_walk::recording::{self, SessionSummary};
use balance_walk::{BalanceEngine, BalanceRatios, EngineConfig, TurnIntensity};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Frame recording (JSON lines)
    recording: Option<PathBuf>,

    /// Engine configuration file (JSON, partial files are filled with defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print ratios and turn rates for every frame
    #[arg(long, default_value_t = false)]
    ratios: bool,

    /// Request a center capture before the first frame at or after this time (ms)
    #[arg(long)]
    center_at: Option<u64>,

    /// Request a zero before the first frame at or after this time (ms)
    #[arg(long)]
    zero_at: Option<u64>,

    /// Print a session summary at the end
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    dump_config: bool,
}

#[derive(Serialize)]
struct FrameLine<'a> {
    timestamp_ms: u64,
    ratios: &'a BalanceRatios,
    turn: Option<TurnIntensity>,
    in_use: bool,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if args.dump_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let path = args
        .recording
        .as_ref()
        .context("a recording is required unless --dump-config is given")?;
    let frames = recording::load(path).with_context(|| format!("reading {}", path.display()))?;

    let mut engine = BalanceEngine::new(config).context("invalid configuration")?;
    let mut summary = SessionSummary::new();
    let mut center_pending = args.center_at;
    let mut zero_pending = args.zero_at;
    let mut rejected = 0usize;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for frame in frames {
        if zero_pending.map_or(false, |t| frame.timestamp_ms >= t) {
            engine.request_zero();
            zero_pending = None;
        }
        if center_pending.map_or(false, |t| frame.timestamp_ms >= t) {
            engine.request_center_capture();
            center_pending = None;
        }

        let tick = match engine.submit_frame(frame) {
            Ok(tick) => tick,
            Err(_) => {
                rejected += 1;
                continue;
            }
        };
        summary.add_tick(&tick);

        if args.ratios {
            let line = FrameLine {
                timestamp_ms: tick.calibrated.timestamp_ms,
                ratios: &tick.ratios,
                turn: tick.turn,
                in_use: tick.calibrated.in_use,
            };
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        }
        for event in &tick.events {
            writeln!(out, "{}", serde_json::to_string(event)?)?;
        }
    }

    // Leave nothing held at the end of the recording.
    let end_ms = engine.state().last_timestamp_ms().unwrap_or(0);
    for event in engine.release_all(end_ms) {
        summary.add_event(&event);
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    }

    if args.summary {
        writeln!(out, "{}", summary.to_json()?)?;
    }
    out.flush()?;

    if rejected > 0 {
        log::warn!("{} frames rejected", rejected);
    }
    log::info!(
        "replayed {} frames ({} ms)",
        summary.ticks,
        summary.duration_ms()
    );
    Ok(())
}
