//! Break-Away Controller (bac-ctl) - Command-line entry point
//!
//! Offline tooling around the controller core: preview a break decision,
//! validate a configuration file, and show the status notifications a
//! configuration change would raise.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bac_common::config::{self, ControllerConfig};
use bac_common::{FrameRate, TimeCode};
use bac_ctl::controller::{compute_break_geometry, diff_configurations, BrokenEvent, GeometryInputs};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for bac-ctl
#[derive(Parser, Debug)]
#[command(name = "bac-ctl")]
#[command(about = "Break-away controller tooling for playout lists")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute where a break-away triggered now would land
    Plan {
        /// Playout latency
        #[arg(long, default_value = "10000", env = "BAC_LATENCY_MS")]
        latency_ms: u64,

        /// Shortest remainder a split may leave
        #[arg(long, default_value = "0")]
        min_fragment_ms: u64,

        /// Saved duration of the on-air event
        #[arg(long)]
        duration_ms: i64,

        /// Time left on the on-air event
        #[arg(long)]
        remaining_ms: i64,

        /// Duration of the next primary event
        #[arg(long)]
        next_duration_ms: Option<i64>,

        /// On-air event is open-ended
        #[arg(long)]
        upcount: bool,

        /// Server clock (HH:MM:SS:FF)
        #[arg(long, default_value = "00:00:00:00")]
        now: String,

        #[arg(long, default_value = "25")]
        fps: FrameRate,
    },

    /// Load and validate a configuration file
    Check {
        config: PathBuf,
    },

    /// Print the status changes between two configuration files
    Diff {
        old: PathBuf,
        new: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bac_ctl=info,bac_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Plan {
            latency_ms,
            min_fragment_ms,
            duration_ms,
            remaining_ms,
            next_duration_ms,
            upcount,
            now,
            fps,
        } => {
            let now = TimeCode::parse_with_rate(&now, fps).context("Invalid --now timecode")?;
            let latency_ms = i64::try_from(latency_ms).context("--latency-ms out of range")?;
            let min_fragment_ms = i64::try_from(min_fragment_ms).context("--min-fragment-ms out of range")?;
            let inputs = GeometryInputs {
                now,
                latency: TimeCode::from_millis(latency_ms, fps),
                min_fragment: TimeCode::from_millis(min_fragment_ms, fps),
                saved_duration: TimeCode::from_millis(duration_ms, fps),
                remaining: TimeCode::from_millis(remaining_ms, fps),
                upcount,
                next_duration: next_duration_ms.map(|ms| TimeCode::from_millis(ms, fps)),
            };
            let geometry = compute_break_geometry(&inputs);

            println!("break_time: {}", geometry.break_time);
            match geometry.remainder {
                Some(remainder) => {
                    println!("split: yes");
                    println!("remainder_duration: {}", remainder.duration);
                    println!("remainder_som: {}", remainder.som);
                }
                None => println!("split: no"),
            }
            if geometry.broken_event == BrokenEvent::Next {
                println!("broken_event: next");
            }
        }

        Command::Check { config: path } => {
            let loaded = load(&path)?;
            let configuration = loaded.configuration();
            info!(groups = configuration.groups.len(), "Configuration valid");

            for channel in configuration.channels() {
                let status = config::channel_status(&configuration, &channel, false);
                let strategy = config::resume_strategy(&configuration, &channel);
                println!(
                    "{channel}\tstrategy={strategy}\tmin_fragment_ms={}\tdefault_path={}\tsequence_path={}",
                    config::min_fragment_ms(&configuration, &channel),
                    status.default_path,
                    status.sequence_path,
                );
            }
        }

        Command::Diff { old, new } => {
            let old = load(&old)?.configuration();
            let new = load(&new)?.configuration();

            for change in diff_configurations(&old, &new, |_| false) {
                let line = serde_json::to_string(&change).context("Failed to serialize status change")?;
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<ControllerConfig> {
    ControllerConfig::load(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}
