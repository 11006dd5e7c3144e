//! Motolink simulator
//!
//! Drives a simulated device session through a scripted scenario and logs
//! the wire traffic. Set `RUST_LOG=debug` for per-frame detail.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info};

use motolink_sim::{Demo, Session, SimConfig};

#[derive(Debug, Parser)]
#[command(name = "motolink-sim", version, about = "Simulate a Motolink device session")]
struct Args {
    /// TOML configuration file (defaults are used if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scripted scenario to run
    #[arg(short, long, value_enum, default_value = "demo")]
    scenario: Scenario,

    /// Suppress the hex dump of transmitted bytes
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Valid commands followed by every link failure and its recovery
    Demo,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };
    if args.quiet {
        config.log_io = false;
    }

    let mut session = Session::new(&config);
    let (stat, _replies) = match args.scenario {
        Scenario::Demo => Demo::new(&mut session).run(),
    };

    match stat {
        Some(stat) => info!(
            "Final: speed={} mode={:?} rx_dropped={} broken_frames={} crc_errors={} timeouts={}",
            stat.speed,
            stat.mode,
            stat.rx_dropped,
            stat.broken_frames,
            stat.crc_errors,
            session.stats().frame_timeouts
        ),
        None => {
            error!("No STAT reply received");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
