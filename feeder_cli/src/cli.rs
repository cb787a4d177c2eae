//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "feeder", version, about = "Wire-feed motor controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/feeder.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the closed control loop (simulated plant unless built for hardware)
    Run {
        /// Signed reference command in [-1, 1]; sign selects direction
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.5)]
        reference: f32,

        /// Stop after this long; runs until ctrl-c when omitted
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,

        /// Start with the motor enabled, as if the run button was pressed
        #[arg(long, action = ArgAction::SetTrue)]
        start_enabled: bool,

        /// Press the torch button once the loop first reports steady
        #[arg(long, action = ArgAction::SetTrue)]
        torch: bool,

        /// Enable real-time scheduling (SCHED_FIFO + mlockall, Linux only)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux: attempts SCHED_FIFO priority and mlockall(MCL_CURRENT) to reduce page faults and jitter. May require elevated privileges or ulimits (e.g. memlock). Use with care on shared systems."
        )]
        rt: bool,

        /// SCHED_FIFO priority when --rt is set (platform range, usually 1..=99)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
