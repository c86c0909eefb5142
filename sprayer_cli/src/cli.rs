//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sprayer", version, about = "Spray-coating G-code generator")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/sprayer.toml")]
    pub config: PathBuf,

    /// Optional syringe calibration CSV (strict header `travel,volume`)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Per-run spray parameters, shared by `generate` and `plan`.
#[derive(Args, Debug, Clone, Copy)]
pub struct SprayArgs {
    /// Raster pitch in mm
    #[arg(long)]
    pub distance: f64,
    /// Hover height above the work surface in mm
    #[arg(long)]
    pub height: f64,
    /// Traverse speed in mm/s
    #[arg(long)]
    pub speed: f64,
    /// Dispense rate (units follow `dose.flow_model`)
    #[arg(long)]
    pub flow: f64,
    /// Number of coating passes
    #[arg(long, default_value_t = 1)]
    pub cycles: u32,
    /// Pause between passes in seconds
    #[arg(long, default_value_t = 0.0)]
    pub delay: f64,
    /// Solution reservoir valve port
    #[arg(long)]
    pub solution: u8,
}

impl From<SprayArgs> for sprayer_core::SprayParameters {
    fn from(a: SprayArgs) -> Self {
        Self {
            distance: a.distance,
            height: a.height,
            speed: a.speed,
            flow: a.flow,
            cycles: a.cycles,
            delay: a.delay,
            solution: a.solution,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a spray program and write it out
    Generate {
        #[command(flatten)]
        params: SprayArgs,
        /// Write the program to this file instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Omit the `;` parameter header
        #[arg(long, action = ArgAction::SetTrue)]
        no_header: bool,
    },
    /// Print the derived dose and command counts without writing a program
    Plan {
        #[command(flatten)]
        params: SprayArgs,
    },
    /// Load and validate the configuration, then report the resolved machine
    SelfCheck,
}
