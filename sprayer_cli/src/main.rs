#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod sink;
mod spray;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

/// Console logs go to stderr so stdout can carry program text.
fn init_logging(cli: &Cli, logging: &sprayer_config::Logging) -> eyre::Result<()> {
    // RUST_LOG wins over --log-level
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .map_err(|e| eyre::eyre!("invalid log level '{}': {e}", cli.log_level))?;
    let file_level = logging.level.as_deref().unwrap_or(&cli.log_level);

    let console = if cli.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };

    let file_layer = match logging.file.as_deref() {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_filter(EnvFilter::new(file_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = spray::load_config(&cli.config)?;
    cfg.validate()?;
    init_logging(&cli, &cfg.logging)?;

    let calib = cli
        .calibration
        .as_deref()
        .map(sprayer_config::load_calibration_csv)
        .transpose()?;
    let assembler = spray::assembler_from(&cfg, calib.as_ref())?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::Generate {
            params,
            ref output,
            no_header,
        } => spray::run_generate(&assembler, params, output.as_deref(), no_header, cli.json),
        Commands::Plan { params } => spray::run_plan(&assembler, params, cli.json),
        Commands::SelfCheck => spray::run_self_check(&assembler, cli.json),
    }
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if !cli.json {
        let _ = color_eyre::install();
    }

    if let Err(err) = run(cli) {
        tracing::error!(error = %err, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
