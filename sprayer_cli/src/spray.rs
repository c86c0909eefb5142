//! Command execution: config mapping, program compilation and delivery.

use std::path::Path;

use eyre::WrapErr;
use serde_json::json;
use sprayer_config::{Calibration, Config};
use sprayer_core::{Command, GcodeWriter, GeometryConfig, ProgramAssembler, SprayParameters};
use sprayer_traits::ProgramSink;

use crate::cli::SprayArgs;
use crate::sink::{FileSink, StdoutSink};

/// Default file name when `--output` names a directory.
const DEFAULT_PROGRAM_NAME: &str = "spray.gcode";

/// Map the typed config into an assembler. A CSV calibration, when given,
/// replaces the configured syringe constant.
pub fn assembler_from(cfg: &Config, calib: Option<&Calibration>) -> eyre::Result<ProgramAssembler> {
    let Some(calib) = calib else {
        return ProgramAssembler::try_from(cfg);
    };
    tracing::info!(
        volume_per_travel = calib.volume_per_travel,
        dead_volume = calib.dead_volume,
        "using CSV calibration"
    );
    ProgramAssembler::builder()
        .with_volume_per_travel(calib.volume_per_travel)
        .with_geometry(GeometryConfig::try_from(cfg)?)
        .with_tuning((&cfg.dose).into())
        .with_feeds((&cfg.feeds).into())
        .with_maintenance((&cfg.maintenance).into())
        .with_safety(cfg.into())
        .with_format((&cfg.output).into())
        .build()
}

/// Split `--output` into the sink directory and program name.
fn output_target(path: &Path) -> (std::path::PathBuf, String) {
    if path.is_dir() {
        return (path.to_path_buf(), DEFAULT_PROGRAM_NAME.to_string());
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf);
    let name = path
        .file_name()
        .map_or_else(|| DEFAULT_PROGRAM_NAME.to_string(), |n| n.to_string_lossy().into_owned());
    (dir, name)
}

pub fn run_generate(
    assembler: &ProgramAssembler,
    args: SprayArgs,
    output: Option<&Path>,
    no_header: bool,
    json_mode: bool,
) -> eyre::Result<()> {
    let params = SprayParameters::from(args);
    let profile = assembler.plan(&params)?;
    let program = assembler.assemble(&params)?;

    let mut format = *assembler.format();
    if no_header {
        format.header = false;
    }
    let text = GcodeWriter::new(format).render_with_header(&program, &params, &profile);

    let Some(path) = output else {
        return StdoutSink
            .submit(DEFAULT_PROGRAM_NAME, &text)
            .map_err(|e| eyre::eyre!("stream program: {e}"));
    };

    let (dir, name) = output_target(path);
    FileSink::new(&dir)
        .submit(&name, &text)
        .map_err(|e| eyre::eyre!("store program: {e}"))?;
    let dispenses = program.count(Command::is_dispense);
    let written = dir.join(&name);
    if json_mode {
        println!(
            "{}",
            json!({
                "output": written.display().to_string(),
                "commands": program.len(),
                "dispense_moves": dispenses,
                "lines_per_cycle": profile.line_count,
                "cycles": params.cycles,
            })
        );
    } else {
        println!(
            "Wrote {} commands ({dispenses} dispense moves) to {}",
            program.len(),
            written.display()
        );
    }
    Ok(())
}

pub fn run_plan(assembler: &ProgramAssembler, args: SprayArgs, json_mode: bool) -> eyre::Result<()> {
    let params = SprayParameters::from(args);
    let profile = assembler.plan(&params)?;
    let program = assembler.assemble(&params)?;
    let dispenses = program.count(Command::is_dispense);

    if json_mode {
        println!(
            "{}",
            json!({
                "line_count": profile.line_count,
                "travel_distance": profile.travel_distance,
                "travel_time": profile.travel_time,
                "linear_density": profile.linear_density,
                "total_volume": profile.total_volume,
                "plunger_travel_total": profile.plunger_travel_total,
                "long_segment_delta": profile.long_segment_delta,
                "short_segment_delta": profile.short_segment_delta,
                "feed_rate": profile.feed_rate,
                "commands": program.len(),
                "dispense_moves": dispenses,
            })
        );
        return Ok(());
    }

    println!("Lines per cycle:          {}", profile.line_count);
    println!(
        "Travel per cycle:         {:.3} mm ({:.3} s)",
        profile.travel_distance, profile.travel_time
    );
    println!("Volume per cycle:         {:.3}", profile.total_volume);
    println!(
        "Plunger travel per cycle: {:.3} mm",
        profile.plunger_travel_total
    );
    println!(
        "Segment deltas:           long {:.6} / short {:.6}",
        profile.long_segment_delta, profile.short_segment_delta
    );
    println!("Feed:                     {:.3}", profile.feed_rate);
    println!(
        "Commands:                 {} ({dispenses} dispense moves, {} cycles)",
        program.len(),
        params.cycles
    );
    Ok(())
}

pub fn run_self_check(assembler: &ProgramAssembler, json_mode: bool) -> eyre::Result<()> {
    let g = assembler.geometry();
    let v = &g.valves;
    if json_mode {
        println!(
            "{}",
            json!({
                "status": "ok",
                "work_area": { "x1": g.x1, "x2": g.x2, "y1": g.y1, "y2": g.y2, "top": g.top },
                "volume_per_travel": g.volume_per_travel,
                "valves": {
                    "waste": v.waste,
                    "wash": v.wash,
                    "head": v.head,
                    "solutions": v.solutions,
                },
            })
        );
        return Ok(());
    }
    println!("Config OK");
    println!(
        "Work area: x {}..{}, y {}..{}, top {}",
        g.x1, g.x2, g.y1, g.y2, g.top
    );
    println!("Syringe: {} per mm of plunger travel", g.volume_per_travel);
    println!(
        "Valves: waste {}, wash {}, head {}, solutions {:?}",
        v.waste, v.wash, v.head, v.solutions
    );
    Ok(())
}

/// Read and parse the TOML config at `path`.
pub fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    sprayer_config::load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))
}
