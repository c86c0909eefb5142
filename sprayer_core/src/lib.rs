#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Spray-coating program compiler (machine-agnostic).
//!
//! Turns one set of `SprayParameters` into a deterministic `Program` for a
//! liquid-dispensing gantry, and serializes it to controller text. Nothing
//! here performs I/O; delivering the text goes through
//! `sprayer_traits::ProgramSink`.
//!
//! ## Architecture
//!
//! - **Dose**: line count, travel and plunger deltas (`dose` module)
//! - **Raster**: serpentine lines and interlaced cycle offsets (`raster` module)
//! - **Emission**: per-cycle commands (`emitter`) and fixed maintenance
//!   blocks (`maintenance`)
//! - **Assembly**: validation and ordering of the whole session (`assembler`)
//! - **Serialization**: G-code text (`gcode` module)
//!
//! ## Example
//!
//! ```
//! use sprayer_core::{GeometryConfig, GcodeWriter, ProgramAssembler, SprayParameters};
//!
//! let assembler = ProgramAssembler::builder()
//!     .with_geometry(GeometryConfig::default())
//!     .build()?;
//! let params = SprayParameters {
//!     distance: 10.0,
//!     height: 50.0,
//!     speed: 10.0,
//!     flow: 10.0,
//!     cycles: 1,
//!     delay: 0.0,
//!     solution: 3,
//! };
//! let program = assembler.assemble(&params)?;
//! let text = GcodeWriter::default().render(&program);
//! assert!(text.starts_with("G1 V3\n"));
//! # Ok::<(), eyre::Report>(())
//! ```

pub mod assembler;
pub mod builder;
pub mod command;
pub mod config;
pub mod dose;
pub mod emitter;
pub mod error;
pub mod gcode;
pub mod maintenance;
pub mod params;
pub mod raster;

#[cfg(feature = "config")]
pub mod conversions;

pub use assembler::ProgramAssembler;
pub use builder::{AssemblerBuilder, Missing, Set};
pub use command::{Command, Program, ProgramBuilder};
pub use config::{
    DoseTuning, FeedRates, FlowModel, GcodeFormat, GeometryConfig, MaintenanceCfg, Point,
    SafetyCfg, TravelFormula, ValvePorts, WashStation,
};
pub use dose::{DoseCalculator, DoseProfile, MAX_LINE_COUNT};
pub use error::{BuildError, Report, Result, SprayError};
pub use gcode::GcodeWriter;
pub use params::SprayParameters;
pub use raster::{Direction, RasterLine, RasterPlanner};
