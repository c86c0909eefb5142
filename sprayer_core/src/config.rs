//! Configuration types for the program compiler.
//!
//! These are the runtime configuration structs injected into every component.
//! They are separate from the TOML-deserialized config in `sprayer_config`.

use crate::error::{Result, invalid};

/// A point in machine coordinates (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Wash station location. The head is lifted to `approach_z`, moved over the
/// station and then lowered to `final_z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WashStation {
    pub x: f64,
    pub y: f64,
    pub approach_z: f64,
    pub final_z: f64,
}

impl Default for WashStation {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: -110.0,
            approach_z: -30.0,
            final_z: -50.0,
        }
    }
}

/// Valve port numbering of the dispensing head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValvePorts {
    /// Outlet used to empty the syringe.
    pub waste: u8,
    /// Wash solution reservoir.
    pub wash: u8,
    /// Path through the dispensing head.
    pub head: u8,
    /// Solution reservoirs, in priming order.
    pub solutions: Vec<u8>,
}

impl Default for ValvePorts {
    fn default() -> Self {
        Self {
            waste: 0,
            wash: 1,
            head: 2,
            solutions: vec![3, 4],
        }
    }
}

impl ValvePorts {
    pub fn is_solution(&self, port: u8) -> bool {
        self.solutions.contains(&port)
    }
}

/// Immutable machine constants.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    /// Work area bounding box (mm), `x1 < x2`, `y1 < y2`.
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    /// Z reference the hover height is measured down from.
    pub top: f64,
    pub home: Point,
    pub wash: WashStation,
    /// Syringe calibration: volume per mm of plunger travel.
    pub volume_per_travel: f64,
    pub valves: ValvePorts,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            x1: -60.0,
            x2: 60.0,
            y1: -80.0,
            y2: 80.0,
            top: 100.0,
            home: Point::default(),
            wash: WashStation::default(),
            volume_per_travel: 5.0,
            valves: ValvePorts::default(),
        }
    }
}

impl GeometryConfig {
    /// Long-axis extent of a raster line.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Extent covered by the raster lines.
    #[inline]
    pub fn span(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn validate(&self) -> Result<()> {
        let coords = [
            self.x1,
            self.x2,
            self.y1,
            self.y2,
            self.top,
            self.home.x,
            self.home.y,
            self.home.z,
            self.wash.x,
            self.wash.y,
            self.wash.approach_z,
            self.wash.final_z,
        ];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(invalid("geometry coordinates must be finite"));
        }
        if self.x1 >= self.x2 {
            return Err(invalid("geometry x1 must be < x2"));
        }
        if self.y1 >= self.y2 {
            return Err(invalid("geometry y1 must be < y2"));
        }
        if !(self.volume_per_travel > 0.0 && self.volume_per_travel.is_finite()) {
            return Err(invalid("volume_per_travel must be > 0"));
        }
        if self.valves.solutions.is_empty() {
            return Err(invalid("at least one solution port must be configured"));
        }
        Ok(())
    }
}

/// How the `flow` parameter converts to volume per mm traveled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowModel {
    /// Flow is volume per `seconds_per_unit` seconds; divided by traverse speed.
    TimeBased { seconds_per_unit: f64 },
    /// Flow is volume per mm² of coated area; multiplied by the line pitch.
    Areal,
}

impl Default for FlowModel {
    fn default() -> Self {
        Self::TimeBased {
            seconds_per_unit: 60.0,
        }
    }
}

/// Travel-distance accounting for the boundary return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelFormula {
    /// `lines * width + span`
    #[default]
    SingleReturn,
    /// `lines * width + 2 * span`
    DoubleReturn,
}

/// Dose tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseTuning {
    /// Controller feed value per mm/s of traverse speed (empirical).
    pub feed_factor: f64,
    pub flow_model: FlowModel,
    pub travel_formula: TravelFormula,
}

impl Default for DoseTuning {
    fn default() -> Self {
        Self {
            feed_factor: 4.0,
            flow_model: FlowModel::default(),
            travel_formula: TravelFormula::SingleReturn,
        }
    }
}

/// Feed values for moves that are not part of the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRates {
    /// Positioning moves and plunger moves into waste.
    pub rapid: f64,
    /// Plunger feed while pushing fluid through the head.
    pub head_flush: f64,
}

impl Default for FeedRates {
    fn default() -> Self {
        Self {
            rapid: 200.0,
            head_flush: 10.0,
        }
    }
}

/// Fixed maintenance volumes (plunger travel, mm) and timings.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceCfg {
    /// Drawn before the first cycle to prime the head with solution.
    pub session_prime_travel: f64,
    /// Drawn per reservoir by prime and purge.
    pub prime_travel: f64,
    /// Syringe and line flush during wash.
    pub wash_travel: f64,
    /// Drip clean during wash; smaller than `wash_travel`.
    pub drip_travel: f64,
    pub dry_pulses: u32,
    pub dry_pulse_s: f64,
    pub purge_repeats: u32,
}

impl Default for MaintenanceCfg {
    fn default() -> Self {
        Self {
            session_prime_travel: 5.0,
            prime_travel: 10.0,
            wash_travel: 10.0,
            drip_travel: 5.0,
            dry_pulses: 4,
            dry_pulse_s: 2.0,
            purge_repeats: 3,
        }
    }
}

/// Physical limits of the syringe plus the program size cap.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyCfg {
    /// Plunger stroke (mm).
    pub max_plunger_travel: f64,
    /// Largest volume a single coating cycle may draw.
    pub max_volume: f64,
    /// Largest program a single run may compile to.
    pub max_commands: usize,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self {
            max_plunger_travel: 40.0,
            max_volume: 200.0,
            max_commands: 1_000_000,
        }
    }
}

/// Text output settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcodeFormat {
    /// Decimal places for every numeric field.
    pub precision: usize,
    /// Dwell emitted after each valve switch (s).
    pub valve_settle_s: f64,
    /// Echo parameters as a `;` comment header.
    pub header: bool,
}

impl Default for GcodeFormat {
    fn default() -> Self {
        Self {
            precision: 6,
            valve_settle_s: 1.0,
            header: true,
        }
    }
}
