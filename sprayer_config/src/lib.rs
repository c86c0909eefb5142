#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and syringe calibration parsing for the spray gantry.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration CSV loader enforces headers and performs a robust refit
//!   to reduce outlier influence before slope/intercept estimation.
use serde::Deserialize;

/// Syringe calibration CSV schema.
///
/// Expected headers:
/// travel,volume
///
/// Example:
/// travel,volume
/// 0.0,0.4
/// 10.0,50.3
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    /// Plunger travel (mm)
    pub travel: f64,
    /// Volume measured for that travel (ul)
    pub volume: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct WashStation {
    pub x: f64,
    pub y: f64,
    /// Z used to approach the station before lowering into it
    pub approach_z: f64,
    /// Z inside the station
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

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    /// Z reference the hover height is measured down from
    pub top: f64,
    #[serde(default)]
    pub home: Position,
    #[serde(default)]
    pub wash: WashStation,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Syringe {
    /// Volume (ul) per mm of plunger travel
    pub volume_per_travel: f64,
    /// Physical plunger stroke (mm); any aspirate beyond it is rejected
    pub max_plunger_travel: f64,
    /// Largest volume (ul) a single coating cycle may draw
    pub max_volume: f64,
}

impl Default for Syringe {
    fn default() -> Self {
        Self {
            volume_per_travel: 5.0,
            max_plunger_travel: 40.0,
            max_volume: 200.0,
        }
    }
}

/// Known valve block revisions. Explicit `waste`/`wash`/`head` keys override
/// the preset port numbers.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValveLayout {
    /// waste 0, wash 1, head 2
    #[default]
    Rev1,
    /// waste 0, wash 2, head 1
    Rev2,
}

impl ValveLayout {
    /// Preset `(waste, wash, head)` ports.
    pub fn ports(self) -> (u8, u8, u8) {
        match self {
            Self::Rev1 => (0, 1, 2),
            Self::Rev2 => (0, 2, 1),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Valves {
    pub layout: ValveLayout,
    pub waste: Option<u8>,
    pub wash: Option<u8>,
    pub head: Option<u8>,
    /// Ports with a solution reservoir attached, in priming order
    pub solutions: Vec<u8>,
}

impl Default for Valves {
    fn default() -> Self {
        Self {
            layout: ValveLayout::Rev1,
            waste: None,
            wash: None,
            head: None,
            solutions: vec![3, 4],
        }
    }
}

/// Valve ports after applying overrides to the layout preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValvePorts {
    pub waste: u8,
    pub wash: u8,
    pub head: u8,
    pub solutions: Vec<u8>,
}

impl Valves {
    pub fn resolve(&self) -> eyre::Result<ValvePorts> {
        let (waste, wash, head) = self.layout.ports();
        let ports = ValvePorts {
            waste: self.waste.unwrap_or(waste),
            wash: self.wash.unwrap_or(wash),
            head: self.head.unwrap_or(head),
            solutions: self.solutions.clone(),
        };
        if ports.waste == ports.wash || ports.waste == ports.head || ports.wash == ports.head {
            eyre::bail!(
                "valves: waste/wash/head ports must be distinct (got {}/{}/{})",
                ports.waste,
                ports.wash,
                ports.head
            );
        }
        if ports.solutions.is_empty() {
            eyre::bail!("valves.solutions must list at least one port");
        }
        for (i, p) in ports.solutions.iter().enumerate() {
            if [ports.waste, ports.wash, ports.head].contains(p) {
                eyre::bail!("valves.solutions port {p} collides with waste/wash/head");
            }
            if ports.solutions[..i].contains(p) {
                eyre::bail!("valves.solutions lists port {p} twice");
            }
        }
        Ok(ports)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowModel {
    /// `flow` is a volume per time unit of `seconds_per_unit` seconds
    #[default]
    TimeBased,
    /// `flow` is a volume per mm² of coated area; the pitch converts it per mm
    Areal,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TravelFormula {
    /// lines * width + y-span
    #[default]
    SingleReturn,
    /// lines * width + 2 * y-span (legacy server generator)
    DoubleReturn,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DoseCfg {
    /// Empirical factor from traverse speed to controller feed value
    pub feed_factor: f64,
    pub flow_model: FlowModel,
    /// Seconds per flow time unit for `time_based` (60 = flow per minute)
    pub seconds_per_unit: f64,
    pub travel_formula: TravelFormula,
}

impl Default for DoseCfg {
    fn default() -> Self {
        Self {
            feed_factor: 4.0,
            flow_model: FlowModel::TimeBased,
            seconds_per_unit: 60.0,
            travel_formula: TravelFormula::SingleReturn,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Feeds {
    /// Feed for positioning moves and plunger moves into the waste
    pub rapid: f64,
    /// Plunger feed while pushing fluid through the dispensing head
    pub head_flush: f64,
}

impl Default for Feeds {
    fn default() -> Self {
        Self {
            rapid: 200.0,
            head_flush: 10.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Maintenance {
    /// Plunger travel drawn to prime the head before the first cycle
    pub session_prime_travel: f64,
    /// Plunger travel drawn per reservoir by prime and purge
    pub prime_travel: f64,
    /// Plunger travel drawn for syringe and line flushes during wash
    pub wash_travel: f64,
    /// Plunger travel drawn for the drip clean (smaller than `wash_travel`)
    pub drip_travel: f64,
    pub dry_pulses: u32,
    pub dry_pulse_s: f64,
    pub purge_repeats: u32,
}

impl Default for Maintenance {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Output {
    /// Decimal places for every numeric field
    pub precision: usize,
    /// Dwell appended after each valve switch (s)
    pub valve_settle_s: f64,
    /// Echo the spray parameters as `;` comments before the program
    pub header: bool,
    /// Largest program (in commands) a single run may compile to
    pub max_commands: usize,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            precision: 6,
            valve_settle_s: 1.0,
            header: true,
            max_commands: 1_000_000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub geometry: Geometry,
    #[serde(default)]
    pub syringe: Syringe,
    #[serde(default)]
    pub valves: Valves,
    #[serde(default)]
    pub dose: DoseCfg,
    #[serde(default)]
    pub feeds: Feeds,
    #[serde(default)]
    pub maintenance: Maintenance,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    /// Optional persisted calibration; preferred over `[syringe]` when present.
    #[serde(default)]
    pub calibration: Option<PersistedCalibration>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PersistedCalibration {
    /// ul per mm of plunger travel
    pub volume_per_travel: f64,
    /// volume at zero travel (ul); informational
    #[serde(default)]
    pub dead_volume: f64,
}

impl From<PersistedCalibration> for Calibration {
    fn from(p: PersistedCalibration) -> Self {
        Calibration {
            volume_per_travel: p.volume_per_travel,
            dead_volume: p.dead_volume,
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub volume_per_travel: f64,
    pub dead_volume: f64,
}

impl Calibration {
    /// Build Calibration from measured rows using ordinary least squares on all points.
    /// Fits volume = a*travel + b; `a` is the calibration constant and `b` the
    /// dead volume of the fluid path.
    pub fn from_rows(rows: Vec<CalibrationRow>) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }
        if rows
            .iter()
            .any(|r| !r.travel.is_finite() || !r.volume.is_finite())
        {
            eyre::bail!("calibration rows must be finite numbers");
        }

        // Ensure strictly monotonic travel values (increasing or decreasing), no duplicates
        let mut dir: i8 = 0; // 1 for increasing, -1 for decreasing
        for i in 1..rows.len() {
            let d = rows[i].travel - rows[i - 1].travel;
            if d == 0.0 {
                eyre::bail!(
                    "calibration rows have duplicate travel values at index {} and {}",
                    i - 1,
                    i
                );
            }
            let step_dir = if d > 0.0 { 1 } else { -1 };
            if dir == 0 {
                dir = step_dir;
            } else if dir != step_dir {
                eyre::bail!(
                    "calibration travel values must be monotonic (strictly increasing or strictly decreasing)"
                );
            }
        }

        let fit = |pts: &[(f64, f64)]| -> eyre::Result<(f64, f64)> {
            let n = pts.len() as f64;
            let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
            let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
            let mut sxx = 0.0f64;
            let mut sxy = 0.0f64;
            for (px, py) in pts {
                let x = px - mean_x;
                let y = py - mean_y;
                sxx += x * x;
                sxy += x * y;
            }
            if !sxx.is_finite() || sxx == 0.0 {
                eyre::bail!("calibration cannot determine slope (degenerate travel variance)");
            }
            let a = sxy / sxx;
            if !a.is_finite() {
                eyre::bail!("calibration produced non-finite slope");
            }
            Ok((a, mean_y - a * mean_x))
        };

        let pts: Vec<(f64, f64)> = rows.iter().map(|r| (r.travel, r.volume)).collect();
        let (a0, b0) = fit(&pts)?;
        // RMS of residuals as a robust sigma estimate
        let sumsq: f64 = pts
            .iter()
            .map(|(x, y)| {
                let r = y - (a0 * x + b0);
                r * r
            })
            .sum();
        let rms = (sumsq / pts.len() as f64).sqrt();

        // Reject outliers with |residual| > 2σ and refit if at least 2 remain.
        let (a, b) = robust_refit(&pts, a0, b0, rms, 2.0).unwrap_or((a0, b0));

        if a <= 0.0 {
            eyre::bail!("calibration slope must be > 0 (volume must grow with travel)");
        }

        Ok(Calibration {
            volume_per_travel: a,
            dead_volume: b,
        })
    }
}

/// Single-step robust refit rejecting outliers with |residual| > k * rms around
/// y = a0*x + b0. Uses an online (Welford/Chan) covariance update over inliers.
/// Returns None when refit is not applicable (non-finite/zero rms, <2 inliers,
/// no outlier rejected, or degenerate variance).
fn robust_refit(pts: &[(f64, f64)], a0: f64, b0: f64, rms: f64, k: f64) -> Option<(f64, f64)> {
    if !(rms.is_finite() && rms > 0.0 && k.is_finite() && k > 0.0) {
        return None;
    }
    let thr = k * rms;
    let mut n_in: usize = 0;
    let mut mean_x = 0.0f64;
    let mut mean_y = 0.0f64;
    let mut cxx = 0.0f64;
    let mut cxy = 0.0f64;

    for &(x, y) in pts {
        if (y - (a0 * x + b0)).abs() <= thr {
            n_in += 1;
            let n_new = n_in as f64;
            let dx = x - mean_x;
            let dy = y - mean_y;
            let mean_x_new = mean_x + dx / n_new;
            let mean_y_new = mean_y + dy / n_new;
            cxx += dx * (x - mean_x_new);
            cxy += dx * (y - mean_y_new);
            mean_x = mean_x_new;
            mean_y = mean_y_new;
        }
    }

    if n_in >= 2 && n_in < pts.len() {
        if !cxx.is_finite() || cxx == 0.0 {
            return None;
        }
        let a = cxy / cxx;
        if !a.is_finite() {
            return None;
        }
        Some((a, mean_y - a * mean_x))
    } else {
        None
    }
}

impl TryFrom<Vec<CalibrationRow>> for Calibration {
    type Error = eyre::Report;
    fn try_from(rows: Vec<CalibrationRow>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl TryFrom<&[CalibrationRow]> for Calibration {
    type Error = eyre::Report;
    fn try_from(rows: &[CalibrationRow]) -> Result<Self, Self::Error> {
        Self::from_rows(rows.to_vec())
    }
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Calibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["travel", "volume"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'travel,volume', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    Calibration::try_from(rows)
}

fn finite_all(vals: &[(&str, f64)]) -> eyre::Result<()> {
    for (name, v) in vals {
        if !v.is_finite() {
            eyre::bail!("{name} must be a finite number");
        }
    }
    Ok(())
}

impl Config {
    /// Calibration constant in effect: persisted `[calibration]` wins over `[syringe]`.
    pub fn volume_per_travel(&self) -> f64 {
        self.calibration
            .map_or(self.syringe.volume_per_travel, |c| c.volume_per_travel)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Geometry
        let g = &self.geometry;
        finite_all(&[
            ("geometry.x1", g.x1),
            ("geometry.x2", g.x2),
            ("geometry.y1", g.y1),
            ("geometry.y2", g.y2),
            ("geometry.top", g.top),
            ("geometry.home.x", g.home.x),
            ("geometry.home.y", g.home.y),
            ("geometry.home.z", g.home.z),
            ("geometry.wash.x", g.wash.x),
            ("geometry.wash.y", g.wash.y),
            ("geometry.wash.approach_z", g.wash.approach_z),
            ("geometry.wash.final_z", g.wash.final_z),
        ])?;
        if g.x1 >= g.x2 {
            eyre::bail!("geometry.x1 must be < geometry.x2");
        }
        if g.y1 >= g.y2 {
            eyre::bail!("geometry.y1 must be < geometry.y2");
        }

        // Syringe
        if !(self.volume_per_travel() > 0.0 && self.volume_per_travel().is_finite()) {
            eyre::bail!("syringe.volume_per_travel must be > 0");
        }
        if !(self.syringe.max_plunger_travel > 0.0 && self.syringe.max_plunger_travel.is_finite())
        {
            eyre::bail!("syringe.max_plunger_travel must be > 0");
        }
        if !(self.syringe.max_volume > 0.0 && self.syringe.max_volume.is_finite()) {
            eyre::bail!("syringe.max_volume must be > 0");
        }

        // Valves
        self.valves.resolve()?;

        // Dose
        if !(self.dose.feed_factor > 0.0 && self.dose.feed_factor.is_finite()) {
            eyre::bail!("dose.feed_factor must be > 0");
        }
        if self.dose.flow_model == FlowModel::TimeBased
            && !(self.dose.seconds_per_unit > 0.0 && self.dose.seconds_per_unit.is_finite())
        {
            eyre::bail!("dose.seconds_per_unit must be > 0");
        }

        // Feeds
        if !(self.feeds.rapid > 0.0 && self.feeds.rapid.is_finite()) {
            eyre::bail!("feeds.rapid must be > 0");
        }
        if !(self.feeds.head_flush > 0.0 && self.feeds.head_flush.is_finite()) {
            eyre::bail!("feeds.head_flush must be > 0");
        }

        // Maintenance
        let m = &self.maintenance;
        let max = self.syringe.max_plunger_travel;
        for (name, v) in [
            ("maintenance.session_prime_travel", m.session_prime_travel),
            ("maintenance.prime_travel", m.prime_travel),
            ("maintenance.wash_travel", m.wash_travel),
            ("maintenance.drip_travel", m.drip_travel),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                eyre::bail!("{name} must be > 0");
            }
            if v > max {
                eyre::bail!("{name} exceeds syringe.max_plunger_travel ({v} > {max})");
            }
        }
        if m.drip_travel >= m.wash_travel {
            eyre::bail!("maintenance.drip_travel must be < maintenance.wash_travel");
        }
        if m.dry_pulse_s.is_sign_negative() || !m.dry_pulse_s.is_finite() {
            eyre::bail!("maintenance.dry_pulse_s must be >= 0");
        }
        if m.purge_repeats == 0 {
            eyre::bail!("maintenance.purge_repeats must be >= 1");
        }

        // Output
        if self.output.precision > 12 {
            eyre::bail!("output.precision is unreasonably large (>12)");
        }
        if self.output.valve_settle_s.is_sign_negative() || !self.output.valve_settle_s.is_finite()
        {
            eyre::bail!("output.valve_settle_s must be >= 0");
        }
        if self.output.max_commands == 0 {
            eyre::bail!("output.max_commands must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref() {
            if !matches!(rot, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly");
            }
        }

        Ok(())
    }
}
