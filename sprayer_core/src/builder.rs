//! Type-state builder for `ProgramAssembler`.
//!
//! The builder enforces at compile time that the machine geometry is provided
//! before `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;

use crate::assembler::ProgramAssembler;
use crate::config::*;
use crate::error::{BuildError, Result, SprayError};

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `ProgramAssembler`. All fields are validated on `build()`.
pub struct AssemblerBuilder<G> {
    geometry: Option<GeometryConfig>,
    tuning: Option<DoseTuning>,
    feeds: Option<FeedRates>,
    maintenance: Option<MaintenanceCfg>,
    safety: Option<SafetyCfg>,
    format: Option<GcodeFormat>,
    volume_per_travel: Option<f64>,
    _g: PhantomData<G>,
}

impl Default for AssemblerBuilder<Missing> {
    fn default() -> Self {
        Self {
            geometry: None,
            tuning: None,
            feeds: None,
            maintenance: None,
            safety: None,
            format: None,
            volume_per_travel: None,
            _g: PhantomData,
        }
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Validate configuration and construct a `ProgramAssembler`.
///
/// Single source of truth for validation, used by `try_build()` and `build()`.
fn validate_and_build(
    geometry: GeometryConfig,
    tuning: DoseTuning,
    feeds: FeedRates,
    maintenance: MaintenanceCfg,
    safety: SafetyCfg,
    format: GcodeFormat,
) -> Result<ProgramAssembler> {
    // ── Validation ───────────────────────────────────────────────────────────
    geometry.validate()?;
    if !positive(tuning.feed_factor) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "feed_factor must be > 0",
        )));
    }
    if let FlowModel::TimeBased { seconds_per_unit } = tuning.flow_model {
        if !positive(seconds_per_unit) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "seconds_per_unit must be > 0",
            )));
        }
    }
    if !positive(feeds.rapid) || !positive(feeds.head_flush) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "feed rates must be > 0",
        )));
    }
    if !positive(safety.max_plunger_travel) || !positive(safety.max_volume) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "syringe limits must be > 0",
        )));
    }
    if safety.max_commands == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "max_commands must be >= 1",
        )));
    }
    if maintenance.drip_travel >= maintenance.wash_travel {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "drip_travel must be < wash_travel",
        )));
    }
    if !(maintenance.dry_pulse_s.is_finite() && maintenance.dry_pulse_s >= 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "dry_pulse_s must be >= 0",
        )));
    }
    if maintenance.purge_repeats == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "purge_repeats must be >= 1",
        )));
    }
    if !(format.valve_settle_s.is_finite() && format.valve_settle_s >= 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "valve_settle_s must be >= 0",
        )));
    }
    for (quantity, travel) in [
        ("session prime travel", maintenance.session_prime_travel),
        ("prime travel", maintenance.prime_travel),
        ("wash travel", maintenance.wash_travel),
        ("drip travel", maintenance.drip_travel),
    ] {
        if !positive(travel) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "maintenance travels must be > 0",
            )));
        }
        if travel > safety.max_plunger_travel {
            return Err(eyre::Report::new(SprayError::Capacity {
                quantity,
                value: travel,
                limit: safety.max_plunger_travel,
            }));
        }
    }

    Ok(ProgramAssembler {
        geometry,
        tuning,
        feeds,
        maintenance,
        safety,
        format,
    })
}

impl<G> AssemblerBuilder<G> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<ProgramAssembler> {
        let mut geometry = self
            .geometry
            .ok_or_else(|| eyre::Report::new(BuildError::MissingGeometry))?;
        if let Some(v) = self.volume_per_travel {
            geometry.volume_per_travel = v;
        }
        validate_and_build(
            geometry,
            self.tuning.unwrap_or_default(),
            self.feeds.unwrap_or_default(),
            self.maintenance.unwrap_or_default(),
            self.safety.unwrap_or_default(),
            self.format.unwrap_or_default(),
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<G> AssemblerBuilder<G> {
    pub fn with_tuning(mut self, tuning: DoseTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }
    pub fn with_feeds(mut self, feeds: FeedRates) -> Self {
        self.feeds = Some(feeds);
        self
    }
    pub fn with_maintenance(mut self, maintenance: MaintenanceCfg) -> Self {
        self.maintenance = Some(maintenance);
        self
    }
    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.safety = Some(safety);
        self
    }
    pub fn with_format(mut self, format: GcodeFormat) -> Self {
        self.format = Some(format);
        self
    }
    /// Override the geometry's syringe calibration constant (e.g. from a fresh CSV fit).
    pub fn with_volume_per_travel(mut self, volume_per_travel: f64) -> Self {
        self.volume_per_travel = Some(volume_per_travel);
        self
    }
}

// Setter that advances type-state
impl AssemblerBuilder<Missing> {
    pub fn with_geometry(self, geometry: GeometryConfig) -> AssemblerBuilder<Set> {
        AssemblerBuilder {
            geometry: Some(geometry),
            tuning: self.tuning,
            feeds: self.feeds,
            maintenance: self.maintenance,
            safety: self.safety,
            format: self.format,
            volume_per_travel: self.volume_per_travel,
            _g: PhantomData,
        }
    }
}

impl AssemblerBuilder<Set> {
    /// Validate and build. Only available once the geometry is set.
    pub fn build(self) -> Result<ProgramAssembler> {
        self.try_build()
    }
}
