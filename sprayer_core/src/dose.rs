//! Volumetric-to-mechanical dose derivation.
//!
//! Everything here is a pure function of `SprayParameters`, `GeometryConfig`
//! and `DoseTuning`: the same inputs always give a bit-identical `DoseProfile`.

use crate::config::{DoseTuning, FlowModel, GeometryConfig, TravelFormula};
use crate::error::{Result, invalid};
use crate::params::SprayParameters;

/// Upper bound on raster lines per cycle. A finer pitch is a validation
/// error; it also caps the size of one cycle's line list.
pub const MAX_LINE_COUNT: u32 = 100_000;

/// Derived dose figures for one coating cycle. Only `DoseCalculator` builds
/// these.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct DoseProfile {
    /// `floor((y2 - y1) / distance)`, always >= 1.
    pub line_count: u32,
    /// Head travel per cycle (mm).
    pub travel_distance: f64,
    /// Time to cover `travel_distance` at the traverse speed (s).
    pub travel_time: f64,
    /// Volume dispensed per mm traveled.
    pub linear_density: f64,
    /// Volume drawn per cycle.
    pub total_volume: f64,
    /// Plunger travel drawn per cycle (absolute position after intake).
    pub plunger_travel_total: f64,
    /// Relative plunger move for a long-axis traverse (<= 0).
    pub long_segment_delta: f64,
    /// Relative plunger move for a connecting segment (<= 0).
    pub short_segment_delta: f64,
    /// Feed value for raster moves.
    pub feed_rate: f64,
}

pub struct DoseCalculator<'a> {
    geometry: &'a GeometryConfig,
    tuning: &'a DoseTuning,
}

impl<'a> DoseCalculator<'a> {
    pub fn new(geometry: &'a GeometryConfig, tuning: &'a DoseTuning) -> Self {
        Self { geometry, tuning }
    }

    /// Number of raster lines for a pitch. Rejects the pitch before dividing.
    pub fn line_count(&self, distance: f64) -> Result<u32> {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(invalid(format!("distance must be > 0, got {distance}")));
        }
        let lines = (self.geometry.span() / distance).floor();
        if lines < 1.0 {
            return Err(invalid(format!(
                "distance {distance} leaves no raster line in a {} mm span",
                self.geometry.span()
            )));
        }
        if lines > f64::from(MAX_LINE_COUNT) {
            return Err(invalid(format!(
                "distance {distance} needs {lines} lines (max {MAX_LINE_COUNT})"
            )));
        }
        Ok(lines as u32)
    }

    /// Volume per mm traveled under the configured flow model.
    pub fn linear_density(&self, params: &SprayParameters) -> f64 {
        match self.tuning.flow_model {
            FlowModel::TimeBased { seconds_per_unit } => {
                params.flow / seconds_per_unit / params.speed
            }
            FlowModel::Areal => params.flow * params.distance,
        }
    }

    pub fn profile(&self, params: &SprayParameters) -> Result<DoseProfile> {
        if !(params.speed.is_finite() && params.speed > 0.0) {
            return Err(invalid(format!("speed must be > 0, got {}", params.speed)));
        }
        if !(params.flow.is_finite() && params.flow >= 0.0) {
            return Err(invalid(format!("flow must be >= 0, got {}", params.flow)));
        }
        let line_count = self.line_count(params.distance)?;

        let width = self.geometry.width();
        let span = self.geometry.span();
        let returns = match self.tuning.travel_formula {
            TravelFormula::SingleReturn => 1.0,
            TravelFormula::DoubleReturn => 2.0,
        };
        let travel_distance = f64::from(line_count) * width + returns * span;
        let travel_time = travel_distance / params.speed;
        let linear_density = self.linear_density(params);
        let total_volume = travel_distance * linear_density;
        let cal = self.geometry.volume_per_travel;
        let plunger_travel_total = total_volume / cal;
        // Dispensing drives the plunger opposite to aspiration.
        let long_segment_delta = -(width * linear_density / cal);
        let short_segment_delta = -(params.distance * linear_density / cal);
        let feed_rate = params.speed * self.tuning.feed_factor;

        let profile = DoseProfile {
            line_count,
            travel_distance,
            travel_time,
            linear_density,
            total_volume,
            plunger_travel_total,
            long_segment_delta,
            short_segment_delta,
            feed_rate,
        };
        tracing::debug!(
            line_count,
            travel_distance,
            total_volume,
            plunger_travel_total,
            feed_rate,
            "dose profile derived"
        );
        Ok(profile)
    }
}
