//! Per-invocation spray parameters.

use crate::config::GeometryConfig;
use crate::error::{Result, invalid};

/// Declarative inputs for one coating run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SprayParameters {
    /// Raster pitch (mm), > 0.
    pub distance: f64,
    /// Hover height above the work surface (mm), measured from `top`.
    pub height: f64,
    /// Traverse speed (mm/s), > 0.
    pub speed: f64,
    /// Dispense rate; units follow the configured `FlowModel`.
    pub flow: f64,
    /// Number of coating passes, >= 1.
    pub cycles: u32,
    /// Pause between passes (s), >= 0.
    pub delay: f64,
    /// Solution reservoir port.
    pub solution: u8,
}

impl SprayParameters {
    /// Check every field against the geometry. Does not derive the line count;
    /// see `DoseCalculator::profile` for that.
    pub fn validate(&self, geometry: &GeometryConfig) -> Result<()> {
        for (name, v) in [
            ("distance", self.distance),
            ("height", self.height),
            ("speed", self.speed),
            ("flow", self.flow),
            ("delay", self.delay),
        ] {
            if !v.is_finite() {
                return Err(invalid(format!("{name} must be a finite number")));
            }
        }
        if self.distance <= 0.0 {
            return Err(invalid(format!("distance must be > 0, got {}", self.distance)));
        }
        if self.speed <= 0.0 {
            return Err(invalid(format!("speed must be > 0, got {}", self.speed)));
        }
        if self.height < 0.0 {
            return Err(invalid(format!("height must be >= 0, got {}", self.height)));
        }
        if self.flow < 0.0 {
            return Err(invalid(format!("flow must be >= 0, got {}", self.flow)));
        }
        if self.delay < 0.0 {
            return Err(invalid(format!("delay must be >= 0, got {}", self.delay)));
        }
        if self.cycles < 1 {
            return Err(invalid("cycles must be >= 1"));
        }
        if !geometry.valves.is_solution(self.solution) {
            return Err(invalid(format!(
                "solution port {} is not a configured solution port {:?}",
                self.solution, geometry.valves.solutions
            )));
        }
        Ok(())
    }
}
