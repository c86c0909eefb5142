//! Boustrophedon raster planning.
//!
//! Lines run along X and step along Y at the configured pitch. Direction
//! alternates every line so the head never lifts between lines. Each cycle
//! shifts the whole raster by `distance / line_count * cycle`, so successive
//! passes interlace instead of repeating the same lines.

use crate::config::GeometryConfig;
use crate::dose::DoseProfile;
use crate::error::{Result, invalid};

/// Tolerance for the "raster stays inside the work area" check (mm).
const Y_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TowardX2,
    TowardX1,
}

impl Direction {
    /// X where a line in this direction starts.
    #[inline]
    pub fn start_x(self, x1: f64, x2: f64) -> f64 {
        match self {
            Self::TowardX2 => x1,
            Self::TowardX1 => x2,
        }
    }

    /// X where a line in this direction ends.
    #[inline]
    pub fn end_x(self, x1: f64, x2: f64) -> f64 {
        self.reverse().start_x(x1, x2)
    }

    #[inline]
    pub fn reverse(self) -> Self {
        match self {
            Self::TowardX2 => Self::TowardX1,
            Self::TowardX1 => Self::TowardX2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterLine {
    pub index: u32,
    pub y: f64,
    pub direction: Direction,
    /// The head already sits at this line's start edge; a single traverse covers it.
    pub is_first: bool,
}

pub struct RasterPlanner {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    distance: f64,
    line_count: u32,
}

impl RasterPlanner {
    pub fn new(geometry: &GeometryConfig, profile: &DoseProfile, distance: f64) -> Self {
        Self {
            x1: geometry.x1,
            x2: geometry.x2,
            y1: geometry.y1,
            y2: geometry.y2,
            distance,
            line_count: profile.line_count.max(1),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    /// Y of the first line of `cycle`.
    pub fn cycle_offset(&self, cycle: u32) -> f64 {
        self.y1 + (self.distance / f64::from(self.line_count)) * f64::from(cycle)
    }

    /// Start point of `cycle`'s raster.
    pub fn cycle_start(&self, cycle: u32) -> (f64, f64) {
        (
            Direction::TowardX2.start_x(self.x1, self.x2),
            self.cycle_offset(cycle),
        )
    }

    /// Reject cycle counts whose interlace shift pushes a line past `y2`.
    pub fn check_cycles(&self, cycles: u32) -> Result<()> {
        let last_cycle = cycles.saturating_sub(1);
        let last_line = f64::from(self.line_count.saturating_sub(1));
        let last_y = self.cycle_offset(last_cycle) + last_line * self.distance;
        if last_y > self.y2 + Y_EPSILON {
            return Err(invalid(format!(
                "{cycles} cycles shift the raster to y={last_y:.3}, past y2={}",
                self.y2
            )));
        }
        Ok(())
    }

    /// Ordered lines of one cycle.
    pub fn lines(&self, cycle: u32) -> Vec<RasterLine> {
        let offset = self.cycle_offset(cycle);
        let mut direction = Direction::TowardX2;
        let mut out = Vec::with_capacity(self.line_count as usize);
        for index in 0..self.line_count {
            out.push(RasterLine {
                index,
                y: offset + f64::from(index) * self.distance,
                direction,
                is_first: index == 0,
            });
            direction = direction.reverse();
        }
        out
    }
}
