//! Turns planned raster lines and dose deltas into commands.

use crate::command::{Command, ProgramBuilder};
use crate::config::{FeedRates, GeometryConfig};
use crate::dose::DoseProfile;
use crate::raster::RasterLine;

/// Lift to the wash approach height, move over the station and lower into it.
pub(crate) fn go_to_wash(geometry: &GeometryConfig, feeds: &FeedRates, out: &mut ProgramBuilder) {
    let w = &geometry.wash;
    out.push(Command::MoveZ {
        z: w.approach_z,
        feed: feeds.rapid,
    })
    .push(Command::MoveXY {
        x: w.x,
        y: w.y,
        feed: feeds.rapid,
    })
    .push(Command::MoveZ {
        z: w.final_z,
        feed: feeds.rapid,
    });
}

/// Absolute mode, route to waste and drive the plunger home.
fn empty_to_waste(
    geometry: &GeometryConfig,
    feeds: &FeedRates,
    out: &mut ProgramBuilder,
) {
    out.push(Command::SyringeAbsoluteMode)
        .push(Command::SelectValve(geometry.valves.waste))
        .push(Command::SetSyringePosition {
            position: 0.0,
            feed: feeds.rapid,
        });
}

pub struct CommandEmitter<'a> {
    geometry: &'a GeometryConfig,
    profile: &'a DoseProfile,
    feeds: &'a FeedRates,
}

impl<'a> CommandEmitter<'a> {
    pub fn new(geometry: &'a GeometryConfig, profile: &'a DoseProfile, feeds: &'a FeedRates) -> Self {
        Self {
            geometry,
            profile,
            feeds,
        }
    }

    /// Draw one cycle's dose from the solution reservoir.
    pub fn cycle_intake(&self, solution: u8, out: &mut ProgramBuilder) {
        out.push(Command::SelectValve(solution))
            .push(Command::SyringeAbsoluteMode)
            .push(Command::SetSyringePosition {
                position: self.profile.plunger_travel_total,
                feed: self.feeds.rapid,
            });
    }

    /// Rapid to the raster start at hover height.
    pub fn position(&self, start: (f64, f64), height: f64, out: &mut ProgramBuilder) {
        out.push(Command::MoveXY {
            x: start.0,
            y: start.1,
            feed: self.feeds.rapid,
        })
        .push(Command::MoveZ {
            z: height - self.geometry.top,
            feed: self.feeds.rapid,
        });
    }

    /// Route the syringe through the head and switch to per-segment dosing.
    pub fn cycle_start(&self, out: &mut ProgramBuilder) {
        out.push(Command::SelectValve(self.geometry.valves.head))
            .push(Command::SyringeRelativeMode);
    }

    /// Dispense moves for one line. A first line is a single traverse; any
    /// other line first connects from the previous line's end.
    pub fn line(&self, line: &RasterLine, out: &mut ProgramBuilder) {
        let (x1, x2) = (self.geometry.x1, self.geometry.x2);
        let feed = self.profile.feed_rate;
        if !line.is_first {
            out.push(Command::Dispense {
                x: line.direction.start_x(x1, x2),
                y: line.y,
                plunger_delta: self.profile.short_segment_delta,
                feed,
            });
        }
        out.push(Command::Dispense {
            x: line.direction.end_x(x1, x2),
            y: line.y,
            plunger_delta: self.profile.long_segment_delta,
            feed,
        });
    }

    pub fn raster(&self, lines: &[RasterLine], out: &mut ProgramBuilder) {
        for line in lines {
            self.line(line, out);
        }
    }

    /// Empty whatever is left of the dose into waste.
    pub fn cycle_empty(&self, out: &mut ProgramBuilder) {
        empty_to_waste(self.geometry, self.feeds, out);
    }

    /// A full coating cycle: intake, positioning, raster, then emptying at the
    /// wash station.
    pub fn cycle(&self, solution: u8, height: f64, lines: &[RasterLine], out: &mut ProgramBuilder) {
        let Some(first) = lines.first() else {
            return;
        };
        self.cycle_intake(solution, out);
        let start = (
            first.direction.start_x(self.geometry.x1, self.geometry.x2),
            first.y,
        );
        self.position(start, height, out);
        self.cycle_start(out);
        self.raster(lines, out);
        go_to_wash(self.geometry, self.feeds, out);
        self.cycle_empty(out);
    }
}
