//! Fixed Prime / Wash / Purge procedures.
//!
//! These blocks depend only on geometry, feeds and `MaintenanceCfg`, never on
//! the raster parameters of a run.

use crate::command::{Command, ProgramBuilder};
use crate::config::{FeedRates, GeometryConfig, MaintenanceCfg};
use crate::emitter::go_to_wash;

pub struct MaintenanceSequencer<'a> {
    geometry: &'a GeometryConfig,
    feeds: &'a FeedRates,
    cfg: &'a MaintenanceCfg,
}

impl<'a> MaintenanceSequencer<'a> {
    pub fn new(geometry: &'a GeometryConfig, feeds: &'a FeedRates, cfg: &'a MaintenanceCfg) -> Self {
        Self {
            geometry,
            feeds,
            cfg,
        }
    }

    /// Reservoirs visited by prime: wash first, then each solution.
    pub fn prime_ports(&self) -> Vec<u8> {
        let v = &self.geometry.valves;
        std::iter::once(v.wash)
            .chain(v.solutions.iter().copied())
            .collect()
    }

    /// Route to waste and drive the plunger home.
    fn vent(&self, out: &mut ProgramBuilder) {
        out.push(Command::SelectValve(self.geometry.valves.waste))
            .push(Command::SetSyringePosition {
                position: 0.0,
                feed: self.feeds.rapid,
            });
    }

    /// Aspirate `travel` from `port` and push it out to waste.
    fn flush_to_waste(&self, port: u8, travel: f64, out: &mut ProgramBuilder) {
        self.aspirate(port, travel, out);
        self.vent(out);
    }

    fn aspirate(&self, port: u8, travel: f64, out: &mut ProgramBuilder) {
        out.push(Command::SelectValve(port))
            .push(Command::SetSyringePosition {
                position: travel,
                feed: self.feeds.rapid,
            });
    }

    /// Aspirate `travel` of wash solution and push it through the head slowly.
    fn flush_through_head(&self, travel: f64, out: &mut ProgramBuilder) {
        self.aspirate(self.geometry.valves.wash, travel, out);
        out.push(Command::SelectValve(self.geometry.valves.head))
            .push(Command::SetSyringePosition {
                position: 0.0,
                feed: self.feeds.head_flush,
            });
    }

    fn home(&self, out: &mut ProgramBuilder) {
        out.push(Command::Home).push(Command::SyringeAbsoluteMode);
    }

    /// Home, then flush every reservoir into waste once.
    pub fn prime(&self, out: &mut ProgramBuilder) {
        self.home(out);
        for port in self.prime_ports() {
            self.flush_to_waste(port, self.cfg.prime_travel, out);
        }
    }

    /// Clean syringe, line and head at the wash station, then dry the head.
    pub fn wash(&self, out: &mut ProgramBuilder) {
        let wash = self.geometry.valves.wash;
        go_to_wash(self.geometry, self.feeds, out);
        out.push(Command::SyringeAbsoluteMode).push(Command::AirOn);
        // vent what is left in the syringe
        self.vent(out);
        // syringe flush
        self.flush_to_waste(wash, self.cfg.wash_travel, out);
        // line flush
        self.flush_through_head(self.cfg.wash_travel, out);
        // drip clean
        out.push(Command::AirOff);
        self.flush_through_head(self.cfg.drip_travel, out);
        // dry
        out.push(Command::AirOn);
        for _ in 0..self.cfg.dry_pulses {
            out.push(Command::Dwell(self.cfg.dry_pulse_s));
        }
        out.push(Command::AirOff);
    }

    /// Home, then flush the wash reservoir `purge_repeats` times so the path
    /// is left filled with wash fluid.
    pub fn purge(&self, out: &mut ProgramBuilder) {
        self.home(out);
        for _ in 0..self.cfg.purge_repeats {
            self.flush_to_waste(self.geometry.valves.wash, self.cfg.prime_travel, out);
        }
    }
}
