//! `From` implementations bridging `sprayer_config` types to `sprayer_core` types.

use crate::config::{
    DoseTuning, FeedRates, FlowModel, GcodeFormat, GeometryConfig, MaintenanceCfg, Point,
    SafetyCfg, TravelFormula, ValvePorts, WashStation,
};

// ── Geometry ─────────────────────────────────────────────────────────────────

impl From<&sprayer_config::Position> for Point {
    fn from(p: &sprayer_config::Position) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

impl From<&sprayer_config::WashStation> for WashStation {
    fn from(w: &sprayer_config::WashStation) -> Self {
        Self {
            x: w.x,
            y: w.y,
            approach_z: w.approach_z,
            final_z: w.final_z,
        }
    }
}

impl From<sprayer_config::ValvePorts> for ValvePorts {
    fn from(v: sprayer_config::ValvePorts) -> Self {
        Self {
            waste: v.waste,
            wash: v.wash,
            head: v.head,
            solutions: v.solutions,
        }
    }
}

/// Fails when the valve section does not resolve to a usable port set.
impl TryFrom<&sprayer_config::Config> for GeometryConfig {
    type Error = eyre::Report;

    fn try_from(c: &sprayer_config::Config) -> Result<Self, Self::Error> {
        let g = &c.geometry;
        Ok(Self {
            x1: g.x1,
            x2: g.x2,
            y1: g.y1,
            y2: g.y2,
            top: g.top,
            home: (&g.home).into(),
            wash: (&g.wash).into(),
            volume_per_travel: c.volume_per_travel(),
            valves: c.valves.resolve()?.into(),
        })
    }
}

// ── Dose ─────────────────────────────────────────────────────────────────────

impl From<&sprayer_config::DoseCfg> for DoseTuning {
    fn from(c: &sprayer_config::DoseCfg) -> Self {
        let flow_model = match c.flow_model {
            sprayer_config::FlowModel::TimeBased => FlowModel::TimeBased {
                seconds_per_unit: c.seconds_per_unit,
            },
            sprayer_config::FlowModel::Areal => FlowModel::Areal,
        };
        let travel_formula = match c.travel_formula {
            sprayer_config::TravelFormula::SingleReturn => TravelFormula::SingleReturn,
            sprayer_config::TravelFormula::DoubleReturn => TravelFormula::DoubleReturn,
        };
        Self {
            feed_factor: c.feed_factor,
            flow_model,
            travel_formula,
        }
    }
}

// ── Feeds / Maintenance / Safety ─────────────────────────────────────────────

impl From<&sprayer_config::Feeds> for FeedRates {
    fn from(c: &sprayer_config::Feeds) -> Self {
        Self {
            rapid: c.rapid,
            head_flush: c.head_flush,
        }
    }
}

impl From<&sprayer_config::Maintenance> for MaintenanceCfg {
    fn from(c: &sprayer_config::Maintenance) -> Self {
        Self {
            session_prime_travel: c.session_prime_travel,
            prime_travel: c.prime_travel,
            wash_travel: c.wash_travel,
            drip_travel: c.drip_travel,
            dry_pulses: c.dry_pulses,
            dry_pulse_s: c.dry_pulse_s,
            purge_repeats: c.purge_repeats,
        }
    }
}

/// Syringe limits plus the program size cap from `[output]`.
impl From<&sprayer_config::Config> for SafetyCfg {
    fn from(c: &sprayer_config::Config) -> Self {
        Self {
            max_plunger_travel: c.syringe.max_plunger_travel,
            max_volume: c.syringe.max_volume,
            max_commands: c.output.max_commands,
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

impl From<&sprayer_config::Output> for GcodeFormat {
    fn from(c: &sprayer_config::Output) -> Self {
        Self {
            precision: c.precision,
            valve_settle_s: c.valve_settle_s,
            header: c.header,
        }
    }
}

// ── Assembler ────────────────────────────────────────────────────────────────

impl TryFrom<&sprayer_config::Config> for crate::assembler::ProgramAssembler {
    type Error = eyre::Report;

    /// Build a validated assembler from a whole configuration file.
    fn try_from(c: &sprayer_config::Config) -> Result<Self, Self::Error> {
        Self::builder()
            .with_geometry(GeometryConfig::try_from(c)?)
            .with_tuning((&c.dose).into())
            .with_feeds((&c.feeds).into())
            .with_maintenance((&c.maintenance).into())
            .with_safety(c.into())
            .with_format((&c.output).into())
            .build()
    }
}
