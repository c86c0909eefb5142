//! Orchestrates validation, priming, coating cycles and maintenance into one
//! `Program`.

use crate::builder::{AssemblerBuilder, Missing};
use crate::command::{Command, Program, ProgramBuilder};
use crate::config::*;
use crate::dose::{DoseCalculator, DoseProfile};
use crate::emitter::CommandEmitter;
use crate::error::{Report, Result, SprayError};
use crate::maintenance::MaintenanceSequencer;
use crate::params::SprayParameters;
use crate::raster::RasterPlanner;

/// Upper bound on the commands reserved up front; larger programs grow as
/// they are emitted.
const RESERVE_LIMIT: u64 = 65_536;

/// Compiles `SprayParameters` into a `Program` for one fixed machine.
#[derive(Debug, Clone)]
pub struct ProgramAssembler {
    pub(crate) geometry: GeometryConfig,
    pub(crate) tuning: DoseTuning,
    pub(crate) feeds: FeedRates,
    pub(crate) maintenance: MaintenanceCfg,
    pub(crate) safety: SafetyCfg,
    pub(crate) format: GcodeFormat,
}

impl ProgramAssembler {
    /// Start building an assembler.
    pub fn builder() -> AssemblerBuilder<Missing> {
        AssemblerBuilder::default()
    }

    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    pub fn format(&self) -> &GcodeFormat {
        &self.format
    }

    /// Validate `params` completely and derive the per-cycle dose.
    ///
    /// Every check that can reject a run happens here, so `assemble` never
    /// stops half way.
    pub fn plan(&self, params: &SprayParameters) -> Result<DoseProfile> {
        params.validate(&self.geometry)?;
        let profile = DoseCalculator::new(&self.geometry, &self.tuning).profile(params)?;
        RasterPlanner::new(&self.geometry, &profile, params.distance).check_cycles(params.cycles)?;
        self.check_capacity(&profile)?;
        self.check_program_size(&profile, params.cycles)?;
        Ok(profile)
    }

    /// Upper bound on the program length, `None` on overflow.
    fn command_estimate(&self, profile: &DoseProfile, cycles: u32) -> Option<u64> {
        let m = &self.maintenance;
        // 2L - 1 raster moves, 13 wrapper commands and the optional dwell
        let per_cycle = u64::from(profile.line_count).checked_mul(2)?.checked_add(16)?;
        let solutions = self.geometry.valves.solutions.len() as u64;
        let fixed = 64u64
            .checked_add(u64::from(m.dry_pulses))?
            .checked_add(solutions.checked_mul(4)?)?
            .checked_add(u64::from(m.purge_repeats).checked_mul(4)?)?;
        per_cycle.checked_mul(u64::from(cycles))?.checked_add(fixed)
    }

    fn check_program_size(&self, profile: &DoseProfile, cycles: u32) -> Result<()> {
        let limit = self.safety.max_commands as u64;
        match self.command_estimate(profile, cycles) {
            Some(n) if n <= limit => Ok(()),
            estimate => Err(Report::new(SprayError::Capacity {
                quantity: "program commands",
                value: estimate.unwrap_or(u64::MAX) as f64,
                limit: limit as f64,
            })),
        }
    }

    fn check_capacity(&self, profile: &DoseProfile) -> Result<()> {
        if profile.plunger_travel_total > self.safety.max_plunger_travel {
            return Err(Report::new(SprayError::Capacity {
                quantity: "plunger travel per cycle",
                value: profile.plunger_travel_total,
                limit: self.safety.max_plunger_travel,
            }));
        }
        if profile.total_volume > self.safety.max_volume {
            return Err(Report::new(SprayError::Capacity {
                quantity: "volume per cycle",
                value: profile.total_volume,
                limit: self.safety.max_volume,
            }));
        }
        Ok(())
    }

    /// Select the solution, draw a small dose and push it through the head.
    fn opening_prime(&self, solution: u8, out: &mut ProgramBuilder) {
        out.push(Command::SelectValve(solution))
            .push(Command::SyringeAbsoluteMode)
            .push(Command::AirOn)
            .push(Command::SetSyringePosition {
                position: self.maintenance.session_prime_travel,
                feed: self.feeds.rapid,
            })
            .push(Command::SelectValve(self.geometry.valves.head))
            .push(Command::SetSyringePosition {
                position: 0.0,
                feed: self.feeds.head_flush,
            });
    }

    /// Pause between passes with the air valve closed.
    fn inter_cycle_dwell(&self, delay: f64, out: &mut ProgramBuilder) {
        out.push(Command::AirOff)
            .push(Command::Dwell(delay))
            .push(Command::AirOn);
    }

    pub fn assemble(&self, params: &SprayParameters) -> Result<Program> {
        let profile = self.plan(params)?;
        let planner = RasterPlanner::new(&self.geometry, &profile, params.distance);
        let emitter = CommandEmitter::new(&self.geometry, &profile, &self.feeds);
        let maintenance = MaintenanceSequencer::new(&self.geometry, &self.feeds, &self.maintenance);

        let reserve = self
            .command_estimate(&profile, params.cycles)
            .unwrap_or(0)
            .min(RESERVE_LIMIT);
        let mut out = ProgramBuilder::with_capacity(reserve as usize);

        self.opening_prime(params.solution, &mut out);
        for cycle in 0..params.cycles {
            let lines = planner.lines(cycle);
            emitter.cycle(params.solution, params.height, &lines, &mut out);
            // never after the final pass
            if cycle + 1 < params.cycles && params.delay > 0.0 {
                self.inter_cycle_dwell(params.delay, &mut out);
            }
        }
        maintenance.wash(&mut out);
        out.push(Command::Home).push(Command::MotorsOff);
        // end-of-session line conditioning
        maintenance.prime(&mut out);
        maintenance.purge(&mut out);
        out.push(Command::Home).push(Command::MotorsOff);

        let program = out.finish();
        tracing::info!(
            commands = program.len(),
            cycles = params.cycles,
            lines = profile.line_count,
            solution = params.solution,
            "program assembled"
        );
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(cycles: u32, delay: f64, distance: f64) -> SprayParameters {
        SprayParameters {
            distance,
            height: 50.0,
            speed: 10.0,
            flow: 10.0,
            cycles,
            delay,
            solution: 4,
        }
    }

    #[test]
    fn estimate_bounds_the_assembled_length() {
        let assembler = ProgramAssembler::builder()
            .with_geometry(GeometryConfig::default())
            .build()
            .unwrap();
        for p in [params(1, 0.0, 10.0), params(5, 2.0, 10.0), params(1, 0.0, 160.0)] {
            let profile = assembler.plan(&p).unwrap();
            let estimate = assembler.command_estimate(&profile, p.cycles).unwrap();
            let actual = assembler.assemble(&p).unwrap().len() as u64;
            assert!(actual <= estimate, "{actual} > {estimate}");
        }
    }

    #[test]
    fn estimate_stays_finite_for_extreme_counts() {
        let assembler = ProgramAssembler::builder()
            .with_geometry(GeometryConfig::default())
            .with_maintenance(MaintenanceCfg {
                purge_repeats: u32::MAX,
                dry_pulses: u32::MAX,
                ..MaintenanceCfg::default()
            })
            .build()
            .unwrap();
        let profile = DoseCalculator::new(&assembler.geometry, &assembler.tuning)
            .profile(&params(1, 0.0, 10.0))
            .unwrap();
        let estimate = assembler.command_estimate(&profile, u32::MAX).unwrap();
        assert!(estimate > u64::from(u32::MAX) * 2);
    }
}
