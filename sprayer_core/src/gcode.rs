//! Text serializer for `Program`: one dialect, fixed number formatting.

use crate::command::{Command, Program};
use crate::config::GcodeFormat;
use crate::dose::DoseProfile;
use crate::params::SprayParameters;

#[derive(Debug, Clone, Copy, Default)]
pub struct GcodeWriter {
    format: GcodeFormat,
}

impl GcodeWriter {
    pub fn new(format: GcodeFormat) -> Self {
        Self { format }
    }

    /// Fixed-precision number; values that round to zero never carry a sign.
    pub fn fmt_num(&self, v: f64) -> String {
        let s = format!("{:.*}", self.format.precision, v);
        match s.strip_prefix('-') {
            Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
            _ => s,
        }
    }

    /// Text for one command, without trailing newline. `SelectValve` spans
    /// two lines because the valve needs time to settle.
    pub fn command_text(&self, cmd: &Command) -> String {
        let n = |v: f64| self.fmt_num(v);
        match *cmd {
            Command::SelectValve(port) => {
                format!("G1 V{port}\nG4 S{}", n(self.format.valve_settle_s))
            }
            Command::AirOn => "M106".to_string(),
            Command::AirOff => "M106 S0".to_string(),
            Command::SyringeAbsoluteMode => "M82".to_string(),
            Command::SyringeRelativeMode => "M83".to_string(),
            Command::MoveXY { x, y, feed } => format!("G1 X{} Y{} F{}", n(x), n(y), n(feed)),
            Command::MoveZ { z, feed } => format!("G1 Z{} F{}", n(z), n(feed)),
            Command::Dispense {
                x,
                y,
                plunger_delta,
                feed,
            } => format!(
                "G1 X{} Y{} P{} F{}",
                n(x),
                n(y),
                n(plunger_delta),
                n(feed)
            ),
            Command::SetSyringePosition { position, feed } => {
                format!("G1 P{} F{}", n(position), n(feed))
            }
            Command::Dwell(s) => format!("G4 S{}", n(s)),
            Command::Home => "G28".to_string(),
            Command::MotorsOff => "M84".to_string(),
        }
    }

    /// Newline-terminated program text.
    pub fn render(&self, program: &Program) -> String {
        let mut out = String::with_capacity(program.len() * 32);
        for cmd in program {
            out.push_str(&self.command_text(cmd));
            out.push('\n');
        }
        out
    }

    /// Comment lines echoing the run parameters and derived dose.
    pub fn header(&self, params: &SprayParameters, profile: &DoseProfile) -> String {
        let n = |v: f64| self.fmt_num(v);
        let mut lines = vec![
            ";Spray file generated on the fly".to_string(),
            format!(";Distance: {}", n(params.distance)),
            format!(";Height: {}", n(params.height)),
            format!(";Speed: {}", n(params.speed)),
            format!(";Flow: {}", n(params.flow)),
            format!(";Cycles: {}", params.cycles),
            format!(";Delay: {}", n(params.delay)),
            format!(";Solution: {}", params.solution),
            format!(";Lines: {}", profile.line_count),
            format!(";Volume per cycle: {}", n(profile.total_volume)),
            format!(";Plunger travel per cycle: {}", n(profile.plunger_travel_total)),
        ];
        lines.push(String::new());
        lines.join("\n")
    }

    /// `render` preceded by `header` when the format asks for it.
    pub fn render_with_header(
        &self,
        program: &Program,
        params: &SprayParameters,
        profile: &DoseProfile,
    ) -> String {
        if !self.format.header {
            return self.render(program);
        }
        let mut out = self.header(params, profile);
        out.push_str(&self.render(program));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_prints_unsigned() {
        let w = GcodeWriter::default();
        assert_eq!(w.fmt_num(-0.0), "0.000000");
        assert_eq!(w.fmt_num(-0.0000001), "0.000000");
        assert_eq!(w.fmt_num(-0.4), "-0.400000");
    }

    #[test]
    fn precision_is_configurable() {
        let w = GcodeWriter::new(GcodeFormat {
            precision: 2,
            ..GcodeFormat::default()
        });
        assert_eq!(
            w.command_text(&Command::MoveZ {
                z: -30.0,
                feed: 200.0
            }),
            "G1 Z-30.00 F200.00"
        );
    }

    #[test]
    fn select_valve_waits_for_settle() {
        let w = GcodeWriter::default();
        assert_eq!(
            w.command_text(&Command::SelectValve(2)),
            "G1 V2\nG4 S1.000000"
        );
    }
}
