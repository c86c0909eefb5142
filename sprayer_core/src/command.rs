//! Typed actuation commands and the immutable `Program` they form.

/// One low-level instruction for the gantry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Route the syringe to a valve port.
    SelectValve(u8),
    AirOn,
    AirOff,
    /// Plunger positions are absolute.
    SyringeAbsoluteMode,
    /// Plunger positions are relative to the current one.
    SyringeRelativeMode,
    MoveXY { x: f64, y: f64, feed: f64 },
    MoveZ { z: f64, feed: f64 },
    /// Traverse to `(x, y)` while moving the plunger by `plunger_delta`.
    Dispense {
        x: f64,
        y: f64,
        plunger_delta: f64,
        feed: f64,
    },
    SetSyringePosition { position: f64, feed: f64 },
    /// Motionless pause (s).
    Dwell(f64),
    /// Home every axis, plunger included.
    Home,
    MotorsOff,
}

impl Command {
    #[inline]
    pub fn is_dispense(&self) -> bool {
        matches!(self, Self::Dispense { .. })
    }
}

/// Ordered command sequence. Only `ProgramBuilder` can create one; once
/// finished it is read-only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    commands: Vec<Command>,
}

impl Program {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Number of commands matching `pred`.
    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Append-only program under construction.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    commands: Vec<Command>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            commands: Vec::with_capacity(n),
        }
    }

    #[inline]
    pub fn push(&mut self, cmd: Command) -> &mut Self {
        self.commands.push(cmd);
        self
    }

    pub fn extend(&mut self, cmds: impl IntoIterator<Item = Command>) -> &mut Self {
        self.commands.extend(cmds);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Seal the program.
    pub fn finish(self) -> Program {
        Program {
            commands: self.commands,
        }
    }
}
