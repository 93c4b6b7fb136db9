use std::fmt;

use strum::{Display, EnumString};

/* === Definitions === */

/// Motor state reported by the unit as a single-character wire symbol.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
pub enum MotorState {
    /// Fan running forwards, drawing outside air in.
    #[strum(serialize = "F")]
    Forward,

    /// Fan running backwards, pushing inside air out through the hood.
    #[strum(serialize = "B")]
    Backward,

    /// No airflow.
    #[strum(serialize = "S")]
    Stopped,
}

/// Physical button transitions, sent as bare literal lines.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
pub enum ButtonEvent {
    Start,
    Stop,
}

/// One parsed telemetry line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusFrame {
    pub state: MotorState,
    pub target: i32,
    pub inside: i32,
    pub outside: i32,
    pub speed: i32,
}

/// Anything the reader task can hand to a consumer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Message {
    Button(ButtonEvent),
    Status(StatusFrame),
}

/// An outbound target temperature, guaranteed to fit the two-digit wire
/// form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TargetCommand(u8);

/* === Implementations === */

impl MotorState {
    pub fn describe(&self) -> &'static str {
        match self {
            MotorState::Forward => "forward (outside air in)",
            MotorState::Backward => "backward (inside air out)",
            MotorState::Stopped => "stopped",
        }
    }
}

impl TargetCommand {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 99;

    /// Rejects temperatures with no two-digit representation.
    pub fn new(value: i64) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(TargetCommand(value as u8))
    }

    /// Clamps into the representable range.
    pub fn clamped(value: i64) -> Self {
        TargetCommand(value.clamp(Self::MIN, Self::MAX) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Wire form: zero-padded two-digit decimal plus a newline.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for TargetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}
