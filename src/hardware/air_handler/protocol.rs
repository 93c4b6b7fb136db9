use std::{fmt, str::FromStr};

use thiserror::Error;

use super::defs::*;

/* === Definitions === */

/// A single inbound line, either a button event or a status frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Line {
    Event(ButtonEvent),
    Status(StatusFrame),
}

/// Reason an inbound line was rejected. Rejected lines are discarded whole;
/// the reason only ever reaches trace logs.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("expected 5 comma-separated fields, found {0}")]
    FieldCount(usize),

    #[error("field `{0}` is not an integer")]
    Integer(&'static str),

    #[error("unknown motor state symbol `{0}`")]
    State(String),

    #[error("not an event or a status line")]
    Unrecognized,
}

const FIELD_COUNT: usize = 5;

/* === Implementations === */

impl Line {
    /// Strict parse: event lines match by full equality, status lines must
    /// carry exactly five fields with four well-formed integers.
    pub fn parse(input: &str) -> Result<Line, LineError> {
        if let Ok(event) = ButtonEvent::from_str(input) {
            return Ok(Line::Event(event));
        }

        match input.contains(',') {
            true => StatusFrame::parse(input).map(Line::Status),
            false => Err(LineError::Unrecognized),
        }
    }
}

impl StatusFrame {
    pub fn parse(input: &str) -> Result<Self, LineError> {
        let fields: Vec<&str> = input.split(',').collect();

        if fields.len() != FIELD_COUNT {
            return Err(LineError::FieldCount(fields.len()));
        }

        let symbol = fields[0].trim();
        let state = MotorState::from_str(symbol).map_err(|_| LineError::State(symbol.to_owned()))?;

        Ok(StatusFrame {
            state,
            target: parse_field(fields[1], "target")?,
            inside: parse_field(fields[2], "inside")?,
            outside: parse_field(fields[3], "outside")?,
            speed: parse_field(fields[4], "speed")?,
        })
    }
}

impl fmt::Display for StatusFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let StatusFrame { state, target, inside, outside, speed } = self;

        write!(f, "{state},{target},{inside},{outside},{speed}")
    }
}

fn parse_field(field: &str, name: &'static str) -> Result<i32, LineError> {
    field.trim().parse().map_err(|_| LineError::Integer(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_line() {
        let line = Line::parse("F,20,25,30,128").unwrap();

        let expected = StatusFrame {
            state: MotorState::Forward,
            target: 20,
            inside: 25,
            outside: 30,
            speed: 128,
        };

        assert_eq!(line, Line::Status(expected));
    }

    #[test]
    fn test_parse_all_states() {
        let sequence = [
            ("F", MotorState::Forward),
            ("B", MotorState::Backward),
            ("S", MotorState::Stopped),
        ];

        for (symbol, state) in sequence {
            let input = format!("{symbol},20,25,30,0");

            match Line::parse(&input).unwrap() {
                Line::Status(frame) => assert_eq!(frame.state, state),
                line => panic!("unexpected parse of {input:?}: {line:?}"),
            }
        }
    }

    #[test]
    fn test_events_match_exactly() {
        assert_eq!(Line::parse("Start").unwrap(), Line::Event(ButtonEvent::Start));
        assert_eq!(Line::parse("Stop").unwrap(), Line::Event(ButtonEvent::Stop));

        for input in ["start", "STOP", "Started", "Start "] {
            assert!(Line::parse(input).is_err(), "should reject {input:?}");
        }
    }

    #[test]
    fn test_rejects_malformed_lines() {
        let rejects = [
            "",
            "F,20,25,30",
            "F,20,25,30,128,7",
            "F,20,twenty,30,128",
            "F,20,,30,128",
            "X,20,25,30,128",
            "Stop,1",
            "garbage",
        ];

        for input in rejects {
            assert!(Line::parse(input).is_err(), "should reject {input:?}");
        }

        assert!(matches!(Line::parse("garbage"), Err(LineError::Unrecognized)));
        assert!(matches!(Line::parse("F,20,25,30"), Err(LineError::FieldCount(4))));
    }

    #[test]
    fn test_fields_tolerate_padding() {
        let line = Line::parse("S, 0 ,21,  21,0").unwrap();

        match line {
            Line::Status(frame) => {
                assert_eq!(frame.state, MotorState::Stopped);
                assert_eq!(frame.target, 0);
                assert_eq!(frame.inside, 21);
            }
            line => panic!("unexpected parse: {line:?}"),
        }
    }

    #[test]
    fn test_display_matches_wire_form() {
        let frame = StatusFrame {
            state: MotorState::Backward,
            target: 18,
            inside: 24,
            outside: 31,
            speed: 192,
        };

        assert_eq!(frame.to_string(), "B,18,24,31,192");
        assert_eq!(Line::parse(&frame.to_string()).unwrap(), Line::Status(frame));
    }
}
