use crate::hardware::air_handler::defs::MotorState;

/// Hysteresis half-width used by the firmware.
pub const TOLERANCE: i32 = 1;

/// Predicts the state the unit should settle into after taking `target`
/// with the sensors reading `inside` and `outside`.
///
/// Four mutually exclusive branches, ties falling exactly as the firmware
/// compares:
///
///   - within tolerance of the target there is no actuation;
///   - cooling draws outside air in when it is the cooler side, otherwise
///     exhausts inside air;
///   - heating draws outside air in only when it is the warmer side; there
///     is no heating element, so otherwise the unit stays stopped.
pub fn expected_state(target: i32, inside: i32, outside: i32) -> MotorState {
    if (inside - target).abs() <= TOLERANCE {
        MotorState::Stopped
    } else if inside > target {
        match outside < inside {
            true => MotorState::Forward,
            false => MotorState::Backward,
        }
    } else if outside > inside {
        MotorState::Forward
    } else {
        MotorState::Stopped
    }
}
