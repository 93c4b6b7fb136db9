use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

use crate::hardware::air_handler::sim::SimHandle;

/* === Definitions === */

/// A physical intervention the harness needs performed on the unit.
#[derive(Clone, Copy, Debug)]
pub enum Action {
    PressButton,
    ReleaseButton,
    WarmInsideSensor,
    WarmOutsideSensor,
}

/// Whoever stands next to the hardware: a person at the console, or the
/// simulator handle during unattended runs.
#[async_trait]
pub trait Operator: Send {
    async fn perform(&mut self, action: Action);

    /// Pauses for a manual verification step where one is possible.
    async fn acknowledge(&mut self, instruction: &str);
}

pub struct ConsoleOperator {
    input: BufReader<Stdin>,
}

/// Performs harness actions directly on the simulated unit.
pub struct SimOperator {
    handle: SimHandle,
}

/* === Implementations === */

impl ConsoleOperator {
    pub fn new() -> Self {
        ConsoleOperator {
            input: BufReader::new(tokio::io::stdin()),
        }
    }

    async fn pause(&mut self, instruction: &str) {
        println!(">>> {instruction} (press Enter to continue)");

        let mut line = String::new();
        let _ = self.input.read_line(&mut line).await;
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    async fn perform(&mut self, action: Action) {
        let instruction = match action {
            Action::PressButton => "Press the unit's button to start a voice session",
            Action::ReleaseButton => "Press the unit's button again to stop the session",
            Action::WarmInsideSensor => "Warm the inside sensor and keep it warm (a finger works)",
            Action::WarmOutsideSensor => "Warm the outside sensor and keep it warm (a finger works)",
        };

        self.pause(instruction).await;
    }

    async fn acknowledge(&mut self, instruction: &str) {
        self.pause(instruction).await;
    }
}

impl SimOperator {
    /// Sensor bump for the probe checks, comfortably over the detection
    /// threshold.
    const SENSOR_BUMP: i32 = 5;

    pub fn new(handle: SimHandle) -> Self {
        SimOperator { handle }
    }
}

#[async_trait]
impl Operator for SimOperator {
    async fn perform(&mut self, action: Action) {
        match action {
            Action::PressButton => self.handle.press().await,
            Action::ReleaseButton => self.handle.release().await,
            Action::WarmInsideSensor => self.handle.warm_inside(Self::SENSOR_BUMP),
            Action::WarmOutsideSensor => self.handle.warm_outside(Self::SENSOR_BUMP),
        }
    }

    async fn acknowledge(&mut self, _instruction: &str) {}
}
