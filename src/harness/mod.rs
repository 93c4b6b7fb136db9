use std::time::Duration;

use eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::sleep;

use crate::{
    config::HarnessConfig,
    hardware::{
        AirHandler,
        air_handler::defs::{ButtonEvent, StatusFrame, TargetCommand},
    },
};

use self::{
    operator::{Action, Operator},
    oracle::expected_state,
    report::Report,
};

pub mod operator;
pub mod oracle;
pub mod report;

/* === Definitions === */

/// Drives the unit through the acceptance sequence and scores the result.
pub struct Harness {
    device: AirHandler,
    options: Options,
}

/// Timing knobs, usually taken from the config file.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub event_timeout: Duration,
    pub settle: Duration,
    pub probe_polls: u32,
    pub probe_interval: Duration,
}

#[derive(Clone, Copy)]
enum Sensor {
    Inside,
    Outside,
}

/* === Implementations === */

impl Default for Options {
    fn default() -> Self {
        Options {
            event_timeout: Duration::from_secs(10),
            settle: Duration::from_secs(1),
            probe_polls: 10,
            probe_interval: Duration::from_secs(1),
        }
    }
}

impl From<&HarnessConfig> for Options {
    fn from(config: &HarnessConfig) -> Self {
        Options {
            event_timeout: Duration::from_secs_f32(config.event_timeout_s),
            settle: Duration::from_secs_f32(config.settle_s),
            probe_polls: config.probe_polls,
            ..Default::default()
        }
    }
}

impl Sensor {
    fn name(&self) -> &'static str {
        match self {
            Sensor::Inside => "inside probe",
            Sensor::Outside => "outside probe",
        }
    }

    fn pick(&self, frame: &StatusFrame) -> i32 {
        match self {
            Sensor::Inside => frame.inside,
            Sensor::Outside => frame.outside,
        }
    }
}

impl Harness {
    /// Target used for the echo check.
    const ECHO_TARGET: i64 = 20;

    /// How far a command moves the target for the cooling/heating checks.
    const TARGET_STEP: i64 = 20;

    /// Minimum rise a warmed sensor must show.
    const PROBE_RISE: i32 = 2;

    pub fn new(device: AirHandler, options: Options) -> Self {
        Harness { device, options }
    }

    /// Runs the whole sequence, returning the scored report. Check failures
    /// are recorded, not raised; only a dead link aborts the run.
    pub async fn run(mut self, operator: &mut dyn Operator) -> Result<Report> {
        let mut report = Report::new();

        self.check_button(&mut report, operator, ButtonEvent::Start).await;
        self.check_button(&mut report, operator, ButtonEvent::Stop).await;
        self.check_target_echo(&mut report, operator).await?;
        self.check_reaction(&mut report, "hold band", -1).await?;
        self.check_reaction(&mut report, "cooling", -Self::TARGET_STEP).await?;
        self.check_reaction(&mut report, "heating", Self::TARGET_STEP).await?;
        self.check_probe(&mut report, operator, Sensor::Outside).await;
        self.check_probe(&mut report, operator, Sensor::Inside).await;

        Ok(report)
    }

    /* == Checks == */

    async fn check_button(
        &mut self,
        report: &mut Report,
        operator: &mut dyn Operator,
        event: ButtonEvent,
    ) {
        let name = match event {
            ButtonEvent::Start => "button start",
            ButtonEvent::Stop => "button stop",
        };

        Self::herald(name);

        let action = match event {
            ButtonEvent::Start => Action::PressButton,
            ButtonEvent::Stop => Action::ReleaseButton,
        };

        operator.perform(action).await;

        let spinner = Self::spinner(format!("Waiting for the {event} line..."));
        let seen = self.device.wait_for_event(event, self.options.event_timeout).await;
        spinner.finish_and_clear();

        match seen {
            true => report.record(name, true, format!("received the {event} event")),
            false => report.record(
                name,
                false,
                format!("no {event} event within {:?}", self.options.event_timeout),
            ),
        }
    }

    async fn check_target_echo(
        &mut self,
        report: &mut Report,
        operator: &mut dyn Operator,
    ) -> Result<()> {
        let name = "target echo";
        Self::herald(name);

        self.set_target(TargetCommand::clamped(Self::ECHO_TARGET)).await?;

        match self.device.current_reading().await {
            Some(reading) if i64::from(reading.target) == Self::ECHO_TARGET => {
                report.record(name, true, format!("target echoed as {}", reading.target));

                operator
                    .acknowledge("Verify the unit's display shows target 20")
                    .await;
            }

            Some(reading) => report.record(
                name,
                false,
                format!("sent {}, unit reports {}", Self::ECHO_TARGET, reading.target),
            ),

            None => report.record(name, false, "no reading available"),
        }

        Ok(())
    }

    /// Commands a target offset from the current inside temperature and
    /// compares the reported state against the expectation table.
    async fn check_reaction(
        &mut self,
        report: &mut Report,
        name: &str,
        offset: i64,
    ) -> Result<()> {
        Self::herald(name);

        let Some(baseline) = self.device.current_reading().await else {
            report.record(name, false, "no baseline reading available");
            return Ok(());
        };

        let target = TargetCommand::clamped(i64::from(baseline.inside) + offset);
        let expected = expected_state(i32::from(target.value()), baseline.inside, baseline.outside);

        self.set_target(target).await?;

        match self.device.current_reading().await {
            Some(reading) => {
                let passed = reading.state == expected;

                report.record(
                    name,
                    passed,
                    format!(
                        "target {target} with inside {} outside {}: expected {expected:?}, unit reports {:?}",
                        baseline.inside, baseline.outside, reading.state,
                    ),
                );
            }

            None => report.record(name, false, "no reading after the command"),
        }

        Ok(())
    }

    async fn check_probe(
        &mut self,
        report: &mut Report,
        operator: &mut dyn Operator,
        sensor: Sensor,
    ) {
        let name = sensor.name();
        Self::herald(name);

        let Some(baseline) = self.device.current_reading().await else {
            report.record(name, false, "no baseline reading available");
            return;
        };

        let start = sensor.pick(&baseline);

        let action = match sensor {
            Sensor::Inside => Action::WarmInsideSensor,
            Sensor::Outside => Action::WarmOutsideSensor,
        };

        operator.perform(action).await;

        let bar = Self::bar(u64::from(self.options.probe_polls));

        for _ in 0..self.options.probe_polls {
            bar.inc(1);

            if let Some(reading) = self.device.current_reading().await {
                let value = sensor.pick(&reading);

                if value - start > Self::PROBE_RISE {
                    bar.finish_and_clear();
                    report.record(name, true, format!("rose from {start} to {value}"));
                    return;
                }
            }

            sleep(self.options.probe_interval).await;
        }

        bar.finish_and_clear();

        report.record(
            name,
            false,
            format!("no rise beyond {} from {start}", Self::PROBE_RISE),
        );
    }

    /* == Console == */

    fn herald(name: &str) {
        println!("\n== Check: {name} ==");
    }

    fn spinner(message: String) -> ProgressBar {
        let spinner = ProgressBar::new_spinner().with_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn bar(length: u64) -> ProgressBar {
        let bar = ProgressBar::new(length);

        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>2}/{len:2}")
                .unwrap()
                .progress_chars("##-"),
        );

        bar
    }

    async fn set_target(&mut self, target: TargetCommand) -> Result<()> {
        self.device.send_target(target).await?;
        sleep(self.options.settle).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use crate::hardware::air_handler::sim::{Climate, Simulator};

    use super::{operator::SimOperator, *};

    #[tokio::test]
    async fn test_full_sequence_against_simulator() {
        let (near, far) = duplex(4096);

        let (sim_reader, sim_writer) = tokio::io::split(far);
        let (handle, _simulator) = Simulator::spawn(sim_reader, sim_writer, Climate::default());

        let (reader, writer) = tokio::io::split(near);
        let device = AirHandler::attach(reader, writer);

        let options = Options {
            event_timeout: Duration::from_secs(2),
            settle: Duration::from_millis(300),
            probe_polls: 5,
            probe_interval: Duration::from_millis(100),
        };

        let mut operator = SimOperator::new(handle);
        let report = Harness::new(device, options).run(&mut operator).await.unwrap();

        assert_eq!(report.run(), 8);
        assert_eq!(report.failed(), 0, "the simulator should pass cleanly");
        assert_eq!(report.score(), 100.);
    }
}
