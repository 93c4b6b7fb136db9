use std::{path::PathBuf, time::Duration};

use clap::Parser;
use eyre::{Result, bail};
use tokio::io::{duplex, split};

use crate::{
    hardware::{
        AirHandler,
        air_handler::sim::{Climate, Simulator},
    },
    harness::{Harness, Options, operator::SimOperator},
};

#[derive(Clone, Debug, Parser)]
pub struct DemoOpts {
    #[clap(long)]
    report: Option<PathBuf>,
}

/// Runs the full acceptance sequence against the built-in simulator.
///
/// Useful for demonstrating the harness without a unit on the bench, and
/// as a smoke test of the toolchain itself.
pub async fn run(opts: DemoOpts) -> Result<()> {
    tracing::info!("Starting the built-in simulator");

    let (near, far) = duplex(4096);

    let (sim_reader, sim_writer) = split(far);
    let (handle, _simulator) = Simulator::spawn(sim_reader, sim_writer, Climate::default());

    let (reader, writer) = split(near);
    let device = AirHandler::attach(reader, writer);

    let options = Options {
        event_timeout: Duration::from_secs(2),
        settle: Duration::from_millis(500),
        probe_polls: 5,
        probe_interval: Duration::from_millis(200),
    };

    let mut operator = SimOperator::new(handle);
    let report = Harness::new(device, options).run(&mut operator).await?;

    report.print_summary();

    if let Some(path) = &opts.report {
        report.save(path).await?;
        tracing::info!("Report written to {}", path.display());
    }

    match report.failed() {
        0 => Ok(()),
        failed => bail!("{failed} of {} checks failed", report.run()),
    }
}
