use std::path::PathBuf;

use clap::Parser;
use eyre::{Result, bail};

use crate::{
    config::Config,
    hardware::AirHandler,
    harness::{Harness, Options, operator::ConsoleOperator},
};

#[derive(Clone, Debug, Parser)]
pub struct CheckOpts {
    #[clap(short, long, default_value = "config.yaml")]
    config: String,

    #[clap(short, long)]
    port: Option<String>,

    #[clap(short, long)]
    baud: Option<u32>,

    #[clap(long)]
    report: Option<PathBuf>,
}

pub async fn run(opts: CheckOpts) -> Result<()> {
    let config = Config::load_or_default(&opts.config).await?;

    let Some(port) = opts.port.or(config.port) else {
        bail!("No serial port given (set `port` in the config file or pass --port)");
    };

    let baud = opts.baud.unwrap_or(config.baud);

    tracing::info!("Connecting to {port} at {baud} baud");
    let device = AirHandler::open(&port, baud).await?;

    let mut operator = ConsoleOperator::new();
    let report = Harness::new(device, Options::from(&config.harness))
        .run(&mut operator)
        .await?;

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
