use std::time::Duration;

use clap::Parser;
use eyre::{Result, bail};
use tokio::time::sleep;

use crate::{config::Config, hardware::AirHandler, panel::Panel};

const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Parser)]
pub struct PanelOpts {
    #[clap(short, long, default_value = "config.yaml")]
    config: String,

    #[clap(short, long)]
    port: Option<String>,

    #[clap(short, long)]
    baud: Option<u32>,
}

/// Keeps the panel attached to the unit, reconnecting after dropped
/// connections until interrupted.
pub async fn run(opts: PanelOpts) -> Result<()> {
    let config = Config::load_or_default(&opts.config).await?;

    let Some(port) = opts.port.or_else(|| config.port.clone()) else {
        bail!("No serial port given (set `port` in the config file or pass --port)");
    };

    let baud = opts.baud.unwrap_or(config.baud);

    loop {
        tracing::info!("Connecting to {port} at {baud} baud");

        match AirHandler::open(&port, baud).await {
            Ok(device) => {
                if let Err(error) = Panel::new(device, &config).run().await {
                    tracing::warn!("Panel stopped: {error}");
                }
            }

            Err(error) => tracing::warn!("Connection failed: {error}"),
        }

        tracing::info!("Retrying in {} seconds", RETRY_DELAY.as_secs());
        sleep(RETRY_DELAY).await;
    }
}
