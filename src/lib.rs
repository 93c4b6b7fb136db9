use std::io;

use eyre::Result;

pub mod audio;
pub mod cli;
pub mod config;
pub mod hardware;
pub mod harness;
pub mod panel;
pub mod voice;

/// One-time process setup: error reports and logging to stderr.
///
/// Stdout is left to the commands themselves so summaries and reports can
/// be piped cleanly.
pub fn init() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter("vento=debug")
        .with_writer(io::stderr)
        .init();

    Ok(())
}

pub fn banner() {
    eprintln!(
        "vento {} ({}-{})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_CFG_TARGET_ARCH"),
        env!("CARGO_CFG_TARGET_OS"),
    );
}
