use clap::{Parser, Subcommand};
use eyre::Result;

mod check;
mod config;
mod demo;
mod panel;
mod ports;

/* === Definitions === */

#[derive(Clone, Debug, Parser)]
#[clap(version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    Check(check::CheckOpts),

    Config {
        #[clap(short, long, default_value = "config.yaml")]
        config: String,
    },

    Demo(demo::DemoOpts),

    Panel(panel::PanelOpts),

    Ports,
}

/* === Implementations === */

pub async fn run() -> Result<()> {
    execute(Cli::parse().command).await
}

async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Check(opts) => self::check::run(opts).await,
        Command::Config { config } => self::config::read_and_print(&config).await,
        Command::Demo(opts) => self::demo::run(opts).await,
        Command::Panel(opts) => self::panel::run(opts).await,
        Command::Ports => self::ports::list(),
    }
}
