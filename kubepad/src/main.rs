//! kubepad: interactive entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use kubepad::{app, logging, KubepadConfig};
use launchpad_mk2::device;

#[derive(Parser, Debug)]
#[command(name = "kubepad", about = "Launchpad MK2 dashboard for Kubernetes and Marathon")]
struct Cli {
    /// Configuration file (default: ./Kubepad.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open the on-screen Launchpad.
    #[arg(long = "virtual")]
    virtual_pad: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Drive the cluster from the Launchpad (default).
    #[default]
    Run,
    /// Print Leap Motion connection events and gestures.
    Leap,
    /// List MIDI ports.
    Devices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = KubepadConfig::load(cli.config.as_deref())?;
    if cli.virtual_pad {
        config.launchpad.virtual_pad = true;
    }
    logging::init_from_config(&config)?;

    match cli.command.unwrap_or_default() {
        Command::Run => {
            info!(service = %config.cluster.service, "starting kubepad");
            app::run(&config)?;
        }
        Command::Leap => app::leap_probe()?,
        Command::Devices => {
            for port in device::list_ports()? {
                println!("{}", port);
            }
        }
    }
    Ok(())
}
