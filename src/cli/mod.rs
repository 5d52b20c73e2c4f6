pub mod device;

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use device::{handle_devices, handle_info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Enable debug logging, including every processed event
    #[arg(long, global = true)]
    pub debug: bool,
    /// When used with --debug, synchronization events are logged too
    #[arg(long, global = true)]
    pub debug_show_sync_events: bool,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Grab the configured devices and run the virtual gamepad (default)
    Run,
    /// List all input devices along with their fingerprints
    Devices,
    /// Show the identity, axes and buttons of an input device
    Info {
        /// Path to the device (e.g. /dev/input/event12)
        path: String,
    },
}

/// Handle the commands that inspect devices instead of running the pipeline
pub fn main_cli(cmd: Commands) -> Result<(), Box<dyn Error>> {
    match cmd {
        Commands::Run => (),
        Commands::Devices => handle_devices()?,
        Commands::Info { path } => handle_info(path.as_str())?,
    }

    Ok(())
}
