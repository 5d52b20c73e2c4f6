use std::env;
use std::error::Error;
use std::future::Future;
use std::io;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};

use hotas_to_gamepad::cli::{main_cli, Args, Commands};
use hotas_to_gamepad::config::Config;
use hotas_to_gamepad::input::manager::{Manager, ManagerOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_level = match env::var("LOG_LEVEL") {
        _ if args.debug => "debug".to_string(),
        Ok(value) => value,
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();

    // Handle any device inspection commands
    match args.cmd {
        None | Some(Commands::Run) => (),
        Some(cmd) => return main_cli(cmd),
    }

    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting hotas-to-gamepad v{}", VERSION);
    if args.debug_show_sync_events && !args.debug {
        log::warn!("--debug-show-sync-events has no effect without --debug");
    }

    let (config, path) = Config::load(args.config.as_deref())?;
    log::info!("Loaded config from {}", path.display());

    // Stop on SIGINT, SIGTERM or SIGHUP
    let shutdown = shutdown_signal()?;

    let options = ManagerOptions {
        show_sync_events: args.debug_show_sync_events,
        ..Default::default()
    };
    let manager = Manager::new(config, options);
    if let Err(e) = manager.run(shutdown).await {
        log::error!("Error running the virtual gamepad: {e}");
        return Err(e.into());
    }

    log::info!("hotas-to-gamepad stopped");

    Ok(())
}

/// Returns a future that completes when the process is asked to terminate
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = hangup.recv() => "SIGHUP",
        };
        log::info!("Received {name}");
    })
}
