use std::{
    collections::HashMap,
    future::Future,
    io,
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use thiserror::Error;
use tokio::{sync::mpsc, task::JoinSet};

use crate::config::{Config, ConfigError};

use super::{
    control::{Calibration, Control},
    diagnostics::EventLogger,
    dispatcher::{DispatchError, DispatchStats, Dispatcher},
    identity::Fingerprint,
    mapping::MappingTable,
    source::{
        assembler::{AssemblerHandle, FrameAssembler},
        evdev::{list_devices, EvdevSource},
        SourceDevice, SourceError,
    },
    target::{gamepad::GamepadDevice, OutputSpec, TargetDevice, TargetError},
};

/// Capacity of the event and error channels shared by all assemblers
pub const BUFFER_SIZE: usize = 1024;

/// Default time to wait for each assembler to release its device on shutdown
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Possible errors while running the remapping pipeline
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("none of the configured input devices were found")]
    NoDevices,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error("failed to start frame assembler: {0}")]
    Spawn(io::Error),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A mapping that cannot be served by the opened devices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("axis {control} on device {device} has no calibration data")]
    UncalibratedAxis { device: Fingerprint, control: Control },
    #[error("output device has no control {control} (mapped from device {device})")]
    UnsupportedTarget { device: Fingerprint, control: Control },
}

/// Runtime options that are not part of the mapping configuration
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Log synchronization markers along with other events
    pub show_sync_events: bool,
    /// Time to wait for each assembler to release its device on shutdown
    pub grace_period: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            show_sync_events: false,
            grace_period: SHUTDOWN_GRACE_PERIOD,
        }
    }
}

/// Sets up the remapping pipeline from a [Config]: opens and grabs every
/// configured input device, creates the virtual gamepad and runs the
/// dispatcher until shutdown.
pub struct Manager {
    config: Config,
    options: ManagerOptions,
}

impl Manager {
    pub fn new(config: Config, options: ManagerOptions) -> Self {
        Self { config, options }
    }

    /// Run the pipeline until the given shutdown future completes or a fatal
    /// error occurs.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ManagerError>
    where
        F: Future<Output = ()>,
    {
        let table = self.config.to_mapping_table()?;
        let spec = self.config.output_spec()?;
        log::debug!(
            "Loaded {} mapping(s) for {} device(s)",
            table.len(),
            table.fingerprints().count()
        );

        let sources = open_configured_devices(&table)?;
        let calibrations: HashMap<Fingerprint, Calibration> = sources
            .iter()
            .map(|s| (s.fingerprint().clone(), s.calibration().clone()))
            .collect();
        validate(&table, &calibrations, &spec)?;

        let target = GamepadDevice::create(&spec)?;
        log::info!("Created virtual gamepad '{}'", target.name());

        let stats = run_pipeline(
            sources,
            target,
            table,
            spec.calibration(),
            &self.options,
            shutdown,
        )
        .await?;
        log::info!(
            "Forwarded {} event(s) in {} frame(s), dropped {} unmapped event(s)",
            stats.forwarded,
            stats.frames,
            stats.dropped
        );

        Ok(())
    }
}

/// Open and grab every input device whose fingerprint has mappings. Devices
/// without mappings are left untouched.
fn open_configured_devices(table: &MappingTable) -> Result<Vec<EvdevSource>, ManagerError> {
    let mut sources = Vec::new();
    for info in list_devices() {
        if !table.contains_device(&info.fingerprint) {
            log::trace!("Skipping unconfigured device {} ({})", info.path, info.name);
            continue;
        }
        sources.push(EvdevSource::open(info.path.as_str())?);
    }

    for fingerprint in table.fingerprints() {
        if !sources.iter().any(|s| s.fingerprint() == fingerprint) {
            log::warn!("Configured device {fingerprint} was not found");
        }
    }

    if sources.is_empty() {
        return Err(ManagerError::NoDevices);
    }
    Ok(sources)
}

/// Check that every mapping of the given devices can be served: source axes
/// must be calibrated and targets must exist on the output device. Devices
/// that are not present are ignored.
pub fn validate(
    table: &MappingTable,
    calibrations: &HashMap<Fingerprint, Calibration>,
    spec: &OutputSpec,
) -> Result<(), ValidationError> {
    for (device, calibration) in calibrations.iter() {
        for (source, record) in table.records(device) {
            if source.is_axis() && calibration.get(source).is_none() {
                return Err(ValidationError::UncalibratedAxis {
                    device: device.clone(),
                    control: *source,
                });
            }
            if !spec.supports(&record.target) {
                return Err(ValidationError::UnsupportedTarget {
                    device: device.clone(),
                    control: record.target,
                });
            }
        }
    }
    Ok(())
}

/// Start one frame assembler per source device and dispatch their events to
/// the target until shutdown. Every assembler is stopped and given the
/// options' grace period to release its device before this returns. A
/// dispatcher error takes precedence over errors closing the devices.
pub async fn run_pipeline<S, T, F>(
    sources: Vec<S>,
    target: T,
    table: MappingTable,
    output_calibration: Calibration,
    options: &ManagerOptions,
    shutdown: F,
) -> Result<DispatchStats, ManagerError>
where
    S: SourceDevice + 'static,
    T: TargetDevice,
    F: Future<Output = ()>,
{
    let calibrations: HashMap<Fingerprint, Calibration> = sources
        .iter()
        .map(|s| (s.fingerprint().clone(), s.calibration().clone()))
        .collect();

    let (events_tx, events_rx) = mpsc::channel(BUFFER_SIZE);
    let (errors_tx, errors_rx) = mpsc::channel(BUFFER_SIZE);
    let mut dispatcher = Dispatcher::new(
        table,
        calibrations,
        output_calibration,
        target,
        events_rx,
        errors_rx,
    )
    .with_logger(EventLogger::new(options.show_sync_events));

    // Start the assemblers
    let mut handles = Vec::with_capacity(sources.len());
    for source in sources {
        let stop = Arc::new(AtomicBool::new(false));
        let assembler = FrameAssembler::new(source, events_tx.clone(), errors_tx.clone(), stop);
        match assembler.spawn() {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                drop(dispatcher);
                return Err(abort_startup(handles, options.grace_period, e).await);
            }
        }
    }
    drop(events_tx);
    drop(errors_tx);

    let result = dispatcher.run(shutdown).await;

    // Closing the channels unblocks assemblers waiting to send
    drop(dispatcher);
    let closed = stop_assemblers(handles, options.grace_period).await;

    let stats = result?;
    closed?;
    Ok(stats)
}

/// Release the devices of assemblers that already started when a later one
/// could not be spawned. The spawn error is returned; close errors are only
/// logged.
pub(crate) async fn abort_startup(
    handles: Vec<AssemblerHandle>,
    grace: Duration,
    error: io::Error,
) -> ManagerError {
    if let Err(e) = stop_assemblers(handles, grace).await {
        log::warn!("Devices were not released cleanly after a failed start: {e}");
    }
    ManagerError::Spawn(error)
}

/// Raise the stop flag of every assembler and wait for them to release their
/// devices. Returns the first close error.
async fn stop_assemblers(handles: Vec<AssemblerHandle>, grace: Duration) -> Result<(), SourceError> {
    for handle in handles.iter() {
        handle.stop();
    }

    let mut waiting = JoinSet::new();
    for handle in handles {
        waiting.spawn(async move {
            let path = handle.path().to_string();
            (path, handle.wait(grace).await)
        });
    }

    let mut first_error = None;
    while let Some(joined) = waiting.join_next().await {
        let (path, result) = match joined {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to wait for frame assembler: {e}");
                continue;
            }
        };
        match result {
            Some(Ok(())) => log::debug!("Released device {path}"),
            Some(Err(e)) => {
                log::error!("Failed to release device {path}: {e}");
                first_error.get_or_insert(e);
            }
            None => (),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
