//! The dispatcher is the single consumer of the events produced by all frame
//! assemblers. It remaps each event and forwards it to the output device.
use std::{collections::HashMap, future::Future};

use thiserror::Error;
use tokio::sync::mpsc::Receiver;

use super::{
    control::Calibration,
    diagnostics::EventLogger,
    event::{DeviceEvent, InputEvent, OutputEvent, SyncMarker},
    identity::Fingerprint,
    mapping::MappingTable,
    source::{assembler::DeviceError, SourceError},
    target::{TargetDevice, TargetError},
};

/// Errors that terminate the dispatch loop
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to read from device {device}: {error}")]
    Device {
        device: Fingerprint,
        #[source]
        error: SourceError,
    },
    #[error("failed to write to the output device: {0}")]
    Target(#[from] TargetError),
    #[error("all source devices have stopped")]
    SourcesClosed,
}

impl From<DeviceError> for DispatchError {
    fn from(value: DeviceError) -> Self {
        Self::Device {
            device: value.device,
            error: value.error,
        }
    }
}

/// Counters collected while dispatching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Remapped events written to the output device
    pub forwarded: u64,
    /// Events without a mapping
    pub dropped: u64,
    /// Synchronization markers written to the output device
    pub frames: u64,
}

/// Merges the event and error streams of all source devices into one loop
/// that remaps events and writes them to the output device.
pub struct Dispatcher<T: TargetDevice> {
    table: MappingTable,
    calibrations: HashMap<Fingerprint, Calibration>,
    output_calibration: Calibration,
    target: T,
    events: Receiver<DeviceEvent>,
    errors: Receiver<DeviceError>,
    logger: EventLogger,
    stats: DispatchStats,
}

impl<T: TargetDevice> Dispatcher<T> {
    pub fn new(
        table: MappingTable,
        calibrations: HashMap<Fingerprint, Calibration>,
        output_calibration: Calibration,
        target: T,
        events: Receiver<DeviceEvent>,
        errors: Receiver<DeviceError>,
    ) -> Self {
        Self {
            table,
            calibrations,
            output_calibration,
            target,
            events,
            errors,
            logger: EventLogger::default(),
            stats: DispatchStats::default(),
        }
    }

    /// Use the given logger for per-event diagnostics
    pub fn with_logger(mut self, logger: EventLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Process events until the shutdown future completes or a fatal error
    /// occurs. The output device is closed before returning in either case.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<DispatchStats, DispatchError>
    where
        F: Future<Output = ()>,
    {
        log::debug!("Dispatcher started");
        let result = self.dispatch(shutdown).await;
        log::debug!("Dispatcher stopped: {:?}", self.stats);

        let closed = self.target.close();
        match (result, closed) {
            (Err(e), Err(close_err)) => {
                log::error!("Failed to close output device: {close_err}");
                Err(e)
            }
            (Err(e), Ok(_)) => Err(e),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Ok(stats), Ok(_)) => Ok(stats),
        }
    }

    async fn dispatch<F>(&mut self, shutdown: F) -> Result<DispatchStats, DispatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Shutdown requested");
                    break;
                }
                Some(error) = self.errors.recv() => {
                    self.handle_error(error)?;
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        return Err(DispatchError::SourcesClosed);
                    };
                    self.handle_event(event)?;
                }
            }
        }

        Ok(self.stats)
    }

    /// Any reported read error stops the pipeline. Sources retry reads that
    /// may succeed before reporting.
    fn handle_error(&mut self, error: DeviceError) -> Result<(), DispatchError> {
        log::error!("Read error on {}: {}", error.device.short(), error.error);
        Err(error.into())
    }

    /// Remap and forward a single event
    pub fn handle_event(&mut self, event: DeviceEvent) -> Result<(), DispatchError> {
        match event {
            DeviceEvent::Sync(marker) => self.forward_sync(marker),
            DeviceEvent::Input(event) => self.forward_input(event),
        }
    }

    /// Synchronization markers bypass the mapping table
    fn forward_sync(&mut self, marker: SyncMarker) -> Result<(), DispatchError> {
        self.logger.log_sync(&marker);
        self.target.send(OutputEvent::from(&marker))?;
        self.stats.frames += 1;
        Ok(())
    }

    fn forward_input(&mut self, event: InputEvent) -> Result<(), DispatchError> {
        let uncalibrated = Calibration::default();
        let source = self
            .calibrations
            .get(&event.device)
            .unwrap_or(&uncalibrated);
        let remapped = self.table.remap(&event, source, &self.output_calibration);
        self.logger.log_event(&event, remapped.as_ref());

        let Some(output) = remapped else {
            self.stats.dropped += 1;
            return Ok(());
        };
        self.target.send(output)?;
        self.stats.forwarded += 1;
        Ok(())
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Consume the dispatcher, returning the output device
    pub fn into_target(self) -> T {
        self.target
    }
}
