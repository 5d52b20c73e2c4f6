//! The frame assembler turns the blocking event stream of a single source
//! device into frames of events delimited by synchronization markers.
//!
//! Each assembler runs on its own thread and owns its device exclusively.
//! Completed frames are streamed to the dispatcher over the shared event
//! channel, one event at a time and in sequence order, followed by the
//! marker that terminated the frame. Read errors are reported on the shared
//! error channel and never stop the loop.
//!
//! Stopping is cooperative: the stop flag is only checked before a new frame
//! is started, and because reads block, an assembler only notices the flag
//! after its device produces the next marker. An idle device will keep its
//! assembler blocked until more input arrives or the process exits.
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use tokio::{
    sync::{mpsc::Sender, oneshot},
    time::timeout,
};

use crate::input::{
    event::{DeviceEvent, Frame, SyncMarker},
    identity::Fingerprint,
};

use super::{SourceDevice, SourceError};

/// A read error reported by a frame assembler
#[derive(Debug)]
pub struct DeviceError {
    pub device: Fingerprint,
    pub error: SourceError,
}

/// Reason an assembler loop exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop flag was raised
    Stopped,
    /// The dispatcher is no longer receiving events
    Disconnected,
}

/// Groups the events of one source device into frames
pub struct FrameAssembler<S: SourceDevice> {
    device: S,
    events: Sender<DeviceEvent>,
    errors: Sender<DeviceError>,
    stop: Arc<AtomicBool>,
}

impl<S: SourceDevice> FrameAssembler<S> {
    pub fn new(
        device: S,
        events: Sender<DeviceEvent>,
        errors: Sender<DeviceError>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            device,
            events,
            errors,
            stop,
        }
    }

    /// Read frames until the stop flag is raised or the dispatcher goes away.
    /// This method blocks and must not be called from an async context.
    pub fn run(&mut self) -> StopReason {
        let fingerprint = self.device.fingerprint().clone();
        log::debug!("Started frame assembler for {}", self.device.path());

        while !self.stop.load(Ordering::Acquire) {
            // Wait for input events and build the frame
            let mut frame = Frame::new(fingerprint.clone());
            let marker = loop {
                let event = match self.device.read_one() {
                    Ok(event) => event,
                    Err(error) => {
                        log::trace!("Failed to read from {}: {error}", self.device.path());
                        let error = DeviceError {
                            device: fingerprint.clone(),
                            error,
                        };
                        if self.errors.blocking_send(error).is_err() {
                            return StopReason::Disconnected;
                        }
                        continue;
                    }
                };
                if event.is_sync() {
                    break SyncMarker {
                        device: fingerprint.clone(),
                        timestamp: event.timestamp,
                        code: event.control.code,
                        value: event.value,
                    };
                }
                frame.push(event);
            };

            // Unwind the frame, emitting each event individually
            if !frame.is_empty() {
                log::trace!("Assembled frame of {} event(s)", frame.len());
            }
            for event in frame.into_events() {
                if self.events.blocking_send(DeviceEvent::Input(event)).is_err() {
                    return StopReason::Disconnected;
                }
            }
            if self.events.blocking_send(DeviceEvent::Sync(marker)).is_err() {
                return StopReason::Disconnected;
            }
        }

        StopReason::Stopped
    }

    /// Consume the assembler, returning the device it owns
    pub fn into_device(self) -> S {
        self.device
    }
}

impl<S: SourceDevice + 'static> FrameAssembler<S> {
    /// Run the assembler on a dedicated thread. The device is closed when the
    /// loop exits and the result is reported through the returned handle.
    pub fn spawn(self) -> io::Result<AssemblerHandle> {
        let fingerprint = self.device.fingerprint().clone();
        let path = self.device.path().to_string();
        let stop = self.stop.clone();
        let (done_tx, done_rx) = oneshot::channel();

        let mut assembler = self;
        thread::Builder::new()
            .name(format!("assembler-{}", fingerprint.short()))
            .spawn(move || {
                let reason = assembler.run();
                let mut device = assembler.into_device();
                log::debug!("Frame assembler for {} exited: {reason:?}", device.path());
                let result = device.close();
                if done_tx.send(result).is_err() {
                    log::trace!("Nobody is waiting for {} to close", device.path());
                }
            })?;

        Ok(AssemblerHandle {
            fingerprint,
            path,
            stop,
            done: done_rx,
        })
    }
}

/// Handle to a running frame assembler thread
#[derive(Debug)]
pub struct AssemblerHandle {
    fingerprint: Fingerprint,
    path: String,
    stop: Arc<AtomicBool>,
    done: oneshot::Receiver<Result<(), SourceError>>,
}

impl AssemblerHandle {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Ask the assembler to stop before its next frame
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Wait up to the given duration for the assembler to exit and close its
    /// device. Returns `None` if the assembler is still blocked on a read.
    pub async fn wait(self, grace: Duration) -> Option<Result<(), SourceError>> {
        match timeout(grace, self.done).await {
            Ok(Ok(result)) => Some(result),
            Ok(Err(_)) => {
                log::error!("Frame assembler for {} exited unexpectedly", self.path);
                None
            }
            Err(_) => {
                log::debug!(
                    "Frame assembler for {} is still waiting for input; device will be released on exit",
                    self.path
                );
                None
            }
        }
    }
}
