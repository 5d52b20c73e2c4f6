//! Source devices are the physical input devices (joysticks, throttles,
//! pedals) that events are read from.
pub mod assembler;
pub mod evdev;


use std::io;

use thiserror::Error;

use super::{control::Calibration, event::RawEvent, identity::Fingerprint};

/// Possible errors for a source device
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open device '{path}': {source}")]
    Open { path: String, source: io::Error },
    #[error("failed to grab device '{path}': {source}")]
    Grab { path: String, source: io::Error },
    #[error("failed to query axis calibration of '{path}': {source}")]
    Calibration { path: String, source: io::Error },
    #[error("failed to read event: {0}")]
    Read(io::Error),
    #[error("failed to close device: {0}")]
    Close(io::Error),
}

impl SourceError {
    /// Returns true if the error is a read that may succeed when retried
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Read(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// A physical input device that has been opened for exclusive reading. Each
/// source device is owned by exactly one frame assembler.
pub trait SourceDevice: Send {
    /// Stable fingerprint of the device
    fn fingerprint(&self) -> &Fingerprint;

    /// Human readable name of the device
    fn name(&self) -> &str;

    /// Path the device is currently exposed under (e.g. /dev/input/event12)
    fn path(&self) -> &str;

    /// Calibrated ranges of the device's absolute axes
    fn calibration(&self) -> &Calibration;

    /// Block until the next event is available and return it
    fn read_one(&mut self) -> Result<RawEvent, SourceError>;

    /// Release the device
    fn close(&mut self) -> Result<(), SourceError>;
}

impl<T: SourceDevice + ?Sized> SourceDevice for Box<T> {
    fn fingerprint(&self) -> &Fingerprint {
        (**self).fingerprint()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn path(&self) -> &str {
        (**self).path()
    }

    fn calibration(&self) -> &Calibration {
        (**self).calibration()
    }

    fn read_one(&mut self) -> Result<RawEvent, SourceError> {
        (**self).read_one()
    }

    fn close(&mut self) -> Result<(), SourceError> {
        (**self).close()
    }
}
