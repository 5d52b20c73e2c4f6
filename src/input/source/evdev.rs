use std::{collections::VecDeque, path::PathBuf};

use evdev::Device;

use crate::input::{
    control::{Calibration, Control, ControlRange},
    event::RawEvent,
    identity::{DeviceMetadata, Fingerprint},
};

use super::{SourceDevice, SourceError};

/// Summary of an input device found during enumeration
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub fingerprint: Fingerprint,
    pub metadata: DeviceMetadata,
}

/// Enumerate all input event devices on the system (e.g. /dev/input/event*)
pub fn list_devices() -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = evdev::enumerate()
        .map(|(path, device)| device_info(path, &device))
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices
}

fn device_info(path: PathBuf, device: &Device) -> DeviceInfo {
    let metadata = DeviceMetadata::from(device);
    DeviceInfo {
        path: path.to_string_lossy().to_string(),
        name: metadata.name.clone().unwrap_or_else(|| "unknown".to_string()),
        fingerprint: metadata.fingerprint(),
        metadata,
    }
}

/// Read the calibrated ranges of all absolute axes on the given device. Axes
/// that report an empty range are skipped.
pub fn read_calibration(device: &Device) -> std::io::Result<Calibration> {
    let mut calibration = Calibration::new();
    for (axis, info) in device.get_absinfo()? {
        log::trace!("Found axis {:?}: {:?}", axis, info);
        match ControlRange::try_from(&info) {
            Ok(range) => calibration.insert(Control::axis(axis), range),
            Err(e) => log::debug!("Ignoring axis {:?}: {e}", axis),
        }
    }
    Ok(calibration)
}

/// Source device implementation for evdev input devices
pub struct EvdevSource {
    path: String,
    name: String,
    device: Device,
    fingerprint: Fingerprint,
    calibration: Calibration,
    pending: VecDeque<RawEvent>,
    grabbed: bool,
}

impl EvdevSource {
    /// Open the device at the given path and grab it so that no other
    /// process receives its events.
    pub fn open(path: &str) -> Result<Self, SourceError> {
        log::debug!("Opening device at: {}", path);
        let mut device = Device::open(path).map_err(|source| SourceError::Open {
            path: path.to_string(),
            source,
        })?;

        let metadata = DeviceMetadata::from(&device);
        let fingerprint = metadata.fingerprint();
        let name = metadata.name.unwrap_or_else(|| "unknown".to_string());

        // Query information about the device to get the absolute ranges
        let calibration =
            read_calibration(&device).map_err(|source| SourceError::Calibration {
                path: path.to_string(),
                source,
            })?;

        device.grab().map_err(|source| SourceError::Grab {
            path: path.to_string(),
            source,
        })?;
        log::info!("Grabbed device {name} ({}) at {path}", fingerprint.short());

        Ok(Self {
            path: path.to_string(),
            name,
            device,
            fingerprint,
            calibration,
            pending: VecDeque::new(),
            grabbed: true,
        })
    }
}

impl SourceDevice for EvdevSource {
    fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn path(&self) -> &str {
        self.path.as_str()
    }

    fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    fn read_one(&mut self) -> Result<RawEvent, SourceError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }
            match self.device.fetch_events() {
                Ok(events) => self.pending.extend(events.map(RawEvent::from)),
                Err(e) => {
                    // Interrupted reads are retried before anything is reported
                    let error = SourceError::Read(e);
                    if !error.is_transient() {
                        return Err(error);
                    }
                    log::trace!("Retrying read on {}: {error}", self.path);
                }
            }
        }
    }

    fn close(&mut self) -> Result<(), SourceError> {
        if !self.grabbed {
            return Ok(());
        }
        log::debug!("Releasing device at: {}", self.path);
        self.grabbed = false;
        self.device.ungrab().map_err(SourceError::Close)
    }
}

impl std::fmt::Debug for EvdevSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevSource")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}
