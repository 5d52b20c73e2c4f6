//! Stable identification of physical input devices.
//!
//! OS device paths like `/dev/input/event12` change between boots and
//! reconnects, so devices are identified by a fingerprint derived from their
//! hardware metadata instead. Two devices of the same model without a serial
//! number will share a fingerprint.
use std::fmt::Display;

use evdev::Device;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier of a physical device, independent of the path it is
/// currently exposed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns a shortened form of the fingerprint for log output
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(self.0.as_str())
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hardware metadata used to derive a [Fingerprint]. Any field may be
/// missing; missing fields are left out of the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceMetadata {
    pub bus_type: Option<u16>,
    pub vendor: Option<u16>,
    pub product: Option<u16>,
    pub version: Option<u16>,
    pub name: Option<String>,
    pub unique_id: Option<String>,
}

impl DeviceMetadata {
    /// Derive the fingerprint for this metadata
    pub fn fingerprint(&self) -> Fingerprint {
        resolve(self)
    }
}

impl From<&Device> for DeviceMetadata {
    fn from(device: &Device) -> Self {
        let input_id = device.input_id();
        Self {
            bus_type: Some(input_id.bus_type().0),
            vendor: Some(input_id.vendor()),
            product: Some(input_id.product()),
            version: Some(input_id.version()),
            name: device.name().map(String::from),
            unique_id: device
                .unique_name()
                .filter(|id| !id.is_empty())
                .map(String::from),
        }
    }
}

/// Derive a stable [Fingerprint] from the given device metadata. The bus
/// type, vendor, product and version are added to an identifier pool as
/// little-endian integers, followed by the device name and unique id, and the
/// pool is hashed with SHA-256.
pub fn resolve(metadata: &DeviceMetadata) -> Fingerprint {
    let mut identifiers: Vec<u8> = Vec::with_capacity(64);

    let input_id = [
        metadata.bus_type,
        metadata.vendor,
        metadata.product,
        metadata.version,
    ];
    for value in input_id.into_iter().flatten() {
        identifiers.extend_from_slice(&value.to_le_bytes());
    }

    if let Some(name) = metadata.name.as_ref() {
        identifiers.extend_from_slice(name.as_bytes());
    }
    if let Some(unique_id) = metadata.unique_id.as_ref() {
        identifiers.extend_from_slice(unique_id.as_bytes());
    }

    let hash = Sha256::digest(&identifiers);
    let fingerprint = Fingerprint(hex::encode(hash));
    log::trace!("Resolved {metadata:?} to fingerprint {fingerprint}");

    fingerprint
}
