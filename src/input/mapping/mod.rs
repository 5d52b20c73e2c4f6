pub mod transform;


use std::collections::HashMap;

use self::transform::Transform;

use super::{
    control::{Calibration, Control},
    event::{InputEvent, OutputEvent},
    identity::Fingerprint,
};

/// Associates a source control on one device with a target control on the
/// output device, along with the transform used to rescale its value.
#[derive(Debug, Clone, Copy)]
pub struct MappingRecord {
    pub target: Control,
    pub transform: Transform,
}

/// Lookup table from (device fingerprint, source control) to [MappingRecord].
/// The table is built once before any events are processed and is read-only
/// afterwards. Events without a record are not forwarded.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    devices: HashMap<Fingerprint, HashMap<Control, MappingRecord>>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping for the given device and source control. Any existing
    /// mapping for the same source control on the same device is replaced.
    pub fn add(
        &mut self,
        device: Fingerprint,
        source: Control,
        target: Control,
        transform: Transform,
    ) {
        let record = MappingRecord { target, transform };
        let previous = self.devices.entry(device).or_default().insert(source, record);
        if let Some(previous) = previous {
            log::debug!(
                "Replacing mapping for {source}: {} => {}",
                previous.target,
                record.target
            );
        }
    }

    /// Returns the mapping for the given device and source control
    pub fn lookup(&self, device: &Fingerprint, source: &Control) -> Option<&MappingRecord> {
        self.devices.get(device)?.get(source)
    }

    /// Remap the given input event using the calibration of the device that
    /// produced it and the calibration of the output device. Returns `None` if
    /// the event has no mapping and should be dropped.
    pub fn remap(
        &self,
        event: &InputEvent,
        source: &Calibration,
        target: &Calibration,
    ) -> Option<OutputEvent> {
        let record = self.lookup(&event.device, &event.control)?;

        let Some(source_range) = source.range_for(&event.control) else {
            log::warn!(
                "No source range for {} on device {}",
                event.control,
                event.device.short()
            );
            return None;
        };
        let Some(target_range) = target.range_for(&record.target) else {
            log::warn!("No target range for {}", record.target);
            return None;
        };

        let value = record
            .transform
            .apply(event.value, source_range, target_range);

        Some(OutputEvent {
            timestamp: event.timestamp,
            control: record.target,
            value,
        })
    }

    /// Returns true if any mapping exists for the given device
    pub fn contains_device(&self, device: &Fingerprint) -> bool {
        self.devices.contains_key(device)
    }

    /// Returns the fingerprints of all devices with mappings
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.devices.keys()
    }

    /// Returns all mappings for the given device
    pub fn records(
        &self,
        device: &Fingerprint,
    ) -> impl Iterator<Item = (&Control, &MappingRecord)> {
        self.devices.get(device).into_iter().flat_map(|m| m.iter())
    }

    /// Returns the total number of mappings across all devices
    pub fn len(&self) -> usize {
        self.devices.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
