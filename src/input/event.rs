use std::time::SystemTime;

use evdev::{EventType, InputEvent as EvdevInputEvent, SynchronizationCode};

use super::{control::Control, identity::Fingerprint};

/// A single unprocessed event read from a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub timestamp: SystemTime,
    pub control: Control,
    pub value: i32,
}

impl RawEvent {
    pub fn new(timestamp: SystemTime, control: Control, value: i32) -> Self {
        Self {
            timestamp,
            control,
            value,
        }
    }

    /// Create a SYN_REPORT marker event with the given timestamp
    pub fn sync(timestamp: SystemTime) -> Self {
        let control = Control::new(EventType::SYNCHRONIZATION, SynchronizationCode::SYN_REPORT.0);
        Self::new(timestamp, control, 0)
    }

    /// Returns true if this event marks the end of a frame
    pub fn is_sync(&self) -> bool {
        self.control.is_sync()
    }
}

impl From<EvdevInputEvent> for RawEvent {
    fn from(event: EvdevInputEvent) -> Self {
        Self {
            timestamp: event.timestamp(),
            control: Control::new(event.event_type(), event.code()),
            value: event.value(),
        }
    }
}

/// An event read from a physical device, tagged with the device it came from
/// and its position within its [Frame].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub timestamp: SystemTime,
    pub control: Control,
    pub value: i32,
    pub device: Fingerprint,
    pub sequence: u32,
}

/// Synchronization marker that terminated a frame. It is forwarded to the
/// output device unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMarker {
    pub device: Fingerprint,
    pub timestamp: SystemTime,
    pub code: u16,
    pub value: i32,
}

impl SyncMarker {
    pub fn control(&self) -> Control {
        Control::new(EventType::SYNCHRONIZATION, self.code)
    }
}

/// Message sent from a frame assembler to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Input(InputEvent),
    Sync(SyncMarker),
}

/// Event ready to be written to the output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEvent {
    pub timestamp: SystemTime,
    pub control: Control,
    pub value: i32,
}

impl OutputEvent {
    pub fn is_sync(&self) -> bool {
        self.control.is_sync()
    }

    /// Convert to an event that can be written to uinput. The timestamp is
    /// not carried over: the kernel stamps every event injected through
    /// uinput with the time it was written.
    pub fn as_input_event(&self) -> EvdevInputEvent {
        EvdevInputEvent::new(self.control.event_type.0, self.control.code, self.value)
    }
}

impl From<&SyncMarker> for OutputEvent {
    fn from(marker: &SyncMarker) -> Self {
        Self {
            timestamp: marker.timestamp,
            control: marker.control(),
            value: marker.value,
        }
    }
}

/// Ordered batch of events read from one device between two synchronization
/// markers. Sequence numbers start at zero and increase by one per event.
#[derive(Debug)]
pub struct Frame {
    device: Fingerprint,
    events: Vec<InputEvent>,
}

impl Frame {
    pub fn new(device: Fingerprint) -> Self {
        Self {
            device,
            events: Vec::new(),
        }
    }

    /// Append the given raw event to the frame, assigning it the next
    /// sequence number.
    pub fn push(&mut self, event: RawEvent) {
        let sequence = self.events.len() as u32;
        self.events.push(InputEvent {
            timestamp: event.timestamp,
            control: event.control,
            value: event.value,
            device: self.device.clone(),
            sequence,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume the frame, yielding its events in sequence order
    pub fn into_events(self) -> impl Iterator<Item = InputEvent> {
        self.events.into_iter()
    }
}
