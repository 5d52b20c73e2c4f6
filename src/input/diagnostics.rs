//! Debug logging of processed events. Purely observational; nothing here
//! affects what is forwarded to the output device.
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use super::{
    control::Control,
    event::{InputEvent, OutputEvent, SyncMarker},
    identity::Fingerprint,
};

/// Minimum time between two log lines for the same axis
pub const AXIS_LOG_INTERVAL: Duration = Duration::from_millis(200);

/// Logs each processed event at debug level. Axis events are throttled per
/// device and control to avoid flooding the console while a stick moves.
#[derive(Debug, Default)]
pub struct EventLogger {
    show_sync_events: bool,
    last_logged: HashMap<(Fingerprint, Control), Instant>,
}

impl EventLogger {
    pub fn new(show_sync_events: bool) -> Self {
        Self {
            show_sync_events,
            last_logged: HashMap::new(),
        }
    }

    /// Returns true if the given event should be logged at the given time.
    /// Axis events are recorded as logged when this returns true.
    pub fn should_log(&mut self, event: &InputEvent, now: Instant) -> bool {
        if !log::log_enabled!(log::Level::Debug) {
            return false;
        }
        self.should_log_at(event, now)
    }

    fn should_log_at(&mut self, event: &InputEvent, now: Instant) -> bool {
        if !event.control.is_axis() {
            return true;
        }
        let key = (event.device.clone(), event.control);
        if let Some(last) = self.last_logged.get(&key) {
            if now.saturating_duration_since(*last) < AXIS_LOG_INTERVAL {
                return false;
            }
        }
        self.last_logged.insert(key, now);
        true
    }

    /// Log a remapped or dropped event
    pub fn log_event(&mut self, event: &InputEvent, result: Option<&OutputEvent>) {
        if !self.should_log(event, Instant::now()) {
            return;
        }
        let target = match result {
            Some(output) => format!("{:>6} {}", output.value, output.control),
            None => "!".to_string(),
        };
        log::debug!(
            "{} seq {:>2} {:>30} {:>6} ===> {}",
            event.device.short(),
            event.sequence,
            event.control.to_string(),
            event.value,
            target
        );
    }

    /// Log a synchronization marker if sync logging is enabled
    pub fn log_sync(&self, marker: &SyncMarker) {
        if !self.show_sync_events {
            return;
        }
        log::debug!(
            "{} {:>30} {:>6} ===> (forwarded)",
            marker.device.short(),
            marker.control().to_string(),
            marker.value
        );
    }
}
