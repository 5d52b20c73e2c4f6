use std::time::{Duration, SystemTime};

use evdev::{AbsoluteAxisCode, EventType, KeyCode};

use crate::input::{
    control::Control,
    event::{OutputEvent, RawEvent, SyncMarker},
    identity::Fingerprint,
};

#[test]
fn test_output_event_as_input_event() {
    let event = OutputEvent {
        timestamp: SystemTime::UNIX_EPOCH + Duration::from_secs(42),
        control: Control::axis(AbsoluteAxisCode::ABS_RZ),
        value: -512,
    };
    let written = event.as_input_event();
    assert_eq!(written.event_type(), EventType::ABSOLUTE);
    assert_eq!(written.code(), AbsoluteAxisCode::ABS_RZ.0);
    assert_eq!(written.value(), -512);

    let button = OutputEvent {
        timestamp: SystemTime::UNIX_EPOCH,
        control: Control::button(KeyCode::BTN_SELECT),
        value: 1,
    };
    let written = button.as_input_event();
    assert_eq!(written.event_type(), EventType::KEY);
    assert_eq!(written.code(), KeyCode::BTN_SELECT.0);
    assert_eq!(written.value(), 1);
}

#[test]
fn test_sync_marker_keeps_code_and_value() {
    let marker = SyncMarker {
        device: Fingerprint::from("stick"),
        timestamp: SystemTime::UNIX_EPOCH + Duration::from_millis(7),
        // SYN_DROPPED
        code: 3,
        value: 0,
    };
    let output = OutputEvent::from(&marker);
    assert!(output.is_sync());
    assert_eq!(output.timestamp, marker.timestamp);

    let written = output.as_input_event();
    assert_eq!(written.event_type(), EventType::SYNCHRONIZATION);
    assert_eq!(written.code(), 3);
    assert!(RawEvent::from(written).is_sync());
}
