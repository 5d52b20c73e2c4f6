use std::{collections::HashMap, io, time::SystemTime};

use evdev::{AbsoluteAxisCode, KeyCode};
use tokio::sync::mpsc;

use crate::input::{
    control::{Calibration, Control, ControlRange},
    dispatcher::{DispatchError, Dispatcher},
    event::{DeviceEvent, InputEvent, OutputEvent, SyncMarker},
    identity::Fingerprint,
    mapping::{transform::Transform, MappingTable},
    source::{assembler::DeviceError, SourceError},
    target::{TargetDevice, TargetError},
};

#[derive(Debug, Default)]
struct RecordingTarget {
    sent: Vec<OutputEvent>,
    closed: bool,
    fail_sends: bool,
}

impl TargetDevice for RecordingTarget {
    fn send(&mut self, event: OutputEvent) -> Result<(), TargetError> {
        if self.fail_sends {
            return Err(TargetError::Send(io::Error::other("device gone")));
        }
        self.sent.push(event);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TargetError> {
        self.closed = true;
        Ok(())
    }
}

fn stick() -> Fingerprint {
    Fingerprint::from("stick")
}

fn input(control: Control, value: i32, sequence: u32) -> DeviceEvent {
    DeviceEvent::Input(InputEvent {
        timestamp: SystemTime::UNIX_EPOCH,
        control,
        value,
        device: stick(),
        sequence,
    })
}

fn marker() -> DeviceEvent {
    DeviceEvent::Sync(SyncMarker {
        device: stick(),
        timestamp: SystemTime::UNIX_EPOCH,
        code: 0,
        value: 0,
    })
}

fn read_error(kind: io::ErrorKind) -> DeviceError {
    DeviceError {
        device: stick(),
        error: SourceError::Read(io::Error::from(kind)),
    }
}

struct Harness {
    dispatcher: Dispatcher<RecordingTarget>,
    events: mpsc::Sender<DeviceEvent>,
    errors: mpsc::Sender<DeviceError>,
}

fn harness(target: RecordingTarget) -> Harness {
    let mut table = MappingTable::new();
    table.add(
        stick(),
        Control::axis(AbsoluteAxisCode::ABS_X),
        Control::axis(AbsoluteAxisCode::ABS_RX),
        Transform::LINEAR,
    );
    table.add(
        stick(),
        Control::button(KeyCode::BTN_TRIGGER),
        Control::button(KeyCode::BTN_SOUTH),
        Transform::LINEAR,
    );

    let mut source = Calibration::new();
    source.insert(
        Control::axis(AbsoluteAxisCode::ABS_X),
        ControlRange::new(-32767, 32767).unwrap(),
    );
    let mut output = Calibration::new();
    output.insert(
        Control::axis(AbsoluteAxisCode::ABS_RX),
        ControlRange::new(0, 65535).unwrap(),
    );

    let (events_tx, events_rx) = mpsc::channel(16);
    let (errors_tx, errors_rx) = mpsc::channel(16);
    let dispatcher = Dispatcher::new(
        table,
        HashMap::from([(stick(), source)]),
        output,
        target,
        events_rx,
        errors_rx,
    );

    Harness {
        dispatcher,
        events: events_tx,
        errors: errors_tx,
    }
}

#[test]
fn test_handle_event_remaps_and_forwards_markers() {
    let mut h = harness(RecordingTarget::default());
    h.dispatcher
        .handle_event(input(Control::axis(AbsoluteAxisCode::ABS_X), 0, 0))
        .unwrap();
    h.dispatcher
        .handle_event(input(Control::button(KeyCode::BTN_TRIGGER), 1, 1))
        .unwrap();
    // Not mapped, should be skipped
    h.dispatcher
        .handle_event(input(Control::button(KeyCode::BTN_THUMB), 1, 2))
        .unwrap();
    h.dispatcher.handle_event(marker()).unwrap();

    let stats = h.dispatcher.stats();
    assert_eq!(stats.forwarded, 2);
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.frames, 1);

    let target = h.dispatcher.into_target();
    let sent: Vec<_> = target
        .sent
        .iter()
        .map(|e| (e.control, e.value))
        .collect();
    assert_eq!(
        sent,
        vec![
            (Control::axis(AbsoluteAxisCode::ABS_RX), 32768),
            (Control::button(KeyCode::BTN_SOUTH), 1),
            (Control::new(evdev::EventType::SYNCHRONIZATION, 0), 0),
        ]
    );
}

#[test]
fn test_events_from_unknown_devices_are_dropped() {
    let mut h = harness(RecordingTarget::default());
    let event = DeviceEvent::Input(InputEvent {
        timestamp: SystemTime::UNIX_EPOCH,
        control: Control::button(KeyCode::BTN_TRIGGER),
        value: 1,
        device: Fingerprint::from("pedals"),
        sequence: 0,
    });
    h.dispatcher.handle_event(event).unwrap();
    assert_eq!(h.dispatcher.stats().dropped, 1);
    assert!(h.dispatcher.into_target().sent.is_empty());
}

#[test]
fn test_failed_send_is_fatal() {
    let target = RecordingTarget {
        fail_sends: true,
        ..Default::default()
    };
    let mut h = harness(target);
    let result = h.dispatcher.handle_event(marker());
    assert!(matches!(result, Err(DispatchError::Target(_))));
}

#[tokio::test]
async fn test_shutdown_closes_target() {
    let mut h = harness(RecordingTarget::default());
    let stats = h.dispatcher.run(async {}).await.unwrap();
    assert_eq!(stats.frames, 0);
    assert!(h.dispatcher.into_target().closed);
}

#[tokio::test]
async fn test_interrupted_read_is_fatal() {
    let mut h = harness(RecordingTarget::default());
    h.errors
        .send(read_error(io::ErrorKind::Interrupted))
        .await
        .unwrap();
    h.events
        .send(input(Control::button(KeyCode::BTN_TRIGGER), 1, 0))
        .await
        .unwrap();
    h.events.send(marker()).await.unwrap();

    let result = h.dispatcher.run(std::future::pending()).await;
    match result {
        Err(DispatchError::Device { device, error }) => {
            assert_eq!(device, stick());
            assert!(matches!(
                &error,
                SourceError::Read(e) if e.kind() == io::ErrorKind::Interrupted
            ));
        }
        other => panic!("expected device error, got {other:?}"),
    }
    assert_eq!(h.dispatcher.stats().forwarded, 0);
    assert_eq!(h.dispatcher.stats().frames, 0);
    let target = h.dispatcher.into_target();
    assert!(target.sent.is_empty());
    assert!(target.closed);
}

#[tokio::test]
async fn test_read_error_is_fatal() {
    let mut h = harness(RecordingTarget::default());
    h.errors
        .send(read_error(io::ErrorKind::BrokenPipe))
        .await
        .unwrap();

    let result = h.dispatcher.run(std::future::pending()).await;
    match result {
        Err(DispatchError::Device { device, error }) => {
            assert_eq!(device, stick());
            assert!(!error.is_transient());
        }
        other => panic!("expected device error, got {other:?}"),
    }
    assert!(h.dispatcher.into_target().closed);
}

#[tokio::test]
async fn test_queued_events_are_processed_in_order() {
    let mut h = harness(RecordingTarget::default());
    let events = [
        input(Control::axis(AbsoluteAxisCode::ABS_X), -32767, 0),
        input(Control::axis(AbsoluteAxisCode::ABS_X), 32767, 1),
        marker(),
    ];
    for event in events {
        h.events.send(event).await.unwrap();
    }
    drop(h.events);

    let _ = h.dispatcher.run(std::future::pending()).await;
    let values: Vec<_> = h
        .dispatcher
        .into_target()
        .sent
        .iter()
        .map(|e| e.value)
        .collect();
    assert_eq!(values, vec![0, 65535, 0]);
}
