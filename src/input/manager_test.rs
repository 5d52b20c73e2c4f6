use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, SystemTime},
};

use evdev::{AbsoluteAxisCode, KeyCode};
use tokio::sync::mpsc;

use crate::input::{
    control::{Calibration, Control, ControlRange},
    event::RawEvent,
    identity::Fingerprint,
    manager::{abort_startup, validate, ManagerError, ValidationError, BUFFER_SIZE},
    mapping::{transform::Transform, MappingTable},
    source::{assembler::FrameAssembler, SourceDevice, SourceError},
    target::OutputSpec,
};

/// Source that produces an empty frame every millisecond
struct IdleSource {
    fingerprint: Fingerprint,
    calibration: Calibration,
    closed: Arc<AtomicBool>,
    fail_close: bool,
}

impl SourceDevice for IdleSource {
    fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn name(&self) -> &str {
        "idle"
    }

    fn path(&self) -> &str {
        self.fingerprint.as_str()
    }

    fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    fn read_one(&mut self) -> Result<RawEvent, SourceError> {
        thread::sleep(Duration::from_millis(1));
        Ok(RawEvent::sync(SystemTime::now()))
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(SourceError::Close(io::Error::other("ungrab failed")));
        }
        Ok(())
    }
}

fn throttle() -> Fingerprint {
    Fingerprint::from("throttle")
}

fn calibrated(axes: &[AbsoluteAxisCode]) -> Calibration {
    axes.iter()
        .map(|code| (Control::axis(*code), ControlRange::new(0, 255).unwrap()))
        .collect()
}

#[test]
fn test_validate_accepts_served_mappings() {
    let mut table = MappingTable::new();
    table.add(
        throttle(),
        Control::axis(AbsoluteAxisCode::ABS_Z),
        Control::axis(AbsoluteAxisCode::ABS_RZ),
        Transform::LINEAR,
    );
    table.add(
        throttle(),
        Control::button(KeyCode::BTN_THUMB2),
        Control::button(KeyCode::BTN_SELECT),
        Transform::LINEAR,
    );
    // Devices that were not found are not validated
    table.add(
        Fingerprint::from("missing"),
        Control::axis(AbsoluteAxisCode::ABS_X),
        Control::axis(AbsoluteAxisCode::ABS_X),
        Transform::LINEAR,
    );

    let calibrations = HashMap::from([(throttle(), calibrated(&[AbsoluteAxisCode::ABS_Z]))]);
    assert_eq!(validate(&table, &calibrations, &OutputSpec::gamepad()), Ok(()));
}

#[test]
fn test_validate_rejects_uncalibrated_axis() {
    let mut table = MappingTable::new();
    table.add(
        throttle(),
        Control::axis(AbsoluteAxisCode::ABS_THROTTLE),
        Control::axis(AbsoluteAxisCode::ABS_Z),
        Transform::LINEAR,
    );

    let calibrations = HashMap::from([(throttle(), calibrated(&[AbsoluteAxisCode::ABS_Z]))]);
    let result = validate(&table, &calibrations, &OutputSpec::gamepad());
    assert_eq!(
        result,
        Err(ValidationError::UncalibratedAxis {
            device: throttle(),
            control: Control::axis(AbsoluteAxisCode::ABS_THROTTLE),
        })
    );
}

#[test]
fn test_validate_rejects_unsupported_target() {
    let mut table = MappingTable::new();
    table.add(
        throttle(),
        Control::button(KeyCode::BTN_THUMB),
        Control::button(KeyCode::BTN_TRIGGER_HAPPY1),
        Transform::LINEAR,
    );

    let calibrations = HashMap::from([(throttle(), Calibration::new())]);
    let result = validate(&table, &calibrations, &OutputSpec::gamepad());
    assert!(matches!(
        result,
        Err(ValidationError::UnsupportedTarget { .. })
    ));
}

#[tokio::test]
async fn test_failed_start_releases_started_devices() {
    let (events_tx, events_rx) = mpsc::channel(BUFFER_SIZE);
    let (errors_tx, errors_rx) = mpsc::channel(BUFFER_SIZE);

    let mut handles = Vec::new();
    let mut closed = Vec::new();
    for (name, fail_close) in [("stick", true), ("throttle", false)] {
        let flag = Arc::new(AtomicBool::new(false));
        let source = IdleSource {
            fingerprint: Fingerprint::from(name),
            calibration: Calibration::new(),
            closed: flag.clone(),
            fail_close,
        };
        let stop = Arc::new(AtomicBool::new(false));
        let assembler = FrameAssembler::new(source, events_tx.clone(), errors_tx.clone(), stop);
        handles.push(assembler.spawn().unwrap());
        closed.push(flag);
    }
    drop(events_rx);
    drop(errors_rx);

    // The spawn error is reported even though one device failed to close
    let error = abort_startup(
        handles,
        Duration::from_secs(2),
        io::Error::other("no threads left"),
    )
    .await;
    match error {
        ManagerError::Spawn(e) => assert_eq!(e.to_string(), "no threads left"),
        other => panic!("expected spawn error, got {other:?}"),
    }
    assert!(closed.iter().all(|flag| flag.load(Ordering::SeqCst)));
}
