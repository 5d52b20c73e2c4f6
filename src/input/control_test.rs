use evdev::{AbsInfo, AbsoluteAxisCode, EventType, KeyCode};

use crate::input::control::{
    Calibration, Control, ControlError, ControlKind, ControlRange, RangeError,
};

#[test]
fn test_control_from_name() {
    let cases = [
        ("ABS_X", Control::axis(AbsoluteAxisCode::ABS_X)),
        ("x", Control::axis(AbsoluteAxisCode::ABS_X)),
        ("rz", Control::axis(AbsoluteAxisCode::ABS_RZ)),
        ("abs_hat0y", Control::axis(AbsoluteAxisCode::ABS_HAT0Y)),
        ("BTN_SELECT", Control::button(KeyCode::BTN_SELECT)),
        ("thumb2", Control::button(KeyCode::BTN_THUMB2)),
        ("Pinkie", Control::button(KeyCode::BTN_PINKIE)),
        ("KEY_A", Control::button(KeyCode::KEY_A)),
        (" base2 ", Control::button(KeyCode::BTN_BASE2)),
    ];
    for (name, expected) in cases {
        assert_eq!(Control::from_name(name), Ok(expected), "name: {name}");
    }
}

#[test]
fn test_control_from_invalid_name() {
    for name in ["", "   ", "not_a_control", "ABS_BOGUS"] {
        assert_eq!(
            Control::from_name(name),
            Err(ControlError::InvalidName(name.to_string()))
        );
    }
}

#[test]
fn test_control_kind() {
    assert_eq!(
        Control::axis(AbsoluteAxisCode::ABS_Y).kind(),
        ControlKind::Axis
    );
    assert_eq!(
        Control::button(KeyCode::BTN_BASE).kind(),
        ControlKind::Button
    );
    assert_eq!(
        Control::new(EventType::SYNCHRONIZATION, 0).kind(),
        ControlKind::Sync
    );
    assert_eq!(
        Control::new(EventType::RELATIVE, 0).kind(),
        ControlKind::Other
    );
}

#[test]
fn test_control_display() {
    let control = Control::axis(AbsoluteAxisCode::ABS_X);
    assert_eq!(control.name(), "ABS_X");
    assert_eq!(control.to_string(), "ABS_X (0)");
    assert_eq!(
        Control::button(KeyCode::BTN_THUMB2).to_string(),
        "BTN_THUMB2 (290)"
    );
}

#[test]
fn test_range_rejects_degenerate_bounds() {
    assert_eq!(
        ControlRange::new(5, 5),
        Err(RangeError::Degenerate { min: 5, max: 5 })
    );
    assert_eq!(
        ControlRange::new(10, -10),
        Err(RangeError::Degenerate { min: 10, max: -10 })
    );
    assert!(ControlRange::new(-1, 0).is_ok());
}

#[test]
fn test_range_helpers() {
    let range = ControlRange::new(-32767, 32767).unwrap();
    assert_eq!(range.width(), 65534);
    assert_eq!(range.midpoint(), 0);
    assert!(range.contains(-32767));
    assert!(!range.contains(32768));
    assert_eq!(range.clamp(100_000), 32767);
    assert_eq!(range.clamp(-100_000), -32767);

    let unsigned = ControlRange::new(0, 1023).unwrap();
    assert_eq!(unsigned.midpoint(), 511);

    // Full i32 domain must not overflow
    let full = ControlRange::new(i32::MIN, i32::MAX).unwrap();
    assert_eq!(full.width(), u32::MAX as i64);
    assert_eq!(full.midpoint(), -1);
}

#[test]
fn test_range_from_absinfo() {
    let info = AbsInfo::new(0, 0, 255, 0, 15, 0);
    assert_eq!(
        ControlRange::try_from(&info),
        Ok(ControlRange::new(0, 255).unwrap())
    );

    let broken = AbsInfo::new(0, 0, 0, 0, 0, 0);
    assert!(ControlRange::try_from(&broken).is_err());
}

#[test]
fn test_calibration_range_for() {
    let x = Control::axis(AbsoluteAxisCode::ABS_X);
    let y = Control::axis(AbsoluteAxisCode::ABS_Y);
    let mut calibration = Calibration::new();
    calibration.insert(x, ControlRange::new(0, 1023).unwrap());

    assert_eq!(
        calibration.range_for(&x),
        Some(ControlRange::new(0, 1023).unwrap())
    );
    assert_eq!(calibration.range_for(&y), None);
    assert_eq!(
        calibration.range_for(&Control::button(KeyCode::BTN_THUMB)),
        Some(ControlRange::BUTTON)
    );
    assert_eq!(
        calibration.range_for(&Control::new(EventType::SYNCHRONIZATION, 0)),
        None
    );
}
