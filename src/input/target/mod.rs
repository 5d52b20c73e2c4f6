//! Target devices are the virtual output devices that remapped events are
//! written to.
pub mod gamepad;

use std::{collections::HashMap, io};

use evdev::{AbsoluteAxisCode, KeyCode};
use thiserror::Error;

use super::{
    control::{Calibration, Control, ControlRange},
    event::OutputEvent,
};

/// Default name of the virtual output device
pub const DEFAULT_OUTPUT_NAME: &str = "hotas-to-gamepad virtual controller";

/// Possible errors for a target device
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("failed to create virtual device: {0}")]
    Create(io::Error),
    #[error("failed to send event: {0}")]
    Send(io::Error),
    #[error("virtual device is closed")]
    Closed,
}

/// A virtual output device. The output device is owned by the dispatcher.
pub trait TargetDevice: Send {
    /// Write the given event to the device. Synchronization markers terminate
    /// the current frame of events.
    fn send(&mut self, event: OutputEvent) -> Result<(), TargetError>;

    /// Destroy the device
    fn close(&mut self) -> Result<(), TargetError>;
}

impl<T: TargetDevice + ?Sized> TargetDevice for Box<T> {
    fn send(&mut self, event: OutputEvent) -> Result<(), TargetError> {
        (**self).send(event)
    }

    fn close(&mut self) -> Result<(), TargetError> {
        (**self).close()
    }
}

/// Parameters of a single absolute axis on the output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisParams {
    pub range: ControlRange,
    pub fuzz: i32,
    pub flat: i32,
}

impl AxisParams {
    pub fn new(range: ControlRange) -> Self {
        Self {
            range,
            fuzz: 0,
            flat: 0,
        }
    }
}

/// Describes the axes and buttons exposed by the virtual output device
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub name: String,
    pub axes: HashMap<Control, AxisParams>,
    pub buttons: Vec<Control>,
}

impl OutputSpec {
    /// Returns the default gamepad layout: two sticks, two analog triggers,
    /// an analog d-pad and the usual face, shoulder and menu buttons.
    pub fn gamepad() -> Self {
        let stick = AxisParams::new(STICK_RANGE);
        let trigger = AxisParams::new(TRIGGER_RANGE);
        let dpad = AxisParams::new(DPAD_RANGE);

        let axes = HashMap::from([
            // left stick
            (Control::axis(AbsoluteAxisCode::ABS_X), stick),
            (Control::axis(AbsoluteAxisCode::ABS_Y), stick),
            // right stick
            (Control::axis(AbsoluteAxisCode::ABS_RX), stick),
            (Control::axis(AbsoluteAxisCode::ABS_RY), stick),
            // triggers
            (Control::axis(AbsoluteAxisCode::ABS_Z), trigger),
            (Control::axis(AbsoluteAxisCode::ABS_RZ), trigger),
            // d-pad (analog form)
            (Control::axis(AbsoluteAxisCode::ABS_HAT0X), dpad),
            (Control::axis(AbsoluteAxisCode::ABS_HAT0Y), dpad),
        ]);

        let buttons = [
            // "xbox" or another center button
            KeyCode::BTN_MODE,
            // action buttons (a, b, x, y)
            KeyCode::BTN_NORTH,
            KeyCode::BTN_SOUTH, // also BTN_GAMEPAD, used for gamepad detection
            KeyCode::BTN_EAST,
            KeyCode::BTN_WEST,
            // thumbstick center click
            KeyCode::BTN_THUMBL,
            KeyCode::BTN_THUMBR,
            KeyCode::BTN_START,
            KeyCode::BTN_SELECT,
            // shoulder buttons
            KeyCode::BTN_TL,
            KeyCode::BTN_TR,
        ]
        .into_iter()
        .map(Control::button)
        .collect();

        Self {
            name: DEFAULT_OUTPUT_NAME.to_string(),
            axes,
            buttons,
        }
    }

    /// Returns the calibration of the output device, used as the target
    /// ranges when remapping.
    pub fn calibration(&self) -> Calibration {
        self.axes
            .iter()
            .map(|(control, params)| (*control, params.range))
            .collect()
    }

    /// Returns true if the output device exposes the given control
    pub fn supports(&self, control: &Control) -> bool {
        if control.is_axis() {
            return self.axes.contains_key(control);
        }
        self.buttons.contains(control)
    }
}

const STICK_RANGE: ControlRange = ControlRange::new_const(-32767, 32767);
const TRIGGER_RANGE: ControlRange = ControlRange::new_const(0, 1023);
const DPAD_RANGE: ControlRange = ControlRange::new_const(-1, 1);
