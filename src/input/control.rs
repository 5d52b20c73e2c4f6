//! Controls are the (type, code) pairs that identify a single axis or button
//! on an input device, along with the value ranges those controls report.
use std::{collections::HashMap, fmt::Display};

use evdev::{AbsInfo, AbsoluteAxisCode, EventType, KeyCode, SynchronizationCode};
use thiserror::Error;

/// Prefixes tried, in order, when resolving a short control name like "x" or
/// "thumb2".
const NAME_PREFIXES: [&str; 3] = ["", "ABS_", "BTN_"];

/// Possible errors when resolving a control by name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("invalid control: {0}")]
    InvalidName(String),
}

/// Possible errors when building a [ControlRange]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("degenerate range: minimum {min} must be less than maximum {max}")]
    Degenerate { min: i32, max: i32 },
}

/// Broad class of a [Control], which determines how its value range is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Digital control reporting 0 or 1 (EV_KEY)
    Button,
    /// Analog control with a calibrated range (EV_ABS)
    Axis,
    /// Frame boundary marker (EV_SYN)
    Sync,
    /// Anything else (relative axes, misc, LEDs, ...)
    Other,
}

/// A single axis or button on a device, identified by its evdev event type
/// and code. Controls compare by exact (type, code) equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Control {
    pub event_type: EventType,
    pub code: u16,
}

impl Control {
    pub fn new(event_type: EventType, code: u16) -> Self {
        Self { event_type, code }
    }

    /// Create a new absolute axis control
    pub fn axis(code: AbsoluteAxisCode) -> Self {
        Self::new(EventType::ABSOLUTE, code.0)
    }

    /// Create a new button control
    pub fn button(code: KeyCode) -> Self {
        Self::new(EventType::KEY, code.0)
    }

    /// Resolve a control from its name. Names are case-insensitive and may
    /// omit the "ABS_" or "BTN_" prefix, e.g. "x" resolves to ABS_X and
    /// "thumb2" resolves to BTN_THUMB2. Axes take precedence over buttons
    /// when a short name is ambiguous.
    pub fn from_name(name: &str) -> Result<Self, ControlError> {
        let normalized = name.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(ControlError::InvalidName(name.to_string()));
        }

        for prefix in NAME_PREFIXES {
            let candidate = format!("{prefix}{normalized}");
            if let Ok(axis) = candidate.parse::<AbsoluteAxisCode>() {
                return Ok(Self::axis(axis));
            }
            if let Ok(key) = candidate.parse::<KeyCode>() {
                return Ok(Self::button(key));
            }
        }

        Err(ControlError::InvalidName(name.to_string()))
    }

    /// Returns the class of this control
    pub fn kind(&self) -> ControlKind {
        match self.event_type {
            EventType::KEY => ControlKind::Button,
            EventType::ABSOLUTE => ControlKind::Axis,
            EventType::SYNCHRONIZATION => ControlKind::Sync,
            _ => ControlKind::Other,
        }
    }

    pub fn is_button(&self) -> bool {
        self.kind() == ControlKind::Button
    }

    pub fn is_axis(&self) -> bool {
        self.kind() == ControlKind::Axis
    }

    pub fn is_sync(&self) -> bool {
        self.kind() == ControlKind::Sync
    }

    /// Returns the evdev name of the control (e.g. "ABS_X")
    pub fn name(&self) -> String {
        match self.kind() {
            ControlKind::Button => format!("{:?}", KeyCode(self.code)),
            ControlKind::Axis => format!("{:?}", AbsoluteAxisCode(self.code)),
            ControlKind::Sync => format!("{:?}", SynchronizationCode(self.code)),
            ControlKind::Other => format!("{:?}:{}", self.event_type, self.code),
        }
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code)
    }
}

/// Inclusive [minimum, maximum] bounds of a control's raw value domain. A
/// range always spans at least two values, so transforms never divide by
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlRange {
    min: i32,
    max: i32,
}

impl ControlRange {
    /// Range used by every button-class control
    pub const BUTTON: ControlRange = ControlRange { min: 0, max: 1 };

    pub fn new(min: i32, max: i32) -> Result<Self, RangeError> {
        if min >= max {
            return Err(RangeError::Degenerate { min, max });
        }
        Ok(Self { min, max })
    }

    /// Build a range from bounds known at compile time. Degenerate bounds
    /// fail const evaluation.
    pub const fn new_const(min: i32, max: i32) -> Self {
        assert!(min < max, "degenerate range");
        Self { min, max }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Distance between the minimum and maximum, always positive
    pub fn width(&self) -> i64 {
        self.max as i64 - self.min as i64
    }

    /// Integer midpoint of the range, rounded towards negative infinity
    pub fn midpoint(&self) -> i32 {
        ((self.min as i64 + self.max as i64).div_euclid(2)) as i32
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: i64) -> i32 {
        value.clamp(self.min as i64, self.max as i64) as i32
    }
}

impl TryFrom<&AbsInfo> for ControlRange {
    type Error = RangeError;

    fn try_from(info: &AbsInfo) -> Result<Self, Self::Error> {
        ControlRange::new(info.minimum(), info.maximum())
    }
}

impl Display for ControlRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Calibrated axis ranges of a single device, either read from a physical
/// device or declared for the virtual output device.
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    axes: HashMap<Control, ControlRange>,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, control: Control, range: ControlRange) {
        self.axes.insert(control, range);
    }

    /// Returns the calibrated range of the given axis, if one exists
    pub fn get(&self, control: &Control) -> Option<ControlRange> {
        self.axes.get(control).copied()
    }

    /// Returns the value range of the given control. Buttons always use
    /// [0, 1]; axes use their calibrated range. Returns `None` for axes without
    /// calibration data and for controls that carry no range.
    pub fn range_for(&self, control: &Control) -> Option<ControlRange> {
        match control.kind() {
            ControlKind::Button => Some(ControlRange::BUTTON),
            ControlKind::Axis => self.get(control),
            ControlKind::Sync | ControlKind::Other => None,
        }
    }
}

impl FromIterator<(Control, ControlRange)> for Calibration {
    fn from_iter<T: IntoIterator<Item = (Control, ControlRange)>>(iter: T) -> Self {
        Self {
            axes: iter.into_iter().collect(),
        }
    }
}
