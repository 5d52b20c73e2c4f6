//! Value transforms used to rescale a raw value from the range of a source
//! control into the range of a target control. Every transform is a pure
//! function of (value, source range, target range).
use std::fmt::Debug;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::input::control::ControlRange;

/// Signature shared by all transform functions
pub type TransformFn = fn(value: i32, source: ControlRange, target: ControlRange) -> i32;

/// Named transform modes that can be selected from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Linearly rescale the source range onto the target range
    #[default]
    Linear,
    /// Map the source midpoint onto the target midpoint, rescaling each half
    /// of the range separately
    ShiftFromPositive,
    /// Forward the raw value, clamped to the target range
    Exact,
}

impl TransformMode {
    pub fn function(&self) -> TransformFn {
        match self {
            TransformMode::Linear => linear,
            TransformMode::ShiftFromPositive => shift_from_positive,
            TransformMode::Exact => exact,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransformMode::Linear => "linear",
            TransformMode::ShiftFromPositive => "shift_from_positive",
            TransformMode::Exact => "exact",
        }
    }
}

/// A named transform function
#[derive(Clone, Copy)]
pub struct Transform {
    name: &'static str,
    function: TransformFn,
}

impl Transform {
    pub const LINEAR: Transform = Transform {
        name: "linear",
        function: linear,
    };

    /// Create a transform from an arbitrary pure function
    pub fn custom(name: &'static str, function: TransformFn) -> Self {
        Self { name, function }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Transform the given value from the source range into the target range
    pub fn apply(&self, value: i32, source: ControlRange, target: ControlRange) -> i32 {
        (self.function)(value, source, target)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl From<TransformMode> for Transform {
    fn from(mode: TransformMode) -> Self {
        Self {
            name: mode.name(),
            function: mode.function(),
        }
    }
}

impl Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Transform").field(&self.name).finish()
    }
}

/// Normalize the value into [0, 1] using the source range, then rescale it
/// into the target range:
///
/// `round((value - src_min) / (src_max - src_min) * (dst_max - dst_min) + dst_min)`
///
/// Halves round away from zero. Values outside of the source range are
/// clamped to the target range.
pub fn linear(value: i32, source: ControlRange, target: ControlRange) -> i32 {
    let normalized = (value as f64 - source.min() as f64) / source.width() as f64;
    let scaled = normalized * target.width() as f64 + target.min() as f64;
    target.clamp(scaled.round() as i64)
}

/// Re-center a source range that only advertises positive values (e.g.
/// [0, 1023]) around its midpoint, then rescale each half independently onto
/// the matching half of the target range. The source midpoint always lands
/// exactly on the target midpoint, which [linear] only does for ranges with
/// an odd number of values.
pub fn shift_from_positive(value: i32, source: ControlRange, target: ControlRange) -> i32 {
    let source_mid = source.midpoint() as f64;
    let target_mid = target.midpoint() as f64;
    let offset = value as f64 - source_mid;

    let (source_half, target_half) = if offset < 0.0 {
        (source_mid - source.min() as f64, target_mid - target.min() as f64)
    } else {
        (source.max() as f64 - source_mid, target.max() as f64 - target_mid)
    };
    // Only an empty lower half (e.g. [0, 1]) can be zero, and then the value
    // is below the source range
    if source_half == 0.0 {
        return target.min();
    }

    let scaled = target_mid + offset / source_half * target_half;
    target.clamp(scaled.round() as i64)
}

/// Forward the raw value unchanged, clamped to the target range
pub fn exact(value: i32, _source: ControlRange, target: ControlRange) -> i32 {
    target.clamp(value as i64)
}
