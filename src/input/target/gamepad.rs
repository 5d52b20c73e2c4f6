//! The virtual gamepad target exposes a uinput device built from an
//! [OutputSpec], which downstream software sees as a single gamepad.
use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisCode, AttributeSet, BusType, InputEvent, InputId, KeyCode,
    UinputAbsSetup,
};
use rand::{distr::Alphanumeric, Rng};

use crate::input::event::OutputEvent;

use super::{OutputSpec, TargetDevice, TargetError};

/// Virtual gamepad backed by uinput. Events are buffered until the
/// synchronization marker that ends their frame is forwarded, then written as
/// one batch.
pub struct GamepadDevice {
    name: String,
    device: Option<VirtualDevice>,
    pending: Vec<InputEvent>,
}

impl GamepadDevice {
    /// Create the virtual device described by the given spec
    pub fn create(spec: &OutputSpec) -> Result<Self, TargetError> {
        // Random suffix to tell multiple instances apart
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        let name = format!("{} {suffix}", spec.name);
        log::debug!("Creating virtual gamepad '{name}'");

        let mut device = build_virtual_device(name.as_str(), spec).map_err(TargetError::Create)?;

        // Find the path to the device in /dev/input
        match device.enumerate_dev_nodes_blocking() {
            Ok(paths) => {
                for path in paths.flatten() {
                    log::info!("Virtual gamepad available as {}", path.display());
                }
            }
            Err(e) => log::warn!("Unable to find device nodes of '{name}': {e}"),
        }

        Ok(Self {
            name,
            device: Some(device),
            pending: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Create the uinput device with the axes and buttons from the given spec
fn build_virtual_device(name: &str, spec: &OutputSpec) -> std::io::Result<VirtualDevice> {
    // Setup Key inputs
    let mut keys = AttributeSet::<KeyCode>::new();
    for button in spec.buttons.iter() {
        keys.insert(KeyCode(button.code));
    }

    let mut builder = VirtualDeviceBuilder::new()?
        .name(name)
        .input_id(InputId::new(BusType::BUS_VIRTUAL, 0, 0, 1))
        .with_keys(&keys)?;

    // Setup ABS inputs
    let mut axes: Vec<_> = spec.axes.iter().collect();
    axes.sort_by_key(|(control, _)| control.code);
    for (control, params) in axes {
        let info = AbsInfo::new(
            0,
            params.range.min(),
            params.range.max(),
            params.fuzz,
            params.flat,
            0,
        );
        let setup = UinputAbsSetup::new(AbsoluteAxisCode(control.code), info);
        builder = builder.with_absolute_axis(&setup)?;
    }

    builder.build()
}

impl TargetDevice for GamepadDevice {
    fn send(&mut self, event: OutputEvent) -> Result<(), TargetError> {
        let Some(device) = self.device.as_mut() else {
            return Err(TargetError::Closed);
        };

        if !event.is_sync() {
            self.pending.push(event.as_input_event());
            return Ok(());
        }

        // The uinput writer terminates every batch with its own SYN_REPORT
        log::trace!("Emitting frame of {} event(s)", self.pending.len());
        let result = device.emit(self.pending.as_slice());
        self.pending.clear();
        result.map_err(TargetError::Send)
    }

    fn close(&mut self) -> Result<(), TargetError> {
        if let Some(device) = self.device.take() {
            log::debug!("Destroying virtual gamepad '{}'", self.name);
            drop(device);
        }
        self.pending.clear();
        Ok(())
    }
}

impl std::fmt::Debug for GamepadDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadDevice")
            .field("name", &self.name)
            .field("pending", &self.pending.len())
            .finish()
    }
}
