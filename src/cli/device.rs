use std::error::Error;

use evdev::Device;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::input::{control::Control, identity::DeviceMetadata, source::evdev::list_devices};

#[derive(Tabled)]
struct InputDeviceRow {
    path: String,
    name: String,
    fingerprint: String,
}

#[derive(Tabled)]
struct DeviceIdentityRow {
    name: String,
    bus: String,
    vendor: String,
    product: String,
    version: String,
    unique_id: String,
    fingerprint: String,
}

#[derive(Tabled)]
struct AxisRow {
    axis: String,
    value: i32,
    min: i32,
    max: i32,
    fuzz: i32,
    flat: i32,
    resolution: i32,
}

fn format_id(value: Option<u16>) -> String {
    value.map(|v| format!("{v:04x}")).unwrap_or_default()
}

/// Print a table of every input device on the system
pub fn handle_devices() -> Result<(), Box<dyn Error>> {
    let devices: Vec<InputDeviceRow> = list_devices()
        .into_iter()
        .map(|info| InputDeviceRow {
            path: info.path,
            name: info.name,
            fingerprint: info.fingerprint.to_string(),
        })
        .collect();
    let count = devices.len();

    let mut table = Table::new(devices);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Input Devices"));
    println!("{table}");
    println!("Found {count} input device(s)");

    Ok(())
}

/// Print the identity, axis calibration and buttons of the device at the
/// given path. The device is not grabbed.
pub fn handle_info(path: &str) -> Result<(), Box<dyn Error>> {
    let device = Device::open(path)?;
    let metadata = DeviceMetadata::from(&device);

    let identity = DeviceIdentityRow {
        name: metadata.name.clone().unwrap_or_default(),
        bus: format_id(metadata.bus_type),
        vendor: format_id(metadata.vendor),
        product: format_id(metadata.product),
        version: format_id(metadata.version),
        unique_id: metadata.unique_id.clone().unwrap_or_default(),
        fingerprint: metadata.fingerprint().to_string(),
    };
    let mut table = Table::new(vec![identity]);
    table
        .with(Style::modern_rounded())
        .with(Panel::header(path));
    println!("{table}");

    let mut axes: Vec<AxisRow> = device
        .get_absinfo()?
        .map(|(axis, info)| AxisRow {
            axis: Control::axis(axis).name(),
            value: info.value(),
            min: info.minimum(),
            max: info.maximum(),
            fuzz: info.fuzz(),
            flat: info.flat(),
            resolution: info.resolution(),
        })
        .collect();
    if !axes.is_empty() {
        axes.sort_by(|a, b| a.axis.cmp(&b.axis));
        let mut table = Table::new(axes);
        table
            .with(Style::modern_rounded())
            .with(Panel::header("Axes"));
        println!("{table}");
    }

    let buttons: Vec<String> = device
        .supported_keys()
        .map(|keys| keys.iter().map(|key| Control::button(key).name()).collect())
        .unwrap_or_default();
    if !buttons.is_empty() {
        println!("Buttons: {}", buttons.join(", "));
    }

    Ok(())
}
