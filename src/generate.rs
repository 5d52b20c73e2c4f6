use std::error::Error;
use std::fs::File;
use std::io::Write;

use hotas_to_gamepad::config::Config;
use schemars::schema_for;

const SCHEMA_PATH: &str = "./rootfs/usr/share/hotas-to-gamepad/schema/config_v1.json";

fn main() -> Result<(), Box<dyn Error>> {
    let config_schema = schema_for!(Config);
    let mut file = File::create(SCHEMA_PATH)?;
    write!(file, "{}", serde_json::to_string_pretty(&config_schema)?)?;
    Ok(())
}
