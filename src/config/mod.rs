pub mod path;


use std::{
    collections::{BTreeMap, HashMap},
    io,
    path::{Path, PathBuf},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::{
    control::{Control, ControlError, ControlRange, RangeError},
    identity::Fingerprint,
    mapping::{transform::TransformMode, MappingTable},
    target::{AxisParams, OutputSpec},
};

/// Latest supported configuration version
pub const CONFIG_VERSION: u32 = 1;

/// Represents all possible errors loading a [Config]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
    #[error("No configuration file found in {0:?}")]
    NotFound(Vec<PathBuf>),
}

/// Represents all possible errors converting a [Config] into runtime types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid fingerprint '{0}': expected 64 hexadecimal characters")]
    InvalidFingerprint(String),
    #[error(transparent)]
    InvalidControl(#[from] ControlError),
    #[error("invalid range for output axis {axis}: {source}")]
    InvalidRange {
        axis: String,
        #[source]
        source: RangeError,
    },
    #[error("output control '{0}' is not an absolute axis")]
    NotAnAxis(String),
    #[error("output control '{0}' is not a button")]
    NotAButton(String),
}

/// Top level configuration: which devices to grab and how their controls map
/// onto the virtual gamepad.
#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    pub version: u32,
    /// Layout of the virtual gamepad. Defaults to a standard gamepad.
    pub output: Option<OutputConfig>,
    /// Control mappings keyed by device fingerprint, then by source control
    #[serde(default)]
    pub inputs: BTreeMap<Fingerprint, BTreeMap<String, MappingConfig>>,
}

/// Overrides for the layout of the virtual gamepad
#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    pub name: Option<String>,
    /// Replaces the default axes when set
    pub axes: Option<BTreeMap<String, AxisConfig>>,
    /// Replaces the default buttons when set
    pub buttons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AxisConfig {
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub fuzz: i32,
    #[serde(default)]
    pub flat: i32,
}

/// Target of a single source control. Either just the name of the target
/// control, which uses the linear transform, or a target with an explicit
/// transform mode.
#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum MappingConfig {
    Target(String),
    Detailed(DetailedMapping),
}

/// Mapping with an explicit transform. Unknown keys are rejected so a
/// misspelled `mode` is not silently replaced by the default.
#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct DetailedMapping {
    pub target: String,
    #[serde(default)]
    pub mode: TransformMode,
}

impl MappingConfig {
    pub fn target(&self) -> &str {
        match self {
            MappingConfig::Target(target) => target.as_str(),
            MappingConfig::Detailed(detailed) => detailed.target.as_str(),
        }
    }

    pub fn mode(&self) -> TransformMode {
        match self {
            MappingConfig::Target(_) => TransformMode::default(),
            MappingConfig::Detailed(detailed) => detailed.mode,
        }
    }
}

impl Config {
    /// Load a [Config] from the given YAML string
    pub fn from_yaml(content: String) -> Result<Config, LoadError> {
        let config: Config = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load a [Config] from the given YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Config, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Load the config from the given path, or from the first config file
    /// found in the search paths if no path is given. Returns the config along
    /// with the path it was loaded from.
    pub fn load(explicit: Option<&Path>) -> Result<(Config, PathBuf), LoadError> {
        let path = match explicit {
            Some(explicit) => explicit.to_path_buf(),
            None => path::find_config()
                .ok_or_else(|| LoadError::NotFound(path::get_config_paths()))?,
        };
        log::debug!("Loading config from {}", path.display());
        let config = Config::from_yaml_file(&path)?;
        Ok((config, path))
    }

    /// Build the [MappingTable] described by this config. Fails if any
    /// fingerprint or control name is malformed.
    pub fn to_mapping_table(&self) -> Result<MappingTable, ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }

        let mut table = MappingTable::new();
        for (fingerprint, controls) in self.inputs.iter() {
            let device = normalize_fingerprint(fingerprint)?;
            for (source, mapping) in controls.iter() {
                let source = Control::from_name(source)?;
                let target = Control::from_name(mapping.target())?;
                table.add(device.clone(), source, target, mapping.mode().into());
            }
        }

        Ok(table)
    }

    /// Build the [OutputSpec] of the virtual gamepad, starting from the
    /// default gamepad layout and applying any overrides.
    pub fn output_spec(&self) -> Result<OutputSpec, ConfigError> {
        let mut spec = OutputSpec::gamepad();
        let Some(output) = self.output.as_ref() else {
            return Ok(spec);
        };

        if let Some(name) = output.name.as_ref() {
            spec.name = name.clone();
        }

        if let Some(axes) = output.axes.as_ref() {
            let mut params = HashMap::with_capacity(axes.len());
            for (name, axis) in axes.iter() {
                let control = Control::from_name(name)?;
                if !control.is_axis() {
                    return Err(ConfigError::NotAnAxis(name.clone()));
                }
                let range =
                    ControlRange::new(axis.min, axis.max).map_err(|source| ConfigError::InvalidRange {
                        axis: name.clone(),
                        source,
                    })?;
                params.insert(
                    control,
                    AxisParams {
                        range,
                        fuzz: axis.fuzz,
                        flat: axis.flat,
                    },
                );
            }
            spec.axes = params;
        }

        if let Some(buttons) = output.buttons.as_ref() {
            let mut controls = Vec::with_capacity(buttons.len());
            for name in buttons.iter() {
                let control = Control::from_name(name)?;
                if !control.is_button() {
                    return Err(ConfigError::NotAButton(name.clone()));
                }
                if !controls.contains(&control) {
                    controls.push(control);
                }
            }
            spec.buttons = controls;
        }

        Ok(spec)
    }
}

/// Fingerprints are lowercase hex encoded SHA-256 digests
fn normalize_fingerprint(fingerprint: &Fingerprint) -> Result<Fingerprint, ConfigError> {
    let value = fingerprint.as_str();
    if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidFingerprint(value.to_string()));
    }
    Ok(Fingerprint::from(value.to_ascii_lowercase()))
}
