//! Compute device selection for model backends.

use crate::error::{EmbedrankError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Device a model should run on.
///
/// Remote backends ignore it; it is still recorded so an exported component
/// can be restored with the same placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda(u32),
    Mps,
}

impl Device {
    /// Resolve an optional explicit choice to a concrete device.
    ///
    /// No accelerator probing is done, so an unset device resolves to CPU.
    pub fn resolve(device: Option<Device>) -> Device {
        match device {
            Some(device) => device,
            None => {
                log::debug!("No device configured, using cpu");
                Device::Cpu
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(index) => write!(f, "cuda:{}", index),
            Device::Mps => f.write_str("mps"),
        }
    }
}

impl FromStr for Device {
    type Err = EmbedrankError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "cpu" => Ok(Device::Cpu),
            "mps" => Ok(Device::Mps),
            "cuda" => Ok(Device::Cuda(0)),
            other => {
                let index = other
                    .strip_prefix("cuda:")
                    .and_then(|i| i.parse::<u32>().ok())
                    .ok_or_else(|| EmbedrankError::Config(format!("Unknown device: {}", s)))?;
                Ok(Device::Cuda(index))
            }
        }
    }
}

/// Structured form written to exported configuration.
#[derive(Serialize, Deserialize)]
struct DeviceDescriptor {
    #[serde(rename = "type")]
    kind: String,
    device: String,
}

/// Config files may use the short string form or the descriptor.
#[derive(Deserialize)]
#[serde(untagged)]
enum DeviceRepr {
    Name(String),
    Descriptor(DeviceDescriptor),
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        DeviceDescriptor {
            kind: "single".to_string(),
            device: self.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Device {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = match DeviceRepr::deserialize(deserializer)? {
            DeviceRepr::Name(name) => name,
            DeviceRepr::Descriptor(descriptor) => {
                if descriptor.kind != "single" {
                    return Err(serde::de::Error::custom(format!(
                        "unsupported device descriptor type: {}",
                        descriptor.kind
                    )));
                }
                descriptor.device
            }
        };
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_device_names() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:2".parse::<Device>().unwrap(), Device::Cuda(2));
        assert_eq!("mps".parse::<Device>().unwrap(), Device::Mps);
        assert!("tpu".parse::<Device>().is_err());
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn resolve_defaults_to_cpu() {
        assert_eq!(Device::resolve(None), Device::Cpu);
        assert_eq!(Device::resolve(Some(Device::Mps)), Device::Mps);
    }

    #[test]
    fn serializes_as_structured_descriptor() {
        let value = serde_json::to_value(Device::Cuda(1)).unwrap();
        assert_eq!(value, serde_json::json!({"type": "single", "device": "cuda:1"}));
        let back: Device = serde_json::from_value(value).unwrap();
        assert_eq!(back, Device::Cuda(1));
    }

    #[test]
    fn deserializes_short_string_form() {
        let device: Device = serde_json::from_value(serde_json::json!("cuda:3")).unwrap();
        assert_eq!(device, Device::Cuda(3));
    }

    #[test]
    fn rejects_multi_device_descriptor() {
        let value = serde_json::json!({"type": "multiple", "device": "cuda:0"});
        assert!(serde_json::from_value::<Device>(value).is_err());
    }
}
