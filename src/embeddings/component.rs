//! Uniform component contract shared by the embedders.
//!
//! A component is configured up front, loaded explicitly, and then run on a
//! mapping of named JSON inputs. Its configuration can be exported to and
//! restored from a `{"type": ..., "init_parameters": ...}` descriptor; the
//! loaded model is never part of it.

use crate::error::{EmbedrankError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exported form of a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor<C> {
    #[serde(rename = "type")]
    pub kind: String,
    pub init_parameters: C,
}

pub trait Component: Sized {
    /// Name written to the descriptor's `type` field
    const TYPE_NAME: &'static str;

    type Config: Serialize + DeserializeOwned;

    fn from_config(config: Self::Config) -> Self;

    fn config(&self) -> &Self::Config;

    /// Acquire the model. Must succeed before `run`.
    fn load(&mut self) -> Result<()>;

    fn is_ready(&self) -> bool;

    /// Run on named inputs and return named outputs
    fn run(&self, inputs: Value) -> Result<Value>;

    /// Export the configuration. Fails if it holds a plain token secret.
    fn to_value(&self) -> Result<Value> {
        let descriptor = ComponentDescriptor {
            kind: Self::TYPE_NAME.to_string(),
            init_parameters: self.config(),
        };
        serde_json::to_value(&descriptor).map_err(|e| {
            EmbedrankError::Config(format!("Cannot export {}: {}", Self::TYPE_NAME, e))
        })
    }

    /// Restore an unloaded component from an exported descriptor
    fn from_value(value: Value) -> Result<Self> {
        let descriptor: ComponentDescriptor<Self::Config> = serde_json::from_value(value)?;
        if descriptor.kind != Self::TYPE_NAME {
            return Err(EmbedrankError::Config(format!(
                "Descriptor of type {} cannot be loaded as {}",
                descriptor.kind,
                Self::TYPE_NAME
            )));
        }
        Ok(Self::from_config(descriptor.init_parameters))
    }
}

/// Take the input called `name` out of a run mapping.
pub(crate) fn take_input(inputs: Value, name: &str, component: &str) -> Result<Value> {
    match inputs {
        Value::Object(mut map) => map.remove(name).ok_or_else(|| {
            EmbedrankError::InputType(format!("{} expects an input named '{}'", component, name))
        }),
        other => Err(EmbedrankError::InputType(format!(
            "{} expects a mapping of named inputs, got {}",
            component,
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn take_input_extracts_named_value() {
        let value = take_input(json!({"text": "abc"}), "text", "C").unwrap();
        assert_eq!(value, json!("abc"));
    }

    #[test]
    fn take_input_requires_mapping_and_name() {
        let err = take_input(json!(["abc"]), "text", "C").unwrap_err();
        assert!(matches!(err, EmbedrankError::InputType(_)));
        assert!(err.to_string().contains("a list"));

        let err = take_input(json!({"other": 1}), "text", "C").unwrap_err();
        assert!(matches!(err, EmbedrankError::InputType(_)));
    }
}
