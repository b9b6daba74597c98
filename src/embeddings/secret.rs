//! Access-token handling for model backends.
//!
//! A `Secret` is either a plain token held in memory or a reference to one or
//! more environment variables resolved at load time. Only the env-var form can
//! be exported with a component's configuration.

use crate::error::{EmbedrankError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default environment variable holding the model hub token.
pub const DEFAULT_TOKEN_ENV_VAR: &str = "HF_API_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// Token value held in memory. Never serialized.
    Token(String),
    /// First set variable wins. `strict` makes an unset lookup an error.
    EnvVar { env_vars: Vec<String>, strict: bool },
}

/// Wire form of a secret in exported configuration.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SecretRepr {
    EnvVar { env_vars: Vec<String>, strict: bool },
}

impl Secret {
    pub fn from_token(token: impl Into<String>) -> Self {
        Secret::Token(token.into())
    }

    pub fn from_env_var(name: impl Into<String>, strict: bool) -> Self {
        Secret::EnvVar {
            env_vars: vec![name.into()],
            strict,
        }
    }

    /// Resolve the secret to its value.
    ///
    /// Returns `Ok(None)` when a non-strict env-var secret finds none of its
    /// variables set.
    pub fn resolve(&self) -> Result<Option<String>> {
        match self {
            Secret::Token(token) => Ok(Some(token.clone())),
            Secret::EnvVar { env_vars, strict } => {
                let found = env_vars
                    .iter()
                    .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()));
                match found {
                    Some(value) => Ok(Some(value)),
                    None if *strict => Err(EmbedrankError::Config(format!(
                        "None of the environment variables {} are set",
                        env_vars.join(", ")
                    ))),
                    None => Ok(None),
                }
            }
        }
    }
}

impl Default for Secret {
    fn default() -> Self {
        Secret::from_env_var(DEFAULT_TOKEN_ENV_VAR, false)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Token(_) => f.write_str("Secret::Token(***)"),
            Secret::EnvVar { env_vars, strict } => f
                .debug_struct("Secret::EnvVar")
                .field("env_vars", env_vars)
                .field("strict", strict)
                .finish(),
        }
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Secret::Token(_) => Err(serde::ser::Error::custom(
                "cannot serialize a token-based secret; use an environment variable secret instead",
            )),
            Secret::EnvVar { env_vars, strict } => SecretRepr::EnvVar {
                env_vars: env_vars.clone(),
                strict: *strict,
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match SecretRepr::deserialize(deserializer)? {
            SecretRepr::EnvVar { env_vars, strict } => {
                if env_vars.is_empty() {
                    return Err(serde::de::Error::custom(
                        "env_var secret needs at least one variable name",
                    ));
                }
                Ok(Secret::EnvVar { env_vars, strict })
            }
        }
    }
}
