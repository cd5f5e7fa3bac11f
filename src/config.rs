//! Responder configuration.
//!
//! [ResponderConfig] can be deserialized from any `serde` format or read from the
//! environment with [ResponderConfig::from_env]:
//!
//! | variable | meaning |
//! |---|---|
//! | `RESPONDER_SYSTEM_PROMPT_PATH` | system prompt template file (default: keep the builder's template) |
//! | `RESPONDER_TEMPERATURE` | model temperature, e.g. `0.2` (default: provider default) |
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::TemplateSource;

pub const SYSTEM_PROMPT_PATH_ENV: &str = "RESPONDER_SYSTEM_PROMPT_PATH";
pub const TEMPERATURE_ENV: &str = "RESPONDER_TEMPERATURE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResponderConfig {
    /// Where the system prompt template is loaded from; `None` keeps the builder's choice
    pub system_prompt: Option<TemplateSource>,
    /// Temperature of the model
    pub temperature: Option<f64>,
    /// Additional provider-specific parameters
    pub additional_params: Option<serde_json::Value>,
}

impl ResponderConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let system_prompt = match lookup(SYSTEM_PROMPT_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => {
                Some(TemplateSource::Path(PathBuf::from(path)))
            }
            _ => None,
        };

        let temperature = lookup(TEMPERATURE_ENV)
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        name: TEMPERATURE_ENV,
                        value: value.clone(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        Ok(Self {
            system_prompt,
            temperature,
            additional_params: None,
        })
    }
}
