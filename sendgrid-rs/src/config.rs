//! Service configuration
//!
//! The host hands services a loosely-typed attribute bag. It is mapped once,
//! at this boundary, into an explicit [`EmailConfig`] with the recognized
//! fields, instead of being poked at ad hoc throughout the handler logic.

use crate::error::{EmailError, Result};
use crate::presets::Preset;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Host-provided configuration: a service instance name plus a JSON-shaped
/// map of named attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, attributes: serde_json::Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    fn string_attr(&self, key: &str) -> &str {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    fn bool_attr(&self, key: &str) -> bool {
        self.attributes
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Recognized configuration for the email service
#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    /// SendGrid API key (secret, required)
    pub api_key: String,
    /// Fallback sender address when the command carries no `from`
    pub default_from: String,
    /// Fallback sender display name
    pub default_from_name: String,
    /// When true, every send command must reference a preset
    pub enforce_preset: bool,
    /// Named library of reusable subject/body templates
    pub preset_messages: HashMap<String, Preset>,
    /// Provider API base URL override; defaults to the live SendGrid endpoint
    pub api_base: Option<String>,
}

impl EmailConfig {
    /// Map the attribute bag into the recognized fields.
    ///
    /// Absent string/bool attributes fall back to empty/false; a malformed
    /// `preset_messages` structure is a configuration error.
    pub fn from_service_config(config: &ServiceConfig) -> Result<Self> {
        let preset_messages = match config.attributes.get("preset_messages") {
            Some(value) => serde_json::from_value::<HashMap<String, Preset>>(value.clone())
                .map_err(|e| EmailError::Config(format!("invalid preset_messages: {}", e)))?,
            None => HashMap::new(),
        };

        let api_base = config
            .attributes
            .get("api_base")
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        Ok(Self {
            api_key: config.string_attr("api_key").to_string(),
            default_from: config.string_attr("default_from").to_string(),
            default_from_name: config.string_attr("default_from_name").to_string(),
            enforce_preset: config.bool_attr("enforce_preset"),
            preset_messages,
            api_base,
        })
    }

    /// Startup-time contract, invoked by the host before activation.
    pub fn validate(config: &ServiceConfig) -> Result<()> {
        let parsed = Self::from_service_config(config)?;

        if parsed.api_key.is_empty() {
            return Err(EmailError::Config("An api_key must be defined".to_string()));
        }

        if parsed.enforce_preset && parsed.preset_messages.is_empty() {
            return Err(EmailError::Config(
                "preset_messages must be defined when enforce_preset is set to true".to_string(),
            ));
        }

        Ok(())
    }
}
