//! Incoming command surface
//!
//! Commands arrive as a loosely-typed map. They are normalized at this
//! boundary into a discriminated [`Command`] instead of branching on key
//! presence throughout the handler. Only `send` is defined; anything else is
//! rejected with the generic "command must be defined" error.

use crate::error::{EmailError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug)]
pub enum Command {
    Send(SendRequest),
}

impl Command {
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("command").and_then(Value::as_str) {
            Some("send") => Ok(Command::Send(serde_json::from_value(value)?)),
            _ => Err(EmailError::Command("command must be defined".to_string())),
        }
    }
}

/// Fields of a send command. Everything is optional at parse time; the
/// handler enforces presence in its required order.
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub to: Option<Vec<String>>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub template_vars: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<AttachmentSpec>>,
}

/// Attachment as supplied by the caller: base64 content plus tagging
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentSpec {
    pub content: String,
    pub filename: String,
    pub mime_type: String,
}
