//! Preset messages with variable substitution
//!
//! A preset is a named, pre-configured subject/body pair selectable by a short
//! key instead of supplying literal text per request. Both fields may contain
//! `<<name>>` placeholder tokens filled in at send time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Named subject/body template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Named library of reusable presets held for the lifetime of the service
#[derive(Debug, Clone, Default)]
pub struct PresetLibrary {
    presets: HashMap<String, Preset>,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge parsed presets into the library. Entries with the same name are
    /// overwritten; previously held entries are kept.
    pub fn merge(&mut self, presets: HashMap<String, Preset>) {
        self.presets.extend(presets);
    }

    /// Look up a preset by name
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }
}

/// Replace every literal `<<key>>` token with its value.
///
/// Plain string replacement, not regex; applied key by key. Substitution with
/// a fixed key set is idempotent since replacement values carry no tokens of
/// their own key.
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> String {
    let mut result = text.to_string();
    for (key, value) in vars {
        let token = format!("<<{}>>", key);
        result = result.replace(&token, value);
    }
    result
}
