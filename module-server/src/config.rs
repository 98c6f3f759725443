//! Server configuration
//!
//! `config.toml` declares the listen address and the service instances to
//! bring up, each naming a registered model plus its attribute table. The
//! toml attribute table is converted to the JSON-shaped attribute map the
//! service layer consumes.

use sendgrid_rs::config::ServiceConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub attributes: toml::Table,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8090".to_string()
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            services: Vec::new(),
        }
    }
}

impl ServiceEntry {
    /// Convert the toml attribute table into the host attribute bag.
    pub fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        let value = serde_json::to_value(&self.attributes)?;
        let attributes = value.as_object().cloned().unwrap_or_default();
        Ok(ServiceConfig::new(self.name.clone(), attributes))
    }
}
