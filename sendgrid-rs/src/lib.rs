//! sendgrid-rs: SendGrid email service module
//!
//! A generic service that maps command payloads onto transactional-email
//! requests delivered through the SendGrid v3 API.
//!
//! # Features
//!
//! - **Send command**: recipients, subject, HTML body, sender overrides
//! - **Presets**: named subject/body templates selectable per request
//! - **Template variables**: literal `<<name>>` substitution at send time
//! - **Attachments**: base64 content with filename and MIME type, order
//!   preserved
//!
//! # Example
//!
//! ```no_run
//! use sendgrid_rs::config::ServiceConfig;
//! use sendgrid_rs::service::{EmailService, GenericService};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let attributes = json!({
//!     "api_key": "SG.secret",
//!     "default_from": "robot@example.com",
//! });
//! let config = ServiceConfig::new("email", attributes.as_object().unwrap().clone());
//!
//! EmailService::validate(&config)?;
//! let service = EmailService::new(&config)?;
//!
//! let result = service
//!     .do_command(json!({
//!         "command": "send",
//!         "to": ["someone@example.com"],
//!         "subject": "Hello",
//!         "body": "<p>Hi there</p>",
//!     }))
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Host attribute bag and recognized configuration
//! - [`error`]: Error types and handling
//! - [`command`]: Incoming command surface
//! - [`presets`]: Preset messages and variable substitution
//! - [`client`]: SendGrid HTTP client and outbound message model
//! - [`service`]: The email command handler
//! - [`registry`]: Model registry consumed by the host plumbing

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod presets;
pub mod registry;
pub mod service;

// Re-export commonly used types
pub use config::{EmailConfig, ServiceConfig};
pub use error::{EmailError, Result};
pub use service::{EmailService, GenericService};
