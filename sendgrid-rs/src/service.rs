//! Email command handler service
//!
//! The one non-trivial piece of the module: validates configuration, maps a
//! send command onto a transactional-email request (recipients, subject,
//! body, optional attachments, templated variables, preset message) and
//! delegates delivery to the provider client. Every failure inside
//! `do_command` resolves to an `{"error": ...}` result; nothing escapes as
//! `Err`.

use crate::client::{Attachment, EmailAddress, EmailSender, OutboundEmail, SendGridClient};
use crate::command::{Command, SendRequest};
use crate::config::{EmailConfig, ServiceConfig};
use crate::error::{EmailError, Result};
use crate::presets::{substitute, PresetLibrary};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Host-facing service surface: a generic request/response command entry
/// point plus reconfiguration. Implementations take `&self`; configuration
/// changes go through interior mutability so in-flight commands and
/// host-driven reconfigures do not race.
#[async_trait]
pub trait GenericService: Send + Sync {
    fn name(&self) -> &str;

    /// Handle a generic command map, returning a result map. Never errors;
    /// failures come back in the `error` key.
    async fn do_command(&self, command: Value) -> Value;

    fn reconfigure(&self, config: &ServiceConfig) -> Result<()>;
}

/// Configuration snapshot held between reconfigurations
struct Snapshot {
    sender: Arc<dyn EmailSender>,
    default_from: String,
    default_from_name: String,
    enforce_preset: bool,
    presets: PresetLibrary,
}

impl Snapshot {
    fn apply(&mut self, config: EmailConfig, sender: Arc<dyn EmailSender>) {
        // Presets merge into the previously held set; everything else is
        // replaced wholesale.
        self.presets.merge(config.preset_messages);
        self.default_from = config.default_from;
        self.default_from_name = config.default_from_name;
        self.enforce_preset = config.enforce_preset;
        self.sender = sender;
    }
}

/// The sendgrid-email service instance
pub struct EmailService {
    name: String,
    state: Mutex<Snapshot>,
}

impl EmailService {
    /// Construct from host configuration, building an authenticated SendGrid
    /// client from `api_key`.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        EmailConfig::validate(config)?;
        let parsed = EmailConfig::from_service_config(config)?;
        let sender = build_client(&parsed);
        Ok(Self::with_sender(config.name.clone(), parsed, sender))
    }

    /// Construct with an explicit transport. Used by tests to substitute a
    /// mock for the provider client.
    pub fn with_sender(
        name: impl Into<String>,
        config: EmailConfig,
        sender: Arc<dyn EmailSender>,
    ) -> Self {
        let mut snapshot = Snapshot {
            sender: Arc::clone(&sender),
            default_from: String::new(),
            default_from_name: String::new(),
            enforce_preset: false,
            presets: PresetLibrary::new(),
        };
        snapshot.apply(config, sender);
        Self {
            name: name.into(),
            state: Mutex::new(snapshot),
        }
    }

    /// Startup-time validation, invoked by the host before activation.
    pub fn validate(config: &ServiceConfig) -> Result<()> {
        EmailConfig::validate(config)
    }

    async fn handle(&self, command: Value) -> Result<Value> {
        let Command::Send(request) = Command::from_value(command)?;

        // Compose under the lock, then release it before the network call.
        let (sender, message) = {
            let state = self.state.lock().unwrap();
            let message = compose(&state, request)?;
            (Arc::clone(&state.sender), message)
        };

        debug!(
            service = %self.name,
            recipients = message.to.len(),
            "dispatching send command"
        );

        let status_code = sender.send(&message).await?;
        Ok(json!({ "status_code": status_code }))
    }
}

#[async_trait]
impl GenericService for EmailService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn do_command(&self, command: Value) -> Value {
        match self.handle(command).await {
            Ok(result) => result,
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    fn reconfigure(&self, config: &ServiceConfig) -> Result<()> {
        EmailConfig::validate(config)?;
        let parsed = EmailConfig::from_service_config(config)?;
        let sender = build_client(&parsed);

        let mut state = self.state.lock().unwrap();
        state.apply(parsed, sender);
        info!(
            service = %self.name,
            presets = state.presets.len(),
            enforce_preset = state.enforce_preset,
            "service reconfigured"
        );
        Ok(())
    }
}

fn build_client(config: &EmailConfig) -> Arc<dyn EmailSender> {
    let client = match &config.api_base {
        Some(base) => SendGridClient::with_base_url(&config.api_key, base),
        None => SendGridClient::new(&config.api_key),
    };
    Arc::new(client)
}

/// Map a send request onto an outbound message, in the required order:
/// enforce-preset check, body/subject resolution, template substitution,
/// recipient check, sender identity, attachment decoding.
fn compose(state: &Snapshot, request: SendRequest) -> Result<OutboundEmail> {
    if state.enforce_preset && request.preset.is_none() {
        return Err(EmailError::Command(
            "preset message must be specified".to_string(),
        ));
    }

    let (mut subject, mut body) = match &request.preset {
        Some(name) => {
            let preset = state
                .presets
                .get(name)
                .ok_or_else(|| EmailError::PresetNotFound(name.clone()))?;
            (preset.subject.clone(), preset.body.clone())
        }
        None => (
            request.subject.unwrap_or_default(),
            request.body.unwrap_or_default(),
        ),
    };

    if let Some(vars) = &request.template_vars {
        body = substitute(&body, vars);
        subject = substitute(&subject, vars);
    }

    let to = request
        .to
        .ok_or_else(|| EmailError::Command("'to' must be defined".to_string()))?;

    let from_name = request
        .from_name
        .unwrap_or_else(|| state.default_from_name.clone());
    let from_email = request.from.unwrap_or_else(|| state.default_from.clone());
    let from = EmailAddress {
        email: from_email,
        name: if from_name.is_empty() {
            None
        } else {
            Some(from_name)
        },
    };

    let mut attachments = Vec::new();
    if let Some(specs) = request.attachments {
        for spec in specs {
            let content = BASE64.decode(spec.content.as_bytes()).map_err(|e| {
                EmailError::InvalidAttachment(format!("{}: {}", spec.filename, e))
            })?;
            attachments.push(Attachment {
                content,
                filename: spec.filename,
                mime_type: spec.mime_type,
            });
        }
    }

    Ok(OutboundEmail {
        from,
        to,
        subject,
        html_body: body,
        attachments,
    })
}
