//! SendGrid v3 mail/send client
//!
//! Thin HTTP client over the transactional-email API. The handler hands it a
//! fully assembled [`OutboundEmail`]; delivery itself is the provider's
//! problem. The [`EmailSender`] trait is the seam between the command handler
//! and the wire, so tests can swap in a mock transport.

use crate::error::{EmailError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://api.sendgrid.com/v3";

/// Sender identity: a bare address, or an (address, display name) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

/// Decoded attachment carried in input-list order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

/// Assembled outbound message handed to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: EmailAddress,
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

/// Transport seam between the command handler and the provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver the message; returns the provider's numeric status code.
    async fn send(&self, message: &OutboundEmail) -> Result<u16>;
}

/// HTTP client for the SendGrid v3 `mail/send` endpoint
pub struct SendGridClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SendGridClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    /// Point the client at an alternate API base (stub servers in tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Build the v3 mail/send JSON body.
    ///
    /// One personalization carrying all recipients and the subject; HTML
    /// content; attachments re-encoded to base64 in their original order.
    fn build_payload(message: &OutboundEmail) -> Value {
        let mut from = serde_json::Map::new();
        from.insert("email".to_string(), json!(message.from.email));
        if let Some(name) = &message.from.name {
            from.insert("name".to_string(), json!(name));
        }

        let personalization = json!({
            "to": message
                .to
                .iter()
                .map(|email| json!({ "email": email }))
                .collect::<Vec<_>>(),
            "subject": message.subject,
        });

        let mut body = serde_json::Map::new();
        body.insert("from".to_string(), Value::Object(from));
        body.insert(
            "personalizations".to_string(),
            Value::Array(vec![personalization]),
        );
        body.insert(
            "content".to_string(),
            json!([{ "type": "text/html", "value": message.html_body }]),
        );

        if !message.attachments.is_empty() {
            let attachments: Vec<Value> = message
                .attachments
                .iter()
                .map(|a| {
                    json!({
                        "content": BASE64.encode(&a.content),
                        "filename": a.filename,
                        "type": a.mime_type,
                        "disposition": "attachment",
                    })
                })
                .collect();
            body.insert("attachments".to_string(), Value::Array(attachments));
        }

        Value::Object(body)
    }
}

#[async_trait]
impl EmailSender for SendGridClient {
    async fn send(&self, message: &OutboundEmail) -> Result<u16> {
        let url = format!("{}/mail/send", self.base_url.trim_end_matches('/'));
        debug!(
            recipients = message.to.len(),
            attachments = message.attachments.len(),
            "posting to SendGrid"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&Self::build_payload(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "SendGrid rejected the message");
            Err(EmailError::Provider(format!(
                "SendGrid request failed (status {}): {}",
                status.as_u16(),
                body
            )))
        }
    }
}
