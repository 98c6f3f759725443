//! End-to-end send pipeline tests
//!
//! Runs the real service and SendGrid client against a local HTTP stub that
//! stands in for the provider, capturing everything posted to mail/send.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sendgrid_rs::config::ServiceConfig;
use sendgrid_rs::registry::{register_models, Registry};
use sendgrid_rs::service::{EmailService, GenericService};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Bind a stub provider on an ephemeral port; returns its base URL and the
/// captured mail/send request bodies.
async fn spawn_provider_stub(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
    let captured: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    let app = Router::new().route(
        "/mail/send",
        post(move |Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(body);
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), captured)
}

fn service_config(api_base: &str, extra: Value) -> ServiceConfig {
    let mut attributes = json!({
        "api_key": "SG.test-key",
        "default_from": "from@example.com",
        "default_from_name": "Test Sender",
        "api_base": api_base,
    })
    .as_object()
    .unwrap()
    .clone();
    if let Some(extra) = extra.as_object() {
        attributes.extend(extra.clone());
    }
    ServiceConfig::new("email", attributes)
}

#[tokio::test]
async fn test_send_roundtrip() {
    let (base, captured) = spawn_provider_stub(StatusCode::ACCEPTED).await;
    let service = EmailService::new(&service_config(&base, json!({}))).unwrap();

    let result = service
        .do_command(json!({
            "command": "send",
            "to": ["a@example.com"],
            "subject": "S",
            "body": "B"
        }))
        .await;
    assert_eq!(result, json!({ "status_code": 202 }));

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let payload = &requests[0];
    assert_eq!(payload["personalizations"][0]["to"][0]["email"], "a@example.com");
    assert_eq!(payload["personalizations"][0]["subject"], "S");
    assert_eq!(payload["content"][0]["value"], "B");
    assert_eq!(payload["from"]["email"], "from@example.com");
    assert_eq!(payload["from"]["name"], "Test Sender");
}

#[tokio::test]
async fn test_provider_rejection_becomes_error_result() {
    let (base, _captured) = spawn_provider_stub(StatusCode::INTERNAL_SERVER_ERROR).await;
    let service = EmailService::new(&service_config(&base, json!({}))).unwrap();

    let result = service
        .do_command(json!({ "command": "send", "to": ["a@example.com"] }))
        .await;
    assert!(result.get("status_code").is_none());
    let error = result["error"].as_str().unwrap();
    assert!(error.contains("500"));
}

#[tokio::test]
async fn test_missing_to_never_contacts_provider() {
    let (base, captured) = spawn_provider_stub(StatusCode::ACCEPTED).await;
    let service = EmailService::new(&service_config(&base, json!({}))).unwrap();

    let result = service
        .do_command(json!({ "command": "send", "subject": "S", "body": "B" }))
        .await;
    assert_eq!(result, json!({ "error": "'to' must be defined" }));
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_attachments_preserved_on_the_wire() {
    let (base, captured) = spawn_provider_stub(StatusCode::ACCEPTED).await;
    let service = EmailService::new(&service_config(&base, json!({}))).unwrap();

    let result = service
        .do_command(json!({
            "command": "send",
            "to": ["a@example.com"],
            "attachments": [
                {
                    "content": BASE64.encode(b"spreadsheet"),
                    "filename": "report.xlsx",
                    "mime_type": "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                },
                {
                    "content": BASE64.encode(b"\x89PNG"),
                    "filename": "chart.png",
                    "mime_type": "image/png"
                }
            ]
        }))
        .await;
    assert_eq!(result, json!({ "status_code": 202 }));

    let requests = captured.lock().unwrap();
    let attachments = requests[0]["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 2);
    assert_eq!(attachments[0]["filename"], "report.xlsx");
    assert_eq!(attachments[0]["content"], BASE64.encode(b"spreadsheet"));
    assert_eq!(attachments[0]["disposition"], "attachment");
    assert_eq!(attachments[1]["filename"], "chart.png");
    assert_eq!(attachments[1]["type"], "image/png");
}

#[tokio::test]
async fn test_preset_pipeline_through_registry() {
    let (base, captured) = spawn_provider_stub(StatusCode::ACCEPTED).await;

    let mut registry = Registry::new();
    register_models(&mut registry);
    let registration = registry.lookup("mcvella:messaging:sendgrid-email").unwrap();

    let config = service_config(
        &base,
        json!({
            "enforce_preset": true,
            "preset_messages": {
                "alert": {
                    "subject": "Alert: <<issue>>",
                    "body": "Issue detected: <<issue>>"
                }
            }
        }),
    );
    (registration.validator)(&config).unwrap();
    let service = (registration.constructor)(&config).unwrap();

    // enforce_preset rejects ad hoc sends
    let result = service
        .do_command(json!({ "command": "send", "to": ["a@example.com"] }))
        .await;
    assert_eq!(result, json!({ "error": "preset message must be specified" }));

    let result = service
        .do_command(json!({
            "command": "send",
            "to": ["a@example.com"],
            "preset": "alert",
            "template_vars": { "issue": "Test Issue" }
        }))
        .await;
    assert_eq!(result, json!({ "status_code": 202 }));

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0]["personalizations"][0]["subject"],
        "Alert: Test Issue"
    );
    assert_eq!(
        requests[0]["content"][0]["value"],
        "Issue detected: Test Issue"
    );
}
