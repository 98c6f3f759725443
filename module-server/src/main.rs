//! module-server - host plumbing for generic service modules
//!
//! Brings up the service instances declared in config.toml (model lookup,
//! startup validation, construction) and exposes their command and
//! reconfigure entry points over HTTP.

mod config;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use config::ServerConfig;
use sendgrid_rs::config::ServiceConfig;
use sendgrid_rs::registry::{register_models, Registry};
use sendgrid_rs::service::GenericService;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Application state: configured service instances by name
struct AppState {
    services: HashMap<String, Arc<dyn GenericService>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .pretty()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting module-server...");

    // Load configuration
    let config = if std::path::Path::new("config.toml").exists() {
        ServerConfig::from_file("config.toml")?
    } else {
        info!("No config file found, using defaults");
        ServerConfig::default()
    };

    // Register available models and bring up the declared services
    let mut registry = Registry::new();
    register_models(&mut registry);

    let mut services: HashMap<String, Arc<dyn GenericService>> = HashMap::new();
    for entry in &config.services {
        let registration = registry
            .lookup(&entry.model)
            .ok_or_else(|| anyhow::anyhow!("unknown model: {}", entry.model))?;
        let service_config = entry.service_config()?;

        (registration.validator)(&service_config)?;
        let service = (registration.constructor)(&service_config)?;
        info!(name = %entry.name, model = %entry.model, "service configured");
        services.insert(entry.name.clone(), service);
    }

    let state = Arc::new(AppState { services });

    // Build router
    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/do_command", post(do_command_handler))
        .route("/reconfigure", post(reconfigure_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!("module-server listening on http://{}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "module-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
struct DoCommandRequest {
    name: String,
    command: Value,
}

/// Invocation entry point: forwards the command map to the named service.
/// Handler failures come back inside the result map, not as HTTP errors.
async fn do_command_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DoCommandRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let service = state.services.get(&request.name).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("unknown service: {}", request.name),
        )
    })?;

    Ok(Json(service.do_command(request.command).await))
}

#[derive(Debug, Deserialize)]
struct ReconfigureRequest {
    name: String,
    #[serde(default)]
    attributes: serde_json::Map<String, Value>,
}

/// Reconfigure entry point: replaces the named service's configuration.
/// Configuration errors are the one failure class reported as HTTP errors.
async fn reconfigure_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReconfigureRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let service = state.services.get(&request.name).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("unknown service: {}", request.name),
        )
    })?;

    let service_config = ServiceConfig::new(request.name.clone(), request.attributes);
    match service.reconfigure(&service_config) {
        Ok(()) => {
            info!(name = %request.name, "service reconfigured");
            Ok(Json(json!({ "status": "ok" })))
        }
        Err(e) => {
            warn!(name = %request.name, error = %e, "reconfigure rejected");
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}
