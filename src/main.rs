mod config;
mod models;
mod relay;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use config::{CredentialResolver, EnvCredentials, FileCredentials};
use models::ticket_request::parse_ticket_request;
use relay::ServiceDeskClient;
use serde_json::{Value, json};

use anyhow::Context;
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ----------------------------------------------------------------------
/// 1  Kommandozeilen-Argumente
/// ----------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// YAML-Datei mit `service_desk:` Zugangsdaten; ohne Angabe werden
    /// die SERVICE_DESK_* Umgebungsvariablen gelesen
    #[arg(long, env = "SERVICE_DESK_CONFIG")]
    credentials_file: Option<PathBuf>,

    /// Port (Default 3000)
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

/// ----------------------------------------------------------------------
/// 2  Gemeinsamer App-State
/// ----------------------------------------------------------------------
struct AppState {
    resolver: Box<dyn CredentialResolver>,
    client: ServiceDeskClient,
}

/// ----------------------------------------------------------------------
/// 3  Router
/// ----------------------------------------------------------------------
fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/create-case", post(create_case))
        .route("/api/create-ticket", post(create_ticket_legacy))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ----------------------------------------------------------------------
/// 4  Programmstart
/// ----------------------------------------------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a) Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // b) CLI
    let cli = Cli::parse();

    // c) State vorbereiten (Credential-Quelle + HTTP-Client)
    let resolver: Box<dyn CredentialResolver> = match cli.credentials_file {
        Some(path) => Box::new(FileCredentials::new(path)),
        None => Box::new(EnvCredentials),
    };
    info!(source = %resolver.source(), "service desk credentials source");

    let client = ServiceDeskClient::new().context("failed to build HTTP client")?;
    let state = Arc::new(AppState { resolver, client });

    // d) Server
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}/api/create-case");
    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}

/// ----------------------------------------------------------------------
/// 5  Handler
/// ----------------------------------------------------------------------
async fn health() -> Json<Value> {
    Json(json!({
        "status": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[tracing::instrument(skip_all)]
async fn create_case(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> Response {
    let request = match parse_ticket_request(payload) {
        Ok(request) => request,
        Err(details) => {
            error!(%details, "invalid create-case request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request", "details": details })),
            )
                .into_response();
        }
    };

    info!(messages = request.message_count(), "create case request received");

    relay::relay(state.resolver.as_ref(), &state.client, &request)
        .await
        .into_response()
}

/// Old Teams app builds still post here.
async fn create_ticket_legacy() -> Redirect {
    Redirect::temporary("/api/create-case")
}
