//! HTTP front door: GET / and POST / relay the request's query parameters
//! to the configured Chat space and report the outcome.

use crate::chat::{GoogleChatClient, TextMessage};
use crate::config::{self, Config};
use crate::credentials::{self, BootstrapOutcome};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the relay server (config, chat client, destination).
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub chat: Arc<GoogleChatClient>,
    /// Resolved Chat space id that relayed requests are posted to.
    pub space_id: String,
}

/// Response body for both routes: actual status, the relayed message text,
/// and whether the Chat call succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct RelayResponse {
    pub status: u16,
    pub message: String,
    pub relayed: bool,
}

/// Serialize query parameters to a JSON object string in arrival order
/// (`{"a":"1","b":"2"}`; `{}` when there are none). Repeated keys keep the
/// last value.
fn params_json(params: &[(String, String)]) -> String {
    let mut map = serde_json::Map::new();
    for (k, v) in params {
        map.insert(k.clone(), serde_json::Value::String(v.clone()));
    }
    serde_json::Value::Object(map).to_string()
}

/// Diagnostic message text relayed to the space.
fn relay_message(method: &str, params: &[(String, String)]) -> String {
    format!(
        "Got your {} request with these params: {}",
        method,
        params_json(params)
    )
}

/// Relay the formatted message and build the response. A relay failure is
/// logged and reported as `relayed: false`; the HTTP response is 200 either
/// way, with the originally constructed message text.
async fn handle_relay(
    state: &ServerState,
    method: &str,
    params: Vec<(String, String)>,
) -> Json<RelayResponse> {
    let msg = relay_message(method, &params);
    let payload = TextMessage::from_text(msg.clone());
    let relayed = match state.chat.create_message(&state.space_id, &payload).await {
        Ok(()) => {
            log::info!("message posted to {}: '{}'", state.space_id, msg);
            true
        }
        Err(e) => {
            log::warn!("relaying message to {} failed: {}", state.space_id, e);
            false
        }
    };
    Json(RelayResponse {
        status: 200,
        message: msg,
        relayed,
    })
}

/// GET / — relay the query parameters.
async fn relay_get(
    State(state): State<ServerState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<RelayResponse> {
    handle_relay(&state, "GET", params).await
}

/// POST / — same contract as GET, still reading query parameters.
async fn relay_post(
    State(state): State<ServerState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<RelayResponse> {
    handle_relay(&state, "POST", params).await
}

/// Run the relay server; binds to config.server.bind:config.server.port.
/// Bootstraps the credential key file first — a missing or malformed
/// GOOGLE_CREDENTIALS blob aborts startup before the listener binds.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_server(config: Config) -> Result<()> {
    let env_value = std::env::var("GOOGLE_CREDENTIALS").ok();
    match credentials::ensure_key_file(&config.credentials.key_file, env_value.as_deref())? {
        BootstrapOutcome::Written => {
            log::info!(
                "loaded credentials from environment into {}",
                config.credentials.key_file.display()
            );
        }
        BootstrapOutcome::Existing => {
            log::debug!(
                "using existing credential key file {}",
                config.credentials.key_file.display()
            );
        }
    }

    let token = config::resolve_chat_token(&config);
    if token.is_none() {
        log::warn!("no chat token configured; relay calls will fail until one is set");
    }
    let chat = GoogleChatClient::new(config.chat.api_base.clone(), token);
    let space_id = config::resolve_space(&config, None)?;

    let state = ServerState {
        config: Arc::new(config.clone()),
        chat: Arc::new(chat),
        space_id,
    };

    let app = Router::new()
        .route("/", get(relay_get).post(relay_post))
        .with_state(state);

    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("relay listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server exited")?;
    log::info!("relay stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}
