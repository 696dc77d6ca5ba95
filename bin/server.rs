// Couple Ledger - HTTP transport
// REST wrapper around the chat dispatcher (Axum)
//
//   GET  /api/health
//   POST /api/commands   InboundCommand  -> [OutboundMessage]
//   POST /api/callbacks  InboundCallback -> [OutboundMessage]

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use couple_ledger::{
    init_logging, open_database, Bot, Config, InboundCallback, InboundCommand, OutboundMessage,
    SystemClock, VERSION,
};
use serde::Serialize;
use std::fs;
use std::sync::{Arc, Mutex, PoisonError};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state. Commands are serialized through the mutex.
#[derive(Clone)]
struct AppState {
    bot: Arc<Mutex<Bot>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn failed(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// Run a dispatcher call off the async runtime; SQLite blocks.
async fn dispatch<F>(state: AppState, call: F) -> Response
where
    F: FnOnce(&Bot) -> Vec<OutboundMessage> + Send + 'static,
{
    let bot = Arc::clone(&state.bot);
    let joined = tokio::task::spawn_blocking(move || {
        let guard = bot.lock().unwrap_or_else(PoisonError::into_inner);
        call(&guard)
    })
    .await;

    match joined {
        Ok(messages) => (StatusCode::OK, Json(ApiResponse::ok(messages))).into_response(),
        Err(err) => {
            error!(error = %err, "dispatch task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failed(
                    Vec::<OutboundMessage>::new(),
                    "internal error",
                )),
            )
                .into_response()
        }
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "OK",
        version: VERSION,
    }))
}

/// POST /api/commands - Deliver a chat command
async fn post_command(
    State(state): State<AppState>,
    Json(command): Json<InboundCommand>,
) -> Response {
    dispatch(state, move |bot| bot.handle_command(&command)).await
}

/// POST /api/callbacks - Deliver a button press
async fn post_callback(
    State(state): State<AppState>,
    Json(callback): Json<InboundCallback>,
) -> Response {
    dispatch(state, move |bot| bot.handle_callback(&callback)).await
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/commands", post(post_command))
        .route("/callbacks", post(post_callback))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_logging(&config.log_level);

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
    }
    let conn = open_database(&config.db_path)
        .with_context(|| format!("cannot open database {}", config.db_path.display()))?;

    let state = AppState {
        bot: Arc::new(Mutex::new(Bot::new(
            conn,
            Box::new(SystemClock),
            config.default_language,
        ))),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, version = VERSION, "🌐 couple-ledger server listening");

    axum::serve(listener, app(state))
        .await
        .context("server stopped unexpectedly")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_shape() {
        let ok = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "data": [1, 2] }));

        let failed = serde_json::to_value(ApiResponse::failed(Vec::<i32>::new(), "boom")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({ "success": false, "data": [], "error": "boom" })
        );
    }
}
