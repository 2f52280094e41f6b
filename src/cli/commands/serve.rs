//! HTTP relay server.
//!
//! Exposes a status check, an echo route for connectivity tests and the
//! vector search relay.

use crate::cli::Output;
use crate::config::Settings;
use crate::relay::{RelayBody, RelayService};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Paths served by the router. OPTIONS on anything else is a 404.
const ROUTES: [&str; 5] = ["/", "/status", "/echo", "/vector-search", "/vector-search/"];

/// Shared application state.
pub struct AppState {
    relay: RelayService,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl AppState {
    pub fn new(relay: RelayService) -> Self {
        Self {
            relay,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }
}

/// Run the HTTP relay server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let settings = Arc::new(settings);
    let relay = RelayService::from_settings(settings.clone())?;

    if let Some(reason) = relay.unavailable_reason() {
        if settings.server.fail_fast {
            anyhow::bail!(
                "{}. Set it, or set server.fail_fast = false to start anyway.",
                reason
            );
        }
        Output::warning(&format!(
            "{}; relay requests will fail until it is configured.",
            reason
        ));
    }

    let app = build_router(Arc::new(AppState::new(relay)))?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Relay listening");

    Output::header("vsrelay");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Status", "GET  /  (or /status)");
    Output::kv("Echo", "POST /echo");
    Output::kv("Vector search", "POST /vector-search");
    println!();
    Output::kv("Model", &settings.openai.model);
    Output::kv(
        "Vector store",
        settings
            .relay
            .default_vector_store()
            .unwrap_or("(per request)"),
    );
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Output::info("Server stopped.");
    Ok(())
}

/// Build the router with CORS applied.
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.relay.settings().server.allowed_origin)?;

    Ok(Router::new()
        .route("/", get(status))
        .route("/status", get(status))
        .route("/echo", post(echo))
        .route("/vector-search", post(vector_search))
        .route("/vector-search/", post(vector_search))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors)
        .layer(middleware::from_fn(preflight_no_content))
        .with_state(state))
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(HeaderValue::from_str(origin.trim())?)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// The CORS layer answers every OPTIONS request itself with an empty 200;
/// report those as 204 on known routes and as a JSON 404 elsewhere.
async fn preflight_no_content(request: Request<Body>, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    if is_options && !ROUTES.contains(&request.uri().path()) {
        return not_found().await.into_response();
    }
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}

// === Response Types ===

#[derive(Serialize)]
struct StatusResponse {
    ok: bool,
    message: &'static str,
    service: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
    uptime_seconds: u64,
    model: String,
    vector_store_configured: bool,
    api_key_configured: bool,
}

// === Handlers ===

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = state.relay.settings();
    Json(StatusResponse {
        ok: true,
        message: "Relay is running",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at,
        uptime_seconds: state.started.elapsed().as_secs(),
        model: settings.openai.model.clone(),
        vector_store_configured: settings.relay.default_vector_store().is_some(),
        api_key_configured: state.relay.is_ready(),
    })
}

async fn echo(body: Result<Bytes, BytesRejection>) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejected(rejection),
    };
    let received = serde_json::from_slice::<Value>(&body).unwrap_or_else(|_| json!({}));
    Json(json!({ "received": received })).into_response()
}

async fn vector_search(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejected(rejection),
    };
    let outcome = state.relay.relay(&body).await;
    let status =
        StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.body)).into_response()
}

/// Body could not be read (too large, aborted stream).
fn body_rejected(rejection: BytesRejection) -> Response {
    let status = rejection.status();
    warn!(%status, reason = %rejection.body_text(), "Request body rejected");
    let body = RelayBody::Error {
        error: "Request body rejected".to_string(),
        detail: Some(rejection.body_text()),
    };
    (status, Json(body)).into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}
