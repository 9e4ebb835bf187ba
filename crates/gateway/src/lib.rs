//! HTTP gateway for Mathwise.
//!
//! Serves the embedded web chat, a health check, and the v1 session API.
//!
//! Built on Axum for async HTTP.

pub mod api_v1;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use mathwise_config::AppConfig;

/// Request bodies are questions; 64 KiB is plenty.
const BODY_LIMIT: usize = 64 * 1024;

/// Build the full router: health, v1 API and frontend.
///
/// Layers applied:
/// - CORS restricted to the gateway's own origin
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(state: api_v1::SharedApiState) -> Router {
    let origin = format!(
        "http://{}:{}",
        state.config.gateway.host, state.config.gateway.port
    );
    let allow_origin = match HeaderValue::from_str(&origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            warn!(origin = %origin, "Invalid gateway origin, cross-origin requests disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .merge(frontend::frontend_router())
        .layer(
            ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
}

/// Start the gateway HTTP server.
///
/// Fails before binding when the provider needs an API key and none is set.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config.check_api_key()?;
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(api_v1::ApiV1State::from_config(config)?);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
    sessions: usize,
}

async fn health_handler(State(state): State<api_v1::SharedApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
        sessions: state.session_count().await,
    })
}
