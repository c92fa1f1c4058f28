//! LexiBridge REST API
//!
//! HTTP API layer for LexiBridge, built with Axum.
//!
//! # Endpoints
//!
//! ## Translation
//! - `POST /api/v1/translate` - Translate text against the loaded glossary
//! - `POST /api/v1/ocr-translate` - Extract text from a label image, then
//!   translate it
//!
//! ## Glossary
//! - `GET /api/v1/glossary` - Current corpus provenance
//! - `POST /api/v1/glossary/reload` - Rebuild the corpus from CSV
//!
//! ## Cost & usage
//! - `GET /api/v1/cost` - Session token counters and derived costs
//! - `GET /api/v1/usage` - Usage statistics and recent audit entries
//!
//! ## Alerts
//! - `GET /api/v1/alerts` - Recent alerts
//! - `DELETE /api/v1/alerts` - Clear the alert log
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! Every `/api/v1` call passes the sliding-window rate limiter keyed by
//! caller identity + endpoint name; latencies and failures of all calls
//! feed the health monitor through middleware.

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    let api_routes = Router::new()
        // Translation routes
        .route("/translate", post(routes::translate::translate))
        .route("/ocr-translate", post(routes::ocr::ocr_translate))
        // Glossary routes
        .route("/glossary", get(routes::glossary::info))
        .route("/glossary/reload", post(routes::glossary::reload))
        // Cost & usage routes
        .route("/cost", get(routes::cost::session_cost))
        .route("/usage", get(routes::cost::usage))
        // Alert routes
        .route("/alerts", get(routes::alerts::recent))
        .route("/alerts", delete(routes::alerts::clear));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&shared_state),
            observe,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Feed every request's latency and outcome into the health monitor
///
/// Server failures become error samples; client rejections are tallied
/// separately so they never inflate the server error rate.
async fn observe(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    state.monitor.record_latency(&path, elapsed);

    let status = response.status();
    if status.is_server_error() {
        let kind = match status.as_u16() {
            502 => "backend_error",
            503 => "service_unavailable",
            _ => "internal_error",
        };
        state.monitor.record_error(kind, &path, status.as_str());
    } else if status.is_client_error() {
        state.monitor.record_client_error();
    }

    response
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.api.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("LexiBridge API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("LexiBridge API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
