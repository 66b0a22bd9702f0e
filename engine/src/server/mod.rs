//! HTTP API
//!
//! Endpoints:
//! - POST /pchat - Preorder chatbot
//! - POST /rchat - Emergency reporting chatbot
//! - GET /api/status - Server status and provider health
//! - GET / - Banner
//!
//! Errors are returned as `{"error": ..., "hint": ...}` with status 400 for
//! caller mistakes and 500 for everything else.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use sdk::errors::{EngineError, MatchdayErrorExt};
use sdk::types::{ChatRequest, ChatResponse, ReportRequest, ReportResponse};

use crate::app::AppContext;

/// Wrapper that turns an `EngineError` into a JSON error response
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Rejected request: {}", self.0);
        }

        // Server-side detail stays in the log
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(json!({
                "error": error,
                "hint": self.0.user_hint(),
            })),
        )
            .into_response()
    }
}

/// Build the router with all endpoints and middleware
pub fn router(ctx: AppContext) -> Router {
    let cors_allow_any = ctx.config.server.cors_allow_any;

    let app = Router::new()
        .route("/pchat", post(pchat_handler))
        .route("/rchat", post(rchat_handler))
        .route("/api/status", get(status_handler))
        .route("/", get(index_handler))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http());

    if cors_allow_any {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind to the configured address and serve until `shutdown` resolves
pub async fn serve<F>(ctx: AppContext, shutdown: F) -> Result<(), EngineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", addr, e)))?;

    serve_on(listener, ctx, shutdown).await
}

/// Serve on an already bound listener
pub async fn serve_on<F>(
    listener: tokio::net::TcpListener,
    ctx: AppContext,
    shutdown: F,
) -> Result<(), EngineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener
        .local_addr()
        .map_err(|e| EngineError::Network(format!("Failed to get local address: {}", e)))?;

    tracing::info!("Matchday API listening on http://{}", addr);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("API server shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Network(format!("API server error: {}", e)))
}

/// Resolves on Ctrl+C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn pchat_handler(
    State(ctx): State<AppContext>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::info!(
        "Received query ({} chars, {} turns of memory)",
        request.query.len(),
        request.memory_input.len()
    );

    let response = ctx.preorder.handle_request(request).await?;
    Ok(Json(response))
}

async fn rchat_handler(
    State(ctx): State<AppContext>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    tracing::info!(
        "Received report (message: {}, image: {}, history: {})",
        request.message.is_some(),
        request.image_data.is_some(),
        request.conversation_history.len()
    );

    let response = ctx.reporter.process(request).await?;
    Ok(Json(response))
}

async fn status_handler(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    let providers = ctx.provider_health().await;
    let status = if providers.iter().any(|p| p.healthy) {
        "running"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("GIT_COMMIT_HASH"),
        "providers": providers,
    }))
}

async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Matchday API is running. Use /pchat for preorders and /rchat for emergency reports."
    }))
}
