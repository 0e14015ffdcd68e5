//! HTTP surface: `POST /translate` and `GET /health`.

mod health;

pub use health::{process_memory, HealthResponse, ResourceUsage};

use crate::config::Config;
use crate::error::GatewayError;
use crate::pipeline::{TranslateBody, TranslateResponse, TranslationPipeline, TranslationRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranslationPipeline>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pipeline: TranslationPipeline, config: Config) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}

/// Build the router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/translate", post(translate))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn translate(
    State(state): State<AppState>,
    body: Result<Json<TranslateBody>, JsonRejection>,
) -> Result<Json<TranslateResponse>, GatewayError> {
    let Json(body) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;

    let target_lang = body
        .target_lang
        .unwrap_or_else(|| state.config.default_target_lang.clone());
    info!(
        "Translate request: {} chars, source={}, target={}",
        body.text.chars().count(),
        body.source_lang,
        target_lang
    );

    let request = TranslationRequest::new(body.text, body.source_lang, target_lang);
    let result = state.pipeline.translate(request).await?;
    Ok(Json(result.into()))
}

/// Serve `router` on `listener` until Ctrl-C or SIGTERM.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    serve_until(listener, state, shutdown_signal()).await
}

/// Serve until `shutdown` completes.
///
/// On shutdown the gate is closed: requests still waiting for a permit fail
/// with [`GatewayError::GateClosed`], in-flight translations run to completion.
pub async fn serve_until<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let pipeline = Arc::clone(&state.pipeline);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            pipeline.gate().close();
            info!("Gate closed, draining in-flight translations");
        })
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
