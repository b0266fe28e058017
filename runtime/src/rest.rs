// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP API for Mediascout.
//!
//! `/api/media` runs one extraction batch per request. `/api/download` and
//! `/api/transcode` proxy a single remote URL.

use crate::error::ProxyError;
use crate::extraction::Orchestrator;
use crate::media::MediaRecord;
use crate::proxy::{self, ProxyClient};
use crate::renderer::Renderer;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mediascout_transcode::Profile;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// State shared by all handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub proxy: ProxyClient,
    /// Renderer behind the fallback scraper, for health reporting.
    pub renderer: Arc<dyn Renderer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, proxy: ProxyClient, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            orchestrator,
            proxy,
            renderer,
            started_at: Instant::now(),
        }
    }
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/media", get(media_query).post(media_body))
        .route("/api/download", get(download))
        .route("/api/transcode", get(transcode))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn start(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Split a comma-separated `sources` value, trimming and dropping empties.
pub fn parse_sources(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct MediaQuery {
    sources: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaBody {
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscodeQuery {
    url: Option<String>,
    quality: Option<String>,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "browser_available": state.renderer.is_available(),
        "active_contexts": state.renderer.active_contexts(),
        "uptime_s": state.started_at.elapsed().as_secs(),
    }))
}

async fn media_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MediaQuery>,
) -> Json<Vec<MediaRecord>> {
    let sources = query
        .sources
        .as_deref()
        .map(parse_sources)
        .unwrap_or_default();
    run_batch(&state, sources).await
}

async fn media_body(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MediaBody>,
) -> Json<Vec<MediaRecord>> {
    let sources = body
        .sources
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    run_batch(&state, sources).await
}

async fn run_batch(state: &AppState, sources: Vec<String>) -> Json<Vec<MediaRecord>> {
    info!("media request for {} source(s)", sources.len());
    Json(state.orchestrator.run(&sources).await)
}

async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ProxyError> {
    let target = proxy::parse_target(query.url.as_deref())?;
    proxy::download(&state.proxy, &target).await
}

async fn transcode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TranscodeQuery>,
) -> Result<Response, ProxyError> {
    let target = proxy::parse_target(query.url.as_deref())?;
    let profile = Profile::from_quality(query.quality.as_deref());
    proxy::transcode(&state.proxy, &target, profile).await
}
