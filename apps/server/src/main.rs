// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Lite Drawing Server - plan and section drawings over HTTP.
//!
//! Clients post triangulated geometry with a cutting plane and optional
//! graphic override rules; the server returns cut polygons, classified
//! lines, hatches and resolved styles, or a rendered SVG.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/drawing` - Drawing as JSON
//! - `POST /api/v1/drawing/svg` - Drawing as SVG
//! - `GET /api/v1/presets` - Built-in presets
//! - `POST /api/v1/rules/import` - Validate imported presets
//! - `GET /api/v1/cache/:key` - Retrieve cached result

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::{Config, LogFormat};
use services::cache::DiskCache;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug,ifc_lite_drawing_server=debug";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DiskCache>,
    pub config: Arc<Config>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    Router::new()
        .route("/", get(routes::health::info))
        .route("/api/v1/health", get(routes::health::check))
        .route("/api/v1/drawing", post(routes::drawing::create_drawing))
        .route("/api/v1/drawing/svg", post(routes::drawing::create_svg))
        .route("/api/v1/presets", get(routes::rules::list_presets))
        .route("/api/v1/rules/import", post(routes::rules::import))
        .route("/api/v1/cache/:key", get(routes::drawing::cached_drawing))
        .layer(DefaultBodyLimit::max(config.max_request_bytes()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    tracing::info!(
        port = config.port,
        cache_dir = %config.cache_dir,
        max_request_size_mb = config.max_request_size_mb,
        worker_threads = config.worker_threads,
        "Starting IFC-Lite Drawing Server"
    );

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    let max_age = Duration::from_secs(config.cache_max_age_days * 24 * 60 * 60);
    let cache = Arc::new(DiskCache::open(&config.cache_dir, max_age).await);
    {
        let cache = Arc::clone(&cache);
        tokio::task::spawn_blocking(move || match cache.prune_expired() {
            Ok(removed) => tracing::info!(removed, "Pruned expired cache entries"),
            Err(e) => tracing::warn!(error = %e, "Cache pruning failed"),
        });
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = build_router(AppState {
        cache,
        config: Arc::new(config),
    });

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let dir = std::env::temp_dir().join(format!("ifc-lite-drawing-test-{}", std::process::id()));
        let config = Config {
            cache_dir: dir.to_string_lossy().into_owned(),
            ..Config::from_env()
        };
        let cache = Arc::new(DiskCache::open(&config.cache_dir, Duration::from_secs(3600)).await);
        build_router(AppState {
            cache,
            config: Arc::new(config),
        })
    }

    async fn post(app: Router, uri: &str, body: String) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .await
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_meshes_is_unprocessable() {
        let body = r#"{"meshes":[],"config":{"axis":"z","position":1.0},"skipCache":true}"#;
        let (status, text) = post(test_app().await, "/api/v1/drawing", body.to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(text.contains("NO_MESHES"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (status, text) = post(test_app().await, "/api/v1/drawing", "{".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.contains("INVALID_REQUEST"));
    }

    #[tokio::test]
    async fn test_rules_import_discards_malformed() {
        let body = r#"[
            {"id": "a", "name": "A", "rules": []},
            {"id": "", "name": "nameless", "rules": []},
            {"id": "b", "name": "B"}
        ]"#;
        let (status, text) = post(test_app().await, "/api/v1/rules/import", body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["discarded"], 2);
        assert_eq!(json["presets"].as_array().unwrap().len(), 1);
    }
}
