// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drawing generation endpoints.

use crate::error::ApiError;
use crate::services::{cache::DiskCache, generate_drawing, render_svg};
use crate::types::{DrawingRequest, DrawingResponse};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";

fn parse_request(body: &[u8]) -> Result<DrawingRequest, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn svg_response(svg: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], svg).into_response()
}

/// Store a result without holding up the response.
fn cache_in_background(cache: &DiskCache, key: String, data: Vec<u8>) {
    let cache = cache.clone();
    tokio::spawn(async move {
        if let Err(e) = cache.put_bytes(&key, &data).await {
            tracing::error!(error = %e, "Failed to cache result");
        }
    });
}

/// POST /api/v1/drawing - Generate a drawing as JSON.
pub async fn create_drawing(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DrawingResponse>, ApiError> {
    let cache_key = DiskCache::generate_key("drawing", &body);
    let request = parse_request(&body)?;

    if !request.skip_cache {
        if let Some(mut cached) = state.cache.get::<DrawingResponse>(&cache_key).await? {
            tracing::info!(cache_key = %cache_key, "Cache HIT");
            cached.stats.from_cache = true;
            return Ok(Json(cached));
        }
    }

    tracing::info!(
        cache_key = %cache_key,
        meshes = request.meshes.len(),
        axis = ?request.config.axis,
        position = request.config.position,
        "Cache MISS - generating"
    );

    let key = cache_key.clone();
    let response = tokio::task::spawn_blocking(move || generate_drawing(&request, key)).await??;

    cache_in_background(&state.cache, cache_key, serde_json::to_vec(&response)?);
    Ok(Json(response))
}

/// POST /api/v1/drawing/svg - Generate a drawing and render it to SVG.
pub async fn create_svg(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let cache_key = DiskCache::generate_key("svg", &body);
    let request = parse_request(&body)?;

    if !request.skip_cache {
        if let Some(svg) = state.cache.get_bytes(&cache_key).await? {
            tracing::info!(cache_key = %cache_key, "Cache HIT");
            return Ok(svg_response(svg));
        }
    }

    let svg = tokio::task::spawn_blocking(move || render_svg(&request)).await??.into_bytes();
    tracing::info!(cache_key = %cache_key, size = svg.len(), "SVG rendered");

    cache_in_background(&state.cache, cache_key, svg.clone());
    Ok(svg_response(svg))
}

/// GET /api/v1/cache/:key - Drawing generated earlier under `key`.
pub async fn cached_drawing(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DrawingResponse>, ApiError> {
    let mut response = state
        .cache
        .get::<DrawingResponse>(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No cached drawing for key {key}")))?;
    response.stats.from_cache = true;
    Ok(Json(response))
}
