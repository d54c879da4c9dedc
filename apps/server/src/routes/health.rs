// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service information and health check.

use axum::Json;
use serde::Serialize;

const SERVICE: &str = "ifc-lite-drawing-server";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// (method, path, description)
const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/v1/health", "Health check"),
    ("POST", "/api/v1/drawing", "Cut polygons, lines, hatches and resolved styles as JSON"),
    ("POST", "/api/v1/drawing/svg", "Rendered drawing as SVG"),
    ("GET", "/api/v1/presets", "Built-in graphic override presets"),
    ("POST", "/api/v1/rules/import", "Validate imported presets, dropping malformed entries"),
    ("GET", "/api/v1/cache/:key", "Drawing generated earlier under a cache key"),
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Threads available to cutting and hatching
    pub worker_threads: usize,
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<Endpoint>,
}

/// GET /api/v1/health
pub async fn check() -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: SERVICE,
        version: VERSION,
        worker_threads: rayon::current_num_threads(),
    })
}

/// GET /
pub async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE,
        version: VERSION,
        description: "Plan and section drawings from triangulated IFC geometry",
        endpoints: ENDPOINTS
            .iter()
            .map(|&(method, path, description)| Endpoint {
                method,
                path,
                description,
            })
            .collect(),
    })
}
