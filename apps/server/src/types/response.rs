// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use ifc_lite_drawing::{Drawing, GraphicOverridePreset, GraphicStyle, HatchResult};
use serde::{Deserialize, Serialize};

/// Generated drawing with everything a renderer needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingResponse {
    /// Cache key for this result (SHA256 of the request body).
    pub cache_key: String,
    pub drawing: Drawing,
    /// One entry per cut polygon, in the same order.
    pub hatches: Vec<HatchResult>,
    /// Resolved style of every element that appears in the drawing.
    pub styles: Vec<EntityStyle>,
    pub stats: DrawingStats,
}

/// Resolved style of one element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStyle {
    pub entity_id: u32,
    pub model_index: usize,
    pub ifc_type: String,
    pub style: GraphicStyle,
    /// Ids of the rules that matched, in evaluation order.
    pub matched_rules: Vec<String>,
}

/// Processing statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingStats {
    pub input_meshes: usize,
    pub input_triangles: usize,
    pub cut_polygons: usize,
    pub lines: usize,
    pub hatch_lines: usize,
    /// Time spent cutting and projecting (ms).
    pub generation_time_ms: u64,
    /// Time spent on style resolution and hatching (ms).
    pub styling_time_ms: u64,
    /// Total processing time (ms).
    pub total_time_ms: u64,
    /// Whether result was from cache.
    pub from_cache: bool,
}

/// Result of a rule/preset import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesImportResponse {
    pub presets: Vec<GraphicOverridePreset>,
    /// Presets and rules dropped as malformed.
    pub discarded: usize,
}

/// Built-in presets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetListResponse {
    pub presets: Vec<GraphicOverridePreset>,
}
