// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use ifc_lite_drawing::style::InMemoryModelData;
use ifc_lite_drawing::{GraphicOverrideRule, Mesh, RenderOptions, SectionConfig};
use serde::Deserialize;

/// Body of the drawing endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRequest {
    /// Triangulated model geometry.
    pub meshes: Vec<Mesh>,
    pub config: SectionConfig,

    /// Built-in preset whose rules are evaluated before `rules`.
    #[serde(default)]
    pub preset: Option<String>,

    /// Override rules (any order; evaluated by priority).
    #[serde(default)]
    pub rules: Vec<GraphicOverrideRule>,

    /// Attribute/property/quantity data for non-type criteria, keyed by entity id.
    #[serde(default)]
    pub model_data: InMemoryModelData,

    /// Coalesce colinear overlapping projection lines.
    #[serde(default = "default_merge_lines")]
    pub merge_lines: bool,

    /// Layer toggles for SVG output.
    #[serde(default)]
    pub render: RenderOptions,

    /// Skip cache lookup if true.
    #[serde(default)]
    pub skip_cache: bool,
}

fn default_merge_lines() -> bool {
    true
}
