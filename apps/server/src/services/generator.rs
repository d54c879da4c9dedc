// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drawing generation service: cut, style, hatch, and SVG export.
//!
//! Everything here is CPU-bound and runs on the blocking pool.

use crate::error::ApiError;
use crate::types::{DrawingRequest, DrawingResponse, DrawingStats, EntityStyle};
use ifc_lite_drawing::style::builtin_preset;
use ifc_lite_drawing::{
    export_svg, generate, generate_hatches, Drawing, EntityRef, GenerateOptions, GraphicOverrideRule, HatchResult,
    StyleResolver, StyleSource,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

struct Generated {
    drawing: Drawing,
    hatches: Vec<HatchResult>,
    resolver: StyleResolver,
    stats: DrawingStats,
}

/// Preset rules followed by the request's own rules
fn rule_set(request: &DrawingRequest) -> Result<Vec<GraphicOverrideRule>, ApiError> {
    let mut rules = match &request.preset {
        Some(id) => builtin_preset(id).ok_or_else(|| ApiError::UnknownPreset(id.clone()))?.rules,
        None => Vec::new(),
    };
    rules.extend(request.rules.iter().cloned());
    Ok(rules)
}

fn run(request: &DrawingRequest) -> Result<Generated, ApiError> {
    let total_start = Instant::now();
    let rules = rule_set(request)?;
    let resolver = StyleResolver::new(&rules, Arc::new(request.model_data.clone()));

    let options = GenerateOptions {
        merge_lines: request.merge_lines,
        ..GenerateOptions::default()
    };
    let generation_start = Instant::now();
    let drawing = generate(&request.meshes, &request.config, &options)?;
    let generation_time_ms = generation_start.elapsed().as_millis() as u64;

    let styling_start = Instant::now();
    let hatches = generate_hatches(&drawing.cut_polygons, drawing.config.scale, |cut| {
        resolver.hatch_for(cut)
    });
    let styling_time_ms = styling_start.elapsed().as_millis() as u64;

    let stats = DrawingStats {
        input_meshes: request.meshes.len(),
        input_triangles: request.meshes.iter().map(|m| m.indices.len() / 3).sum(),
        cut_polygons: drawing.cut_polygons.len(),
        lines: drawing.lines.len(),
        hatch_lines: hatches.iter().map(|h| h.lines.len()).sum(),
        generation_time_ms,
        styling_time_ms,
        total_time_ms: total_start.elapsed().as_millis() as u64,
        from_cache: false,
    };

    tracing::info!(
        cut_polygons = stats.cut_polygons,
        lines = stats.lines,
        hatch_lines = stats.hatch_lines,
        rules = resolver.rule_count(),
        total_ms = stats.total_time_ms,
        "Drawing generated"
    );

    Ok(Generated {
        drawing,
        hatches,
        resolver,
        stats,
    })
}

/// Resolved style of every element in the drawing, ordered by (model, entity)
fn entity_styles(drawing: &Drawing, resolver: &StyleResolver) -> Vec<EntityStyle> {
    let mut entities: BTreeMap<(usize, u32), &str> = BTreeMap::new();
    for cut in &drawing.cut_polygons {
        entities.entry((cut.model_index, cut.entity_id)).or_insert(&cut.ifc_type);
    }
    for line in &drawing.lines {
        entities.entry((line.model_index, line.entity_id)).or_insert(&line.ifc_type);
    }

    entities
        .into_iter()
        .map(|((model_index, entity_id), ifc_type)| {
            let resolved = resolver.resolve(&EntityRef {
                entity_id,
                ifc_type,
                model_index,
            });
            EntityStyle {
                entity_id,
                model_index,
                ifc_type: ifc_type.to_string(),
                style: resolved.style,
                matched_rules: resolved.matched_rules,
            }
        })
        .collect()
}

/// Generate a drawing with hatches and resolved styles.
pub fn generate_drawing(request: &DrawingRequest, cache_key: String) -> Result<DrawingResponse, ApiError> {
    let Generated {
        drawing,
        hatches,
        resolver,
        stats,
    } = run(request)?;
    let styles = entity_styles(&drawing, &resolver);
    Ok(DrawingResponse {
        cache_key,
        drawing,
        hatches,
        styles,
        stats,
    })
}

/// Generate a drawing and render it to SVG.
pub fn render_svg(request: &DrawingRequest) -> Result<String, ApiError> {
    let generated = run(request)?;
    Ok(export_svg(
        &generated.drawing,
        &generated.resolver,
        &generated.hatches,
        &request.render,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> DrawingRequest {
        serde_json::from_str(json).unwrap()
    }

    fn wall_request(extra: &str) -> DrawingRequest {
        let wall = ifc_lite_drawing::box_mesh(
            42,
            "IfcWall",
            ifc_lite_drawing::Point3::new(0.0, 0.0, 0.0),
            ifc_lite_drawing::Point3::new(4.0, 0.2, 2.8),
        );
        let meshes = serde_json::to_string(&vec![wall]).unwrap();
        request(&format!(
            r#"{{"meshes":{meshes},"config":{{"axis":"z","position":1.4}}{extra}}}"#
        ))
    }

    #[test]
    fn test_generate_drawing_with_styles() {
        let response = generate_drawing(&wall_request(""), "key".into()).unwrap();
        assert_eq!(response.drawing.cut_polygons.len(), 1);
        assert_eq!(response.hatches.len(), 1);
        assert_eq!(response.styles.len(), 1);
        assert_eq!(response.styles[0].entity_id, 42);
        assert!(response.styles[0].matched_rules.is_empty());
        assert_eq!(response.stats.input_triangles, 12);
        assert!(!response.stats.from_cache);
    }

    #[test]
    fn test_request_rules_apply() {
        let rules = r##","rules":[{"id":"red","name":"Red walls","priority":1,
            "criteria":{"type":"ifcType","ifcType":"IfcWall","includeSubtypes":true},
            "style":{"fillColor":"#ff0000"}}]"##;
        let response = generate_drawing(&wall_request(rules), "key".into()).unwrap();
        assert_eq!(response.styles[0].matched_rules, vec!["red".to_string()]);
        assert_eq!(response.styles[0].style.fill_color.to_hex_rgb(), "#ff0000");
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        let result = generate_drawing(&wall_request(r#","preset":"no-such-preset""#), "key".into());
        assert!(matches!(result, Err(ApiError::UnknownPreset(_))));
    }

    #[test]
    fn test_empty_meshes_error() {
        let result = generate_drawing(&request(r#"{"meshes":[],"config":{"axis":"z","position":1.0}}"#), "k".into());
        assert!(matches!(result, Err(ApiError::Drawing(ifc_lite_drawing::Error::NoMeshes))));
    }

    #[test]
    fn test_render_svg() {
        let svg = render_svg(&wall_request("")).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("fill-rule=\"evenodd\""));
    }
}
