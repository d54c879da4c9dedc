// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in presets and JSON import/export of rules and presets
//!
//! Import is lenient: malformed entries are logged and dropped, the rest of
//! the document is still accepted. Only a document that isn't JSON at all,
//! or has the wrong top-level shape, is an error.

use super::color::Color;
use super::criteria::Criteria;
use super::graphic::PartialGraphicStyle;
use super::rules::{GraphicOverridePreset, GraphicOverrideRule};
use crate::error::{Error, Result};
use crate::hatch::HatchPattern;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Outcome of a preset import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetImport {
    pub presets: Vec<GraphicOverridePreset>,
    /// Presets and rules dropped as malformed
    pub discarded: usize,
}

/// Outcome of a rule import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleImport {
    pub rules: Vec<GraphicOverrideRule>,
    pub discarded: usize,
}

fn non_empty_str<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn parse_rule(item: &Value) -> std::result::Result<GraphicOverrideRule, String> {
    let id = non_empty_str(item, "id").ok_or("rule without a non-empty id")?;
    if non_empty_str(item, "name").is_none() {
        return Err(format!("rule '{id}' without a non-empty name"));
    }
    if !item.get("criteria").is_some_and(Value::is_object) {
        return Err(format!("rule '{id}' without criteria object"));
    }
    serde_json::from_value(item.clone()).map_err(|e| format!("rule '{id}': {e}"))
}

/// Accept the well-formed rules of a list, counting the rest
fn collect_rules(items: &[Value]) -> (Vec<GraphicOverrideRule>, usize) {
    let mut rules = Vec::with_capacity(items.len());
    let mut discarded = 0;
    for item in items {
        match parse_rule(item) {
            Ok(rule) => rules.push(rule),
            Err(reason) => {
                warn!(reason = %reason, "Discarding malformed override rule");
                discarded += 1;
            }
        }
    }
    (rules, discarded)
}

/// Import rules from a JSON array (or an object with a `rules` array)
pub fn import_rules(json: &str) -> Result<RuleImport> {
    let doc: Value = serde_json::from_str(json)?;
    let items = match &doc {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("rules")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Rules("expected an array of rules".to_string()))?,
        _ => return Err(Error::Rules("expected an array of rules".to_string())),
    };
    let (rules, discarded) = collect_rules(items);
    Ok(RuleImport { rules, discarded })
}

/// Import presets from a JSON array, a single preset object, or an object
/// with a `presets` array
pub fn import_presets(json: &str) -> Result<PresetImport> {
    let doc: Value = serde_json::from_str(json)?;
    let single;
    let items: &[Value] = match &doc {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("presets").and_then(Value::as_array) {
            Some(items) => items,
            None => {
                single = [doc.clone()];
                &single
            }
        },
        _ => return Err(Error::Rules("expected a preset or an array of presets".to_string())),
    };

    let mut result = PresetImport::default();
    for item in items {
        let (Some(id), Some(name)) = (non_empty_str(item, "id"), non_empty_str(item, "name")) else {
            warn!("Discarding preset without a non-empty id and name");
            result.discarded += 1;
            continue;
        };
        let Some(rule_items) = item.get("rules").and_then(Value::as_array) else {
            warn!(preset = id, "Discarding preset without a rules array");
            result.discarded += 1;
            continue;
        };
        let (rules, discarded) = collect_rules(rule_items);
        result.discarded += discarded;
        result.presets.push(GraphicOverridePreset {
            id: id.to_string(),
            name: name.to_string(),
            description: item
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            rules,
        });
    }
    Ok(result)
}

pub fn export_presets(presets: &[GraphicOverridePreset]) -> Result<String> {
    Ok(serde_json::to_string_pretty(presets)?)
}

pub fn export_rules(rules: &[GraphicOverrideRule]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rules)?)
}

fn style() -> PartialGraphicStyle {
    PartialGraphicStyle::default()
}

fn type_rule(id: &str, name: &str, priority: i32, ifc_type: &str, style: PartialGraphicStyle) -> GraphicOverrideRule {
    GraphicOverrideRule::new(id, name, priority, Criteria::ifc_type(ifc_type, true), style)
}

fn architectural() -> GraphicOverridePreset {
    let poche = Color::rgb(0x40, 0x40, 0x40);
    GraphicOverridePreset {
        id: "architectural".to_string(),
        name: "Architectural".to_string(),
        description: Some("Heavy cut walls, concrete structure, light openings".to_string()),
        rules: vec![
            type_rule(
                "arch-walls",
                "Walls",
                10,
                "IfcWall",
                PartialGraphicStyle {
                    fill_color: Some(poche),
                    line_weight: Some(0.5),
                    hatch_pattern: Some(HatchPattern::Diagonal),
                    hatch_color: Some(Color::WHITE),
                    ..style()
                },
            ),
            type_rule(
                "arch-slabs",
                "Slabs",
                10,
                "IfcSlab",
                PartialGraphicStyle {
                    hatch_pattern: Some(HatchPattern::Concrete),
                    line_weight: Some(0.5),
                    ..style()
                },
            ),
            type_rule(
                "arch-doors",
                "Doors",
                20,
                "IfcDoor",
                PartialGraphicStyle {
                    line_weight: Some(0.25),
                    hatch_pattern: Some(HatchPattern::None),
                    ..style()
                },
            ),
            type_rule(
                "arch-windows",
                "Windows",
                20,
                "IfcWindow",
                PartialGraphicStyle {
                    line_weight: Some(0.18),
                    opacity: Some(0.6),
                    hatch_pattern: Some(HatchPattern::None),
                    ..style()
                },
            ),
            type_rule(
                "arch-furniture",
                "Furniture",
                20,
                "IfcFurnishingElement",
                PartialGraphicStyle {
                    line_weight: Some(0.13),
                    stroke_color: Some(Color::rgb(0x60, 0x60, 0x60)),
                    ..style()
                },
            ),
        ],
    }
}

fn structural() -> GraphicOverridePreset {
    let faded = PartialGraphicStyle {
        fill_color: Some(Color::rgb(0xee, 0xee, 0xee)),
        stroke_color: Some(Color::rgb(0xaa, 0xaa, 0xaa)),
        line_weight: Some(0.13),
        opacity: Some(0.3),
        hatch_pattern: Some(HatchPattern::None),
        ..style()
    };
    let structure = PartialGraphicStyle {
        fill_color: Some(Color::rgb(0x80, 0x80, 0x80)),
        line_weight: Some(0.5),
        opacity: Some(1.0),
        hatch_pattern: Some(HatchPattern::Concrete),
        ..style()
    };
    let load_bearing = Criteria::Property {
        pset: "Pset_WallCommon".to_string(),
        name: "LoadBearing".to_string(),
        operator: super::criteria::Operator::Equals,
        value: Some("true".to_string()),
    };
    GraphicOverridePreset {
        id: "structural".to_string(),
        name: "Structural".to_string(),
        description: Some("Load-bearing elements emphasised, everything else faded".to_string()),
        rules: vec![
            type_rule("struct-fade", "Non-structural", 0, "IfcProduct", faded),
            GraphicOverrideRule::new(
                "struct-frame",
                "Frame",
                10,
                Criteria::Or {
                    criteria: ["IfcColumn", "IfcBeam", "IfcSlab", "IfcFooting", "IfcPile", "IfcMember"]
                        .into_iter()
                        .map(|t| Criteria::ifc_type(t, true))
                        .collect(),
                },
                structure.clone(),
            ),
            GraphicOverrideRule::new(
                "struct-walls",
                "Load-bearing walls",
                10,
                Criteria::And {
                    criteria: vec![Criteria::ifc_type("IfcWall", true), load_bearing],
                },
                structure,
            ),
        ],
    }
}

fn monochrome() -> GraphicOverridePreset {
    GraphicOverridePreset {
        id: "monochrome".to_string(),
        name: "Monochrome".to_string(),
        description: Some("Black line work on white, hatches kept".to_string()),
        rules: vec![type_rule(
            "mono-all",
            "All elements",
            0,
            "IfcProduct",
            PartialGraphicStyle {
                fill_color: Some(Color::WHITE),
                stroke_color: Some(Color::BLACK),
                hatch_color: Some(Color::BLACK),
                opacity: Some(1.0),
                ..style()
            },
        )],
    }
}

/// Presets shipped with the library
pub fn builtin_presets() -> Vec<GraphicOverridePreset> {
    vec![architectural(), structural(), monochrome()]
}

/// Built-in preset by id
pub fn builtin_preset(id: &str) -> Option<GraphicOverridePreset> {
    builtin_presets().into_iter().find(|p| p.id == id)
}
