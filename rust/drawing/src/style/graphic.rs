// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Visual style records: partial overrides and fully resolved styles

use super::color::Color;
use super::defaults::{
    type_defaults, DEFAULT_HATCH_COLOR, DEFAULT_HATCH_LINE_WEIGHT_MM, DEFAULT_LINE_WEIGHT_MM, DEFAULT_OPACITY,
    DEFAULT_STROKE_COLOR,
};
use crate::hatch::{HatchParams, HatchPattern};
use serde::{Deserialize, Serialize};

/// Fully resolved style of one element. Weights and spacing are paper
/// millimetres, angles degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_weight: f64,
    pub opacity: f64,
    pub hatch_pattern: HatchPattern,
    pub hatch_spacing: f64,
    pub hatch_angle: f64,
    pub hatch_secondary_angle: f64,
    pub hatch_color: Color,
    pub hatch_line_weight: f64,
}

/// Style fields a rule sets explicitly; unset fields fall through
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialGraphicStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hatch_pattern: Option<HatchPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hatch_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hatch_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hatch_secondary_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hatch_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hatch_line_weight: Option<f64>,
}

impl PartialGraphicStyle {
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite every field that `other` sets
    pub fn apply(&mut self, other: &PartialGraphicStyle) {
        fn set<T: Copy>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }
        set(&mut self.fill_color, other.fill_color);
        set(&mut self.stroke_color, other.stroke_color);
        set(&mut self.line_weight, other.line_weight);
        set(&mut self.opacity, other.opacity);
        set(&mut self.hatch_pattern, other.hatch_pattern);
        set(&mut self.hatch_spacing, other.hatch_spacing);
        set(&mut self.hatch_angle, other.hatch_angle);
        set(&mut self.hatch_secondary_angle, other.hatch_secondary_angle);
        set(&mut self.hatch_color, other.hatch_color);
        set(&mut self.hatch_line_weight, other.hatch_line_weight);
    }
}

impl GraphicStyle {
    /// Complete a partial style with the defaults for `ifc_type`.
    ///
    /// Hatch spacing and angles left unset follow the chosen pattern's
    /// canonical values, so a rule that only picks `brick` gets brick spacing.
    pub fn complete(partial: &PartialGraphicStyle, ifc_type: &str) -> Self {
        let defaults = type_defaults(ifc_type);
        let pattern = partial.hatch_pattern.unwrap_or(defaults.hatch_pattern);
        let opacity = partial.opacity.unwrap_or(DEFAULT_OPACITY);
        Self {
            fill_color: partial.fill_color.unwrap_or(defaults.fill_color),
            stroke_color: partial.stroke_color.unwrap_or(DEFAULT_STROKE_COLOR),
            line_weight: partial.line_weight.unwrap_or(DEFAULT_LINE_WEIGHT_MM).max(0.0),
            opacity: if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { DEFAULT_OPACITY },
            hatch_pattern: pattern,
            hatch_spacing: partial.hatch_spacing.unwrap_or(pattern.default_spacing_mm()),
            hatch_angle: partial.hatch_angle.unwrap_or(pattern.default_angle()),
            hatch_secondary_angle: partial
                .hatch_secondary_angle
                .unwrap_or(pattern.default_secondary_angle()),
            hatch_color: partial.hatch_color.unwrap_or(DEFAULT_HATCH_COLOR),
            hatch_line_weight: partial
                .hatch_line_weight
                .unwrap_or(DEFAULT_HATCH_LINE_WEIGHT_MM)
                .max(0.0),
        }
    }

    /// Style of an element no rule applies to
    pub fn for_type(ifc_type: &str) -> Self {
        Self::complete(&PartialGraphicStyle::default(), ifc_type)
    }

    pub fn hatch_params(&self) -> HatchParams {
        HatchParams {
            pattern: self.hatch_pattern,
            spacing: self.hatch_spacing,
            angle: self.hatch_angle,
            secondary_angle: self.hatch_secondary_angle,
        }
    }
}

/// Resolution result: the merged style and the ids of every matched rule in
/// evaluation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStyle {
    pub style: GraphicStyle,
    pub matched_rules: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_is_field_wise() {
        let mut acc = PartialGraphicStyle {
            fill_color: Some(Color::rgb(255, 0, 0)),
            hatch_pattern: Some(HatchPattern::Brick),
            ..Default::default()
        };
        acc.apply(&PartialGraphicStyle {
            stroke_color: Some(Color::rgb(0, 0, 255)),
            ..Default::default()
        });
        assert_eq!(acc.fill_color, Some(Color::rgb(255, 0, 0)));
        assert_eq!(acc.stroke_color, Some(Color::rgb(0, 0, 255)));
        assert_eq!(acc.hatch_pattern, Some(HatchPattern::Brick));
    }

    #[test]
    fn test_pattern_defaults_follow_pattern() {
        let style = GraphicStyle::complete(
            &PartialGraphicStyle {
                hatch_pattern: Some(HatchPattern::Brick),
                opacity: Some(3.0),
                ..Default::default()
            },
            "IfcWall",
        );
        assert_eq!(style.hatch_spacing, 2.0);
        assert_eq!(style.hatch_angle, 0.0);
        assert_eq!(style.opacity, 1.0);
    }

    #[test]
    fn test_partial_serde_skips_unset() {
        let partial = PartialGraphicStyle {
            hatch_pattern: Some(HatchPattern::None),
            ..Default::default()
        };
        let json = serde_json::to_string(&partial).unwrap();
        assert_eq!(json, r#"{"hatchPattern":"none"}"#);
        let back: PartialGraphicStyle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, partial);
    }
}
