// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hatch pattern generation for cut polygons
//!
//! Spacing is given in paper millimetres and converted to model units with
//! the drawing scale, so the printed density does not depend on the scale.
//! Scanlines are anchored at integer multiples of the spacing in drawing
//! coordinates; adjacent polygons with the same pattern line up and the
//! output for a given polygon never depends on anything but its inputs.

use crate::polygon::{clip_segment, line_intervals, point_in_polygon};
use crate::section::paper_mm_to_model;
use crate::types::{CutPolygon, Line2D, Polygon2D};
use nalgebra::{Point2, Vector2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on scanlines per pattern family for one polygon
const MAX_FAMILY_LINES: f64 = 10_000.0;

/// Upper bound on dot markers for one polygon
const MAX_MARKERS: f64 = 250_000.0;

/// Named hatch patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HatchPattern {
    #[default]
    None,
    /// Expressed through the fill colour; emits no lines
    Solid,
    Diagonal,
    CrossHatch,
    Dots,
    Concrete,
    Brick,
    Insulation,
}

impl HatchPattern {
    pub const ALL: [HatchPattern; 8] = [
        HatchPattern::None,
        HatchPattern::Solid,
        HatchPattern::Diagonal,
        HatchPattern::CrossHatch,
        HatchPattern::Dots,
        HatchPattern::Concrete,
        HatchPattern::Brick,
        HatchPattern::Insulation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HatchPattern::None => "none",
            HatchPattern::Solid => "solid",
            HatchPattern::Diagonal => "diagonal",
            HatchPattern::CrossHatch => "cross-hatch",
            HatchPattern::Dots => "dots",
            HatchPattern::Concrete => "concrete",
            HatchPattern::Brick => "brick",
            HatchPattern::Insulation => "insulation",
        }
    }

    /// Look up a pattern by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether the pattern produces hatch lines or markers
    #[inline]
    pub fn emits_lines(self) -> bool {
        !matches!(self, HatchPattern::None | HatchPattern::Solid)
    }

    /// Canonical spacing in paper millimetres
    pub fn default_spacing_mm(self) -> f64 {
        match self {
            HatchPattern::None | HatchPattern::Solid => 0.0,
            HatchPattern::Diagonal | HatchPattern::CrossHatch => 3.0,
            HatchPattern::Dots => 2.0,
            HatchPattern::Concrete | HatchPattern::Insulation => 4.0,
            HatchPattern::Brick => 2.0,
        }
    }

    /// Canonical primary angle in degrees
    pub fn default_angle(self) -> f64 {
        match self {
            HatchPattern::Diagonal | HatchPattern::CrossHatch | HatchPattern::Concrete => 45.0,
            _ => 0.0,
        }
    }

    /// Canonical secondary angle in degrees (cross-hatch only)
    pub fn default_secondary_angle(self) -> f64 {
        match self {
            HatchPattern::CrossHatch => 135.0,
            other => other.default_angle() + 90.0,
        }
    }
}

/// Resolved pattern parameters for one polygon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HatchParams {
    pub pattern: HatchPattern,
    /// Paper millimetres between adjacent lines
    pub spacing: f64,
    /// Degrees, counter-clockwise from the drawing x axis
    pub angle: f64,
    pub secondary_angle: f64,
}

impl HatchParams {
    /// Parameters with the pattern's canonical spacing and angles
    pub fn for_pattern(pattern: HatchPattern) -> Self {
        Self {
            pattern,
            spacing: pattern.default_spacing_mm(),
            angle: pattern.default_angle(),
            secondary_angle: pattern.default_secondary_angle(),
        }
    }

    pub fn none() -> Self {
        Self::for_pattern(HatchPattern::None)
    }
}

/// Hatch segment tagged with its source element.
/// Dot markers are zero-length segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HatchLine {
    pub line: Line2D,
    pub entity_id: u32,
    pub ifc_type: String,
    pub model_index: usize,
}

/// Hatch output for one cut polygon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HatchResult {
    pub lines: Vec<HatchLine>,
}

impl HatchResult {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Generate hatches for every polygon, one result per polygon in input order.
///
/// `style_for_polygon` supplies the pattern parameters, typically from the
/// style resolver.
pub fn generate_hatches<F>(cut_polygons: &[CutPolygon], scale: f64, style_for_polygon: F) -> Vec<HatchResult>
where
    F: Fn(&CutPolygon) -> HatchParams + Sync,
{
    cut_polygons
        .par_iter()
        .map(|cut| {
            let params = style_for_polygon(cut);
            let lines = hatch_polygon(&cut.polygon, &params, scale)
                .into_iter()
                .map(|line| HatchLine {
                    line,
                    entity_id: cut.entity_id,
                    ifc_type: cut.ifc_type.clone(),
                    model_index: cut.model_index,
                })
                .collect();
            HatchResult { lines }
        })
        .collect()
}

/// Hatch segments for one polygon, clipped to its outer ring minus holes
pub fn hatch_polygon(polygon: &Polygon2D, params: &HatchParams, scale: f64) -> Vec<Line2D> {
    if !params.pattern.emits_lines() {
        return Vec::new();
    }
    let spacing = paper_mm_to_model(params.spacing, scale);
    if !spacing.is_finite() || spacing <= 0.0 || !polygon.bounds().is_valid() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    match params.pattern {
        HatchPattern::None | HatchPattern::Solid => {}
        HatchPattern::Diagonal => {
            parallel_family(polygon, spacing, params.angle, &mut lines);
        }
        HatchPattern::CrossHatch => {
            parallel_family(polygon, spacing, params.angle, &mut lines);
            parallel_family(polygon, spacing, params.secondary_angle, &mut lines);
        }
        HatchPattern::Dots => {
            dot_grid(polygon, spacing, params.angle, 0.0, &mut lines);
        }
        HatchPattern::Concrete => {
            // Strokes with aggregate dots halfway between them
            parallel_family(polygon, spacing, params.angle, &mut lines);
            dot_grid(polygon, spacing, params.angle, 0.5, &mut lines);
        }
        HatchPattern::Brick => {
            brick_courses(polygon, spacing, params.angle, &mut lines);
        }
        HatchPattern::Insulation => {
            zigzag_bands(polygon, spacing, params.angle, &mut lines);
        }
    }
    lines
}

/// Unit direction and left normal for an angle in degrees
#[inline]
fn basis(angle_deg: f64) -> (Vector2<f64>, Vector2<f64>) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    (Vector2::new(cos, sin), Vector2::new(-sin, cos))
}

/// Range of `axis · p` over the polygon bounds
fn projected_range(polygon: &Polygon2D, axis: &Vector2<f64>) -> (f64, f64) {
    let b = polygon.bounds();
    let corners = [
        Point2::new(b.min.x, b.min.y),
        Point2::new(b.max.x, b.min.y),
        Point2::new(b.max.x, b.max.y),
        Point2::new(b.min.x, b.max.y),
    ];
    corners
        .iter()
        .map(|c| axis.dot(&c.coords))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Integer multiples of `spacing` (shifted by `phase` spacings) inside `[lo, hi]`
fn grid_steps(lo: f64, hi: f64, spacing: f64, phase: f64) -> std::ops::RangeInclusive<i64> {
    let first = (lo / spacing - phase).ceil() as i64;
    let last = (hi / spacing - phase).floor() as i64;
    first..=last
}

fn too_dense(count: f64, limit: f64, what: &str) -> bool {
    if count > limit {
        debug!(count, limit, pattern = what, "Hatch too dense at this scale, skipped");
        true
    } else {
        false
    }
}

fn parallel_family(polygon: &Polygon2D, spacing: f64, angle_deg: f64, out: &mut Vec<Line2D>) {
    let (dir, normal) = basis(angle_deg);
    let (lo, hi) = projected_range(polygon, &normal);
    if too_dense((hi - lo) / spacing, MAX_FAMILY_LINES, "parallel") {
        return;
    }
    for k in grid_steps(lo, hi, spacing, 0.0) {
        let anchor = Point2::from(normal * (k as f64 * spacing));
        for (t0, t1) in line_intervals(polygon, &anchor, &dir) {
            out.push(Line2D::new(anchor + dir * t0, anchor + dir * t1));
        }
    }
}

fn dot_grid(polygon: &Polygon2D, spacing: f64, angle_deg: f64, phase: f64, out: &mut Vec<Line2D>) {
    let (dir, normal) = basis(angle_deg);
    let (n_lo, n_hi) = projected_range(polygon, &normal);
    let (d_lo, d_hi) = projected_range(polygon, &dir);
    let count = ((n_hi - n_lo) / spacing + 1.0) * ((d_hi - d_lo) / spacing + 1.0);
    if too_dense(count, MAX_MARKERS, "dots") {
        return;
    }
    for k in grid_steps(n_lo, n_hi, spacing, phase) {
        for m in grid_steps(d_lo, d_hi, spacing, phase) {
            let p = Point2::from(
                normal * ((k as f64 + phase) * spacing) + dir * ((m as f64 + phase) * spacing),
            );
            if point_in_polygon(&p, polygon) {
                out.push(Line2D::new(p, p));
            }
        }
    }
}

/// Courses along the angle with staggered head joints every two spacings
fn brick_courses(polygon: &Polygon2D, spacing: f64, angle_deg: f64, out: &mut Vec<Line2D>) {
    parallel_family(polygon, spacing, angle_deg, out);

    let (dir, normal) = basis(angle_deg);
    let (n_lo, n_hi) = projected_range(polygon, &normal);
    let (d_lo, d_hi) = projected_range(polygon, &dir);
    let joint_pitch = spacing * 2.0;
    let count = ((n_hi - n_lo) / spacing) * ((d_hi - d_lo) / joint_pitch);
    if too_dense(count, MAX_MARKERS, "brick") {
        return;
    }
    for k in grid_steps(n_lo - spacing, n_hi, spacing, 0.0) {
        let stagger = if k.rem_euclid(2) == 0 { 0.0 } else { 0.5 };
        let base = normal * (k as f64 * spacing);
        for m in grid_steps(d_lo, d_hi, joint_pitch, stagger) {
            let along = dir * ((m as f64 + stagger) * joint_pitch);
            let a = Point2::from(base + along);
            let b = a + normal * spacing;
            for (p, q) in clip_segment(polygon, &a, &b) {
                out.push(Line2D::new(p, q));
            }
        }
    }
}

/// Batt insulation: a zigzag spanning each band between two scanlines
fn zigzag_bands(polygon: &Polygon2D, spacing: f64, angle_deg: f64, out: &mut Vec<Line2D>) {
    let (dir, normal) = basis(angle_deg);
    let (n_lo, n_hi) = projected_range(polygon, &normal);
    let (d_lo, d_hi) = projected_range(polygon, &dir);
    let half = spacing * 0.5;
    let count = ((n_hi - n_lo) / spacing + 1.0) * ((d_hi - d_lo) / half + 1.0);
    if too_dense(count, MAX_MARKERS, "insulation") {
        return;
    }
    for k in grid_steps(n_lo - spacing, n_hi, spacing, 0.0) {
        let low = normal * (k as f64 * spacing);
        let high = normal * ((k + 1) as f64 * spacing);
        for m in grid_steps(d_lo - half, d_hi, half, 0.0) {
            let (from, to) = if m.rem_euclid(2) == 0 { (low, high) } else { (high, low) };
            let a = Point2::from(from + dir * (m as f64 * half));
            let b = Point2::from(to + dir * ((m + 1) as f64 * half));
            for (p, q) in clip_segment(polygon, &a, &b) {
                out.push(Line2D::new(p, q));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::point_in_ring;
    use approx::assert_relative_eq;

    fn rect_at(x0: f64, y0: f64, w: f64, h: f64) -> Polygon2D {
        Polygon2D::new(vec![
            Point2::new(x0, y0),
            Point2::new(x0 + w, y0),
            Point2::new(x0 + w, y0 + h),
            Point2::new(x0, y0 + h),
        ])
    }

    fn rect(w: f64, h: f64) -> Polygon2D {
        rect_at(0.0, 0.0, w, h)
    }

    fn params(pattern: HatchPattern, spacing: f64, angle: f64) -> HatchParams {
        HatchParams {
            pattern,
            spacing,
            angle,
            secondary_angle: angle + 90.0,
        }
    }

    #[test]
    fn test_pattern_names_round_trip() {
        for p in HatchPattern::ALL {
            assert_eq!(HatchPattern::from_name(p.name()), Some(p));
        }
        assert_eq!(HatchPattern::from_name("Cross-Hatch"), Some(HatchPattern::CrossHatch));
        assert_eq!(HatchPattern::from_name("herringbone"), None);
        let json = serde_json::to_string(&HatchPattern::CrossHatch).unwrap();
        assert_eq!(json, "\"cross-hatch\"");
    }

    #[test]
    fn test_none_and_solid_emit_nothing() {
        let poly = rect(10.0, 10.0);
        assert!(hatch_polygon(&poly, &params(HatchPattern::None, 1.0, 0.0), 100.0).is_empty());
        assert!(hatch_polygon(&poly, &params(HatchPattern::Solid, 1.0, 0.0), 100.0).is_empty());
    }

    #[test]
    fn test_horizontal_lines_anchored_to_grid() {
        // 10 mm at 1:100 is 1 m; y from 0.5 to 4.5 gives lines at y = 1..4
        let poly = rect_at(0.0, 0.5, 10.0, 4.0);
        let lines = hatch_polygon(&poly, &params(HatchPattern::Diagonal, 10.0, 0.0), 100.0);
        assert_eq!(lines.len(), 4);
        for (i, line) in lines.iter().enumerate() {
            assert_relative_eq!(line.start.y, (i + 1) as f64, epsilon = 1e-9);
            assert_relative_eq!(line.length(), 10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_hatch_avoids_hole() {
        let mut poly = rect(10.0, 10.0);
        let hole = vec![
            Point2::new(3.0, 3.0),
            Point2::new(3.0, 7.0),
            Point2::new(7.0, 7.0),
            Point2::new(7.0, 3.0),
        ];
        poly.holes.push(hole.clone());

        let lines = hatch_polygon(&poly, &params(HatchPattern::CrossHatch, 5.0, 30.0), 100.0);
        assert!(!lines.is_empty());
        for line in &lines {
            let mid = line.midpoint();
            assert!(point_in_ring(&mid, &poly.outer));
            assert!(!point_in_ring(&mid, &hole));
        }
    }

    #[test]
    fn test_dots_are_markers_inside() {
        let poly = rect_at(0.25, 0.25, 2.0, 2.0);
        let lines = hatch_polygon(&poly, &params(HatchPattern::Dots, 5.0, 0.0), 100.0);
        // 0.5 m grid from 0.5 to 2.0 in both directions
        assert_eq!(lines.len(), 16);
        assert!(lines.iter().all(|l| l.length() == 0.0));
    }

    #[test]
    fn test_scale_invariance() {
        let poly = rect(20.0, 20.0);
        let at_100 = hatch_polygon(&poly, &params(HatchPattern::Diagonal, 3.0, 45.0), 100.0);
        let at_200 = hatch_polygon(&poly, &params(HatchPattern::Diagonal, 1.5, 45.0), 200.0);
        assert_eq!(at_100, at_200);

        let coarse = hatch_polygon(&poly, &params(HatchPattern::Diagonal, 3.0, 45.0), 200.0);
        let ratio = at_100.len() as f64 / coarse.len() as f64;
        assert!((ratio - 2.0).abs() < 0.1, "ratio {ratio}");
    }

    #[test]
    fn test_material_patterns_stay_inside() {
        let poly = rect(3.0, 2.0);
        for pattern in [HatchPattern::Concrete, HatchPattern::Brick, HatchPattern::Insulation] {
            let lines = hatch_polygon(&poly, &HatchParams::for_pattern(pattern), 50.0);
            assert!(!lines.is_empty(), "{pattern:?}");
            for line in &lines {
                for p in [line.start, line.end] {
                    assert!(p.x >= -1e-9 && p.x <= 3.0 + 1e-9 && p.y >= -1e-9 && p.y <= 2.0 + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_generate_hatches_is_deterministic_and_ordered() {
        let cuts: Vec<CutPolygon> = (0..8)
            .map(|i| CutPolygon {
                entity_id: i,
                ifc_type: "IfcWall".to_string(),
                model_index: 0,
                polygon: rect(2.0 + i as f64, 1.0),
            })
            .collect();
        let style = |_: &CutPolygon| HatchParams::for_pattern(HatchPattern::Diagonal);
        let first = generate_hatches(&cuts, 50.0, style);
        let second = generate_hatches(&cuts, 50.0, style);
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
        for (i, result) in first.iter().enumerate() {
            assert!(result.lines.iter().all(|l| l.entity_id == i as u32));
        }
    }

    #[test]
    fn test_too_dense_is_skipped() {
        let poly = rect(1000.0, 1000.0);
        let lines = hatch_polygon(&poly, &params(HatchPattern::Diagonal, 0.01, 0.0), 1.0);
        assert!(lines.is_empty());
    }
}
