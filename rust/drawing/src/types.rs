// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drawing data model: cut polygons, classified lines and the assembled drawing

use crate::section::SectionConfig;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// 2D line segment in drawing coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line2D {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Line2D {
    #[inline]
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    #[inline]
    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.start, &self.end)
    }
}

/// Axis-aligned 2D bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2D {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds2D {
    /// Inverted bounds that any point will expand
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Zero-size bounds at the origin, used for empty drawings
    pub fn zero() -> Self {
        Self {
            min: Point2::origin(),
            max: Point2::origin(),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    #[inline]
    pub fn include_point(&mut self, p: &Point2<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether two boxes overlap (touching counts)
    #[inline]
    pub fn intersects(&self, other: &Bounds2D) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Closed polygon with holes, filled with the even-odd rule.
/// The outer ring is counter-clockwise, holes are clockwise.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon2D {
    pub outer: Vec<Point2<f64>>,
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Polygon2D {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Iterate over the outer ring followed by all holes
    pub fn rings(&self) -> impl Iterator<Item = &[Point2<f64>]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    pub fn bounds(&self) -> Bounds2D {
        let mut bounds = Bounds2D::empty();
        for p in &self.outer {
            bounds.include_point(p);
        }
        bounds
    }
}

/// Cross-section of one entity where it crosses the cutting plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutPolygon {
    pub entity_id: u32,
    pub ifc_type: String,
    #[serde(default)]
    pub model_index: usize,
    pub polygon: Polygon2D,
}

/// Line classification used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCategory {
    /// Edge of a cut polygon (rendered through the polygon outline)
    Cut,
    /// Border edge of open geometry in the projection range
    Projection,
    /// Occluded edge
    Hidden,
    /// Outline between front- and back-facing geometry
    Silhouette,
    /// Sharp fold between two visible faces
    Crease,
    /// Where projected geometry meets the far projection limit
    Boundary,
    /// Supplied by annotation layers, never generated here
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Classified line segment of a drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingLine {
    pub line: Line2D,
    pub category: LineCategory,
    pub visibility: Visibility,
    pub entity_id: u32,
    pub ifc_type: String,
    #[serde(default)]
    pub model_index: usize,
    /// Distance behind the cutting plane along the view direction
    pub depth: f64,
}

/// Box enclosing every polygon point and line endpoint (zero box when empty)
pub fn content_bounds(cut_polygons: &[CutPolygon], lines: &[DrawingLine]) -> Bounds2D {
    let mut bounds = Bounds2D::empty();
    for cut in cut_polygons {
        for ring in cut.polygon.rings() {
            for p in ring {
                bounds.include_point(p);
            }
        }
    }
    for line in lines {
        bounds.include_point(&line.line.start);
        bounds.include_point(&line.line.end);
    }
    if bounds.is_valid() {
        bounds
    } else {
        Bounds2D::zero()
    }
}

/// Result of one generation run. Never mutated after it is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub cut_polygons: Vec<CutPolygon>,
    pub lines: Vec<DrawingLine>,
    pub bounds: Bounds2D,
    pub config: SectionConfig,
}

impl Drawing {
    /// Drawing with no content
    pub fn empty(config: SectionConfig) -> Self {
        Self {
            cut_polygons: Vec::new(),
            lines: Vec::new(),
            bounds: Bounds2D::zero(),
            config,
        }
    }

    /// Assemble a drawing, computing bounds over every polygon point and
    /// line endpoint
    pub fn new(cut_polygons: Vec<CutPolygon>, lines: Vec<DrawingLine>, config: SectionConfig) -> Self {
        let bounds = content_bounds(&cut_polygons, &lines);
        Self {
            cut_polygons,
            lines,
            bounds,
            config,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cut_polygons.is_empty() && self.lines.is_empty()
    }

    /// Lines drawn as line work (everything except cut edges, which are
    /// rendered through the polygon outlines)
    pub fn render_lines(&self) -> impl Iterator<Item = &DrawingLine> {
        self.lines.iter().filter(|l| l.category != LineCategory::Cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64, category: LineCategory) -> DrawingLine {
        DrawingLine {
            line: Line2D::new(Point2::new(x0, y0), Point2::new(x1, y1)),
            category,
            visibility: Visibility::Visible,
            entity_id: 1,
            ifc_type: "IfcWall".to_string(),
            model_index: 0,
            depth: 0.0,
        }
    }

    #[test]
    fn test_drawing_bounds_cover_polygons_and_lines() {
        let cut = CutPolygon {
            entity_id: 1,
            ifc_type: "IfcWall".to_string(),
            model_index: 0,
            polygon: Polygon2D::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(2.0, 1.0),
            ]),
        };
        let lines = vec![line(-1.0, 0.5, 0.0, 3.0, LineCategory::Silhouette)];
        let drawing = Drawing::new(vec![cut], lines, SectionConfig::plan(1.0));
        assert_eq!(drawing.bounds.min, Point2::new(-1.0, 0.0));
        assert_eq!(drawing.bounds.max, Point2::new(2.0, 3.0));
    }

    #[test]
    fn test_empty_drawing_has_zero_bounds() {
        let drawing = Drawing::new(Vec::new(), Vec::new(), SectionConfig::plan(1.0));
        assert!(drawing.is_empty());
        assert_eq!(drawing.bounds, Bounds2D::zero());
    }

    #[test]
    fn test_render_lines_skip_cut() {
        let lines = vec![
            line(0.0, 0.0, 1.0, 0.0, LineCategory::Cut),
            line(0.0, 1.0, 1.0, 1.0, LineCategory::Crease),
        ];
        let drawing = Drawing::new(Vec::new(), lines, SectionConfig::plan(1.0));
        let rendered: Vec<_> = drawing.render_lines().collect();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].category, LineCategory::Crease);
    }

    #[test]
    fn test_drawing_json_shape() {
        let drawing = Drawing::empty(SectionConfig::plan(1.0));
        let json = serde_json::to_value(&drawing).unwrap();
        assert!(json.get("cutPolygons").is_some());
        assert_eq!(json["config"]["axis"], "z");
    }
}
