// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render plan: the ordered, fully styled draw list shared by every renderer
//!
//! All visual decisions are made here: fill colours, stroke widths in model
//! units, dash patterns and draw order. A renderer only turns the plan's
//! primitives into pixels or markup through [`RenderSink`].

use crate::hatch::HatchResult;
use crate::section::paper_mm_to_model;
use crate::style::{Color, EntityRef, GraphicStyle, StyleSource};
use crate::types::{Bounds2D, Drawing, Line2D, LineCategory, Polygon2D, Visibility};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Dash and gap of hidden lines in paper millimetres
pub const HIDDEN_DASH_MM: [f64; 2] = [2.0, 1.0];

/// Paper line weight per projected line category (mm)
pub fn category_weight_mm(category: LineCategory) -> f64 {
    match category {
        LineCategory::Cut => 0.35,
        LineCategory::Silhouette => 0.25,
        LineCategory::Crease | LineCategory::Projection | LineCategory::Annotation => 0.18,
        LineCategory::Boundary | LineCategory::Hidden => 0.13,
    }
}

/// Draw order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Fill,
    Hatch,
    Outline,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub show_fills: bool,
    pub show_hatching: bool,
    pub show_hidden_lines: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_fills: true,
            show_hatching: true,
            show_hidden_lines: true,
        }
    }
}

/// Stroke with width and dashes already in model units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub opacity: f64,
    pub dash: Option<[f64; 2]>,
}

/// One styled primitive
#[derive(Debug, Clone, PartialEq)]
pub enum RenderItem<'a> {
    Fill {
        entity_id: u32,
        polygon: &'a Polygon2D,
        color: Color,
        opacity: f64,
    },
    Hatch {
        entity_id: u32,
        lines: Vec<&'a Line2D>,
        stroke: Stroke,
    },
    Outline {
        entity_id: u32,
        polygon: &'a Polygon2D,
        stroke: Stroke,
    },
    Line {
        entity_id: u32,
        category: LineCategory,
        line: &'a Line2D,
        stroke: Stroke,
    },
}

impl RenderItem<'_> {
    pub fn layer(&self) -> Layer {
        match self {
            RenderItem::Fill { .. } => Layer::Fill,
            RenderItem::Hatch { .. } => Layer::Hatch,
            RenderItem::Outline { .. } => Layer::Outline,
            RenderItem::Line { .. } => Layer::Line,
        }
    }
}

/// Output backend for a render plan
pub trait RenderSink {
    /// Called once before any primitive
    fn begin(&mut self, bounds: &Bounds2D, scale: f64);
    /// Even-odd fill of the outer ring minus holes
    fn fill_polygon(&mut self, polygon: &Polygon2D, color: Color, opacity: f64);
    fn stroke_polygon(&mut self, polygon: &Polygon2D, stroke: &Stroke);
    /// Zero-length segments are dot markers and must render as round dots
    fn stroke_segments(&mut self, segments: &[&Line2D], stroke: &Stroke);
    fn end(&mut self);
}

/// Ordered draw list for one drawing
#[derive(Debug, Clone)]
pub struct RenderPlan<'a> {
    pub bounds: Bounds2D,
    pub scale: f64,
    pub items: Vec<RenderItem<'a>>,
}

impl<'a> RenderPlan<'a> {
    /// Build the draw list: fills, then hatches, then outlines, then lines.
    ///
    /// `hatches` is indexed like `drawing.cut_polygons`; cut lines are skipped
    /// because the outlines already draw them.
    pub fn build(
        drawing: &'a Drawing,
        styles: &dyn StyleSource,
        hatches: &'a [HatchResult],
        options: &RenderOptions,
    ) -> Self {
        let scale = drawing.config.scale;
        let mm = |v: f64| paper_mm_to_model(v, scale);

        let mut cache: FxHashMap<(usize, u32), GraphicStyle> = FxHashMap::default();
        let mut style_of = |entity_id: u32, ifc_type: &str, model_index: usize| -> GraphicStyle {
            *cache.entry((model_index, entity_id)).or_insert_with(|| {
                styles.style_for(&EntityRef {
                    entity_id,
                    ifc_type,
                    model_index,
                })
            })
        };

        let mut fills = Vec::new();
        let mut hatch_items = Vec::new();
        let mut outlines = Vec::new();
        for (i, cut) in drawing.cut_polygons.iter().enumerate() {
            let style = style_of(cut.entity_id, &cut.ifc_type, cut.model_index);
            if options.show_fills && style.opacity > 0.0 {
                fills.push(RenderItem::Fill {
                    entity_id: cut.entity_id,
                    polygon: &cut.polygon,
                    color: style.fill_color,
                    opacity: style.opacity * style.fill_color.alpha(),
                });
            }
            if options.show_hatching && style.hatch_pattern.emits_lines() {
                if let Some(hatch) = hatches.get(i).filter(|h| !h.is_empty()) {
                    hatch_items.push(RenderItem::Hatch {
                        entity_id: cut.entity_id,
                        lines: hatch.lines.iter().map(|l| &l.line).collect(),
                        stroke: Stroke {
                            color: style.hatch_color,
                            width: mm(style.hatch_line_weight),
                            opacity: style.opacity,
                            dash: None,
                        },
                    });
                }
            }
            outlines.push(RenderItem::Outline {
                entity_id: cut.entity_id,
                polygon: &cut.polygon,
                stroke: Stroke {
                    color: style.stroke_color,
                    width: mm(style.line_weight),
                    opacity: style.opacity,
                    dash: None,
                },
            });
        }

        let mut lines = Vec::new();
        for line in drawing.render_lines() {
            let hidden = line.visibility == Visibility::Hidden;
            if hidden && !options.show_hidden_lines {
                continue;
            }
            let style = style_of(line.entity_id, &line.ifc_type, line.model_index);
            lines.push(RenderItem::Line {
                entity_id: line.entity_id,
                category: line.category,
                line: &line.line,
                stroke: Stroke {
                    color: style.stroke_color,
                    width: mm(category_weight_mm(line.category)),
                    opacity: style.opacity,
                    dash: hidden.then(|| [mm(HIDDEN_DASH_MM[0]), mm(HIDDEN_DASH_MM[1])]),
                },
            });
        }

        let mut items = fills;
        items.extend(hatch_items);
        items.extend(outlines);
        items.extend(lines);
        Self {
            bounds: drawing.bounds,
            scale,
            items,
        }
    }

    /// Replay the plan into a sink
    pub fn render(&self, sink: &mut dyn RenderSink) {
        sink.begin(&self.bounds, self.scale);
        for item in &self.items {
            match item {
                RenderItem::Fill {
                    polygon,
                    color,
                    opacity,
                    ..
                } => sink.fill_polygon(polygon, *color, *opacity),
                RenderItem::Hatch { lines, stroke, .. } => sink.stroke_segments(lines, stroke),
                RenderItem::Outline { polygon, stroke, .. } => sink.stroke_polygon(polygon, stroke),
                RenderItem::Line { line, stroke, .. } => sink.stroke_segments(&[*line], stroke),
            }
        }
        sink.end();
    }

    pub fn count(&self, layer: Layer) -> usize {
        self.items.iter().filter(|i| i.layer() == layer).count()
    }
}
