// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SVG export
//!
//! Coordinates stay in model units; the y axis is flipped so that drawing
//! "up" is SVG "up". The root `width`/`height` are paper millimetres, so the
//! file prints at the drawing scale.

use crate::hatch::HatchResult;
use crate::render::{RenderOptions, RenderPlan, RenderSink, Stroke};
use crate::style::{Color, StyleSource};
use crate::types::{Bounds2D, Drawing, Line2D, Polygon2D};
use std::fmt::Write;

/// Margin around the drawing bounds, as a fraction of the larger extent
const MARGIN_FRACTION: f64 = 0.05;

/// Format a coordinate with fixed precision and no trailing zeros
fn num(v: f64) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn ring_path(d: &mut String, ring: &[nalgebra::Point2<f64>]) {
    for (i, p) in ring.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{} {} ", num(p.x), num(-p.y));
    }
    if !ring.is_empty() {
        d.push_str("Z ");
    }
}

fn polygon_path(polygon: &Polygon2D) -> String {
    let mut d = String::new();
    for ring in polygon.rings() {
        ring_path(&mut d, ring);
    }
    d.trim_end().to_string()
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let mut attrs = format!(
        r#"fill="none" stroke="{}" stroke-width="{}""#,
        stroke.color.to_hex_rgb(),
        num(stroke.width)
    );
    let opacity = stroke.opacity * stroke.color.alpha();
    if opacity < 1.0 {
        let _ = write!(attrs, r#" stroke-opacity="{}""#, num(opacity));
    }
    if let Some([dash, gap]) = stroke.dash {
        let _ = write!(attrs, r#" stroke-dasharray="{} {}""#, num(dash), num(gap));
    }
    attrs
}

/// [`RenderSink`] writing SVG markup
#[derive(Debug, Default)]
pub struct SvgSink {
    svg: String,
}

impl SvgSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.svg
    }
}

impl RenderSink for SvgSink {
    fn begin(&mut self, bounds: &Bounds2D, scale: f64) {
        let (min, width, height) = if bounds.is_valid() {
            (bounds.min, bounds.width(), bounds.height())
        } else {
            (nalgebra::Point2::origin(), 0.0, 0.0)
        };
        let margin = (width.max(height) * MARGIN_FRACTION).max(1e-3);
        let vb_x = min.x - margin;
        let vb_y = -(min.y + height) - margin;
        let vb_w = width + 2.0 * margin;
        let vb_h = height + 2.0 * margin;
        let to_mm = 1000.0 / scale;

        let _ = writeln!(self.svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            self.svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}mm" height="{}mm" viewBox="{} {} {} {}">"#,
            num(vb_w * to_mm),
            num(vb_h * to_mm),
            num(vb_x),
            num(vb_y),
            num(vb_w),
            num(vb_h)
        );
    }

    fn fill_polygon(&mut self, polygon: &Polygon2D, color: Color, opacity: f64) {
        let mut attrs = format!(r#"fill="{}" fill-rule="evenodd" stroke="none""#, color.to_hex_rgb());
        if opacity < 1.0 {
            let _ = write!(attrs, r#" fill-opacity="{}""#, num(opacity));
        }
        let _ = writeln!(self.svg, r#"  <path d="{}" {attrs}/>"#, polygon_path(polygon));
    }

    fn stroke_polygon(&mut self, polygon: &Polygon2D, stroke: &Stroke) {
        let _ = writeln!(
            self.svg,
            r#"  <path d="{}" {} stroke-linejoin="miter"/>"#,
            polygon_path(polygon),
            stroke_attrs(stroke)
        );
    }

    fn stroke_segments(&mut self, segments: &[&Line2D], stroke: &Stroke) {
        if segments.is_empty() {
            return;
        }
        let mut d = String::new();
        for line in segments {
            let _ = write!(
                d,
                "M{} {} L{} {} ",
                num(line.start.x),
                num(-line.start.y),
                num(line.end.x),
                num(-line.end.y)
            );
        }
        let _ = writeln!(
            self.svg,
            r#"  <path d="{}" {} stroke-linecap="round"/>"#,
            d.trim_end(),
            stroke_attrs(stroke)
        );
    }

    fn end(&mut self) {
        self.svg.push_str("</svg>\n");
    }
}

/// Render a drawing to an SVG document
pub fn export_svg(
    drawing: &Drawing,
    styles: &dyn StyleSource,
    hatches: &[HatchResult],
    options: &RenderOptions,
) -> String {
    let plan = RenderPlan::build(drawing, styles, hatches, options);
    let mut sink = SvgSink::new();
    plan.render(&mut sink);
    sink.finish()
}
