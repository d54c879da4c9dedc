// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section cutting pipeline: triangle scan, loop assembly, projection pass
//!
//! Every stage works per element and collects in input order, so the result
//! is identical across runs regardless of how rayon schedules the work.
//! A broken element (open loops, out-of-range indices) loses only its own
//! output.

use crate::error::{Error, Result};
use crate::intersect::{chain_segments, cut_mesh, CHAIN_TOLERANCE};
use crate::merge::merge_lines;
use crate::mesh::{group_by_entity, meshes_bounds, EntityMeshes, Mesh};
use crate::polygon::{assemble_polygons, simplify_ring};
use crate::projection::project_lines;
use crate::section::{SectionConfig, SectionFrame};
use crate::types::{content_bounds, Bounds2D, CutPolygon, Drawing, DrawingLine, Line2D, LineCategory, Visibility};
use nalgebra::Point2;
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Planes closer than this to the model extent produce an empty drawing
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// Progress stage names
pub mod stage {
    pub const TRIANGLE_SCAN: &str = "triangle-scan";
    pub const LOOP_ASSEMBLY: &str = "loop-assembly";
    pub const PROJECTION: &str = "projection";
}

/// Progress callback: `(stage, fraction in [0, 1])`. Advisory only.
pub type ProgressFn = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Shared cancellation flag, checked between stages
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone)]
pub struct GenerateOptions {
    /// Coalesce colinear overlapping projection lines
    pub merge_lines: bool,
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancelToken>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            merge_lines: true,
            on_progress: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("merge_lines", &self.merge_lines)
            .field("on_progress", &self.on_progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl GenerateOptions {
    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn progress(&self, stage: &str, fraction: f64) {
        if let Some(cb) = &self.on_progress {
            cb(stage, fraction.clamp(0.0, 1.0));
        }
    }

    fn checkpoint(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Output of the intersector
#[derive(Debug, Clone, PartialEq)]
pub struct CutResult {
    pub cut_polygons: Vec<CutPolygon>,
    pub lines: Vec<DrawingLine>,
    pub bounds: Bounds2D,
}

impl CutResult {
    pub fn empty() -> Self {
        Self {
            cut_polygons: Vec::new(),
            lines: Vec::new(),
            bounds: Bounds2D::zero(),
        }
    }

    pub fn into_drawing(self, config: SectionConfig) -> Drawing {
        Drawing {
            cut_polygons: self.cut_polygons,
            lines: self.lines,
            bounds: self.bounds,
            config,
        }
    }
}

/// Whether the plane lies at or outside the model extent along its axis
pub fn is_degenerate_plane(meshes: &[Mesh], config: &SectionConfig) -> bool {
    let bounds = meshes_bounds(meshes);
    if !bounds.is_valid() {
        return true;
    }
    let (min, max) = bounds.extent(config.axis);
    config.position <= min + DEGENERATE_EPSILON || config.position >= max - DEGENERATE_EPSILON
}

/// Cut polygons of one element
fn section_entity(group: &EntityMeshes<'_>, segments: &[(Point2<f64>, Point2<f64>)]) -> Vec<CutPolygon> {
    if segments.is_empty() {
        return Vec::new();
    }
    let chained = chain_segments(segments, CHAIN_TOLERANCE);
    if chained.open_chains > 0 {
        debug!(
            entity_id = group.entity_id,
            open = chained.open_chains,
            "Dropping open section chains"
        );
    }
    let loops = chained
        .loops
        .iter()
        .map(|ring| simplify_ring(ring, CHAIN_TOLERANCE))
        .collect();
    let polygons = assemble_polygons(loops);
    if polygons.is_empty() {
        warn!(
            entity_id = group.entity_id,
            ifc_type = group.ifc_type,
            "No closed section loop, element skipped"
        );
    }
    polygons
        .into_iter()
        .map(|polygon| CutPolygon {
            entity_id: group.entity_id,
            ifc_type: group.ifc_type.to_string(),
            model_index: group.model_index,
            polygon,
        })
        .collect()
}

/// Cut-category lines along every polygon edge
fn cut_lines(cut_polygons: &[CutPolygon]) -> Vec<DrawingLine> {
    let mut lines = Vec::new();
    for cut in cut_polygons {
        for ring in cut.polygon.rings() {
            let n = ring.len();
            for i in 0..n {
                lines.push(DrawingLine {
                    line: Line2D::new(ring[i], ring[(i + 1) % n]),
                    category: LineCategory::Cut,
                    visibility: Visibility::Visible,
                    entity_id: cut.entity_id,
                    ifc_type: cut.ifc_type.clone(),
                    model_index: cut.model_index,
                    depth: 0.0,
                });
            }
        }
    }
    lines
}

/// Intersect meshes with the section plane and classify projected edges.
///
/// Empty input and planes at or outside the model extent give an empty
/// result. Only an invalid configuration or cancellation is an error.
pub fn cut(meshes: &[Mesh], config: &SectionConfig, options: &GenerateOptions) -> Result<CutResult> {
    config.validate()?;
    if meshes.is_empty() || is_degenerate_plane(meshes, config) {
        debug!(axis = ?config.axis, position = config.position, "Section plane outside model, empty result");
        return Ok(CutResult::empty());
    }

    let start = Instant::now();
    let frame = SectionFrame::new(config);
    let groups = group_by_entity(meshes);

    options.progress(stage::TRIANGLE_SCAN, 0.0);
    let segments: Vec<Vec<(Point2<f64>, Point2<f64>)>> = groups
        .par_iter()
        .map(|group| {
            group
                .meshes
                .iter()
                .flat_map(|mesh| cut_mesh(mesh, &frame))
                .collect()
        })
        .collect();
    options.progress(stage::TRIANGLE_SCAN, 1.0);
    options.checkpoint()?;

    options.progress(stage::LOOP_ASSEMBLY, 0.0);
    let cut_polygons: Vec<CutPolygon> = groups
        .par_iter()
        .zip(segments.par_iter())
        .map(|(group, segs)| section_entity(group, segs))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();
    options.progress(stage::LOOP_ASSEMBLY, 1.0);
    options.checkpoint()?;

    options.progress(stage::PROJECTION, 0.0);
    let mut projected = project_lines(&groups, config, &cut_polygons);
    if options.merge_lines {
        let before = projected.len();
        projected = merge_lines(projected);
        debug!(before, after = projected.len(), "Merged projection lines");
    }
    options.progress(stage::PROJECTION, 1.0);
    options.checkpoint()?;

    let mut lines = cut_lines(&cut_polygons);
    lines.extend(projected);
    let bounds = content_bounds(&cut_polygons, &lines);

    debug!(
        entities = groups.len(),
        polygons = cut_polygons.len(),
        lines = lines.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Section cut complete"
    );

    Ok(CutResult {
        cut_polygons,
        lines,
        bounds,
    })
}

/// Generate a complete drawing. An empty mesh list is an input error.
pub fn generate(meshes: &[Mesh], config: &SectionConfig, options: &GenerateOptions) -> Result<Drawing> {
    if meshes.is_empty() {
        return Err(Error::NoMeshes);
    }
    Ok(cut(meshes, config, options)?.into_drawing(config.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::box_mesh;
    use crate::section::Axis;
    use nalgebra::Point3;
    use std::sync::Mutex;

    fn wall() -> Mesh {
        box_mesh(42, "IfcWall", Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.3, 3.0))
    }

    #[test]
    fn test_wall_plan_cut() {
        let drawing = generate(&[wall()], &SectionConfig::plan(1.5), &GenerateOptions::default()).unwrap();
        assert_eq!(drawing.cut_polygons.len(), 1);
        let cut = &drawing.cut_polygons[0];
        assert_eq!(cut.entity_id, 42);
        assert!(cut.polygon.holes.is_empty());
        assert_eq!(cut.polygon.outer.len(), 4);
        let cut_edges = drawing
            .lines
            .iter()
            .filter(|l| l.category == LineCategory::Cut)
            .count();
        assert_eq!(cut_edges, 4);
    }

    #[test]
    fn test_empty_input() {
        let config = SectionConfig::plan(1.0);
        assert!(matches!(
            generate(&[], &config, &GenerateOptions::default()),
            Err(Error::NoMeshes)
        ));
        assert_eq!(cut(&[], &config, &GenerateOptions::default()).unwrap(), CutResult::empty());
    }

    #[test]
    fn test_plane_at_extent_is_empty() {
        for position in [0.0, 3.0, -1.0, 10.0] {
            let drawing = generate(&[wall()], &SectionConfig::plan(position), &GenerateOptions::default()).unwrap();
            assert!(drawing.is_empty(), "position {position}");
        }
        let section = SectionConfig::section(Axis::X, 5.0);
        assert!(generate(&[wall()], &section, &GenerateOptions::default())
            .unwrap()
            .cut_polygons
            .is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SectionConfig {
            scale: 0.0,
            ..SectionConfig::plan(1.0)
        };
        assert!(matches!(
            generate(&[wall()], &config, &GenerateOptions::default()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_progress_reported_per_stage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let options = GenerateOptions::default().with_progress(Arc::new(move |stage: &str, f: f64| {
            if let Ok(mut v) = sink.lock() {
                v.push((stage.to_string(), f));
            }
        }));
        generate(&[wall()], &SectionConfig::plan(1.0), &options).unwrap();
        let seen = seen.lock().unwrap();
        let stages: Vec<&str> = seen.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            stages,
            vec![
                stage::TRIANGLE_SCAN,
                stage::TRIANGLE_SCAN,
                stage::LOOP_ASSEMBLY,
                stage::LOOP_ASSEMBLY,
                stage::PROJECTION,
                stage::PROJECTION
            ]
        );
    }

    #[test]
    fn test_cancelled_before_projection() {
        let token = CancelToken::new();
        token.cancel();
        let options = GenerateOptions::default().with_cancel(token);
        assert!(matches!(
            generate(&[wall()], &SectionConfig::plan(1.0), &options),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn test_open_mesh_skipped_others_kept() {
        let mut broken = Mesh::new(7, "IfcSlab");
        let a = broken.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = broken.add_vertex(Point3::new(1.0, 0.0, 2.0));
        let c = broken.add_vertex(Point3::new(0.0, 1.0, 2.0));
        broken.add_triangle(a, b, c);
        let drawing =
            generate(&[broken, wall()], &SectionConfig::plan(1.0), &GenerateOptions::default()).unwrap();
        assert_eq!(drawing.cut_polygons.len(), 1);
        assert_eq!(drawing.cut_polygons[0].entity_id, 42);
    }
}
