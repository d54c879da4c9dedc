// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projection pass: classified edges of the geometry behind the cutting plane
//!
//! Geometry with depth in `(0, projection_depth]` is projected orthographically
//! along the cut axis. Edges are classified from the faces adjacent to them:
//!
//! - **silhouette**: one adjacent face is front-facing, another is not
//! - **crease**: all adjacent faces are front-facing and fold by more than
//!   [`CREASE_ANGLE_DEG`]
//! - **projection**: border edge of open geometry with a front-facing face
//! - **boundary**: where geometry is clipped by the far projection limit
//!
//! Each line is then tested for occlusion at its midpoint against the cut
//! polygons and against nearer triangles of the projection range.

use crate::mesh::EntityMeshes;
use crate::intersect::intersect_triangle;
use crate::polygon::{cross, point_in_polygon};
use crate::section::{SectionConfig, SectionFrame};
use crate::types::{Bounds2D, CutPolygon, DrawingLine, Line2D, LineCategory, Visibility};
use nalgebra::{Point2, Point3, Vector3};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Dihedral angle above which an edge between two visible faces is drawn
pub const CREASE_ANGLE_DEG: f64 = 30.0;

/// Geometry closer to the plane than this counts as lying in it
const DEPTH_EPSILON: f64 = 1e-6;

/// An occluder must be nearer than the edge by at least this much
const OCCLUSION_EPSILON: f64 = 1e-4;

/// Tolerance for matching edge endpoints between triangles
const EDGE_KEY_TOLERANCE: f64 = 1e-6;

/// Barycentric margin for strict point-in-triangle tests
const BARYCENTRIC_EPSILON: f64 = 1e-9;

/// Projected triangles beyond the plane, used as occluders
struct ProjectedTriangle {
    points: [Point2<f64>; 3],
    depths: [f64; 3],
    bounds: Bounds2D,
}

impl ProjectedTriangle {
    /// Interpolated depth at `p` if `p` lies strictly inside the triangle
    fn depth_at(&self, p: &Point2<f64>) -> Option<f64> {
        let [a, b, c] = &self.points;
        let denom = cross(&(b - a), &(c - a));
        if denom.abs() < 1e-12 {
            return None;
        }
        let wa = cross(&(b - p), &(c - p)) / denom;
        let wb = cross(&(c - p), &(a - p)) / denom;
        let wc = 1.0 - wa - wb;
        if wa <= BARYCENTRIC_EPSILON || wb <= BARYCENTRIC_EPSILON || wc <= BARYCENTRIC_EPSILON {
            return None;
        }
        Some(wa * self.depths[0] + wb * self.depths[1] + wc * self.depths[2])
    }
}

/// Uniform grid over projected triangles plus the cut polygons
pub struct OcclusionIndex<'a> {
    triangles: Vec<ProjectedTriangle>,
    cells: FxHashMap<(i32, i32), Vec<u32>>,
    origin: Point2<f64>,
    cell_size: f64,
    cut_polygons: &'a [CutPolygon],
    cut_bounds: Vec<Bounds2D>,
}

impl<'a> OcclusionIndex<'a> {
    pub fn build(groups: &[EntityMeshes<'_>], frame: &SectionFrame, cut_polygons: &'a [CutPolygon]) -> Self {
        let max_depth = frame.projection_depth();
        let mut triangles = Vec::new();
        let mut extent = Bounds2D::empty();

        for tri in groups.iter().flat_map(|g| g.triangles()) {
            let depths = [frame.depth(&tri[0]), frame.depth(&tri[1]), frame.depth(&tri[2])];
            if !overlaps_range(&depths, max_depth) {
                continue;
            }
            let points = [frame.to_2d(&tri[0]), frame.to_2d(&tri[1]), frame.to_2d(&tri[2])];
            if cross(&(points[1] - points[0]), &(points[2] - points[0])).abs() < 1e-12 {
                continue;
            }
            let mut bounds = Bounds2D::empty();
            for p in &points {
                bounds.include_point(p);
                extent.include_point(p);
            }
            triangles.push(ProjectedTriangle {
                points,
                depths,
                bounds,
            });
        }

        let per_side = ((triangles.len() as f64).sqrt().ceil() as usize).clamp(1, 256);
        let cell_size = if extent.is_valid() {
            (extent.width().max(extent.height()) / per_side as f64).max(1e-6)
        } else {
            1.0
        };
        let origin = if extent.is_valid() { extent.min } else { Point2::origin() };

        let mut index = Self {
            triangles: Vec::new(),
            cells: FxHashMap::default(),
            origin,
            cell_size,
            cut_bounds: cut_polygons.iter().map(|c| c.polygon.bounds()).collect(),
            cut_polygons,
        };
        for (i, tri) in triangles.iter().enumerate() {
            let (x0, y0) = index.cell_of(&tri.bounds.min);
            let (x1, y1) = index.cell_of(&tri.bounds.max);
            for x in x0..=x1 {
                for y in y0..=y1 {
                    index.cells.entry((x, y)).or_default().push(i as u32);
                }
            }
        }
        index.triangles = triangles;
        index
    }

    #[inline]
    fn cell_of(&self, p: &Point2<f64>) -> (i32, i32) {
        (
            ((p.x - self.origin.x) / self.cell_size).floor() as i32,
            ((p.y - self.origin.y) / self.cell_size).floor() as i32,
        )
    }

    /// Whether a point at `depth` behind the plane is hidden from the viewer
    pub fn is_occluded(&self, p: &Point2<f64>, depth: f64) -> bool {
        // Everything behind a cut face is covered by it
        if depth > OCCLUSION_EPSILON {
            let covered = self
                .cut_polygons
                .iter()
                .zip(&self.cut_bounds)
                .any(|(cut, bounds)| bounds.contains(p) && point_in_polygon(p, &cut.polygon));
            if covered {
                return true;
            }
        }

        let Some(candidates) = self.cells.get(&self.cell_of(p)) else {
            return false;
        };
        candidates.iter().any(|&i| {
            let tri = &self.triangles[i as usize];
            tri.bounds.contains(p)
                && tri
                    .depth_at(p)
                    .is_some_and(|d| d > DEPTH_EPSILON && d < depth - OCCLUSION_EPSILON)
        })
    }
}

/// Whether a triangle's depth span overlaps `(0, max_depth]`
#[inline]
fn overlaps_range(depths: &[f64; 3], max_depth: f64) -> bool {
    let max = depths[0].max(depths[1]).max(depths[2]);
    let min = depths[0].min(depths[1]).min(depths[2]);
    max > DEPTH_EPSILON && min <= max_depth
}

/// Parameter range of an edge whose depth lies in `(0, max_depth]`
fn clip_to_range(da: f64, db: f64, max_depth: f64) -> Option<(f64, f64)> {
    let (lo, hi) = (DEPTH_EPSILON, max_depth);
    if (db - da).abs() < 1e-12 {
        return (da > lo && da <= hi).then_some((0.0, 1.0));
    }
    let t_lo = (lo - da) / (db - da);
    let t_hi = (hi - da) / (db - da);
    let t0 = t_lo.min(t_hi).max(0.0);
    let t1 = t_lo.max(t_hi).min(1.0);
    (t1 > t0).then_some((t0, t1))
}

type EdgeKey = ((i64, i64, i64), (i64, i64, i64));

#[inline]
fn vertex_key(p: &Point3<f64>) -> (i64, i64, i64) {
    let scale = 1.0 / EDGE_KEY_TOLERANCE;
    (
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    )
}

#[inline]
fn edge_key(a: &Point3<f64>, b: &Point3<f64>) -> EdgeKey {
    let (ka, kb) = (vertex_key(a), vertex_key(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// An edge and the faces sharing it
struct EdgeFaces {
    a: Point3<f64>,
    b: Point3<f64>,
    normals: SmallVec<[Vector3<f64>; 2]>,
}

/// Classify an edge from its adjacent face normals, or `None` if it isn't drawn
fn classify_edge(normals: &[Vector3<f64>], frame: &SectionFrame, crease_cos: f64) -> Option<LineCategory> {
    let front = normals.iter().filter(|n| frame.is_front_facing(n)).count();
    if front == 0 {
        return None;
    }
    if normals.len() == 1 {
        return Some(LineCategory::Projection);
    }
    if front < normals.len() {
        return Some(LineCategory::Silhouette);
    }
    let folded = normals
        .iter()
        .enumerate()
        .any(|(i, n)| normals[i + 1..].iter().any(|m| n.dot(m) < crease_cos));
    folded.then_some(LineCategory::Crease)
}

/// Projection lines of one element
fn entity_lines(
    group: &EntityMeshes<'_>,
    frame: &SectionFrame,
    far_frame: &SectionFrame,
    occlusion: &OcclusionIndex<'_>,
    include_hidden: bool,
) -> Vec<DrawingLine> {
    let max_depth = frame.projection_depth();
    let crease_cos = CREASE_ANGLE_DEG.to_radians().cos();

    let mut edges: Vec<EdgeFaces> = Vec::new();
    let mut edge_index: FxHashMap<EdgeKey, usize> = FxHashMap::default();
    let mut far_segments: Vec<(Point3<f64>, Point3<f64>)> = Vec::new();

    for tri in group.triangles() {
        let depths = [frame.depth(&tri[0]), frame.depth(&tri[1]), frame.depth(&tri[2])];
        if !overlaps_range(&depths, max_depth) {
            continue;
        }
        let normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
        let Some(normal) = normal.try_normalize(1e-12) else {
            continue;
        };

        for (i, j) in [(0, 1), (1, 2), (2, 0)] {
            let key = edge_key(&tri[i], &tri[j]);
            let slot = *edge_index.entry(key).or_insert_with(|| {
                edges.push(EdgeFaces {
                    a: tri[i],
                    b: tri[j],
                    normals: SmallVec::new(),
                });
                edges.len() - 1
            });
            edges[slot].normals.push(normal);
        }

        if let Some(segment) = intersect_triangle(&tri, far_frame) {
            far_segments.push(segment);
        }
    }

    let mut lines = Vec::new();
    let mut emit = |a: Point3<f64>, b: Point3<f64>, category: LineCategory| {
        let line = Line2D::new(frame.to_2d(&a), frame.to_2d(&b));
        if line.length() < 1e-9 {
            return;
        }
        let depth = frame.depth(&nalgebra::center(&a, &b));
        let (category, visibility) = if occlusion.is_occluded(&line.midpoint(), depth) {
            if !include_hidden {
                return;
            }
            (LineCategory::Hidden, Visibility::Hidden)
        } else {
            (category, Visibility::Visible)
        };
        lines.push(DrawingLine {
            line,
            category,
            visibility,
            entity_id: group.entity_id,
            ifc_type: group.ifc_type.to_string(),
            model_index: group.model_index,
            depth,
        });
    };

    for edge in &edges {
        let Some(category) = classify_edge(&edge.normals, frame, crease_cos) else {
            continue;
        };
        let Some((t0, t1)) = clip_to_range(frame.depth(&edge.a), frame.depth(&edge.b), max_depth) else {
            continue;
        };
        let d = edge.b - edge.a;
        emit(edge.a + d * t0, edge.a + d * t1, category);
    }

    if max_depth > DEPTH_EPSILON {
        for (a, b) in far_segments {
            emit(a, b, LineCategory::Boundary);
        }
    }

    lines
}

/// Compute the classified projection lines for all elements.
///
/// Output order follows the element order of `groups`; within an element,
/// edges come in first-seen order followed by far-limit boundary segments.
pub fn project_lines(
    groups: &[EntityMeshes<'_>],
    config: &SectionConfig,
    cut_polygons: &[CutPolygon],
) -> Vec<DrawingLine> {
    let frame = SectionFrame::new(config);
    if frame.projection_depth() <= DEPTH_EPSILON {
        return Vec::new();
    }

    let view_sign = if config.flipped { -1.0 } else { 1.0 };
    let far_frame = SectionFrame::new(&SectionConfig {
        position: config.position - config.projection_depth * view_sign,
        ..config.clone()
    });

    let occlusion = OcclusionIndex::build(groups, &frame, cut_polygons);

    let per_entity: Vec<Vec<DrawingLine>> = groups
        .par_iter()
        .map(|group| entity_lines(group, &frame, &far_frame, &occlusion, config.include_hidden_lines))
        .collect();

    per_entity.into_iter().flatten().collect()
}
