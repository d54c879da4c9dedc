// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane-triangle intersection and segment chaining
//!
//! Vertices exactly on the plane are treated as lying on its positive side.
//! This symbolic perturbation guarantees that a face edge lying in the plane
//! is produced by exactly one of its two adjacent triangles, so chained loops
//! never contain duplicate or dangling segments.

use crate::mesh::Mesh;
use crate::section::SectionFrame;
use nalgebra::{Point2, Point3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Tolerance used to match segment endpoints while chaining (model units)
pub const CHAIN_TOLERANCE: f64 = 1e-6;

/// Order two points lexicographically so an edge shared by two triangles is
/// always interpolated in the same direction (bit-identical results)
#[inline]
fn canonical(a: (Point3<f64>, f64), b: (Point3<f64>, f64)) -> ((Point3<f64>, f64), (Point3<f64>, f64)) {
    let key = |p: &Point3<f64>| (p.x, p.y, p.z);
    if key(&a.0) <= key(&b.0) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Point where the edge between two vertices on opposite sides crosses the plane
#[inline]
fn edge_crossing(a: (Point3<f64>, f64), b: (Point3<f64>, f64)) -> Point3<f64> {
    let ((p, dp), (q, dq)) = canonical(a, b);
    let t = dp / (dp - dq);
    p + (q - p) * t
}

/// Intersect a single triangle with the section plane.
///
/// Returns the cut segment when the triangle straddles the plane.
pub fn intersect_triangle(tri: &[Point3<f64>; 3], frame: &SectionFrame) -> Option<(Point3<f64>, Point3<f64>)> {
    let d = [
        frame.plane_distance(&tri[0]),
        frame.plane_distance(&tri[1]),
        frame.plane_distance(&tri[2]),
    ];
    let positive = [d[0] >= 0.0, d[1] >= 0.0, d[2] >= 0.0];

    if positive[0] == positive[1] && positive[1] == positive[2] {
        return None;
    }

    // The vertex alone on its side; both of its edges cross the plane
    let lone = if positive[1] == positive[2] {
        0
    } else if positive[0] == positive[2] {
        1
    } else {
        2
    };
    let j = (lone + 1) % 3;
    let k = (lone + 2) % 3;

    let p0 = edge_crossing((tri[lone], d[lone]), (tri[j], d[j]));
    let p1 = edge_crossing((tri[lone], d[lone]), (tri[k], d[k]));
    if (p1 - p0).norm_squared() == 0.0 {
        return None;
    }
    Some((p0, p1))
}

/// Cut all triangles of a mesh, returning 2D segments on the drawing plane
pub fn cut_mesh(mesh: &Mesh, frame: &SectionFrame) -> Vec<(Point2<f64>, Point2<f64>)> {
    mesh.triangles()
        .filter_map(|tri| intersect_triangle(&tri, frame))
        .map(|(a, b)| (frame.to_2d(&a), frame.to_2d(&b)))
        .collect()
}

/// Key for endpoint lookup with tolerance-based hashing
#[inline]
fn point_key(p: &Point2<f64>, tolerance: f64) -> (i64, i64) {
    let scale = 1.0 / tolerance;
    ((p.x * scale).round() as i64, (p.y * scale).round() as i64)
}

/// Result of chaining one entity's segments
#[derive(Debug, Default)]
pub struct ChainResult {
    /// Closed loops, without a repeated closing point
    pub loops: Vec<Vec<Point2<f64>>>,
    /// Chains that could not be closed (malformed geometry)
    pub open_chains: usize,
}

/// Chain individual segments into closed loops.
///
/// Endpoints are matched by quantized keys; chains that don't return to
/// their start are reported as open and dropped.
pub fn chain_segments(segments: &[(Point2<f64>, Point2<f64>)], tolerance: f64) -> ChainResult {
    let mut result = ChainResult::default();
    if segments.is_empty() {
        return result;
    }

    let keys: Vec<((i64, i64), (i64, i64))> = segments
        .iter()
        .map(|(a, b)| (point_key(a, tolerance), point_key(b, tolerance)))
        .collect();

    let mut adjacency: FxHashMap<(i64, i64), SmallVec<[usize; 2]>> = FxHashMap::default();
    for (i, (k0, k1)) in keys.iter().enumerate() {
        if k0 == k1 {
            continue;
        }
        adjacency.entry(*k0).or_default().push(i);
        adjacency.entry(*k1).or_default().push(i);
    }

    let mut used: Vec<bool> = keys.iter().map(|(k0, k1)| k0 == k1).collect();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let start_key = keys[start].0;
        let mut chain = vec![segments[start].0, segments[start].1];
        let mut current = keys[start].1;
        let mut closed = false;

        loop {
            if current == start_key {
                closed = true;
                break;
            }
            let next = adjacency
                .get(&current)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
            let Some(next) = next else {
                break;
            };
            used[next] = true;
            let (k0, k1) = keys[next];
            let (point, key) = if k0 == current {
                (segments[next].1, k1)
            } else {
                (segments[next].0, k0)
            };
            chain.push(point);
            current = key;
        }

        if closed {
            // Drop the repeated start point
            chain.pop();
            if chain.len() >= 3 {
                result.loops.push(chain);
                continue;
            }
        }
        result.open_chains += 1;
    }

    result
}
