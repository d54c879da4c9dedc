// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon utilities: winding, containment, loop nesting and clipping

use crate::types::Polygon2D;
use nalgebra::{Point2, Vector2};

/// Epsilon for 2D comparisons
const EPSILON_2D: f64 = 1e-9;

/// Loops smaller than this are considered degenerate
const MIN_LOOP_AREA: f64 = 1e-10;

/// 2D cross product
#[inline]
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Signed area (positive for counter-clockwise rings)
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let p = &ring[i];
        let q = &ring[(i + 1) % n];
        area += p.x * q.y - q.x * p.y;
    }
    area * 0.5
}

/// Point-in-ring test using ray casting
pub fn point_in_ring(p: &Point2<f64>, ring: &[Point2<f64>]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = &ring[i];
        let vj = &ring[j];
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Even-odd containment against the outer ring and all holes
pub fn point_in_polygon(p: &Point2<f64>, polygon: &Polygon2D) -> bool {
    polygon
        .rings()
        .fold(false, |inside, ring| inside ^ point_in_ring(p, ring))
}

/// Reverse the ring if its winding doesn't match `ccw`
pub fn ensure_winding(ring: &mut [Point2<f64>], ccw: bool) {
    let area = signed_area(ring);
    if (area > 0.0) != ccw {
        ring.reverse();
    }
}

/// Remove repeated points and vertices lying on a straight run.
/// Cut loops from triangulated faces carry one vertex per triangle edge,
/// most of which are colinear.
pub fn simplify_ring(ring: &[Point2<f64>], tolerance: f64) -> Vec<Point2<f64>> {
    let mut points: Vec<Point2<f64>> = Vec::with_capacity(ring.len());
    for p in ring {
        if points.last().map_or(true, |last| (p - last).norm() > tolerance) {
            points.push(*p);
        }
    }
    while points.len() > 1 && (points[0] - points[points.len() - 1]).norm() <= tolerance {
        points.pop();
    }

    // Repeat until stable; removing a vertex can make its neighbour colinear
    loop {
        let n = points.len();
        if n < 3 {
            return points;
        }
        let mut kept = Vec::with_capacity(n);
        for i in 0..n {
            let prev = &points[(i + n - 1) % n];
            let cur = &points[i];
            let next = &points[(i + 1) % n];
            let a = cur - prev;
            let b = next - cur;
            let chord = next - prev;
            let chord_len = chord.norm();
            // Distance of `cur` from the chord prev → next
            let colinear = chord_len > 0.0
                && cross(&a, &chord).abs() / chord_len <= tolerance
                && a.dot(&b) > 0.0;
            if !colinear {
                kept.push(*cur);
            }
        }
        if kept.len() == n {
            return kept;
        }
        points = kept;
    }
}

/// Whether `inner` lies inside `outer`, decided by a majority of its vertices
/// so that shared boundary points don't flip the result
fn ring_inside(inner: &[Point2<f64>], outer: &[Point2<f64>]) -> bool {
    let inside = inner.iter().filter(|p| point_in_ring(p, outer)).count();
    inside * 2 > inner.len()
}

/// Assemble closed loops of one entity into polygons with holes.
///
/// Loops are nested by containment: a loop at even nesting depth starts a
/// new polygon, a loop at odd depth becomes a hole of its immediate
/// enclosing loop. Islands inside holes therefore become separate polygons.
/// Output order is by decreasing outer area, ties in input order.
pub fn assemble_polygons(loops: Vec<Vec<Point2<f64>>>) -> Vec<Polygon2D> {
    let mut rings: Vec<(f64, Vec<Point2<f64>>)> = loops
        .into_iter()
        .filter(|ring| ring.len() >= 3)
        .map(|ring| (signed_area(&ring).abs(), ring))
        .filter(|(area, _)| *area > MIN_LOOP_AREA)
        .collect();
    rings.sort_by(|a, b| b.0.total_cmp(&a.0));

    let n = rings.len();
    let mut depth = vec![0usize; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        // Walking back from i visits candidates from smallest to largest,
        // so the first containing loop is the immediate parent
        for j in (0..i).rev() {
            if rings[j].0 > rings[i].0 + EPSILON_2D && ring_inside(&rings[i].1, &rings[j].1) {
                parent[i] = Some(j);
                depth[i] = depth[j] + 1;
                break;
            }
        }
    }

    let mut polygons: Vec<Polygon2D> = Vec::new();
    let mut polygon_of: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let mut ring = std::mem::take(&mut rings[i].1);
        if depth[i] % 2 == 0 {
            ensure_winding(&mut ring, true);
            polygon_of[i] = Some(polygons.len());
            polygons.push(Polygon2D::new(ring));
        } else if let Some(target) = parent[i].and_then(|p| polygon_of[p]) {
            ensure_winding(&mut ring, false);
            polygons[target].holes.push(ring);
        }
    }
    polygons
}

/// Parameters along `a → b` where the infinite line through them crosses the
/// polygon boundary, sorted ascending. Uses a half-open vertex rule so the
/// count is always even for closed rings.
fn boundary_crossings(polygon: &Polygon2D, a: &Point2<f64>, b: &Point2<f64>) -> Vec<f64> {
    let d = b - a;
    let mut ts = Vec::new();
    for ring in polygon.rings() {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        for i in 0..n {
            let p = &ring[i];
            let q = &ring[(i + 1) % n];
            let side_p = cross(&d, &(p - a));
            let side_q = cross(&d, &(q - a));
            if (side_p > 0.0) != (side_q > 0.0) {
                let e = q - p;
                let t = cross(&(p - a), &e) / cross(&d, &e);
                ts.push(t);
            }
        }
    }
    ts.sort_by(f64::total_cmp);
    ts
}

/// Clip the segment `a → b` to the inside of the polygon (outer minus holes).
/// Returns the inside pieces in order along the segment.
pub fn clip_segment(
    polygon: &Polygon2D,
    a: &Point2<f64>,
    b: &Point2<f64>,
) -> Vec<(Point2<f64>, Point2<f64>)> {
    let d = b - a;
    let length = d.norm();
    if length < EPSILON_2D {
        return Vec::new();
    }

    let ts = boundary_crossings(polygon, a, b);
    let min_t = EPSILON_2D / length;
    let mut pieces = Vec::new();
    for pair in ts.chunks_exact(2) {
        let t0 = pair[0].max(0.0);
        let t1 = pair[1].min(1.0);
        if t1 - t0 > min_t {
            pieces.push((a + d * t0, a + d * t1));
        }
    }
    pieces
}

/// Intervals of the infinite line through `a` along `dir` that lie inside the
/// polygon, as parameter pairs along `dir`
pub fn line_intervals(polygon: &Polygon2D, a: &Point2<f64>, dir: &Vector2<f64>) -> Vec<(f64, f64)> {
    let b = a + dir;
    boundary_crossings(polygon, a, &b)
        .chunks_exact(2)
        .filter(|pair| pair[1] - pair[0] > EPSILON_2D)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
        ]
    }

    #[test]
    fn test_signed_area() {
        assert_relative_eq!(signed_area(&square(0.0, 0.0, 2.0)), 4.0);
        let mut cw = square(0.0, 0.0, 2.0);
        cw.reverse();
        assert_relative_eq!(signed_area(&cw), -4.0);
    }

    #[test]
    fn test_point_in_ring() {
        let sq = square(0.0, 0.0, 10.0);
        assert!(point_in_ring(&Point2::new(5.0, 5.0), &sq));
        assert!(!point_in_ring(&Point2::new(15.0, 5.0), &sq));
        assert!(!point_in_ring(&Point2::new(-5.0, 5.0), &sq));
    }

    #[test]
    fn test_simplify_removes_colinear() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ];
        let simplified = simplify_ring(&ring, 1e-9);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn test_assemble_nested_loops() {
        let outer = square(0.0, 0.0, 10.0);
        let hole = square(2.0, 2.0, 6.0);
        let island = square(4.0, 4.0, 2.0);
        let separate = square(20.0, 0.0, 3.0);
        let polygons = assemble_polygons(vec![island.clone(), hole, outer, separate]);

        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0].holes.len(), 1);
        assert!(signed_area(&polygons[0].outer) > 0.0);
        assert!(signed_area(&polygons[0].holes[0]) < 0.0);
        // separate (9) sorts before island (4)
        assert_relative_eq!(signed_area(&polygons[1].outer), 9.0);
        assert_relative_eq!(signed_area(&polygons[2].outer), 4.0);
        assert!(polygons[2].holes.is_empty());
    }

    #[test]
    fn test_degenerate_loops_dropped() {
        let sliver = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert!(assemble_polygons(vec![sliver]).is_empty());
    }

    #[test]
    fn test_clip_segment_with_hole() {
        let mut polygon = Polygon2D::new(square(0.0, 0.0, 10.0));
        let mut hole = square(4.0, 4.0, 2.0);
        hole.reverse();
        polygon.holes.push(hole);

        let pieces = clip_segment(&polygon, &Point2::new(-5.0, 5.0), &Point2::new(15.0, 5.0));
        assert_eq!(pieces.len(), 2);
        assert_relative_eq!(pieces[0].0.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[0].1.x, 4.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[1].0.x, 6.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[1].1.x, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_segment_through_vertex() {
        // Diamond: the horizontal line passes exactly through two vertices
        let polygon = Polygon2D::new(vec![
            Point2::new(0.0, -1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(-1.0, 0.0),
        ]);
        let pieces = clip_segment(&polygon, &Point2::new(-2.0, 0.0), &Point2::new(2.0, 0.0));
        assert_eq!(pieces.len(), 1);
        assert_relative_eq!(pieces[0].0.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[0].1.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_segment_partial() {
        let polygon = Polygon2D::new(square(0.0, 0.0, 10.0));
        let pieces = clip_segment(&polygon, &Point2::new(5.0, 5.0), &Point2::new(15.0, 5.0));
        assert_eq!(pieces.len(), 1);
        assert_relative_eq!(pieces[0].0.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[0].1.x, 10.0, epsilon = 1e-9);
    }
}
