// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Colinear line merging
//!
//! Segments of one element, category and visibility that lie on the same
//! infinite line are replaced by the union of their intervals. The covered
//! region is unchanged; only the segment count drops.

use crate::types::{DrawingLine, Line2D, LineCategory, Visibility};
use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;

/// Angular tolerance for treating two directions as parallel (radians)
const ANGLE_TOLERANCE: f64 = 1e-6;

/// Perpendicular offset tolerance for treating two lines as coincident
const OFFSET_TOLERANCE: f64 = 1e-6;

/// Gap below which two intervals on one line are joined
const GAP_TOLERANCE: f64 = 1e-6;

type GroupKey = (usize, u32, LineCategory, Visibility);
type LineKey = (i64, i64);

/// Direction with a canonical sign, so `a → b` and `b → a` share a key
fn canonical_direction(line: &Line2D) -> Option<Vector2<f64>> {
    let d = (line.end - line.start).try_normalize(1e-12)?;
    if d.x < -ANGLE_TOLERANCE || (d.x.abs() <= ANGLE_TOLERANCE && d.y < 0.0) {
        Some(-d)
    } else {
        Some(d)
    }
}

fn line_key(start: &Point2<f64>, dir: &Vector2<f64>) -> LineKey {
    let angle = dir.y.atan2(dir.x);
    let offset = dir.x * start.y - dir.y * start.x;
    (
        (angle / ANGLE_TOLERANCE).round() as i64,
        (offset / OFFSET_TOLERANCE).round() as i64,
    )
}

/// Segments sharing one infinite line, parametrised along `dir` from `origin`
struct Run {
    origin: Point2<f64>,
    dir: Vector2<f64>,
    template: DrawingLine,
    intervals: Vec<(f64, f64, f64)>,
}

impl Run {
    /// Whether a segment starting at `start` with direction `dir` lies on this run's line
    fn holds(&self, start: &Point2<f64>, dir: &Vector2<f64>) -> bool {
        let parallel = self.dir.perp(dir).abs() <= ANGLE_TOLERANCE;
        let offset = self.dir.perp(&(*start - self.origin)).abs();
        parallel && offset <= OFFSET_TOLERANCE
    }
}

/// Run for a line key, also checking neighbouring buckets so that lines
/// straddling a bucket boundary still share a run
fn find_run(
    runs: &[Run],
    run_index: &FxHashMap<LineKey, usize>,
    key: LineKey,
    start: &Point2<f64>,
    dir: &Vector2<f64>,
) -> Option<usize> {
    if let Some(&r) = run_index.get(&key) {
        return Some(r);
    }
    (-1..=1)
        .flat_map(|da| (-1..=1).map(move |doff| (key.0 + da, key.1 + doff)))
        .filter_map(|neighbour| run_index.get(&neighbour).copied())
        .find(|&r| runs[r].holds(start, dir))
}

/// Merge colinear, overlapping or touching segments.
///
/// Output order: groups of `(model, element, category, visibility)` in
/// first-appearance order, lines within a group in first-appearance order,
/// intervals by ascending start. Merged lines keep the smallest depth.
pub fn merge_lines(lines: Vec<DrawingLine>) -> Vec<DrawingLine> {
    let mut groups: Vec<(Vec<Run>, FxHashMap<LineKey, usize>)> = Vec::new();
    let mut group_index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut degenerate = Vec::new();

    for line in lines {
        let Some(dir) = canonical_direction(&line.line) else {
            degenerate.push(line);
            continue;
        };
        let group_key = (line.model_index, line.entity_id, line.category, line.visibility);
        let g = *group_index.entry(group_key).or_insert_with(|| {
            groups.push((Vec::new(), FxHashMap::default()));
            groups.len() - 1
        });
        let (runs, run_index) = &mut groups[g];

        let key = line_key(&line.line.start, &dir);
        let r = match find_run(runs, run_index, key, &line.line.start, &dir) {
            Some(r) => r,
            None => {
                runs.push(Run {
                    origin: line.line.start,
                    dir,
                    template: line.clone(),
                    intervals: Vec::new(),
                });
                run_index.insert(key, runs.len() - 1);
                runs.len() - 1
            }
        };
        let run = &mut runs[r];
        let t0 = (line.line.start - run.origin).dot(&run.dir);
        let t1 = (line.line.end - run.origin).dot(&run.dir);
        run.intervals.push((t0.min(t1), t0.max(t1), line.depth));
    }

    let mut merged = Vec::new();
    for (runs, _) in groups {
        for mut run in runs {
            run.intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut current: Option<(f64, f64, f64)> = None;
            for (start, end, depth) in run.intervals.iter().copied() {
                current = match current {
                    Some((s, e, d)) if start <= e + GAP_TOLERANCE => Some((s, e.max(end), d.min(depth))),
                    Some(done) => {
                        merged.push(run_line(&run, done));
                        Some((start, end, depth))
                    }
                    None => Some((start, end, depth)),
                };
            }
            if let Some(done) = current {
                merged.push(run_line(&run, done));
            }
        }
    }
    merged.extend(degenerate);
    merged
}

fn run_line(run: &Run, (start, end, depth): (f64, f64, f64)) -> DrawingLine {
    DrawingLine {
        line: Line2D::new(run.origin + run.dir * start, run.origin + run.dir * end),
        depth,
        ..run.template.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(entity_id: u32, category: LineCategory, a: (f64, f64), b: (f64, f64)) -> DrawingLine {
        DrawingLine {
            line: Line2D::new(Point2::new(a.0, a.1), Point2::new(b.0, b.1)),
            category,
            visibility: Visibility::Visible,
            entity_id,
            ifc_type: "IfcWall".to_string(),
            model_index: 0,
            depth: 1.0,
        }
    }

    #[test]
    fn test_overlapping_segments_merge() {
        let lines = vec![
            line(1, LineCategory::Silhouette, (0.0, 0.0), (2.0, 0.0)),
            line(1, LineCategory::Silhouette, (3.0, 0.0), (1.0, 0.0)),
            line(1, LineCategory::Silhouette, (3.0, 0.0), (4.0, 0.0)),
        ];
        let merged = merge_lines(lines);
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(merged[0].line.length(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_gap_keeps_segments_apart() {
        let lines = vec![
            line(1, LineCategory::Crease, (0.0, 0.0), (1.0, 1.0)),
            line(1, LineCategory::Crease, (2.0, 2.0), (3.0, 3.0)),
        ];
        let merged = merge_lines(lines);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].line.start.x < merged[1].line.start.x);
    }

    #[test]
    fn test_different_category_or_entity_not_merged() {
        let lines = vec![
            line(1, LineCategory::Silhouette, (0.0, 0.0), (2.0, 0.0)),
            line(1, LineCategory::Boundary, (1.0, 0.0), (3.0, 0.0)),
            line(2, LineCategory::Silhouette, (1.0, 0.0), (3.0, 0.0)),
        ];
        let merged = merge_lines(lines);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].entity_id, 1);
        assert_eq!(merged[1].category, LineCategory::Boundary);
        assert_eq!(merged[2].entity_id, 2);
    }

    #[test]
    fn test_offsets_across_bucket_boundary_merge() {
        let edge = 0.5 * OFFSET_TOLERANCE;
        let lines = vec![
            line(1, LineCategory::Silhouette, (0.0, edge - 1e-12), (2.0, edge - 1e-12)),
            line(1, LineCategory::Silhouette, (1.0, edge + 1e-12), (3.0, edge + 1e-12)),
        ];
        let merged = merge_lines(lines);
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(merged[0].line.length(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_parallel_offset_lines_not_merged() {
        let lines = vec![
            line(1, LineCategory::Silhouette, (0.0, 0.0), (2.0, 0.0)),
            line(1, LineCategory::Silhouette, (0.0, 0.5), (2.0, 0.5)),
        ];
        assert_eq!(merge_lines(lines).len(), 2);
    }
}
