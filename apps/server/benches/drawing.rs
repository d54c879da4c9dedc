// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmark of the drawing pipeline on a synthetic floor plate.
//!
//! Measures:
//! 1. Plane cut with projection and line merging
//! 2. Hatch generation for the resulting cut polygons
//! 3. SVG export
//!
//! Run with: cargo bench -p ifc-lite-drawing-server --bench drawing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ifc_lite_drawing::{
    box_mesh, export_svg, generate, generate_hatches, GenerateOptions, Mesh, Point3, RenderOptions, SectionConfig,
    StyleResolver, StyleSource,
};

/// Grid of rooms: walls on every grid line, a slab and one furniture block per room.
fn floor_plate(rooms_per_side: usize) -> Vec<Mesh> {
    let room = 4.0;
    let extent = room * rooms_per_side as f64;
    let mut meshes = vec![box_mesh(
        1,
        "IfcSlab",
        Point3::new(0.0, 0.0, -0.25),
        Point3::new(extent, extent, 0.0),
    )];
    let mut id = 2;
    for i in 0..=rooms_per_side {
        let t = room * i as f64;
        meshes.push(box_mesh(id, "IfcWall", Point3::new(0.0, t, 0.0), Point3::new(extent, t + 0.2, 3.0)));
        meshes.push(box_mesh(id + 1, "IfcWall", Point3::new(t, 0.0, 0.0), Point3::new(t + 0.2, extent, 3.0)));
        id += 2;
    }
    for i in 0..rooms_per_side {
        for j in 0..rooms_per_side {
            let (x, y) = (room * i as f64 + 1.0, room * j as f64 + 1.0);
            meshes.push(box_mesh(id, "IfcFurniture", Point3::new(x, y, 0.0), Point3::new(x + 1.2, y + 0.8, 0.75)));
            id += 1;
        }
    }
    meshes
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for rooms in [4, 10, 20] {
        let meshes = floor_plate(rooms);
        let triangles: usize = meshes.iter().map(|m| m.indices.len() / 3).sum();
        group.throughput(Throughput::Elements(triangles as u64));
        for hidden in [false, true] {
            let config = SectionConfig {
                include_hidden_lines: hidden,
                ..SectionConfig::plan(1.2)
            };
            let label = if hidden { "with_hidden" } else { "visible_only" };
            group.bench_with_input(BenchmarkId::new(label, rooms), &meshes, |b, meshes| {
                b.iter(|| generate(black_box(meshes), &config, &GenerateOptions::default()))
            });
        }
    }
    group.finish();
}

fn bench_hatch_and_svg(c: &mut Criterion) {
    let meshes = floor_plate(10);
    let config = SectionConfig::plan(1.2);
    let drawing = match generate(&meshes, &config, &GenerateOptions::default()) {
        Ok(drawing) => drawing,
        Err(e) => panic!("benchmark model failed to cut: {e}"),
    };
    let styles = StyleResolver::default();

    let mut group = c.benchmark_group("styling");
    for scale in [50.0, 100.0, 200.0] {
        group.bench_with_input(BenchmarkId::new("hatch", scale), &scale, |b, &scale| {
            b.iter(|| generate_hatches(black_box(&drawing.cut_polygons), scale, |cut| styles.hatch_for(cut)))
        });
    }

    let hatches = generate_hatches(&drawing.cut_polygons, config.scale, |cut| styles.hatch_for(cut));
    group.bench_function("svg", |b| {
        b.iter(|| export_svg(black_box(&drawing), &styles, &hatches, &RenderOptions::default()))
    });
    group.finish();
}

criterion_group!(benches, bench_generate, bench_hatch_and_svg);
criterion_main!(benches);
