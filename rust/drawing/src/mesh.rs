// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input mesh data structures
//!
//! Meshes are produced by the geometry extraction pipeline and are read-only
//! here. One building element may be represented by several meshes (one per
//! geometry item), all carrying the same `entity_id`.

use crate::section::Axis;
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Triangulated geometry of one IFC element (or one of its geometry items)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    /// Express ID of the IFC element
    pub entity_id: u32,
    /// IFC type name (e.g. "IfcWall")
    pub ifc_type: String,
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
    /// RGBA color in 0-1 range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 4]>,
    /// Index of the source model in a federated scene
    #[serde(default)]
    pub model_index: usize,
}

/// Axis-aligned bounds of a set of meshes in f64 precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl MeshBounds {
    /// Create new bounds initialized to an inverted (invalid) state
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Check if at least one point was added
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x
    }

    #[inline]
    pub fn expand(&mut self, p: &Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Extent (min, max) along one axis
    #[inline]
    pub fn extent(&self, axis: Axis) -> (f64, f64) {
        let i = axis.index();
        (self.min[i], self.max[i])
    }
}

impl Mesh {
    /// Create a new empty mesh for an element
    pub fn new(entity_id: u32, ifc_type: impl Into<String>) -> Self {
        Self {
            entity_id,
            ifc_type: ifc_type.into(),
            ..Self::default()
        }
    }

    /// Set the element color
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the federated model index
    pub fn with_model_index(mut self, model_index: usize) -> Self {
        self.model_index = model_index;
        self
    }

    /// Add a vertex, returning its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);
        index
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Vertex position in f64, or `None` if the index is out of range
    #[inline]
    pub fn vertex(&self, index: u32) -> Option<Point3<f64>> {
        let i = index as usize * 3;
        let chunk = self.positions.get(i..i + 3)?;
        Some(Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64))
    }

    /// Iterate over triangles as vertex triples, skipping triangles with
    /// out-of-range indices
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            Some([
                self.vertex(tri[0])?,
                self.vertex(tri[1])?,
                self.vertex(tri[2])?,
            ])
        })
    }

    /// Calculate bounds in f64
    pub fn bounds(&self) -> MeshBounds {
        let mut bounds = MeshBounds::empty();
        self.positions.chunks_exact(3).for_each(|chunk| {
            bounds.expand(&Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64));
        });
        bounds
    }
}

/// Combined bounds of all meshes
pub fn meshes_bounds(meshes: &[Mesh]) -> MeshBounds {
    let mut bounds = MeshBounds::empty();
    for mesh in meshes {
        let b = mesh.bounds();
        if b.is_valid() {
            bounds.expand(&b.min);
            bounds.expand(&b.max);
        }
    }
    bounds
}

/// All meshes of one element, in input order
#[derive(Debug, Clone)]
pub struct EntityMeshes<'a> {
    pub entity_id: u32,
    pub ifc_type: &'a str,
    pub model_index: usize,
    pub meshes: Vec<&'a Mesh>,
}

impl EntityMeshes<'_> {
    /// Iterate over the triangles of every mesh of the element
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.meshes.iter().flat_map(|mesh| mesh.triangles())
    }
}

/// Group meshes by `(model_index, entity_id)`, preserving first-seen order.
/// The IFC type of a group is taken from its first mesh.
pub fn group_by_entity(meshes: &[Mesh]) -> Vec<EntityMeshes<'_>> {
    let mut groups: Vec<EntityMeshes<'_>> = Vec::new();
    let mut index: FxHashMap<(usize, u32), usize> = FxHashMap::default();
    for mesh in meshes {
        if mesh.is_empty() {
            continue;
        }
        let key = (mesh.model_index, mesh.entity_id);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(EntityMeshes {
                entity_id: mesh.entity_id,
                ifc_type: &mesh.ifc_type,
                model_index: mesh.model_index,
                meshes: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].meshes.push(mesh);
    }
    groups
}

/// Axis-aligned box mesh, used by tests and benchmarks
pub fn box_mesh(entity_id: u32, ifc_type: &str, min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::new(entity_id, ifc_type);
    let corners = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];
    for c in corners {
        mesh.add_vertex(c);
    }
    // Outward-facing, counter-clockwise winding
    #[rustfmt::skip]
    let faces: [[u32; 3]; 12] = [
        [0, 2, 1], [0, 3, 2], // bottom (-Z)
        [4, 5, 6], [4, 6, 7], // top (+Z)
        [0, 1, 5], [0, 5, 4], // front (-Y)
        [2, 3, 7], [2, 7, 6], // back (+Y)
        [0, 4, 7], [0, 7, 3], // left (-X)
        [1, 2, 6], [1, 6, 5], // right (+X)
    ];
    for [a, b, c] in faces {
        mesh.add_triangle(a, b, c);
    }
    mesh
}
