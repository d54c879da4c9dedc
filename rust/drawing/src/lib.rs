//! IFC-Lite Drawing Generation
//!
//! 2D plan and section drawings from triangulated IFC geometry: plane
//! cutting into polygons with holes, classified projection lines, hatch
//! fills, and a priority-ordered graphic override engine shared by every
//! renderer.

pub mod error;
pub mod generate;
pub mod hatch;
pub mod intersect;
pub mod merge;
pub mod mesh;
pub mod polygon;
pub mod projection;
pub mod render;
pub mod section;
pub mod style;
pub mod svg;
pub mod types;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use error::{Error, Result};
pub use generate::{cut, generate, is_degenerate_plane, CancelToken, CutResult, GenerateOptions, ProgressFn};
pub use hatch::{generate_hatches, hatch_polygon, HatchLine, HatchParams, HatchPattern, HatchResult};
pub use merge::merge_lines;
pub use mesh::{box_mesh, Mesh, MeshBounds};
pub use render::{Layer, RenderItem, RenderOptions, RenderPlan, RenderSink, Stroke};
pub use section::{Axis, SectionConfig};
pub use style::{
    resolve, Color, Criteria, EntityRef, GraphicOverridePreset, GraphicOverrideRule, GraphicStyle,
    ModelDataProvider, PartialGraphicStyle, ResolvedStyle, StyleResolver, StyleSource,
};
pub use svg::{export_svg, SvgSink};
pub use types::{Bounds2D, CutPolygon, Drawing, DrawingLine, Line2D, LineCategory, Polygon2D, Visibility};
