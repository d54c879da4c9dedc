// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section plane definition and the plane-local 2D frame
//!
//! The cutting plane is always perpendicular to one model axis. Drawing
//! coordinates are the two remaining model coordinates, oriented so the
//! viewer sees a right-handed (non-mirrored) image.

use crate::error::{Error, Result};
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis the cutting plane is perpendicular to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Coordinate index (0 = x, 1 = y, 2 = z)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Cutting plane and projection settings for one drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConfig {
    pub axis: Axis,
    /// Plane position along `axis` in model units
    pub position: f64,
    /// View the section from the negative side of the plane
    #[serde(default)]
    pub flipped: bool,
    /// Distance beyond the plane within which geometry is projected
    #[serde(default = "default_projection_depth")]
    pub projection_depth: f64,
    #[serde(default)]
    pub include_hidden_lines: bool,
    /// Drawing scale denominator (100 means 1:100)
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_projection_depth() -> f64 {
    3.0
}

fn default_scale() -> f64 {
    100.0
}

impl SectionConfig {
    /// Horizontal cut (plan view) at the given height
    pub fn plan(height: f64) -> Self {
        Self {
            axis: Axis::Z,
            position: height,
            flipped: false,
            projection_depth: default_projection_depth(),
            include_hidden_lines: false,
            scale: default_scale(),
        }
    }

    /// Vertical cut perpendicular to `axis`
    pub fn section(axis: Axis, position: f64) -> Self {
        Self {
            axis,
            ..Self::plan(position)
        }
    }

    /// Check that all numeric settings are usable
    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() {
            return Err(Error::InvalidConfig("position must be finite".to_string()));
        }
        if !self.projection_depth.is_finite() || self.projection_depth < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "projection depth must be a non-negative number, got {}",
                self.projection_depth
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Model units covered by one paper millimetre at this scale
    /// (model units are metres)
    #[inline]
    pub fn model_units_per_mm(&self) -> f64 {
        paper_mm_to_model(1.0, self.scale)
    }
}

/// Convert a paper-space length in millimetres to model units (metres)
#[inline]
pub fn paper_mm_to_model(mm: f64, scale: f64) -> f64 {
    mm * scale / 1000.0
}

/// Plane-local frame derived from a [`SectionConfig`]
#[derive(Debug, Clone, Copy)]
pub struct SectionFrame {
    axis: usize,
    u: usize,
    v: usize,
    u_sign: f64,
    view_sign: f64,
    position: f64,
    projection_depth: f64,
}

impl SectionFrame {
    pub fn new(config: &SectionConfig) -> Self {
        // Horizontal drawing axis per cut axis, chosen so that looking from
        // the positive side of the plane gives a non-mirrored image
        let (u, v, u_sign) = match config.axis {
            Axis::X => (1, 2, 1.0),
            Axis::Y => (0, 2, -1.0),
            Axis::Z => (0, 1, 1.0),
        };
        let flip = if config.flipped { -1.0 } else { 1.0 };
        Self {
            axis: config.axis.index(),
            u,
            v,
            u_sign: u_sign * flip,
            view_sign: flip,
            position: config.position,
            projection_depth: config.projection_depth,
        }
    }

    /// Signed distance from the plane along the viewing direction.
    /// Geometry in the projection range has depth in `(0, projection_depth]`,
    /// geometry on the viewer's side of the plane has negative depth.
    #[inline]
    pub fn depth(&self, p: &Point3<f64>) -> f64 {
        (self.position - p[self.axis]) * self.view_sign
    }

    /// Signed distance from the plane along the positive cut axis,
    /// independent of the viewing side
    #[inline]
    pub fn plane_distance(&self, p: &Point3<f64>) -> f64 {
        p[self.axis] - self.position
    }

    /// Project a model point onto the drawing plane
    #[inline]
    pub fn to_2d(&self, p: &Point3<f64>) -> Point2<f64> {
        Point2::new(p[self.u] * self.u_sign, p[self.v])
    }

    /// Whether a face with this normal faces the viewer
    #[inline]
    pub fn is_front_facing(&self, normal: &Vector3<f64>) -> bool {
        normal[self.axis] * self.view_sign > FACING_EPSILON
    }

    /// Component of a unit normal along the view axis, positive toward the viewer
    #[inline]
    pub fn facing(&self, normal: &Vector3<f64>) -> f64 {
        normal[self.axis] * self.view_sign
    }

    #[inline]
    pub fn projection_depth(&self) -> f64 {
        self.projection_depth
    }
}

/// Faces closer to edge-on than this are treated as back-facing
const FACING_EPSILON: f64 = 1e-9;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plan_frame() {
        let frame = SectionFrame::new(&SectionConfig::plan(1.5));
        let p = Point3::new(2.0, 3.0, 1.0);
        assert_relative_eq!(frame.depth(&p), 0.5);
        assert_eq!(frame.to_2d(&p), Point2::new(2.0, 3.0));
        assert!(frame.is_front_facing(&Vector3::z()));
        assert!(!frame.is_front_facing(&-Vector3::z()));
    }

    #[test]
    fn test_flipped_frame_mirrors_horizontal() {
        let mut config = SectionConfig::plan(1.5);
        config.flipped = true;
        let frame = SectionFrame::new(&config);
        let p = Point3::new(2.0, 3.0, 2.0);
        assert_relative_eq!(frame.depth(&p), 0.5);
        assert_eq!(frame.to_2d(&p), Point2::new(-2.0, 3.0));
        assert!(frame.is_front_facing(&-Vector3::z()));
    }

    #[test]
    fn test_section_axes() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let fx = SectionFrame::new(&SectionConfig::section(Axis::X, 0.0));
        assert_eq!(fx.to_2d(&p), Point2::new(2.0, 3.0));
        let fy = SectionFrame::new(&SectionConfig::section(Axis::Y, 0.0));
        assert_eq!(fy.to_2d(&p), Point2::new(-1.0, 3.0));
    }

    #[test]
    fn test_validate() {
        let mut config = SectionConfig::plan(0.0);
        assert!(config.validate().is_ok());
        config.scale = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        config.scale = 50.0;
        config.projection_depth = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_defaults() {
        let config: SectionConfig =
            serde_json::from_str(r#"{"axis":"y","position":2.5}"#).unwrap();
        assert_eq!(config.axis, Axis::Y);
        assert!(!config.flipped);
        assert!(!config.include_hidden_lines);
        assert_relative_eq!(config.scale, 100.0);
        assert_relative_eq!(config.model_units_per_mm(), 0.1);
    }
}
