// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static per-type style defaults

use super::color::Color;
use super::ifc_types::{lineage, same_type};
use crate::hatch::HatchPattern;

pub const DEFAULT_STROKE_COLOR: Color = Color::BLACK;
pub const DEFAULT_LINE_WEIGHT_MM: f64 = 0.35;
pub const DEFAULT_OPACITY: f64 = 1.0;
pub const DEFAULT_HATCH_COLOR: Color = Color::BLACK;
pub const DEFAULT_HATCH_LINE_WEIGHT_MM: f64 = 0.13;

/// Fill and hatch used when no rule sets them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDefaults {
    pub fill_color: Color,
    pub hatch_pattern: HatchPattern,
}

const fn entry(r: u8, g: u8, b: u8, hatch_pattern: HatchPattern) -> TypeDefaults {
    TypeDefaults {
        fill_color: Color::rgb(r, g, b),
        hatch_pattern,
    }
}

/// Entry for types not listed (and not descending from a listed type)
pub const FALLBACK: TypeDefaults = entry(0xcc, 0xcc, 0xcc, HatchPattern::None);

const TABLE: &[(&str, TypeDefaults)] = &[
    ("IfcWall", entry(0xb0, 0xb0, 0xb0, HatchPattern::Diagonal)),
    ("IfcCurtainWall", entry(0xc8, 0xe6, 0xff, HatchPattern::None)),
    ("IfcSlab", entry(0xa0, 0xa0, 0xa0, HatchPattern::Concrete)),
    ("IfcRoof", entry(0xb4, 0xa0, 0x8c, HatchPattern::Diagonal)),
    ("IfcColumn", entry(0x80, 0x80, 0x80, HatchPattern::Concrete)),
    ("IfcBeam", entry(0x90, 0x90, 0x90, HatchPattern::Concrete)),
    ("IfcFooting", entry(0x90, 0x90, 0x90, HatchPattern::Concrete)),
    ("IfcPile", entry(0x90, 0x90, 0x90, HatchPattern::Concrete)),
    ("IfcMember", entry(0xa8, 0xa8, 0xa8, HatchPattern::None)),
    ("IfcPlate", entry(0xd0, 0xd0, 0xd0, HatchPattern::None)),
    ("IfcStair", entry(0xc8, 0xc8, 0xc8, HatchPattern::None)),
    ("IfcStairFlight", entry(0xc8, 0xc8, 0xc8, HatchPattern::None)),
    ("IfcRamp", entry(0xc8, 0xc8, 0xc8, HatchPattern::None)),
    ("IfcRampFlight", entry(0xc8, 0xc8, 0xc8, HatchPattern::None)),
    ("IfcRailing", entry(0xa0, 0xa0, 0xa0, HatchPattern::None)),
    ("IfcCovering", entry(0xe0, 0xe0, 0xe0, HatchPattern::None)),
    ("IfcDoor", entry(0xe6, 0xd2, 0xb4, HatchPattern::None)),
    ("IfcWindow", entry(0xc8, 0xe6, 0xff, HatchPattern::None)),
    ("IfcFurnishingElement", entry(0xf0, 0xe6, 0xd2, HatchPattern::None)),
    ("IfcSpace", entry(0xf5, 0xf5, 0xf5, HatchPattern::None)),
    ("IfcOpeningElement", entry(0xff, 0xff, 0xff, HatchPattern::None)),
    ("IfcDistributionElement", entry(0xb4, 0xc8, 0xdc, HatchPattern::None)),
];

/// Defaults for `ifc_type`, inherited from the nearest listed supertype
pub fn type_defaults(ifc_type: &str) -> TypeDefaults {
    lineage(ifc_type)
        .find_map(|ty| {
            TABLE
                .iter()
                .find(|(name, _)| same_type(name, ty))
                .map(|(_, defaults)| *defaults)
        })
        .unwrap_or(FALLBACK)
}
