// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declared supertypes of the IFC4 product classes that carry geometry
//!
//! Names compare ASCII case-insensitively, so STEP spellings (`IFCWALL`)
//! and schema spellings (`IfcWall`) are interchangeable.

/// `(type, supertype)` pairs. `IfcProduct` is the root.
const SUPERTYPES: &[(&str, &str)] = &[
    // Building elements
    ("IfcWall", "IfcBuildingElement"),
    ("IfcWallStandardCase", "IfcWall"),
    ("IfcWallElementedCase", "IfcWall"),
    ("IfcSlab", "IfcBuildingElement"),
    ("IfcSlabStandardCase", "IfcSlab"),
    ("IfcSlabElementedCase", "IfcSlab"),
    ("IfcColumn", "IfcBuildingElement"),
    ("IfcColumnStandardCase", "IfcColumn"),
    ("IfcBeam", "IfcBuildingElement"),
    ("IfcBeamStandardCase", "IfcBeam"),
    ("IfcMember", "IfcBuildingElement"),
    ("IfcMemberStandardCase", "IfcMember"),
    ("IfcPlate", "IfcBuildingElement"),
    ("IfcPlateStandardCase", "IfcPlate"),
    ("IfcDoor", "IfcBuildingElement"),
    ("IfcDoorStandardCase", "IfcDoor"),
    ("IfcWindow", "IfcBuildingElement"),
    ("IfcWindowStandardCase", "IfcWindow"),
    ("IfcRoof", "IfcBuildingElement"),
    ("IfcStair", "IfcBuildingElement"),
    ("IfcStairFlight", "IfcBuildingElement"),
    ("IfcRamp", "IfcBuildingElement"),
    ("IfcRampFlight", "IfcBuildingElement"),
    ("IfcRailing", "IfcBuildingElement"),
    ("IfcCovering", "IfcBuildingElement"),
    ("IfcCurtainWall", "IfcBuildingElement"),
    ("IfcFooting", "IfcBuildingElement"),
    ("IfcPile", "IfcBuildingElement"),
    ("IfcChimney", "IfcBuildingElement"),
    ("IfcShadingDevice", "IfcBuildingElement"),
    ("IfcBuildingElementProxy", "IfcBuildingElement"),
    ("IfcBuildingElement", "IfcElement"),
    // Openings
    ("IfcOpeningElement", "IfcFeatureElementSubtraction"),
    ("IfcOpeningStandardCase", "IfcOpeningElement"),
    ("IfcFeatureElementSubtraction", "IfcFeatureElement"),
    ("IfcFeatureElement", "IfcElement"),
    // Furnishing
    ("IfcFurnishingElement", "IfcElement"),
    ("IfcFurniture", "IfcFurnishingElement"),
    ("IfcSystemFurnitureElement", "IfcFurnishingElement"),
    // Distribution
    ("IfcDistributionElement", "IfcElement"),
    ("IfcDistributionFlowElement", "IfcDistributionElement"),
    ("IfcFlowSegment", "IfcDistributionFlowElement"),
    ("IfcFlowFitting", "IfcDistributionFlowElement"),
    ("IfcFlowTerminal", "IfcDistributionFlowElement"),
    ("IfcFlowController", "IfcDistributionFlowElement"),
    ("IfcPipeSegment", "IfcFlowSegment"),
    ("IfcDuctSegment", "IfcFlowSegment"),
    ("IfcCableSegment", "IfcFlowSegment"),
    ("IfcPipeFitting", "IfcFlowFitting"),
    ("IfcDuctFitting", "IfcFlowFitting"),
    ("IfcSanitaryTerminal", "IfcFlowTerminal"),
    ("IfcLightFixture", "IfcFlowTerminal"),
    ("IfcAirTerminal", "IfcFlowTerminal"),
    ("IfcValve", "IfcFlowController"),
    // Other elements
    ("IfcElementAssembly", "IfcElement"),
    ("IfcTransportElement", "IfcElement"),
    ("IfcVirtualElement", "IfcElement"),
    ("IfcCivilElement", "IfcElement"),
    ("IfcGeographicElement", "IfcElement"),
    ("IfcElement", "IfcProduct"),
    // Spatial structure
    ("IfcSpatialElement", "IfcProduct"),
    ("IfcSpatialStructureElement", "IfcSpatialElement"),
    ("IfcSite", "IfcSpatialStructureElement"),
    ("IfcBuilding", "IfcSpatialStructureElement"),
    ("IfcBuildingStorey", "IfcSpatialStructureElement"),
    ("IfcSpace", "IfcSpatialStructureElement"),
    ("IfcAnnotation", "IfcProduct"),
];

/// Longest chain in the table; bounds the ancestor walk
const MAX_DEPTH: usize = 8;

/// Compare two IFC type names
#[inline]
pub fn same_type(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Declared supertype of `ifc_type`, if known
pub fn supertype(ifc_type: &str) -> Option<&'static str> {
    SUPERTYPES
        .iter()
        .find(|(ty, _)| same_type(ty, ifc_type))
        .map(|(_, parent)| *parent)
}

/// Schema spelling of a known type name (`IFCWALL` → `IfcWall`)
pub fn canonical_name(ifc_type: &str) -> Option<&'static str> {
    SUPERTYPES
        .iter()
        .flat_map(|(ty, parent)| [*ty, *parent])
        .find(|ty| same_type(ty, ifc_type))
}

/// The type itself followed by its supertypes, nearest first.
/// Known types come back in schema spelling.
pub fn lineage(ifc_type: &str) -> impl Iterator<Item = &str> {
    let mut next = Some(canonical_name(ifc_type).unwrap_or(ifc_type));
    let mut steps = 0;
    std::iter::from_fn(move || {
        let current = next?;
        steps += 1;
        next = if steps > MAX_DEPTH { None } else { supertype(current) };
        Some(current)
    })
}

/// Whether `ifc_type` equals `ancestor` or is declared below it
pub fn is_subtype_of(ifc_type: &str, ancestor: &str) -> bool {
    lineage(ifc_type).any(|ty| same_type(ty, ancestor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supertype_chain() {
        let chain: Vec<_> = lineage("IfcWallStandardCase").collect();
        assert_eq!(
            chain,
            vec!["IfcWallStandardCase", "IfcWall", "IfcBuildingElement", "IfcElement", "IfcProduct"]
        );
    }

    #[test]
    fn test_subtype_case_insensitive() {
        assert!(is_subtype_of("IFCWALLSTANDARDCASE", "IfcWall"));
        assert!(is_subtype_of("IfcWall", "IFCWALL"));
        assert!(is_subtype_of("IfcPipeSegment", "IfcElement"));
        assert!(!is_subtype_of("IfcWall", "IfcWallStandardCase"));
        assert!(!is_subtype_of("IfcSlab", "IfcWall"));
    }

    #[test]
    fn test_unknown_type_is_its_own_lineage() {
        let chain: Vec<_> = lineage("IfcCustomThing").collect();
        assert_eq!(chain, vec!["IfcCustomThing"]);
        assert_eq!(canonical_name("IFCSLAB"), Some("IfcSlab"));
        assert_eq!(canonical_name("IFCPRODUCT"), Some("IfcProduct"));
        assert_eq!(canonical_name("IfcCustomThing"), None);
    }

    #[test]
    fn test_lineage_uses_schema_spelling() {
        let chain: Vec<_> = lineage("IFCWALLSTANDARDCASE").take(2).collect();
        assert_eq!(chain, vec!["IfcWallStandardCase", "IfcWall"]);
        assert_eq!(lineage("ifcslab").next(), Some("IfcSlab"));
    }
}
