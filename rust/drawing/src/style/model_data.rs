// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building-model data lookups used by non-type rule criteria

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Classification reference attached to an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRef {
    pub system: String,
    pub code: String,
}

/// Read-only access to element attributes, properties, quantities,
/// classifications and materials. Values are compared as strings;
/// quantities additionally numerically.
pub trait ModelDataProvider: Send + Sync {
    fn attribute(&self, entity_id: u32, name: &str) -> Option<String>;
    fn property(&self, entity_id: u32, pset: &str, name: &str) -> Option<String>;
    fn quantity(&self, entity_id: u32, qset: &str, name: &str) -> Option<f64>;
    fn classifications(&self, entity_id: u32) -> Vec<ClassificationRef>;
    fn materials(&self, entity_id: u32) -> Vec<String>;
}

/// Provider with no data: every lookup is absent
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModelData;

impl ModelDataProvider for NoModelData {
    fn attribute(&self, _: u32, _: &str) -> Option<String> {
        None
    }

    fn property(&self, _: u32, _: &str, _: &str) -> Option<String> {
        None
    }

    fn quantity(&self, _: u32, _: &str, _: &str) -> Option<f64> {
        None
    }

    fn classifications(&self, _: u32) -> Vec<ClassificationRef> {
        Vec::new()
    }

    fn materials(&self, _: u32) -> Vec<String> {
        Vec::new()
    }
}

/// Data recorded for one element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityData {
    pub attributes: FxHashMap<String, String>,
    /// Property set name → property name → value
    pub properties: FxHashMap<String, FxHashMap<String, String>>,
    /// Quantity set name → quantity name → value
    pub quantities: FxHashMap<String, FxHashMap<String, f64>>,
    pub classifications: Vec<ClassificationRef>,
    pub materials: Vec<String>,
}

/// Provider backed by in-memory maps, deserialisable from JSON keyed by
/// entity id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryModelData {
    entities: FxHashMap<u32, EntityData>,
}

impl InMemoryModelData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable record for an element, created on first access
    pub fn entity_mut(&mut self, entity_id: u32) -> &mut EntityData {
        self.entities.entry(entity_id).or_default()
    }

    pub fn with_attribute(mut self, entity_id: u32, name: &str, value: &str) -> Self {
        self.entity_mut(entity_id)
            .attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_property(mut self, entity_id: u32, pset: &str, name: &str, value: &str) -> Self {
        self.entity_mut(entity_id)
            .properties
            .entry(pset.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_quantity(mut self, entity_id: u32, qset: &str, name: &str, value: f64) -> Self {
        self.entity_mut(entity_id)
            .quantities
            .entry(qset.to_string())
            .or_default()
            .insert(name.to_string(), value);
        self
    }

    pub fn with_classification(mut self, entity_id: u32, system: &str, code: &str) -> Self {
        self.entity_mut(entity_id).classifications.push(ClassificationRef {
            system: system.to_string(),
            code: code.to_string(),
        });
        self
    }

    pub fn with_material(mut self, entity_id: u32, name: &str) -> Self {
        self.entity_mut(entity_id).materials.push(name.to_string());
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl ModelDataProvider for InMemoryModelData {
    fn attribute(&self, entity_id: u32, name: &str) -> Option<String> {
        self.entities.get(&entity_id)?.attributes.get(name).cloned()
    }

    fn property(&self, entity_id: u32, pset: &str, name: &str) -> Option<String> {
        self.entities
            .get(&entity_id)?
            .properties
            .get(pset)?
            .get(name)
            .cloned()
    }

    fn quantity(&self, entity_id: u32, qset: &str, name: &str) -> Option<f64> {
        self.entities
            .get(&entity_id)?
            .quantities
            .get(qset)?
            .get(name)
            .copied()
    }

    fn classifications(&self, entity_id: u32) -> Vec<ClassificationRef> {
        self.entities
            .get(&entity_id)
            .map(|e| e.classifications.clone())
            .unwrap_or_default()
    }

    fn materials(&self, entity_id: u32) -> Vec<String> {
        self.entities
            .get(&entity_id)
            .map(|e| e.materials.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_lookups() {
        let data = InMemoryModelData::new()
            .with_attribute(1, "Name", "Wall-01")
            .with_property(1, "Pset_WallCommon", "IsExternal", "TRUE")
            .with_quantity(1, "Qto_WallBaseQuantities", "Width", 0.2)
            .with_material(1, "Concrete C30/37");

        assert_eq!(data.attribute(1, "Name").as_deref(), Some("Wall-01"));
        assert_eq!(
            data.property(1, "Pset_WallCommon", "IsExternal").as_deref(),
            Some("TRUE")
        );
        assert_eq!(data.quantity(1, "Qto_WallBaseQuantities", "Width"), Some(0.2));
        assert_eq!(data.property(1, "Pset_Missing", "IsExternal"), None);
        assert!(data.materials(2).is_empty());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "7": {
                "attributes": { "ObjectType": "Partition" },
                "classifications": [{ "system": "Uniclass", "code": "Ss_25_10" }]
            }
        }"#;
        let data: InMemoryModelData = serde_json::from_str(json).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.attribute(7, "ObjectType").as_deref(), Some("Partition"));
        assert_eq!(data.classifications(7)[0].code, "Ss_25_10");
    }
}
