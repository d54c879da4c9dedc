// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Override rules and rule presets

use super::criteria::Criteria;
use super::graphic::PartialGraphicStyle;
use serde::{Deserialize, Serialize};

fn enabled_by_default() -> bool {
    true
}

/// Criteria plus the style fields applied to matching elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicOverrideRule {
    pub id: String,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Lower priorities are applied first; later matches win per field
    #[serde(default)]
    pub priority: i32,
    pub criteria: Criteria,
    #[serde(default)]
    pub style: PartialGraphicStyle,
}

impl GraphicOverrideRule {
    pub fn new(id: &str, name: &str, priority: i32, criteria: Criteria, style: PartialGraphicStyle) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            enabled: true,
            priority,
            criteria,
            style,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Named rule collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicOverridePreset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: Vec<GraphicOverrideRule>,
}

/// Enabled rules in evaluation order: ascending priority, ties in list order
pub fn evaluation_order(rules: &[GraphicOverrideRule]) -> Vec<&GraphicOverrideRule> {
    let mut ordered: Vec<&GraphicOverrideRule> = rules.iter().filter(|r| r.enabled).collect();
    ordered.sort_by_key(|r| r.priority);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_defaults_from_json() {
        let json = r#"{
            "id": "r1",
            "name": "Walls",
            "criteria": { "type": "ifcType", "ifcType": "IfcWall" }
        }"#;
        let rule: GraphicOverrideRule = serde_json::from_str(json).unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.priority, 0);
        assert!(rule.style.is_empty());
    }

    #[test]
    fn test_evaluation_order_is_stable() {
        let rule = |id: &str, priority| {
            GraphicOverrideRule::new(id, id, priority, Criteria::And { criteria: vec![] }, Default::default())
        };
        let rules = vec![rule("c", 5), rule("a", 1), rule("b", 1).disabled(), rule("d", 1)];
        let ids: Vec<_> = evaluation_order(&rules).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d", "c"]);
    }
}
