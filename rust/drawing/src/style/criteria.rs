// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rule criteria and their matching semantics
//!
//! Type criteria are evaluated directly. Everything else is looked up through
//! a [`ModelDataProvider`]; a lookup that finds nothing simply doesn't match.

use super::ifc_types::{is_subtype_of, same_type};
use super::model_data::ModelDataProvider;
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of the element being styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef<'a> {
    pub entity_id: u32,
    pub ifc_type: &'a str,
    pub model_index: usize,
}

impl<'a> EntityRef<'a> {
    pub fn new(entity_id: u32, ifc_type: &'a str) -> Self {
        Self {
            entity_id,
            ifc_type,
            model_index: 0,
        }
    }
}

/// Value comparison applied to a looked-up value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    Equals,
    /// Case-sensitive substring
    Contains,
    /// Present, whatever the value
    Exists,
}

/// Which elements a rule applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Criteria {
    #[serde(rename_all = "camelCase")]
    IfcType {
        ifc_type: String,
        #[serde(default)]
        include_subtypes: bool,
    },
    Attribute {
        name: String,
        #[serde(default)]
        operator: Operator,
        #[serde(default, deserialize_with = "scalar_as_string", skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Property {
        pset: String,
        name: String,
        #[serde(default)]
        operator: Operator,
        #[serde(default, deserialize_with = "scalar_as_string", skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Quantity {
        qset: String,
        name: String,
        #[serde(default)]
        operator: Operator,
        #[serde(default, deserialize_with = "scalar_as_string", skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Classification {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    Material {
        name: String,
    },
    /// All nested criteria match (empty matches)
    And {
        criteria: Vec<Criteria>,
    },
    /// Any nested criterion matches (empty doesn't)
    Or {
        criteria: Vec<Criteria>,
    },
    Not {
        criteria: Box<Criteria>,
    },
}

/// Accept strings, numbers and booleans for comparison values
fn scalar_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    use serde_json::Value;
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, number or boolean value, got {other}"
        ))),
    }
}

impl Criteria {
    pub fn ifc_type(ifc_type: &str, include_subtypes: bool) -> Self {
        Criteria::IfcType {
            ifc_type: ifc_type.to_string(),
            include_subtypes,
        }
    }

    pub fn matches(&self, entity: &EntityRef<'_>, data: &dyn ModelDataProvider) -> bool {
        match self {
            Criteria::IfcType {
                ifc_type,
                include_subtypes,
            } => {
                if *include_subtypes {
                    is_subtype_of(entity.ifc_type, ifc_type)
                } else {
                    same_type(entity.ifc_type, ifc_type)
                }
            }
            Criteria::Attribute { name, operator, value } => compare_text(
                data.attribute(entity.entity_id, name).as_deref(),
                *operator,
                value.as_deref(),
            ),
            Criteria::Property {
                pset,
                name,
                operator,
                value,
            } => compare_text(
                data.property(entity.entity_id, pset, name).as_deref(),
                *operator,
                value.as_deref(),
            ),
            Criteria::Quantity {
                qset,
                name,
                operator,
                value,
            } => compare_quantity(
                data.quantity(entity.entity_id, qset, name),
                *operator,
                value.as_deref(),
            ),
            Criteria::Classification { system, code } => {
                data.classifications(entity.entity_id).iter().any(|c| {
                    system.as_deref().map_or(true, |s| c.system.eq_ignore_ascii_case(s.trim()))
                        && code.as_deref().map_or(true, |k| c.code == k.trim())
                })
            }
            Criteria::Material { name } => {
                let needle = name.trim().to_lowercase();
                data.materials(entity.entity_id)
                    .iter()
                    .any(|m| m.to_lowercase().contains(&needle))
            }
            Criteria::And { criteria } => criteria.iter().all(|c| c.matches(entity, data)),
            Criteria::Or { criteria } => criteria.iter().any(|c| c.matches(entity, data)),
            Criteria::Not { criteria } => !criteria.matches(entity, data),
        }
    }
}

/// Numbers compare numerically when both sides parse, text otherwise
fn values_equal(actual: &str, expected: &str) -> bool {
    if actual == expected {
        return true;
    }
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => numbers_equal(a, b),
        _ => false,
    }
}

#[inline]
fn numbers_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn compare_text(actual: Option<&str>, operator: Operator, expected: Option<&str>) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    match operator {
        Operator::Exists => true,
        Operator::Equals => expected.is_some_and(|e| values_equal(actual, e)),
        Operator::Contains => expected.is_some_and(|e| actual.contains(e)),
    }
}

fn compare_quantity(actual: Option<f64>, operator: Operator, expected: Option<&str>) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    match operator {
        Operator::Exists => true,
        Operator::Equals => expected
            .and_then(|e| e.trim().parse::<f64>().ok())
            .is_some_and(|e| numbers_equal(actual, e)),
        Operator::Contains => expected.is_some_and(|e| actual.to_string().contains(e)),
    }
}
