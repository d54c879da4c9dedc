// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rule resolution
//!
//! Enabled rules are evaluated in ascending priority. Each matching rule's
//! explicit fields overwrite an accumulator, and whatever is still unset at
//! the end comes from the type defaults. Resolution never mutates the rules
//! it is given and has no side effects.

use super::criteria::EntityRef;
use super::graphic::{GraphicStyle, PartialGraphicStyle, ResolvedStyle};
use super::model_data::{ModelDataProvider, NoModelData};
use super::rules::{evaluation_order, GraphicOverrideRule};
use crate::hatch::HatchParams;
use crate::types::CutPolygon;
use std::sync::Arc;

/// Resolve the style of one element against a rule list
pub fn resolve(
    entity: &EntityRef<'_>,
    rules: &[GraphicOverrideRule],
    data: &dyn ModelDataProvider,
) -> ResolvedStyle {
    resolve_ordered(entity, evaluation_order(rules).into_iter(), data)
}

fn resolve_ordered<'r>(
    entity: &EntityRef<'_>,
    ordered: impl Iterator<Item = &'r GraphicOverrideRule>,
    data: &dyn ModelDataProvider,
) -> ResolvedStyle {
    let mut acc = PartialGraphicStyle::default();
    let mut matched_rules = Vec::new();
    for rule in ordered {
        if rule.criteria.matches(entity, data) {
            acc.apply(&rule.style);
            matched_rules.push(rule.id.clone());
        }
    }
    ResolvedStyle {
        style: GraphicStyle::complete(&acc, entity.ifc_type),
        matched_rules,
    }
}

/// Anything that can answer "what does this element look like".
/// Every renderer goes through this seam.
pub trait StyleSource: Sync {
    fn style_for(&self, entity: &EntityRef<'_>) -> GraphicStyle;

    /// Hatch parameters for a cut polygon
    fn hatch_for(&self, cut: &CutPolygon) -> HatchParams {
        self.style_for(&EntityRef {
            entity_id: cut.entity_id,
            ifc_type: &cut.ifc_type,
            model_index: cut.model_index,
        })
        .hatch_params()
    }
}

/// Rule snapshot plus model data, sorted once and reused for every element
#[derive(Clone)]
pub struct StyleResolver {
    ordered: Arc<[GraphicOverrideRule]>,
    data: Arc<dyn ModelDataProvider>,
}

impl std::fmt::Debug for StyleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleResolver")
            .field("rules", &self.ordered.len())
            .finish_non_exhaustive()
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new(&[], Arc::new(NoModelData))
    }
}

impl StyleResolver {
    /// Snapshot `rules`; later edits to the caller's list are not seen
    pub fn new(rules: &[GraphicOverrideRule], data: Arc<dyn ModelDataProvider>) -> Self {
        let ordered: Vec<GraphicOverrideRule> = evaluation_order(rules).into_iter().cloned().collect();
        Self {
            ordered: ordered.into(),
            data,
        }
    }

    /// Resolver for type-only rules
    pub fn without_model_data(rules: &[GraphicOverrideRule]) -> Self {
        Self::new(rules, Arc::new(NoModelData))
    }

    pub fn rule_count(&self) -> usize {
        self.ordered.len()
    }

    pub fn resolve(&self, entity: &EntityRef<'_>) -> ResolvedStyle {
        resolve_ordered(entity, self.ordered.iter(), self.data.as_ref())
    }
}

impl StyleSource for StyleResolver {
    fn style_for(&self, entity: &EntityRef<'_>) -> GraphicStyle {
        self.resolve(entity).style
    }
}

/// Type defaults only
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStyles;

impl StyleSource for DefaultStyles {
    fn style_for(&self, entity: &EntityRef<'_>) -> GraphicStyle {
        GraphicStyle::for_type(entity.ifc_type)
    }
}
