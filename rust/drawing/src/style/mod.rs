// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graphic override engine
//!
//! Resolves the final fill, stroke and hatch of each element from a
//! priority-ordered rule list, falling back to per-type defaults.

pub mod color;
pub mod criteria;
pub mod defaults;
pub mod graphic;
pub mod ifc_types;
pub mod model_data;
pub mod presets;
pub mod resolver;
pub mod rules;

pub use color::{Color, ParseColorError};
pub use criteria::{Criteria, EntityRef, Operator};
pub use defaults::{type_defaults, TypeDefaults};
pub use graphic::{GraphicStyle, PartialGraphicStyle, ResolvedStyle};
pub use model_data::{ClassificationRef, EntityData, InMemoryModelData, ModelDataProvider, NoModelData};
pub use presets::{builtin_preset, builtin_presets, export_presets, export_rules, import_presets, import_rules, PresetImport, RuleImport};
pub use resolver::{resolve, DefaultStyles, StyleResolver, StyleSource};
pub use rules::{GraphicOverridePreset, GraphicOverrideRule};
