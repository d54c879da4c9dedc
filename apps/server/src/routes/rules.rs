// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graphic override presets and rule import.

use crate::error::ApiError;
use crate::types::{PresetListResponse, RulesImportResponse};
use axum::Json;
use ifc_lite_drawing::style::{builtin_presets, import_presets};

/// GET /api/v1/presets - Built-in presets.
pub async fn list_presets() -> Json<PresetListResponse> {
    Json(PresetListResponse {
        presets: builtin_presets(),
    })
}

/// POST /api/v1/rules/import - Validate presets, dropping malformed entries.
pub async fn import(body: String) -> Result<Json<RulesImportResponse>, ApiError> {
    let imported = import_presets(&body)?;
    if imported.discarded > 0 {
        tracing::warn!(
            accepted = imported.presets.len(),
            discarded = imported.discarded,
            "Discarded malformed presets or rules"
        );
    }
    Ok(Json(RulesImportResponse {
        presets: imported.presets,
        discarded: imported.discarded,
    }))
}
