//! IFC-Lite Drawing Processing
//!
//! Async lifecycle around [`ifc_lite_drawing::generate`]: one
//! [`DrawingPanel`] per visible drawing, debounced requests identified by a
//! monotonically increasing id, and results applied only while they are
//! still the latest request.

pub mod backend;
pub mod error;
pub mod panel;

pub use backend::{ContextHandle, GeometryBackend, GeometryContext, StaticMeshBackend};
pub use error::{GenerationError, Result};
pub use panel::{
    DrawingPanel, GenerationRequest, PanelConfig, PanelSnapshot, PanelStatus, RequestHandle, RequestOutcome,
};
