// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry backends
//!
//! A backend hands out processing contexts (a worker, a native geometry
//! kernel, a loaded model). Each context is wrapped in a [`ContextHandle`]
//! that releases it when dropped, so success, failure, cancellation and
//! panics all give the context back.

use crate::error::{GenerationError, Result};
use ifc_lite_drawing::Mesh;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Source of geometry processing contexts
pub trait GeometryBackend: Send + Sync + 'static {
    /// Acquire a context. Called on a blocking thread.
    fn acquire(&self) -> Result<ContextHandle>;
}

/// An acquired geometry context
pub trait GeometryContext: Send {
    /// Meshes of the loaded model(s)
    fn meshes(&self) -> std::result::Result<Arc<[Mesh]>, String>;
}

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Owned context, released on drop
pub struct ContextHandle {
    context: Box<dyn GeometryContext>,
    on_release: Option<ReleaseFn>,
}

impl ContextHandle {
    pub fn new(context: impl GeometryContext + 'static) -> Self {
        Self {
            context: Box::new(context),
            on_release: None,
        }
    }

    /// Run `release` exactly once when the handle is dropped
    pub fn with_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(release));
        self
    }

    pub fn meshes(&self) -> Result<Arc<[Mesh]>> {
        self.context.meshes().map_err(GenerationError::Geometry)
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("pending_release", &self.on_release.is_some())
            .finish()
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
        debug!("Geometry context released");
    }
}

struct StaticContext {
    meshes: Arc<[Mesh]>,
}

impl GeometryContext for StaticContext {
    fn meshes(&self) -> std::result::Result<Arc<[Mesh]>, String> {
        Ok(Arc::clone(&self.meshes))
    }
}

/// Backend over meshes that are already in memory
///
/// Tracks live contexts so callers can check that every handle was released.
#[derive(Debug, Clone)]
pub struct StaticMeshBackend {
    meshes: Arc<[Mesh]>,
    live: Arc<AtomicUsize>,
    acquired: Arc<AtomicUsize>,
}

impl StaticMeshBackend {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            meshes: meshes.into(),
            live: Arc::new(AtomicUsize::new(0)),
            acquired: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Contexts acquired and not yet released
    pub fn live_contexts(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Total number of successful acquisitions
    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl GeometryBackend for StaticMeshBackend {
    fn acquire(&self) -> Result<ContextHandle> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        let live = Arc::clone(&self.live);
        Ok(ContextHandle::new(StaticContext {
            meshes: Arc::clone(&self.meshes),
        })
        .with_release(move || {
            live.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}
