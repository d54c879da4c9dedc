// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drawing panel lifecycle
//!
//! Every request gets a monotonically increasing id. A request waits out the
//! debounce window, runs [`generate`] on the blocking pool and is applied to
//! the panel state only if no newer request was issued in the meantime. The
//! previously applied drawing stays in the snapshot until a newer one
//! replaces it, including when generation fails.

use crate::backend::GeometryBackend;
use crate::error::{GenerationError, Result};
use ifc_lite_drawing::{generate, CancelToken, Drawing, GenerateOptions, ProgressFn, SectionConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default coalescing window for rapid plane moves
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Phase reported between acceptance and the first pipeline stage
const PHASE_QUEUED: &str = "queued";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelConfig {
    pub debounce: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl PanelConfig {
    /// No debounce: every request starts right away
    pub fn immediate() -> Self {
        Self {
            debounce: Duration::ZERO,
        }
    }
}

/// One generation request as issued by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub config: SectionConfig,
    #[serde(default = "default_merge_lines")]
    pub merge_lines: bool,
}

fn default_merge_lines() -> bool {
    true
}

impl GenerationRequest {
    pub fn new(config: SectionConfig) -> Self {
        Self {
            config,
            merge_lines: true,
        }
    }
}

/// `idle -> generating -> {ready | error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PanelStatus {
    Idle,
    #[serde(rename_all = "camelCase")]
    Generating {
        request_id: u64,
        phase: String,
        fraction: f64,
    },
    #[serde(rename_all = "camelCase")]
    Ready { request_id: u64 },
    #[serde(rename_all = "camelCase")]
    Error { request_id: u64, message: String },
}

/// Visible panel state
#[derive(Debug, Clone)]
pub struct PanelSnapshot {
    pub status: PanelStatus,
    /// Last applied drawing
    pub drawing: Option<Arc<Drawing>>,
}

impl PanelSnapshot {
    fn idle() -> Self {
        Self {
            status: PanelStatus::Idle,
            drawing: None,
        }
    }

    #[inline]
    pub fn is_generating(&self) -> bool {
        matches!(self.status, PanelStatus::Generating { .. })
    }
}

/// How a request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The drawing was applied to the panel
    Applied,
    /// The request was still the latest but failed; carries the user message
    Failed(String),
    /// A newer request was issued; the result was discarded
    Superseded,
    /// The panel was disposed before the result could be applied
    Disposed,
}

/// Handle to an issued request
#[derive(Debug)]
pub struct RequestHandle {
    id: u64,
    task: JoinHandle<RequestOutcome>,
}

impl RequestHandle {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the request to finish
    pub async fn wait(self) -> RequestOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(request_id = self.id, error = %err, "Request task aborted");
                RequestOutcome::Failed(GenerationError::Panicked.user_message())
            }
        }
    }
}

struct PanelInner {
    backend: Arc<dyn GeometryBackend>,
    config: PanelConfig,
    next_id: AtomicU64,
    latest: AtomicU64,
    disposed: AtomicBool,
    in_flight: Mutex<Option<(u64, CancelToken)>>,
    state: watch::Sender<PanelSnapshot>,
}

impl PanelInner {
    /// Outcome for a request that must not touch the panel any more
    fn stale(&self, id: u64) -> Option<RequestOutcome> {
        if self.disposed.load(Ordering::SeqCst) {
            Some(RequestOutcome::Disposed)
        } else if self.latest.load(Ordering::SeqCst) != id {
            Some(RequestOutcome::Superseded)
        } else {
            None
        }
    }

    /// Update the snapshot only while `id` is the latest live request
    fn publish(&self, id: u64, update: impl FnOnce(&mut PanelSnapshot)) {
        self.state.send_if_modified(|snapshot| {
            if self.stale(id).is_some() {
                return false;
            }
            update(snapshot);
            true
        });
    }

    fn replace_in_flight(&self, next: Option<(u64, CancelToken)>) -> Option<(u64, CancelToken)> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, next)
    }

    fn finish_in_flight(&self, id: u64) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(&*slot, Some((current, _)) if *current == id) {
            *slot = None;
        }
    }

    async fn run(self: Arc<Self>, id: u64, request: GenerationRequest, cancel: CancelToken) -> RequestOutcome {
        if !self.config.debounce.is_zero() {
            tokio::time::sleep(self.config.debounce).await;
        }
        if let Some(outcome) = self.stale(id) {
            debug!(request_id = id, ?outcome, "Request dropped after debounce");
            return outcome;
        }

        self.publish(id, |snapshot| {
            snapshot.status = PanelStatus::Generating {
                request_id: id,
                phase: PHASE_QUEUED.to_string(),
                fraction: 0.0,
            };
        });

        let progress: ProgressFn = {
            let inner = Arc::clone(&self);
            Arc::new(move |phase: &str, fraction: f64| {
                inner.publish(id, |snapshot| {
                    snapshot.status = PanelStatus::Generating {
                        request_id: id,
                        phase: phase.to_string(),
                        fraction,
                    };
                });
            })
        };
        let options = GenerateOptions {
            merge_lines: request.merge_lines,
            ..GenerateOptions::default()
        }
        .with_progress(progress)
        .with_cancel(cancel);

        let backend = Arc::clone(&self.backend);
        let config = request.config;
        let joined = tokio::task::spawn_blocking(move || -> Result<Drawing> {
            let context = backend.acquire()?;
            let meshes = context.meshes()?;
            Ok(generate(&meshes, &config, &options)?)
        })
        .await;

        self.finish_in_flight(id);
        let result = joined.unwrap_or_else(|err| {
            warn!(request_id = id, error = %err, "Generation worker panicked");
            Err(GenerationError::Panicked)
        });

        if let Some(outcome) = self.stale(id) {
            debug!(request_id = id, ?outcome, "Discarding stale result");
            return outcome;
        }
        self.apply(id, result)
    }

    fn apply(&self, id: u64, result: Result<Drawing>) -> RequestOutcome {
        let mut outcome = RequestOutcome::Superseded;
        self.state.send_if_modified(|snapshot| {
            if let Some(stale) = self.stale(id) {
                outcome = stale;
                return false;
            }
            match result {
                Ok(drawing) => {
                    info!(
                        request_id = id,
                        cut_polygons = drawing.cut_polygons.len(),
                        lines = drawing.lines.len(),
                        "Drawing ready"
                    );
                    snapshot.status = PanelStatus::Ready { request_id: id };
                    snapshot.drawing = Some(Arc::new(drawing));
                    outcome = RequestOutcome::Applied;
                }
                Err(err) => {
                    let message = err.user_message();
                    warn!(request_id = id, error = %err, "Drawing generation failed");
                    snapshot.status = PanelStatus::Error {
                        request_id: id,
                        message: message.clone(),
                    };
                    outcome = RequestOutcome::Failed(message);
                }
            }
            true
        });
        outcome
    }
}

/// Generation pipeline of one drawing panel
pub struct DrawingPanel {
    inner: Arc<PanelInner>,
}

impl DrawingPanel {
    pub fn new(backend: Arc<dyn GeometryBackend>, config: PanelConfig) -> Self {
        let (state, _) = watch::channel(PanelSnapshot::idle());
        Self {
            inner: Arc::new(PanelInner {
                backend,
                config,
                next_id: AtomicU64::new(0),
                latest: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
                in_flight: Mutex::new(None),
                state,
            }),
        }
    }

    /// Issue a new request, superseding every earlier one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn request(&self, request: GenerationRequest) -> RequestHandle {
        let inner = Arc::clone(&self.inner);
        let id = inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        if inner.disposed.load(Ordering::SeqCst) {
            debug!(request_id = id, "Request on disposed panel");
            return RequestHandle {
                id,
                task: tokio::spawn(async { RequestOutcome::Disposed }),
            };
        }

        inner.latest.fetch_max(id, Ordering::SeqCst);
        let cancel = CancelToken::new();
        if let Some((previous, token)) = inner.replace_in_flight(Some((id, cancel.clone()))) {
            debug!(request_id = previous, superseded_by = id, "Cancelling superseded request");
            token.cancel();
        }
        debug!(
            request_id = id,
            axis = ?request.config.axis,
            position = request.config.position,
            "Generation requested"
        );

        let task = tokio::spawn(inner.run(id, request, cancel));
        RequestHandle { id, task }
    }

    /// Current panel state
    pub fn snapshot(&self) -> PanelSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.inner.state.subscribe()
    }

    /// Id of the most recently issued request (0 before the first one)
    pub fn latest_request(&self) -> u64 {
        self.inner.latest.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Close the panel: cancel in-flight work and clear the state.
    /// Safe to call any number of times.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some((id, token)) = self.inner.replace_in_flight(None) {
            debug!(request_id = id, "Cancelling request on dispose");
            token.cancel();
        }
        self.inner.state.send_modify(|snapshot| *snapshot = PanelSnapshot::idle());
        info!("Drawing panel disposed");
    }
}

impl Drop for DrawingPanel {
    fn drop(&mut self) {
        self.dispose();
    }
}
