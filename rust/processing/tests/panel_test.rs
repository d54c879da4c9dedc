// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request lifecycle: supersession, debounce, failure and disposal.

use ifc_lite_drawing::{box_mesh, Mesh, Point3, SectionConfig};
use ifc_lite_processing::{
    ContextHandle, DrawingPanel, GenerationError, GenerationRequest, GeometryBackend, PanelConfig, PanelStatus,
    RequestOutcome, Result, StaticMeshBackend,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory backend with scripted acquisition delays and failures
struct ScriptedBackend {
    meshes: StaticMeshBackend,
    delays: Mutex<VecDeque<Duration>>,
    fail: AtomicBool,
}

impl ScriptedBackend {
    fn new(meshes: Vec<Mesh>) -> Arc<Self> {
        Arc::new(Self {
            meshes: StaticMeshBackend::new(meshes),
            delays: Mutex::new(VecDeque::new()),
            fail: AtomicBool::new(false),
        })
    }

    fn delay_next(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }
}

impl GeometryBackend for ScriptedBackend {
    fn acquire(&self) -> Result<ContextHandle> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::ResourceUnavailable("no worker available".into()));
        }
        let delay = self.delays.lock().unwrap().pop_front();
        let handle = self.meshes.acquire()?;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        Ok(handle)
    }
}

fn walls() -> Vec<Mesh> {
    vec![
        box_mesh(42, "IfcWall", Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.2, 3.0)),
        box_mesh(43, "IfcWall", Point3::new(0.0, 0.2, 0.0), Point3::new(0.2, 3.0, 3.0)),
    ]
}

fn plan(height: f64) -> GenerationRequest {
    GenerationRequest::new(SectionConfig::plan(height))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn newer_request_wins_over_slower_older_one() {
    let backend = ScriptedBackend::new(walls());
    backend.delay_next(Duration::from_millis(400));
    let panel = DrawingPanel::new(backend.clone(), PanelConfig::immediate());

    let first = panel.request(plan(1.0));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = panel.request(plan(2.0));
    assert_eq!((first.id(), second.id()), (1, 2));

    assert_eq!(second.wait().await, RequestOutcome::Applied);
    assert_eq!(first.wait().await, RequestOutcome::Superseded);

    let snapshot = panel.snapshot();
    assert_eq!(snapshot.status, PanelStatus::Ready { request_id: 2 });
    assert_eq!(snapshot.drawing.unwrap().config.position, 2.0);
    assert_eq!(backend.meshes.live_contexts(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn debounce_coalesces_rapid_requests() {
    let backend = ScriptedBackend::new(walls());
    let panel = DrawingPanel::new(
        backend.clone(),
        PanelConfig {
            debounce: Duration::from_millis(80),
        },
    );

    let handles: Vec<_> = [0.5, 1.0, 1.5].into_iter().map(|h| panel.request(plan(h))).collect();
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.wait().await);
    }

    assert_eq!(
        outcomes,
        vec![RequestOutcome::Superseded, RequestOutcome::Superseded, RequestOutcome::Applied]
    );
    assert_eq!(backend.meshes.acquire_count(), 1);
    assert_eq!(panel.snapshot().drawing.unwrap().config.position, 1.5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failure_keeps_previous_drawing() {
    let backend = ScriptedBackend::new(walls());
    let panel = DrawingPanel::new(backend.clone(), PanelConfig::immediate());
    assert_eq!(panel.request(plan(1.0)).wait().await, RequestOutcome::Applied);

    backend.fail.store(true, Ordering::SeqCst);
    let expected = GenerationError::ResourceUnavailable(String::new()).user_message();
    assert_eq!(
        panel.request(plan(2.0)).wait().await,
        RequestOutcome::Failed(expected.clone())
    );

    let snapshot = panel.snapshot();
    assert_eq!(
        snapshot.status,
        PanelStatus::Error {
            request_id: 2,
            message: expected
        }
    );
    assert_eq!(snapshot.drawing.unwrap().config.position, 1.0);
    assert_eq!(backend.meshes.live_contexts(), 0);
}

#[tokio::test]
async fn empty_model_reports_user_message() {
    let backend = Arc::new(StaticMeshBackend::new(Vec::new()));
    let panel = DrawingPanel::new(backend.clone(), PanelConfig::immediate());

    let outcome = panel.request(plan(1.0)).wait().await;
    assert_eq!(outcome, RequestOutcome::Failed("The model has no geometry to draw.".into()));
    assert!(panel.snapshot().drawing.is_none());
    assert_eq!(backend.live_contexts(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn previous_drawing_stays_visible_while_regenerating() {
    let backend = ScriptedBackend::new(walls());
    let panel = DrawingPanel::new(backend.clone(), PanelConfig::immediate());
    assert_eq!(panel.request(plan(1.0)).wait().await, RequestOutcome::Applied);

    backend.delay_next(Duration::from_millis(300));
    let pending = panel.request(plan(2.0));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = panel.snapshot();
    assert!(matches!(snapshot.status, PanelStatus::Generating { request_id: 2, .. }));
    assert_eq!(snapshot.drawing.unwrap().config.position, 1.0);

    assert_eq!(pending.wait().await, RequestOutcome::Applied);
    assert_eq!(panel.snapshot().drawing.unwrap().config.position, 2.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispose_mid_generation_releases_context() {
    let backend = ScriptedBackend::new(walls());
    backend.delay_next(Duration::from_millis(300));
    let panel = DrawingPanel::new(backend.clone(), PanelConfig::immediate());

    let pending = panel.request(plan(1.0));
    tokio::time::sleep(Duration::from_millis(50)).await;
    panel.dispose();
    panel.dispose();

    assert_eq!(pending.wait().await, RequestOutcome::Disposed);
    assert_eq!(backend.meshes.live_contexts(), 0);
    assert!(panel.is_disposed());

    let snapshot = panel.snapshot();
    assert_eq!(snapshot.status, PanelStatus::Idle);
    assert!(snapshot.drawing.is_none());

    assert_eq!(panel.request(plan(2.0)).wait().await, RequestOutcome::Disposed);
}

#[tokio::test]
async fn dispose_after_completion_is_harmless() {
    let backend = ScriptedBackend::new(walls());
    let panel = DrawingPanel::new(backend.clone(), PanelConfig::immediate());
    assert_eq!(panel.request(plan(1.0)).wait().await, RequestOutcome::Applied);

    panel.dispose();
    panel.dispose();
    assert_eq!(backend.meshes.live_contexts(), 0);
    assert_eq!(panel.latest_request(), 1);
}

#[tokio::test]
async fn subscribers_see_final_state() {
    let backend = ScriptedBackend::new(walls());
    let panel = DrawingPanel::new(backend, PanelConfig::immediate());
    let mut rx = panel.subscribe();

    assert_eq!(panel.request(plan(1.5)).wait().await, RequestOutcome::Applied);
    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.status, PanelStatus::Ready { request_id: 1 });
    assert!(!snapshot.is_generating());
}
