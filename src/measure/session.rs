//! The measurement session: debounce, cancellation, and state machine
//! around volume/mesh recomputation.
//!
//! A session owns the current boundary, elevation sources, and resolution,
//! and keeps exactly one "active" computation generation. Every recompute
//! request bumps a generation counter, aborts in-flight work, and spawns
//! fresh volume and mesh tasks; a task that finishes after being superseded
//! finds its generation stale and discards its result instead of
//! publishing. Results and state transitions reach the UI collaborator over
//! a channel handed in at construction, so the engine stays decoupled from
//! any particular event bus.
//!
//! All mutating methods expect to run inside a tokio runtime.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::elevation::{ElevationProvider, ElevationSourceRef};
use crate::geom::Polygon;

use super::mesh::{MeshResult, SourceRole, build_mesh};
use super::volume::{VolumeResult, estimate_volume};

/// Default sampling resolution in meters.
pub const DEFAULT_RESOLUTION: f64 = 3.0;

/// The resolution span a UI slider should offer, in meters.
pub const RESOLUTION_RANGE: RangeInclusive<f64> = 1.0..=30.0;

/// Where a measurement session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasurementState {
    /// No boundary; the UI shows its "start measuring" hint.
    Idle,
    /// Boundary vertices are being placed; computation is suppressed until
    /// a minimum-vertex polygon exists.
    Drawing,
    /// A volume + mesh computation is in flight.
    Computing,
    /// The latest computation's results are on display.
    Settled,
    /// A boundary reshape began; values are cleared until it completes.
    Editing,
}

/// Everything the engine reports back to its UI collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MeasurementEvent {
    StateChanged(MeasurementState),
    /// Displayed values must be reset to the zero state.
    Cleared,
    VolumeReady {
        generation: u64,
        result: VolumeResult,
    },
    MeshReady {
        generation: u64,
        result: MeshResult,
    },
    /// The computation for `generation` failed; prior values may stay on
    /// display. The engine never substitutes defaults.
    ComputationFailed {
        generation: u64,
        message: String,
    },
}

/// Errors from session parameter setters.
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    /// Resolution must be a positive, finite number of meters; the prior
    /// value is left untouched.
    #[error("resolution must be a positive, finite number of meters, got {resolution}")]
    NonPositiveResolution { resolution: f64 },
}

/// Tunables for a measurement session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Settle delay before a resolution change triggers recomputation.
    pub debounce: Duration,
    /// Initial mesh-layer visibility.
    pub mesh_visible: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            mesh_visible: true,
        }
    }
}

/// State shared with spawned computation tasks.
struct Shared<P> {
    provider: P,
    events: mpsc::UnboundedSender<MeasurementEvent>,
    generation: AtomicU64,
    state: Mutex<MeasurementState>,
    tasks: Mutex<TaskSlots>,
}

#[derive(Default)]
struct TaskSlots {
    volume: Option<JoinHandle<()>>,
    mesh: Option<JoinHandle<()>>,
    debounce: Option<JoinHandle<()>>,
}

impl<P> Shared<P> {
    fn emit(&self, event: MeasurementEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.events.send(event);
    }

    fn state(&self) -> MeasurementState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: MeasurementState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            debug!("measurement state: {:?} -> {next:?}", *state);
            *state = next;
            self.emit(MeasurementEvent::StateChanged(next));
        }
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Invalidate in-flight work: cancel any pending debounce, supersede
    /// the generation, and abort running computation tasks.
    fn cancel_inflight(&self) -> u64 {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = tasks.debounce.take() {
            pending.abort();
        }
        if let Some(task) = tasks.volume.take() {
            task.abort();
        }
        if let Some(task) = tasks.mesh.take() {
            task.abort();
        }
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish_volume(&self, generation: u64, result: Result<VolumeResult, super::VolumeError>) {
        if !self.is_current(generation) {
            warn!("discarding stale volume result for generation {generation}");
            return;
        }
        match result {
            Ok(result) => {
                self.emit(MeasurementEvent::VolumeReady { generation, result });
                self.set_state(MeasurementState::Settled);
            }
            Err(err) => self.emit(MeasurementEvent::ComputationFailed {
                generation,
                message: err.to_string(),
            }),
        }
    }

    fn publish_mesh(&self, generation: u64, result: Result<MeshResult, super::MeshError>) {
        if !self.is_current(generation) {
            warn!("discarding stale mesh result for generation {generation}");
            return;
        }
        match result {
            Ok(result) => {
                self.emit(MeasurementEvent::MeshReady { generation, result });
                self.set_state(MeasurementState::Settled);
            }
            Err(err) => self.emit(MeasurementEvent::ComputationFailed {
                generation,
                message: err.to_string(),
            }),
        }
    }
}

impl<P: ElevationProvider + 'static> Shared<P> {
    /// Supersede any in-flight computation and start a new volume + mesh
    /// pair for the given inputs. The two pipelines are independent tasks
    /// sharing one generation; either may finish first.
    fn launch(
        self: &Arc<Self>,
        boundary: Polygon,
        resolution: f64,
        baseline: ElevationSourceRef,
        compare: ElevationSourceRef,
    ) {
        let generation = self.cancel_inflight();
        self.set_state(MeasurementState::Computing);

        let volume = {
            let shared = Arc::clone(self);
            let boundary = boundary.clone();
            let baseline = baseline.clone();
            let compare = compare.clone();
            tokio::spawn(async move {
                let result =
                    estimate_volume(&boundary, resolution, &baseline, &compare, &shared.provider)
                        .await;
                shared.publish_volume(generation, result);
            })
        };
        let mesh = {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                let result =
                    build_mesh(&boundary, resolution, &baseline, &compare, &shared.provider).await;
                shared.publish_mesh(generation, result);
            })
        };

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.volume = Some(volume);
        tasks.mesh = Some(mesh);
    }
}

/// One interactive volume measurement: boundary, sources, resolution, and
/// the recompute coordinator around them.
pub struct VolumeMeasurement<P: ElevationProvider> {
    shared: Arc<Shared<P>>,
    boundary: Option<Polygon>,
    baseline: ElevationSourceRef,
    compare: ElevationSourceRef,
    resolution: f64,
    mesh_visible: bool,
    debounce: Duration,
}

impl<P: ElevationProvider + 'static> VolumeMeasurement<P> {
    /// Create a session with default options. Events flow to `events`;
    /// the receiver half belongs to the UI collaborator.
    pub fn new(
        provider: P,
        baseline: ElevationSourceRef,
        compare: ElevationSourceRef,
        events: mpsc::UnboundedSender<MeasurementEvent>,
    ) -> Self {
        Self::with_options(provider, baseline, compare, events, SessionOptions::default())
    }

    pub fn with_options(
        provider: P,
        baseline: ElevationSourceRef,
        compare: ElevationSourceRef,
        events: mpsc::UnboundedSender<MeasurementEvent>,
        options: SessionOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                events,
                generation: AtomicU64::new(0),
                state: Mutex::new(MeasurementState::Idle),
                tasks: Mutex::new(TaskSlots::default()),
            }),
            boundary: None,
            baseline,
            compare,
            resolution: DEFAULT_RESOLUTION,
            mesh_visible: options.mesh_visible,
            debounce: options.debounce,
        }
    }

    #[must_use]
    pub fn state(&self) -> MeasurementState {
        self.shared.state()
    }

    #[must_use]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    #[must_use]
    pub fn boundary(&self) -> Option<&Polygon> {
        self.boundary.as_ref()
    }

    /// The most recent computation generation. Results delivered with an
    /// older generation were superseded.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.shared.current_generation()
    }

    #[must_use]
    pub fn mesh_visible(&self) -> bool {
        self.mesh_visible
    }

    /// A new sketch begins: drop the boundary, clear displayed values, and
    /// cancel anything in flight.
    pub fn begin_sketch(&mut self) {
        self.shared.cancel_inflight();
        self.boundary = None;
        self.shared.emit(MeasurementEvent::Cleared);
        self.shared.set_state(MeasurementState::Drawing);
    }

    /// The sketch or reshape produced a boundary; recompute immediately if
    /// it is measurable, otherwise stay in the drawing state with cleared
    /// values.
    pub fn set_boundary(&mut self, boundary: Polygon) {
        self.boundary = Some(boundary);
        self.recompute_now();
    }

    /// A reshape gesture started: clear displayed values before the
    /// eventual recompute, cancelling anything in flight.
    pub fn begin_edit(&mut self) {
        self.shared.cancel_inflight();
        self.shared.emit(MeasurementEvent::Cleared);
        self.shared.set_state(MeasurementState::Editing);
    }

    /// A reshape gesture was cancelled; the boundary is unchanged but the
    /// cleared values need recomputing.
    pub fn cancel_edit(&mut self) {
        self.recompute_now();
    }

    /// Drop the measurement entirely.
    pub fn clear_boundary(&mut self) {
        self.shared.cancel_inflight();
        self.boundary = None;
        self.shared.emit(MeasurementEvent::Cleared);
        self.shared.set_state(MeasurementState::Idle);
    }

    /// Swap one elevation source; recomputes immediately.
    pub fn set_source(&mut self, role: SourceRole, source: ElevationSourceRef) {
        match role {
            SourceRole::Baseline => self.baseline = source,
            SourceRole::Compare => self.compare = source,
        }
        self.recompute_now();
    }

    /// Change the sampling resolution. Non-positive or non-finite values
    /// are rejected and the prior resolution stays in effect. Valid
    /// changes recompute after the debounce delay so slider drags coalesce
    /// into one computation.
    pub fn set_resolution(&mut self, meters: f64) -> Result<(), ParameterError> {
        if !meters.is_finite() || meters <= 0.0 {
            return Err(ParameterError::NonPositiveResolution { resolution: meters });
        }
        self.resolution = meters;
        self.recompute_debounced();
        Ok(())
    }

    /// Mesh visibility is a display concern; toggling it never recomputes.
    pub fn set_mesh_visible(&mut self, visible: bool) {
        self.mesh_visible = visible;
    }

    fn recompute_now(&mut self) {
        let Some(boundary) = self.boundary.clone() else {
            return;
        };
        if !boundary.is_measurable() {
            self.shared.cancel_inflight();
            self.shared.emit(MeasurementEvent::Cleared);
            self.shared.set_state(MeasurementState::Drawing);
            return;
        }
        self.shared.launch(
            boundary,
            self.resolution,
            self.baseline.clone(),
            self.compare.clone(),
        );
    }

    fn recompute_debounced(&mut self) {
        let Some(boundary) = self.boundary.clone() else {
            return;
        };
        if !boundary.is_measurable() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let resolution = self.resolution;
        let baseline = self.baseline.clone();
        let compare = self.compare.clone();
        let delay = self.debounce;
        let pending = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.launch(boundary, resolution, baseline, compare);
        });

        let mut tasks = self
            .shared
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = tasks.debounce.replace(pending) {
            previous.abort();
        }
    }
}

impl<P: ElevationProvider> Drop for VolumeMeasurement<P> {
    fn drop(&mut self) {
        let mut tasks = self
            .shared
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for task in [
            tasks.debounce.take(),
            tasks.volume.take(),
            tasks.mesh.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::{ElevationError, Geometry, LayerId, ResolveOptions};
    use crate::geom::Point3;

    struct NoLayers;

    impl ElevationProvider for NoLayers {
        async fn query_elevation(
            &self,
            layer: &LayerId,
            _geometry: Geometry,
            _options: ResolveOptions,
        ) -> Result<Geometry, ElevationError> {
            Err(ElevationError::LayerUnavailable { id: layer.clone() })
        }
    }

    fn square(side: f64) -> Polygon {
        Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(side, 0.0),
            Point3::xy(side, side),
            Point3::xy(0.0, side),
        ])
        .unwrap()
    }

    fn plane_session(
        events: mpsc::UnboundedSender<MeasurementEvent>,
    ) -> VolumeMeasurement<NoLayers> {
        VolumeMeasurement::new(
            NoLayers,
            ElevationSourceRef::plane(0.0),
            ElevationSourceRef::plane(5.0),
            events,
        )
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<MeasurementEvent>) -> MeasurementEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn sketch_to_settled_lifecycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = plane_session(tx);
        assert_eq!(session.state(), MeasurementState::Idle);

        session.begin_sketch();
        assert_eq!(session.state(), MeasurementState::Drawing);

        session.set_boundary(square(10.0));
        assert_eq!(session.state(), MeasurementState::Computing);

        // Drain until the volume result arrives; only the current
        // generation may ever be delivered.
        let generation = session.generation();
        loop {
            match next_event(&mut rx).await {
                MeasurementEvent::VolumeReady {
                    generation: g,
                    result,
                } => {
                    assert_eq!(g, generation);
                    assert!((result.fill - 500.0).abs() < 1e-9);
                    break;
                }
                MeasurementEvent::ComputationFailed { message, .. } => {
                    panic!("unexpected failure: {message}")
                }
                _ => {}
            }
        }
        assert_eq!(session.state(), MeasurementState::Settled);
    }

    #[tokio::test]
    async fn unmeasurable_boundary_stays_drawing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = plane_session(tx);
        session.begin_sketch();

        let degenerate = Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(10.0, 0.0),
            Point3::xy(0.0, 0.0),
        ])
        .unwrap();
        session.set_boundary(degenerate);
        assert_eq!(session.state(), MeasurementState::Drawing);
    }

    #[tokio::test]
    async fn invalid_resolution_keeps_prior_value() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = plane_session(tx);
        session.set_resolution(7.5).unwrap();

        for bad in [0.0, -2.0, f64::NAN] {
            let result = session.set_resolution(bad);
            assert!(matches!(
                result,
                Err(ParameterError::NonPositiveResolution { .. })
            ));
        }
        assert_eq!(session.resolution(), 7.5);
    }

    #[tokio::test]
    async fn begin_edit_clears_values() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = plane_session(tx);
        session.begin_sketch();
        session.set_boundary(square(10.0));
        session.begin_edit();
        assert_eq!(session.state(), MeasurementState::Editing);

        // A Cleared event must arrive after the edit begins.
        let mut cleared = false;
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(200), rx.recv()).await
        {
            if event == MeasurementEvent::Cleared {
                cleared = true;
            }
        }
        assert!(cleared);
    }

    #[tokio::test]
    async fn mesh_visibility_never_recomputes() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = plane_session(tx);
        session.begin_sketch();
        session.set_boundary(square(10.0));
        let generation = session.generation();

        session.set_mesh_visible(false);
        session.set_mesh_visible(true);
        assert_eq!(session.generation(), generation);
    }

    #[tokio::test]
    async fn source_failure_reports_computation_failed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = VolumeMeasurement::new(
            NoLayers,
            ElevationSourceRef::layer("missing"),
            ElevationSourceRef::plane(5.0),
            tx,
        );
        session.begin_sketch();
        session.set_boundary(square(10.0));

        loop {
            match next_event(&mut rx).await {
                MeasurementEvent::ComputationFailed { message, .. } => {
                    assert!(message.contains("missing"));
                    break;
                }
                MeasurementEvent::VolumeReady { .. } | MeasurementEvent::MeshReady { .. } => {
                    panic!("results must not be delivered when a source is unavailable")
                }
                _ => {}
            }
        }
    }
}
