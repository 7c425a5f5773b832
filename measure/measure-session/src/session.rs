//! The measurement session: one measurement at a time, from fit to refined volume.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use measure_edit::{BoxEditor, EditOutcome, Gesture, ScreenProjector};
use measure_fit::{BoxFitter, recalculate};
use measure_refine::{RefineError, RefineResult, VolumeRefiner};
use measure_sample::{PointSampler, SampleOutcome};
use measure_types::{
    BoxId, MeasurementId, MeasurementResult, OrientedBox, PointCloud, QualityLevel, RefinedVolume,
};
use sensor_types::Observation;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::context::{MeasurementContext, Slot};
use crate::error::{SessionError, SessionResult};
use crate::events::{SessionEvent, Subscribers};
use crate::state::MeasurementState;

/// What happened to a refinement result handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Attached to the current box.
    Merged,
    /// The box was edited or refitted since; the result was dropped.
    Stale,
    /// The measurement was discarded; the result was dropped.
    Cleared,
    /// Refinement produced no volume; the box is back to settled.
    Unavailable,
}

/// Snapshot of a box and its points, ready to refine off the session lock.
#[derive(Debug, Clone)]
pub struct RefinementTicket {
    box_id: BoxId,
    obb: OrientedBox,
    cloud: Arc<PointCloud>,
    refiner: VolumeRefiner,
}

impl RefinementTicket {
    /// Identity of the box this ticket was taken from.
    #[must_use]
    pub const fn box_id(&self) -> BoxId {
        self.box_id
    }

    /// Runs refinement. Safe to call on any thread.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::NoPointsInBox`] if the box holds no points.
    pub fn run(&self) -> RefineResult<RefinedVolume> {
        self.refiner.refine(&self.obb, &self.cloud)
    }
}

#[derive(Debug)]
struct Shared {
    config: SessionConfig,
    sampler: PointSampler,
    fitter: BoxFitter,
    editor: BoxEditor,
    refiner: VolumeRefiner,
    slot: Mutex<Slot>,
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
}

/// Drives one measurement at a time through its lifecycle.
///
/// Cloning is cheap and every clone refers to the same session. No stage
/// (sampling, fitting, editing, refinement) runs while the session lock is
/// held; events are published after it is released.
///
/// # Example
///
/// ```
/// use measure_session::{MeasurementSession, MeasurementState, SessionConfig};
///
/// let session = MeasurementSession::new(SessionConfig::fast()).unwrap();
/// assert_eq!(session.state(), MeasurementState::Idle);
/// assert!(session.current().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    inner: Arc<Shared>,
}

/// Outcome of the sampling and fitting stages, computed off the lock.
enum FitProduct {
    Result(MeasurementResult),
    Insufficient { kept: usize, required: usize },
}

impl MeasurementSession {
    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns the validation error of any invalid stage parameters.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        let inner = Shared {
            sampler: PointSampler::new(config.sample.clone())?,
            fitter: BoxFitter::new(config.fit)?,
            editor: BoxEditor::new(config.edit)?,
            refiner: VolumeRefiner::new(config.refine.clone())?,
            config,
            slot: Mutex::new(Slot::default()),
            subscribers: Mutex::new(Subscribers::default()),
            next_id: AtomicU64::new(1),
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Receives every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        lock(&self.inner.subscribers).subscribe()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MeasurementState {
        self.slot().state
    }

    /// Current result, if a box exists.
    #[must_use]
    pub fn current(&self) -> Option<Arc<MeasurementResult>> {
        self.slot().context.as_ref().map(|c| Arc::clone(&c.result))
    }

    /// Identity of the current box.
    #[must_use]
    pub fn box_id(&self) -> Option<BoxId> {
        self.slot().context.as_ref().map(MeasurementContext::box_id)
    }

    /// Quality level of the current measurement under the configured thresholds.
    #[must_use]
    pub fn quality_level(&self) -> Option<QualityLevel> {
        self.current()
            .map(|r| r.measurement().quality.level_with(&self.inner.config.quality))
    }

    // =========================================================================
    // Fitting
    // =========================================================================

    /// Samples `observations` and fits a new box, replacing any current
    /// measurement. Blocks until done.
    ///
    /// Returns `Ok(None)` when too few points survive sampling or when the
    /// session was discarded while fitting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::FitInFlight`] if another fit is running, or
    /// the sampling or fitting error.
    pub fn fit(
        &self,
        observations: &[Observation],
        floor_y: Option<f64>,
    ) -> SessionResult<Option<Arc<MeasurementResult>>> {
        self.begin_fit()?;
        self.run_fit(observations, floor_y)
    }

    /// Like [`fit`](Self::fit) but runs on the rayon pool. Results arrive
    /// as [`SessionEvent`]s.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::FitInFlight`] if another fit is running.
    pub fn request_fit(&self, observations: Vec<Observation>, floor_y: Option<f64>) -> SessionResult<()> {
        self.begin_fit()?;
        let session = self.clone();
        rayon::spawn(move || {
            // Failures are already published as events.
            let _ = session.run_fit(&observations, floor_y);
        });
        Ok(())
    }

    fn begin_fit(&self) -> SessionResult<()> {
        let mut events = Vec::new();
        {
            let mut slot = self.slot();
            if slot.fit_in_flight {
                return Err(SessionError::FitInFlight);
            }
            slot.fit_in_flight = true;
            slot.fit_cancelled = false;
            if let Some(old) = slot.context.take() {
                debug!(measurement = %old.result.id(), "Replacing measurement with a new fit");
            }
            events.extend(slot.transition(MeasurementState::Fitting).map(SessionEvent::StateChanged));
        }
        self.publish(&events);
        Ok(())
    }

    fn run_fit(
        &self,
        observations: &[Observation],
        floor_y: Option<f64>,
    ) -> SessionResult<Option<Arc<MeasurementResult>>> {
        let start = Instant::now();
        let product = self.sample_and_fit(observations, floor_y);

        let mut events = Vec::new();
        let outcome = {
            let mut slot = self.slot();
            slot.fit_in_flight = false;
            if std::mem::take(&mut slot.fit_cancelled) {
                debug!("Fit finished after discard; result dropped");
                Ok(None)
            } else {
                match product {
                    Ok(FitProduct::Result(result)) => {
                        let context = MeasurementContext::new(result);
                        let current = Arc::clone(&context.result);
                        slot.context = Some(context);
                        events.push(SessionEvent::ResultChanged(Arc::clone(&current)));
                        events.extend(
                            slot.transition(MeasurementState::Settled)
                                .map(SessionEvent::StateChanged),
                        );
                        Ok(Some(current))
                    }
                    Ok(FitProduct::Insufficient { kept, required }) => {
                        events.push(SessionEvent::InsufficientData { kept, required });
                        events.extend(
                            slot.transition(MeasurementState::Idle).map(SessionEvent::StateChanged),
                        );
                        Ok(None)
                    }
                    Err(e) => {
                        events.push(SessionEvent::FitFailed(e.to_string()));
                        events.extend(
                            slot.transition(MeasurementState::Idle).map(SessionEvent::StateChanged),
                        );
                        Err(e)
                    }
                }
            }
        };
        self.publish(&events);

        match &outcome {
            Ok(Some(result)) => {
                info!(
                    measurement = %result.id(),
                    length_cm = result.measurement().length * 100.0,
                    width_cm = result.measurement().width * 100.0,
                    height_cm = result.measurement().height * 100.0,
                    points = result.cloud().map_or(0, |c| c.len()),
                    time_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Measurement fitted"
                );
                if self.inner.config.auto_refine {
                    // The box may already have been edited or discarded.
                    let _ = self.settle();
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Fit failed"),
        }
        outcome
    }

    fn sample_and_fit(
        &self,
        observations: &[Observation],
        floor_y: Option<f64>,
    ) -> SessionResult<FitProduct> {
        let report = match self.inner.sampler.sample_observations(observations)? {
            SampleOutcome::Sampled(report) => report,
            SampleOutcome::InsufficientData { stats, required } => {
                debug!(kept = stats.kept, required, "Fit skipped");
                return Ok(FitProduct::Insufficient {
                    kept: stats.kept,
                    required,
                });
            }
        };

        let policy = self
            .inner
            .config
            .mode
            .policy(report.tap_normal, Some(report.view_direction));
        let fit = self.inner.fitter.fit(&report.cloud, policy.as_ref(), floor_y)?;
        let measurement = fit.into_measurement(report.quality);

        let id = MeasurementId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut result =
            MeasurementResult::new(id, measurement).with_cloud(Arc::new(report.cloud));
        if let Some(imagery) = report.debug {
            result = result.with_debug(Arc::new(imagery));
        }
        Ok(FitProduct::Result(result))
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Applies a gesture to the current box.
    ///
    /// Returns whether the box changed. A change starts a new revision,
    /// drops any refined volume and returns the session to
    /// [`MeasurementState::Settled`]; call [`settle`](Self::settle) when the
    /// gesture ends.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoMeasurement`] if there is no box to edit.
    pub fn apply_edit(
        &self,
        gesture: &Gesture,
        projector: &dyn ScreenProjector,
    ) -> SessionResult<bool> {
        let editor = &self.inner.editor;
        self.edit_with(|result| {
            let cloud = result.cloud().map(Arc::as_ref);
            Ok(editor.apply(result.obb(), gesture, projector, cloud))
        })
    }

    /// Shrinks or grows the current box to the stored points it covers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoMeasurement`] if there is no box, or
    /// [`SessionError::NoPointCloud`] if the measurement has no points.
    pub fn fit_to_points(&self) -> SessionResult<bool> {
        let editor = &self.inner.editor;
        self.edit_with(|result| {
            let cloud = result
                .cloud()
                .ok_or(SessionError::NoPointCloud(result.id()))?;
            let obb = result.obb();
            Ok(editor
                .fit_to_points(obb, cloud)
                .map_or_else(|| EditOutcome::unchanged(*obb), |b| EditOutcome::compare(obb, b)))
        })
    }

    /// Extends the bottom face down (or up) to `floor_y` when close enough.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoMeasurement`] if there is no box.
    pub fn extend_to_floor(&self, floor_y: f64) -> SessionResult<bool> {
        let editor = &self.inner.editor;
        self.edit_with(|result| Ok(editor.snap_to_floor(result.obb(), floor_y)))
    }

    fn edit_with(
        &self,
        edit: impl FnOnce(&MeasurementResult) -> SessionResult<EditOutcome>,
    ) -> SessionResult<bool> {
        // The edit runs on a snapshot with the lock released; editors may use
        // the rayon pool, whose workers can be running `complete_refinement`.
        let snapshot = {
            let slot = self.slot();
            if !slot.state.accepts_edits() {
                return Err(SessionError::NoMeasurement);
            }
            let Some(context) = slot.context.as_ref() else {
                return Err(SessionError::NoMeasurement);
            };
            Arc::clone(&context.result)
        };

        let outcome = edit(snapshot.as_ref())?;
        if !outcome.did_change {
            return Ok(false);
        }

        let mut events = Vec::new();
        let changed = {
            let mut slot = self.slot();
            let accepts = slot.state.accepts_edits();
            match slot.context.as_mut() {
                Some(context) if accepts && context.box_id() == snapshot.box_id() => {
                    let previous = context.result.measurement();
                    let measurement =
                        recalculate(&outcome.obb, &previous.quality, &previous.axis_mapping);
                    context.result = Arc::new(context.result.with_measurement(measurement));
                    context.refining = None;
                    debug!(box_id = %context.box_id(), "Box edited");
                    events.push(SessionEvent::ResultChanged(Arc::clone(&context.result)));
                    events.extend(
                        slot.transition(MeasurementState::Settled)
                            .map(SessionEvent::StateChanged),
                    );
                    true
                }
                _ => {
                    debug!(box_id = %snapshot.box_id(), "Box changed during edit; edit dropped");
                    false
                }
            }
        };
        self.publish(&events);
        Ok(changed)
    }

    // =========================================================================
    // Refinement
    // =========================================================================

    /// Marks the current box as settled and refines it on the rayon pool.
    ///
    /// Returns `false` without doing anything when the current box is
    /// already refined or being refined.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoMeasurement`] or
    /// [`SessionError::NoPointCloud`] when there is nothing to refine.
    pub fn settle(&self) -> SessionResult<bool> {
        let Some(ticket) = self.begin_refinement(true)? else {
            return Ok(false);
        };
        let session = self.clone();
        rayon::spawn(move || {
            let refined = ticket.run();
            session.complete_refinement(ticket.box_id(), refined);
        });
        Ok(true)
    }

    /// Snapshots the current box for refinement and enters
    /// [`MeasurementState::RefinedVolumeCalculating`].
    ///
    /// Run the ticket anywhere, then hand its result to
    /// [`complete_refinement`](Self::complete_refinement).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoMeasurement`] if there is no box, or
    /// [`SessionError::NoPointCloud`] if the measurement has no points.
    pub fn prepare_refinement(&self) -> SessionResult<RefinementTicket> {
        self.begin_refinement(false)?.ok_or(SessionError::NoMeasurement)
    }

    /// Takes a refinement ticket. With `once_per_box`, returns `None` when
    /// the current box is already refined or being refined; the check and
    /// the state change happen under one lock.
    fn begin_refinement(&self, once_per_box: bool) -> SessionResult<Option<RefinementTicket>> {
        let mut events = Vec::new();
        let ticket = {
            let mut slot = self.slot();
            if !slot.state.has_box() {
                return Err(SessionError::NoMeasurement);
            }
            let Some(context) = slot.context.as_mut() else {
                return Err(SessionError::NoMeasurement);
            };
            if once_per_box && context.is_refined_or_refining() {
                return Ok(None);
            }
            let cloud = context
                .result
                .cloud()
                .cloned()
                .ok_or(SessionError::NoPointCloud(context.result.id()))?;
            let box_id = context.box_id();
            if context.result.refined().is_some() {
                context.result = Arc::new(context.result.without_refined());
                events.push(SessionEvent::ResultChanged(Arc::clone(&context.result)));
            }
            context.refining = Some(box_id);
            let ticket = RefinementTicket {
                box_id,
                obb: *context.result.obb(),
                cloud,
                refiner: self.inner.refiner.clone(),
            };
            events.extend(
                slot.transition(MeasurementState::RefinedVolumeCalculating)
                    .map(SessionEvent::StateChanged),
            );
            ticket
        };
        debug!(box_id = %ticket.box_id, "Refinement started");
        self.publish(&events);
        Ok(Some(ticket))
    }

    /// Merges a refinement result if it still belongs to the current box.
    pub fn complete_refinement(
        &self,
        box_id: BoxId,
        refined: RefineResult<RefinedVolume>,
    ) -> MergeOutcome {
        let mut events = Vec::new();
        let outcome = {
            let mut slot = self.slot();
            match slot.context.as_mut() {
                None => MergeOutcome::Cleared,
                Some(context) if context.box_id() != box_id => MergeOutcome::Stale,
                Some(context) => {
                    context.refining = None;
                    match refined {
                        Ok(volume) => {
                            info!(
                                box_id = %box_id,
                                voxel_volume_cm3 = volume.voxel_volume * 1e6,
                                mesh_volume_cm3 = volume.mesh_volume.map(|v| v * 1e6),
                                "Refined volume ready"
                            );
                            context.result = Arc::new(context.result.with_refined(volume));
                            events.push(SessionEvent::ResultChanged(Arc::clone(&context.result)));
                            events.extend(
                                slot.transition(MeasurementState::RefinedVolumeReady)
                                    .map(SessionEvent::StateChanged),
                            );
                            MergeOutcome::Merged
                        }
                        Err(e) => {
                            match e {
                                RefineError::NoPointsInBox => {
                                    info!(box_id = %box_id, "No points inside the box; refined volume unavailable");
                                }
                                RefineError::InvalidParams(_) => {
                                    warn!(box_id = %box_id, error = %e, "Refinement failed");
                                }
                            }
                            events.push(SessionEvent::RefinementUnavailable(box_id));
                            events.extend(
                                slot.transition(MeasurementState::Settled)
                                    .map(SessionEvent::StateChanged),
                            );
                            MergeOutcome::Unavailable
                        }
                    }
                }
            }
        };
        if matches!(outcome, MergeOutcome::Stale | MergeOutcome::Cleared) {
            debug!(box_id = %box_id, outcome = ?outcome, "Refinement result dropped");
        }
        self.publish(&events);
        outcome
    }

    // =========================================================================
    // Discard
    // =========================================================================

    /// Ends the current measurement and releases its points, voxels and mesh.
    ///
    /// Pending refinement and an in-flight fit become no-ops. Returns the
    /// id of the discarded measurement, if there was one.
    pub fn discard(&self) -> Option<MeasurementId> {
        let mut events = Vec::new();
        let discarded = {
            let mut slot = self.slot();
            if slot.fit_in_flight {
                slot.fit_cancelled = true;
            }
            let discarded = slot.context.take().map(|c| c.result.id());
            events.extend(discarded.map(SessionEvent::Cleared));
            events.extend(slot.transition(MeasurementState::Cleared).map(SessionEvent::StateChanged));
            discarded
        };
        if let Some(id) = discarded {
            info!(measurement = %id, "Measurement discarded");
        }
        self.publish(&events);
        discarded
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        lock(&self.inner.slot)
    }

    fn publish(&self, events: &[SessionEvent]) {
        lock(&self.inner.subscribers).publish(events);
    }
}

/// Locks `mutex`, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
