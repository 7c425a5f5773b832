//! The mutable slot behind a session's lock.

use std::sync::Arc;

use measure_types::{BoxId, MeasurementResult};

use crate::state::MeasurementState;

/// The current measurement and the box refinement is running against.
#[derive(Debug, Clone)]
pub(crate) struct MeasurementContext {
    pub(crate) result: Arc<MeasurementResult>,
    pub(crate) refining: Option<BoxId>,
}

impl MeasurementContext {
    pub(crate) fn new(result: MeasurementResult) -> Self {
        Self {
            result: Arc::new(result),
            refining: None,
        }
    }

    pub(crate) fn box_id(&self) -> BoxId {
        self.result.box_id()
    }

    /// Refinement of the current box is either running or merged.
    pub(crate) fn is_refined_or_refining(&self) -> bool {
        self.refining == Some(self.box_id()) || self.result.refined().is_some()
    }
}

/// Everything guarded by the session mutex.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    pub(crate) context: Option<MeasurementContext>,
    pub(crate) state: MeasurementState,
    pub(crate) fit_in_flight: bool,
    pub(crate) fit_cancelled: bool,
}

impl Slot {
    /// Moves to `state`, returning it if it differs from the previous one.
    pub(crate) fn transition(&mut self, state: MeasurementState) -> Option<MeasurementState> {
        (self.state != state).then(|| {
            self.state = state;
            state
        })
    }
}
