//! Change notifications.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use measure_types::{BoxId, MeasurementId, MeasurementResult};

use crate::state::MeasurementState;

/// Something observable changed in a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The lifecycle state changed.
    StateChanged(MeasurementState),
    /// A new result (new fit, edit, or merged refinement) is current.
    ResultChanged(Arc<MeasurementResult>),
    /// Too few points survived sampling; no box was produced.
    InsufficientData {
        /// Points that survived.
        kept: usize,
        /// Points required.
        required: usize,
    },
    /// Sampling or fitting failed.
    FitFailed(String),
    /// Refinement of this box produced no volume.
    RefinementUnavailable(BoxId),
    /// The measurement was discarded.
    Cleared(MeasurementId),
}

/// Fan-out of events to every live subscriber.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<Sender<SessionEvent>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }

    /// Sends to every subscriber, dropping the ones whose receiver is gone.
    pub(crate) fn publish(&mut self, events: &[SessionEvent]) {
        if events.is_empty() {
            return;
        }
        self.senders
            .retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_and_prune() {
        let mut subscribers = Subscribers::default();
        let a = subscribers.subscribe();
        let b = subscribers.subscribe();
        drop(b);

        subscribers.publish(&[
            SessionEvent::StateChanged(MeasurementState::Fitting),
            SessionEvent::Cleared(MeasurementId(1)),
        ]);
        assert_eq!(subscribers.len(), 1);

        let received: Vec<_> = a.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert!(matches!(
            received[0],
            SessionEvent::StateChanged(MeasurementState::Fitting)
        ));
    }

    #[test]
    fn empty_batch_keeps_disconnected() {
        let mut subscribers = Subscribers::default();
        drop(subscribers.subscribe());
        subscribers.publish(&[]);
        assert_eq!(subscribers.len(), 1);
    }
}
