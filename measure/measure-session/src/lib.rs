//! Measurement lifecycle for box measurement.
//!
//! A [`MeasurementSession`] owns at most one measurement at a time and walks
//! it through its states:
//!
//! 1. **Fitting**: observations are sampled and a box is fitted, on the
//!    caller's thread ([`MeasurementSession::fit`]) or the rayon pool
//!    ([`MeasurementSession::request_fit`])
//! 2. **Settled**: the box can be edited; every edit starts a new revision
//! 3. **Refining**: the settled box is refined in the background
//! 4. **Refined**: the refined volume is attached, if the box did not change
//!    in the meantime
//!
//! Every box state has a [`BoxId`] (measurement id plus edit revision).
//! Background refinement records the id it started from and its result is
//! dropped unless that id is still current.
//!
//! Changes are published as [`SessionEvent`]s to every subscriber.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use measure_session::{MeasurementSession, MeasurementState, SessionConfig};
//!
//! let session = MeasurementSession::new(SessionConfig::default()).unwrap();
//! let events = session.subscribe();
//!
//! // Nothing to discard yet, but the session still moves to Cleared.
//! assert_eq!(session.discard(), None);
//! assert_eq!(session.state(), MeasurementState::Cleared);
//! assert!(events.try_recv().is_ok());
//! ```
//!
//! [`BoxId`]: measure_types::BoxId

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod context;
mod error;
mod events;
mod session;
mod state;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use events::SessionEvent;
pub use session::{MeasurementSession, MergeOutcome, RefinementTicket};
pub use state::MeasurementState;
