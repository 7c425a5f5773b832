//! Interactive editing of measured boxes.
//!
//! [`BoxEditor`] turns screen-space gestures into new boxes. It is stateless
//! apart from its [`EditParams`]: every call takes a box and returns an
//! [`EditOutcome`] holding a new box and whether anything changed, so the
//! caller can skip recalculation for no-op gestures.
//!
//! # Gestures
//!
//! - Face drag: grows or shrinks one extent, the opposite face stays fixed
//! - Rotation drag: yaw about the world vertical through the box center
//! - Fit to points: tight extents from the captured cloud, same orientation
//! - Snap to floor: bottom face onto a detected floor height
//!
//! Screen positions come from a caller-supplied [`ScreenProjector`]; a
//! [`Camera`](sensor_types::Camera) is one.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod editor;
mod error;
mod handle;
mod params;
mod projector;

pub use editor::{BoxEditor, EditOutcome, Gesture};
pub use error::{EditError, EditResult};
pub use handle::FaceHandle;
pub use params::EditParams;
pub use projector::{FnProjector, ScreenProjector};
