//! Measurement lifecycle states.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the current measurement is in its lifecycle.
///
/// ```text
/// Idle ─fit─▶ Fitting ─▶ Settled ─settle─▶ RefinedVolumeCalculating ─▶ RefinedVolumeReady
///                           ▲                         │                        │
///                           └────────── edit ─────────┴────────────────────────┘
/// any ─discard─▶ Cleared
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeasurementState {
    /// No measurement has been started.
    #[default]
    Idle,
    /// Sampling and fitting are running.
    Fitting,
    /// A box exists and no refinement is pending.
    Settled,
    /// Refinement is running for the current box.
    RefinedVolumeCalculating,
    /// The current box carries a refined volume.
    RefinedVolumeReady,
    /// The measurement was discarded.
    Cleared,
}

impl MeasurementState {
    /// Returns `true` if a box is available to show and edit.
    #[must_use]
    pub const fn has_box(self) -> bool {
        matches!(
            self,
            Self::Settled | Self::RefinedVolumeCalculating | Self::RefinedVolumeReady
        )
    }

    /// Returns `true` if an edit is accepted in this state.
    #[must_use]
    pub const fn accepts_edits(self) -> bool {
        self.has_box()
    }
}

impl fmt::Display for MeasurementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fitting => "fitting",
            Self::Settled => "settled",
            Self::RefinedVolumeCalculating => "refining",
            Self::RefinedVolumeReady => "refined",
            Self::Cleared => "cleared",
        };
        f.write_str(name)
    }
}
