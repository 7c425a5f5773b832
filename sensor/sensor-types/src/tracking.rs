//! Device tracking state as reported by the pose provider.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why tracking is degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitedReason {
    /// Tracking is still initializing.
    Initializing,
    /// The device is moving too fast.
    ExcessiveMotion,
    /// The scene lacks visual features.
    InsufficientFeatures,
    /// Tracking is recovering after an interruption.
    Relocalizing,
}

/// Quality of the camera pose at the time of capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackingState {
    /// Pose is reliable.
    #[default]
    Normal,
    /// Pose is available but degraded.
    Limited(LimitedReason),
    /// No pose is available.
    NotAvailable,
}

impl TrackingState {
    /// Returns `true` for [`TrackingState::Normal`].
    #[must_use]
    pub const fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }

    /// Returns `true` unless tracking is [`TrackingState::NotAvailable`].
    #[must_use]
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::NotAvailable)
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Limited(reason) => write!(f, "limited ({reason:?})"),
            Self::NotAvailable => write!(f, "not available"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_predicates() {
        assert!(TrackingState::Normal.is_normal());
        assert!(TrackingState::Limited(LimitedReason::ExcessiveMotion).is_available());
        assert!(!TrackingState::Limited(LimitedReason::Initializing).is_normal());
        assert!(!TrackingState::NotAvailable.is_available());
    }

    #[test]
    fn tracking_display() {
        let s = TrackingState::Limited(LimitedReason::Relocalizing).to_string();
        assert!(s.contains("limited"));
        assert!(s.contains("Relocalizing"));
        assert_eq!(TrackingState::NotAvailable.to_string(), "not available");
    }
}
