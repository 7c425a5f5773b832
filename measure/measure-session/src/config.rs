//! Session configuration.

use measure_edit::EditParams;
use measure_fit::{FitParams, MeasurementMode};
use measure_refine::RefineParams;
use measure_sample::SampleParams;
use measure_types::QualityThresholds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Parameters for every stage of a measurement.
///
/// # Example
///
/// ```
/// use measure_fit::MeasurementMode;
/// use measure_session::SessionConfig;
///
/// let config = SessionConfig::fast().with_mode(MeasurementMode::AlignToView);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.mode, MeasurementMode::AlignToView);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Point sampling.
    pub sample: SampleParams,
    /// Box fitting.
    pub fit: FitParams,
    /// Gesture handling.
    pub edit: EditParams,
    /// Volume refinement.
    pub refine: RefineParams,
    /// Orientation mode used when fitting.
    pub mode: MeasurementMode,
    /// Cut-offs for the reported quality level.
    pub quality: QualityThresholds,
    /// Run refinement automatically whenever the box settles. Default: true.
    pub auto_refine: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample: SampleParams::default(),
            fit: FitParams::default(),
            edit: EditParams::default(),
            refine: RefineParams::default(),
            mode: MeasurementMode::default(),
            quality: QualityThresholds::default(),
            auto_refine: true,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarser sampling and refinement for interactive previews.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            sample: SampleParams::fast(),
            refine: RefineParams::fast(),
            ..Self::default()
        }
    }

    /// Dense sampling and fine refinement.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            sample: SampleParams::precise(),
            refine: RefineParams::precise(),
            ..Self::default()
        }
    }

    /// Sets the sampling parameters.
    #[must_use]
    pub fn with_sample(mut self, sample: SampleParams) -> Self {
        self.sample = sample;
        self
    }

    /// Sets the fitting parameters.
    #[must_use]
    pub const fn with_fit(mut self, fit: FitParams) -> Self {
        self.fit = fit;
        self
    }

    /// Sets the editing parameters.
    #[must_use]
    pub const fn with_edit(mut self, edit: EditParams) -> Self {
        self.edit = edit;
        self
    }

    /// Sets the refinement parameters.
    #[must_use]
    pub fn with_refine(mut self, refine: RefineParams) -> Self {
        self.refine = refine;
        self
    }

    /// Sets the orientation mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: MeasurementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the quality thresholds.
    #[must_use]
    pub const fn with_quality(mut self, quality: QualityThresholds) -> Self {
        self.quality = quality;
        self
    }

    /// Enables or disables refinement on settle.
    #[must_use]
    pub const fn with_auto_refine(mut self, enabled: bool) -> Self {
        self.auto_refine = enabled;
        self
    }

    /// Validates every stage's parameters.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, wrapped in [`SessionError`].
    pub fn validate(&self) -> SessionResult<()> {
        self.sample.validate()?;
        self.fit.validate()?;
        self.edit.validate()?;
        self.refine.validate()?;
        if self.quality.low_points > self.quality.high_points {
            return Err(SessionError::config(
                "quality.low_points must not exceed quality.high_points",
            ));
        }
        Ok(())
    }

    /// Parses a configuration from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] on malformed JSON, or the validation
    /// error of an out-of-range value.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> SessionResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SessionError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if serialization fails.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> SessionResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SessionError::config(e.to_string()))
    }
}
