//! Measurement scalars and the result record handed to presentation.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    AxisMapping, DebugImagery, Dimension, MeasurementQuality, OrientedBox, PointCloud,
    RefinedVolume,
};

/// Box, quality and the scalars derived from them.
///
/// Built by `recalculate` after every fit and edit; never edited in place.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// The measured box.
    pub obb: OrientedBox,
    /// Quality of the data the box was fitted from.
    pub quality: MeasurementQuality,
    /// Dimension labels fixed at first fit.
    pub axis_mapping: AxisMapping,
    /// Full extent along the length axis, meters.
    pub length: f64,
    /// Full extent along the width axis, meters.
    pub width: f64,
    /// Full extent along the height axis, meters.
    pub height: f64,
    /// Box volume, cubic meters.
    pub volume: f64,
}

impl Measurement {
    /// Value of one dimension in meters.
    #[must_use]
    pub const fn dimension(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Length => self.length,
            Dimension::Width => self.width,
            Dimension::Height => self.height,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} × {:.1} × {:.1} cm (L×W×H), {:.1} cm³, {} quality",
            self.length * 100.0,
            self.width * 100.0,
            self.height * 100.0,
            self.volume * 1e6,
            self.quality.level()
        )
    }
}

/// Monotonically increasing identifier of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementId(pub u64);

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of one box state: the measurement plus its edit revision.
///
/// Background work records the `BoxId` it was computed against; its result
/// is only accepted while the current box still has the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxId {
    /// Measurement the box belongs to.
    pub measurement: MeasurementId,
    /// Number of edits applied since the fit.
    pub revision: u64,
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.measurement, self.revision)
    }
}

/// Everything known about one measurement at one revision.
///
/// Replaced wholesale on every change. Shared data (point cloud, debug
/// images) is reference counted so replacement is cheap.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementResult {
    id: MeasurementId,
    revision: u64,
    measurement: Measurement,
    refined: Option<RefinedVolume>,
    #[cfg_attr(feature = "serde", serde(skip))]
    cloud: Option<Arc<PointCloud>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    debug: Option<Arc<DebugImagery>>,
}

impl MeasurementResult {
    /// Creates revision 0 of a measurement.
    #[must_use]
    pub const fn new(id: MeasurementId, measurement: Measurement) -> Self {
        Self {
            id,
            revision: 0,
            measurement,
            refined: None,
            cloud: None,
            debug: None,
        }
    }

    /// Attaches the retained point cloud.
    #[must_use]
    pub fn with_cloud(mut self, cloud: Arc<PointCloud>) -> Self {
        self.cloud = Some(cloud);
        self
    }

    /// Attaches debug imagery.
    #[must_use]
    pub fn with_debug(mut self, debug: Arc<DebugImagery>) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Next revision with a new measurement. Any refined volume is dropped.
    #[must_use]
    pub fn with_measurement(&self, measurement: Measurement) -> Self {
        Self {
            id: self.id,
            revision: self.revision + 1,
            measurement,
            refined: None,
            cloud: self.cloud.clone(),
            debug: self.debug.clone(),
        }
    }

    /// Same revision with a refined volume attached.
    #[must_use]
    pub fn with_refined(&self, refined: RefinedVolume) -> Self {
        Self {
            refined: Some(refined),
            ..self.clone()
        }
    }

    /// Same revision with the refined volume removed.
    #[must_use]
    pub fn without_refined(&self) -> Self {
        Self {
            refined: None,
            ..self.clone()
        }
    }

    /// Measurement id.
    #[must_use]
    pub const fn id(&self) -> MeasurementId {
        self.id
    }

    /// Edit revision.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Identity of the current box.
    #[must_use]
    pub const fn box_id(&self) -> BoxId {
        BoxId {
            measurement: self.id,
            revision: self.revision,
        }
    }

    /// Box, quality and scalars.
    #[must_use]
    pub const fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    /// The measured box.
    #[must_use]
    pub const fn obb(&self) -> &OrientedBox {
        &self.measurement.obb
    }

    /// Refined volume, once background refinement has merged.
    #[must_use]
    pub const fn refined(&self) -> Option<&RefinedVolume> {
        self.refined.as_ref()
    }

    /// Retained point cloud.
    #[must_use]
    pub const fn cloud(&self) -> Option<&Arc<PointCloud>> {
        self.cloud.as_ref()
    }

    /// Debug imagery from sampling.
    #[must_use]
    pub const fn debug(&self) -> Option<&Arc<DebugImagery>> {
        self.debug.as_ref()
    }
}

impl fmt::Display for MeasurementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Measurement {}: {}", self.box_id(), self.measurement)?;
        if let Some(refined) = &self.refined {
            write!(f, "; {refined}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn measurement() -> Measurement {
        let obb = OrientedBox::axis_aligned(Point3::origin(), Vector3::new(0.1, 0.15, 0.05));
        Measurement {
            obb,
            quality: MeasurementQuality::default(),
            axis_mapping: AxisMapping::default(),
            length: 0.2,
            width: 0.1,
            height: 0.3,
            volume: obb.volume(),
        }
    }

    fn refined() -> RefinedVolume {
        RefinedVolume {
            voxel_size: 0.01,
            grid_origin: Point3::origin(),
            grid_dims: [1, 1, 1],
            occupied: BTreeSet::new(),
            voxel_volume: 0.0,
            carved: false,
            mesh_volume: None,
            reconstructor: None,
            processing_time: Duration::ZERO,
        }
    }

    #[test]
    fn revision_advances_and_drops_refined() {
        let r0 = MeasurementResult::new(MeasurementId(3), measurement())
            .with_cloud(Arc::new(PointCloud::default()));
        let r0 = r0.with_refined(refined());
        assert_eq!(r0.revision(), 0);
        assert!(r0.refined().is_some());

        let r1 = r0.with_measurement(measurement());
        assert_eq!(r1.revision(), 1);
        assert_eq!(r1.id(), MeasurementId(3));
        assert!(r1.refined().is_none());
        assert!(r1.cloud().is_some());
        assert_ne!(r0.box_id(), r1.box_id());
    }

    #[test]
    fn dimension_lookup() {
        let m = measurement();
        assert!((m.dimension(Dimension::Height) - 0.3).abs() < f64::EPSILON);
        assert!((m.dimension(Dimension::Length) - 0.2).abs() < f64::EPSILON);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn result_serialization_keeps_box_and_revision() {
        let obb = OrientedBox::from_yaw(Point3::new(0.3, 0.15, -0.2), Vector3::new(0.2, 0.15, 0.1), 0.4);
        let json = serde_json::to_string(&obb).unwrap();
        let back: OrientedBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obb);

        let result = MeasurementResult::new(MeasurementId(4), measurement())
            .with_refined(refined())
            .with_measurement(measurement())
            .with_refined(refined())
            .with_cloud(Arc::new(PointCloud::default()));
        let json = serde_json::to_string(&result).unwrap();
        let back: MeasurementResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.box_id(), result.box_id());
        assert_eq!(back.measurement(), result.measurement());
        assert_eq!(back.refined(), result.refined());
        // Points stay in memory only.
        assert!(back.cloud().is_none());
    }

    #[test]
    fn display() {
        let r = MeasurementResult::new(MeasurementId(1), measurement());
        let s = r.to_string();
        assert!(s.contains("#1.0"));
        assert!(s.contains("20.0 × 10.0 × 30.0 cm"));
    }
}
