//! Calibration model and its application to sensor readings

use nalgebra::{Matrix3, Vector3};

use crate::math::SampleMatrixExt;
use crate::types::SampleMatrix;

/// Offset and gain correction for a 3-axis sensor
///
/// Applying the model to a reading `v` yields `gain * (v - offset)`. The gain
/// is diagonal for the extent method and dense for the ellipsoid method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    /// Bias subtracted from every raw reading
    pub offset: Vector3<f64>,
    /// Scale and cross-axis correction applied after the offset
    pub gain: Matrix3<f64>,
}

impl CalibrationModel {
    pub fn new(offset: Vector3<f64>, gain: Matrix3<f64>) -> Self {
        Self { offset, gain }
    }

    /// Model that leaves readings unchanged
    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), Matrix3::identity())
    }

    /// Calibrate a single reading
    ///
    /// # Example
    /// ```
    /// use nalgebra::{Matrix3, Vector3};
    /// use sphere_cal::CalibrationModel;
    ///
    /// let model = CalibrationModel::new(
    ///     Vector3::new(10.0, 20.0, 30.0),
    ///     Matrix3::from_diagonal(&Vector3::new(0.5, 0.5, 0.5)),
    /// );
    /// let calibrated = model.apply(Vector3::new(12.0, 22.0, 32.0));
    /// assert_eq!(calibrated, Vector3::new(1.0, 1.0, 1.0));
    /// ```
    pub fn apply(&self, uncalibrated: Vector3<f64>) -> Vector3<f64> {
        self.gain * (uncalibrated - self.offset)
    }

    /// Calibrate every row of a sample matrix into a new matrix
    pub fn apply_all(&self, samples: &SampleMatrix) -> SampleMatrix {
        let calibrated: Vec<_> = samples.points().map(|p| self.apply(p)).collect();
        SampleMatrix::from_points(&calibrated)
    }
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self::identity()
    }
}
