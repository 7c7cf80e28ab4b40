//! Min/max extent calibration
//!
//! A coarse, always-available method: the offset is the midpoint of each
//! axis's range and the gain maps that range onto `[-m, m]`. Axes are assumed
//! to be uncoupled.

use nalgebra::Matrix3;
use tracing::debug;

use crate::calibration::CalibrationModel;
use crate::error::{Axis, CalibrationError, Result, Stage};
use crate::math::{SampleMatrixExt, ensure_finite};
use crate::types::SampleMatrix;

/// Derive an offset and diagonal gain from per-axis extents
///
/// # Arguments
/// * `samples` - Preprocessed readings
/// * `sensor_multiplier` - Expected magnitude m of a calibrated reading
///
/// # Returns
/// Model whose output spans exactly `[-m, m]` on every axis
///
/// # Errors
/// [`CalibrationError::DegenerateAxis`] if any axis has zero range,
/// [`CalibrationError::InsufficientCoverage`] for an empty matrix, and
/// [`CalibrationError::InvalidParameter`] for a non-finite reading.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use sphere_cal::{extent_calibration, SampleMatrix, SampleMatrixExt};
///
/// let samples = SampleMatrix::from_points(&[
///     Vector3::new(2.0, -1.0, 10.0),
///     Vector3::new(6.0, 3.0, 14.0),
/// ]);
/// let model = extent_calibration(&samples, 1.0).unwrap();
/// assert_eq!(model.offset, Vector3::new(4.0, 1.0, 12.0));
/// assert_eq!(model.apply(Vector3::new(6.0, 3.0, 14.0)), Vector3::new(1.0, 1.0, 1.0));
/// ```
pub fn extent_calibration(samples: &SampleMatrix, sensor_multiplier: f64) -> Result<CalibrationModel> {
    if samples.nrows() == 0 {
        return Err(CalibrationError::InsufficientCoverage {
            stage: Stage::ExtentCalibration,
            found: 0,
            required: 1,
        });
    }
    ensure_finite(samples)?;

    let (min, max) = samples.column_extents();
    let range = max - min;
    if let Some(axis) = Axis::ALL.into_iter().find(|a| range[a.index()] == 0.0) {
        return Err(CalibrationError::DegenerateAxis {
            stage: Stage::ExtentCalibration,
            axis,
        });
    }

    let offset = (max + min) * 0.5;
    let gain = Matrix3::from_diagonal(&range.map(|r| 2.0 * sensor_multiplier / r));
    debug!(?offset, ?gain, "extent calibration");

    Ok(CalibrationModel::new(offset, gain))
}
