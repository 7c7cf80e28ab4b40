//! Ellipsoid calibration: offset, per-axis scale and cross-axis coupling
//!
//! The fitted quadric is rewritten as `xᵀ R x + 2 rᵀ x = 1`. Its centre gives
//! the offset, the diagonal of the normalized shape matrix gives the per-axis
//! scale, and the remaining off-diagonal coupling is removed by a symmetric
//! correction matrix. Every inversion is a pseudoinverse so near-singular fits
//! degrade instead of failing.

use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::calibration::CalibrationModel;
use crate::error::{CalibrationError, Result, Stage};
use crate::math::pinv;
use crate::quadric::{QuadricCoefficients, QuadricFitter};
use crate::types::SampleMatrix;

/// A `w9`-normalized quadratic form whose largest entry is below this counts as zero
const ZERO_FORM_TOLERANCE: f64 = 1e-12;

/// Off-diagonal coupling terms of the correction matrix
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CrossAxis {
    /// x-y coupling
    pub psi: f64,
    /// x-z coupling
    pub theta: f64,
    /// y-z coupling
    pub phi: f64,
}

impl CrossAxis {
    /// Symmetric correction matrix with unit diagonal
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            1.0, self.psi, self.theta, //
            self.psi, 1.0, self.phi, //
            self.theta, self.phi, 1.0,
        )
    }
}

/// Result of [`ellipsoid_calibration`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsoidCalibration {
    pub model: CalibrationModel,
    /// Per-axis gain before cross-axis correction (diagonal)
    pub scale: Matrix3<f64>,
    pub cross_axis: CrossAxis,
}

/// Fit an ellipsoid to `samples` and derive its calibration
///
/// # Arguments
/// * `fitter` - Quadric fitter used for the single fit
/// * `samples` - Preprocessed readings
/// * `sensor_multiplier` - Radius m of the target sphere
///
/// # Returns
/// The calibration model together with its per-axis scale and cross-axis terms
///
/// # Errors
/// Propagates fitter errors, and returns [`CalibrationError::SingularFit`]
/// when the fitted surface has no usable ellipsoid form.
pub fn ellipsoid_calibration<F: QuadricFitter>(
    fitter: &F,
    samples: &SampleMatrix,
    sensor_multiplier: f64,
) -> Result<EllipsoidCalibration> {
    let fit = fitter.fit(samples)?;
    calibration_from_coefficients(&fit.coefficients, sensor_multiplier)
}

/// Derive an ellipsoid calibration from already fitted quadric coefficients
pub fn calibration_from_coefficients(
    w: &QuadricCoefficients,
    sensor_multiplier: f64,
) -> Result<EllipsoidCalibration> {
    let singular = |reason| CalibrationError::SingularFit {
        stage: Stage::EllipsoidCalibration,
        reason,
    };

    let scale_by = -w.constant();
    if scale_by == 0.0 || !scale_by.is_finite() {
        return Err(singular("quadric constant term is zero"));
    }
    let form = w.quadratic_form() / scale_by;
    let linear = w.linear() / scale_by;

    let largest = form.abs().max();
    if !(largest > ZERO_FORM_TOLERANCE) {
        return Err(singular("quadratic form is zero"));
    }

    let offset = -pinv(&form, Stage::EllipsoidCalibration)? * linear;

    // p = 1 - 2 oᵀ r - oᵀ R o
    let p = 1.0 - 2.0 * offset.dot(&linear) - offset.dot(&(form * offset));
    if p == 0.0 || !p.is_finite() {
        return Err(singular("normalization scalar is zero"));
    }

    let k1 = pinv(&(form / p), Stage::EllipsoidCalibration)?;
    let diagonal = k1.diagonal();
    if diagonal.iter().any(|&d| !(d > 0.0)) {
        return Err(singular("fitted surface is not an ellipsoid"));
    }
    let radii: Vector3<f64> = diagonal.map(f64::sqrt);
    let scale = Matrix3::from_diagonal(&radii.map(|r| 1.0 / r));

    let coupling = scale * k1 * scale;
    let cross_axis = CrossAxis {
        psi: coupling[(0, 1)] / 2.0,
        theta: coupling[(0, 2)] / 2.0,
        phi: coupling[(1, 2)] / 2.0,
    };

    let gain = pinv(&cross_axis.matrix(), Stage::EllipsoidCalibration)? * (scale * sensor_multiplier);
    debug!(?offset, ?scale, ?cross_axis, ?gain, "ellipsoid calibration");

    Ok(EllipsoidCalibration {
        model: CalibrationModel::new(offset, gain),
        scale,
        cross_axis,
    })
}
