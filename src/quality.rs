//! Coefficient sum-of-deviations (SOD) score for a calibration
//!
//! The calibrated readings are refitted and the quadric coefficients compared
//! with those of an ideal sphere of radius `m`: unit squared terms, no cross
//! or linear terms, and `sqrt(|v9|) = m`.

use tracing::info;

use crate::error::Result;
use crate::quadric::{QuadricCoefficients, QuadricDecomposition, QuadricFitter};
use crate::types::SampleMatrix;

/// Refit of calibrated data together with its SOD score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    pub fit: QuadricDecomposition,
    pub score: f64,
}

/// Coefficient SOD of a refit
///
/// Computed literally as
/// `(|v0|-1) + (|v1|-1) + (|v2|-1) + |v3| + ... + |v8| + sqrt(|v9|) - m`.
/// The squared terms use `|vi| - 1`, not `|vi - 1|`, so deviations can cancel
/// and the score may be negative. Treat it as a diagnostic, not a metric.
pub fn coefficient_sod(v: &QuadricCoefficients, sensor_multiplier: f64) -> f64 {
    let squared: f64 = (0..3).map(|i| v[i].abs() - 1.0).sum();
    let cross_and_linear: f64 = (3..9).map(|i| v[i].abs()).sum();
    squared + cross_and_linear + v[9].abs().sqrt() - sensor_multiplier
}

/// Refit `calibrated` and score it against a sphere of radius `sensor_multiplier`
pub fn evaluate<F: QuadricFitter>(
    fitter: &F,
    calibrated: &SampleMatrix,
    sensor_multiplier: f64,
) -> Result<QualityReport> {
    let fit = fitter.fit(calibrated)?;
    let score = coefficient_sod(&fit.coefficients, sensor_multiplier);
    info!(score, "coefficient SOD");

    Ok(QualityReport { fit, score })
}
