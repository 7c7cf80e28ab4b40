//! Z-score outlier rejection

use tracing::info;

use crate::error::{Axis, CalibrationError, Result, Stage};
use crate::math::{SampleMatrixExt, ensure_finite};
use crate::types::SampleMatrix;

/// Samples kept by [`remove_outliers`] and how many were dropped
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub samples: SampleMatrix,
    pub removed: usize,
}

/// Drop every row whose z-score on any axis reaches `threshold`
///
/// The z-score of a value is `(value - mean) / std` with the column's
/// population standard deviation. A row survives only if all three
/// `|z| < threshold`.
///
/// # Arguments
/// * `samples` - Raw readings, one row per sample
/// * `threshold` - Z-score cut, exclusive (2.5 by default)
///
/// # Returns
/// The surviving rows in their original order and the number removed
///
/// # Errors
/// [`CalibrationError::DegenerateAxis`] if an axis has zero variance, and
/// [`CalibrationError::InvalidParameter`] if `threshold` is not positive or a
/// reading is not finite.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use sphere_cal::{remove_outliers, SampleMatrix, SampleMatrixExt};
///
/// let mut points: Vec<_> = (0..20)
///     .map(|i| Vector3::new(i as f64, (i % 5) as f64, (i % 3) as f64))
///     .collect();
/// points.push(Vector3::new(500.0, 2.0, 1.0));
///
/// let report = remove_outliers(&SampleMatrix::from_points(&points), 2.5).unwrap();
/// assert_eq!(report.removed, 1);
/// ```
pub fn remove_outliers(samples: &SampleMatrix, threshold: f64) -> Result<OutlierReport> {
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(CalibrationError::invalid("threshold", threshold));
    }
    ensure_finite(samples)?;

    let (mean, std) = samples.column_mean_std();
    for axis in Axis::ALL {
        let spread = std[axis.index()];
        // rounding noise on a constant column counts as zero spread
        if !(spread.is_finite() && spread > f64::EPSILON * mean[axis.index()].abs()) {
            return Err(CalibrationError::DegenerateAxis {
                stage: Stage::OutlierFilter,
                axis,
            });
        }
    }

    let kept: Vec<usize> = samples
        .points()
        .enumerate()
        .filter(|(_, p)| {
            (p - mean)
                .component_div(&std)
                .iter()
                .all(|z| z.abs() < threshold)
        })
        .map(|(i, _)| i)
        .collect();

    let removed = samples.nrows() - kept.len();
    info!(removed, kept = kept.len(), "outliers removed");

    Ok(OutlierReport {
        samples: samples.select_rows(kept.iter()),
        removed,
    })
}
