//! End-to-end calibration run: preprocessing, calibration and scoring

use tracing::debug;

use crate::calibration::CalibrationModel;
use crate::ellipsoid::{EllipsoidCalibration, ellipsoid_calibration};
use crate::error::Result;
use crate::extent::extent_calibration;
use crate::outliers::remove_outliers;
use crate::quadric::{LeastSquaresFitter, QuadricDecomposition, QuadricFitter};
use crate::quality::evaluate;
use crate::regularize::regularize;
use crate::types::{CalibrationMethod, CalibrationSettings, SampleMatrix};

/// Everything a calibration run produces
///
/// Visualization and reporting consume this; nothing here is mutated after
/// the run returns.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationReport {
    /// Input readings, untouched
    pub raw: SampleMatrix,
    /// Readings after preprocessing, the ones the model was derived from
    pub processed: SampleMatrix,
    /// `processed` with the model applied
    pub calibrated: SampleMatrix,
    /// Rows dropped by the outlier filter (zero when it did not run)
    pub outliers_removed: usize,
    pub model: CalibrationModel,
    /// Scale and cross-axis terms, present for the ellipsoid method only
    pub ellipsoid: Option<EllipsoidCalibration>,
    /// Quadric fit of `processed`
    pub pre_fit: QuadricDecomposition,
    /// Quadric fit of `calibrated`
    pub post_fit: QuadricDecomposition,
    /// Coefficient SOD of `post_fit`
    pub score: f64,
}

/// Run a calibration with the default least-squares fitter
///
/// # Arguments
/// * `samples` - Raw readings; never modified
/// * `settings` - Preprocessing, method and sensor profile
///
/// # Returns
/// A [`CalibrationReport`] with the model, the intermediate matrices, both
/// quadric fits and the coefficient SOD score
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use sphere_cal::{calibrate, CalibrationSettings, SampleMatrix, SampleMatrixExt};
///
/// let points: Vec<_> = (0..400)
///     .map(|i| {
///         let z = 1.0 - 2.0 * (i as f64 + 0.5) / 400.0;
///         let r = (1.0 - z * z).sqrt();
///         let phi = 2.399963 * i as f64;
///         Vector3::new(0.1 + 1.2 * r * phi.cos(), -0.2 + 0.9 * r * phi.sin(), z)
///     })
///     .collect();
///
/// let report = calibrate(&SampleMatrix::from_points(&points), &CalibrationSettings::default()).unwrap();
/// assert!((report.model.offset - Vector3::new(0.1, -0.2, 0.0)).norm() < 1e-6);
/// ```
pub fn calibrate(samples: &SampleMatrix, settings: &CalibrationSettings) -> Result<CalibrationReport> {
    calibrate_with(&LeastSquaresFitter, samples, settings)
}

/// Run a calibration with a caller-supplied quadric fitter
pub fn calibrate_with<F: QuadricFitter>(
    fitter: &F,
    samples: &SampleMatrix,
    settings: &CalibrationSettings,
) -> Result<CalibrationReport> {
    settings.validate()?;
    let multiplier = settings.sensor.multiplier();
    debug!(?settings, rows = samples.nrows(), "starting calibration");

    let (processed, outliers_removed) = preprocess(samples, settings)?;

    let (model, ellipsoid) = match settings.method {
        CalibrationMethod::Extent => (extent_calibration(&processed, multiplier)?, None),
        CalibrationMethod::Ellipsoid => {
            let cal = ellipsoid_calibration(fitter, &processed, multiplier)?;
            (cal.model, Some(cal))
        }
    };
    debug!(offset = ?model.offset, gain = ?model.gain, "calibration model");

    let calibrated = model.apply_all(&processed);
    let pre_fit = fitter.fit(&processed)?;
    let quality = evaluate(fitter, &calibrated, multiplier)?;

    Ok(CalibrationReport {
        raw: samples.clone(),
        processed,
        calibrated,
        outliers_removed,
        model,
        ellipsoid,
        pre_fit,
        post_fit: quality.fit,
        score: quality.score,
    })
}

/// Apply the preprocessing stages selected in `settings`
///
/// Returns the processed matrix and the number of outliers removed.
pub fn preprocess(samples: &SampleMatrix, settings: &CalibrationSettings) -> Result<(SampleMatrix, usize)> {
    let mut processed = samples.clone();
    let mut removed = 0;

    if settings.preprocessing.removes_outliers() {
        let report = remove_outliers(&processed, settings.threshold)?;
        processed = report.samples;
        removed = report.removed;
    }
    if settings.preprocessing.regularizes() {
        processed = regularize(&processed, settings.resolution)?;
    }

    Ok((processed, removed))
}
