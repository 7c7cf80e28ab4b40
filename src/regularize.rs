//! Angular resampling of a point cloud over the sphere
//!
//! Readings collected by hand tend to over-represent a few orientations (a
//! sensor resting on its face, say). Left alone those clusters dominate a
//! least-squares fit. The regularizer bins samples by direction and keeps one
//! representative per populated bin.

use core::f64::consts::PI;

use nalgebra::Vector3;
use tracing::{info, warn};

use crate::error::{CalibrationError, Result, Stage};
use crate::math::{SampleMatrixExt, ensure_finite};
use crate::quadric::MIN_FIT_SAMPLES;
use crate::types::SampleMatrix;

/// Number of angular bins for a given resolution
///
/// `resolution` polar bands times `2 * resolution` azimuth sectors.
pub fn bin_count(resolution: usize) -> usize {
    2 * resolution * resolution
}

/// Resample `samples` to one mean point per populated direction bin
///
/// Directions are measured from the midpoint of the per-axis extents, so a
/// large offset does not squeeze the cloud into a single bin. Polar angle
/// `[0, π]` is split into `resolution` bands and azimuth `[-π, π)` into
/// `2 * resolution` sectors. Each populated bin emits the mean of its members
/// in the original coordinates, so radius information is preserved. Rows are
/// ordered by bin, polar band first.
///
/// # Arguments
/// * `samples` - Readings to resample
/// * `resolution` - Number of polar bands; the grid has [`bin_count`] bins
///
/// # Returns
/// One row per populated bin
///
/// # Errors
/// [`CalibrationError::InsufficientCoverage`] if fewer than
/// [`MIN_FIT_SAMPLES`] bins are populated, and
/// [`CalibrationError::InvalidParameter`] if `resolution` is zero or a reading
/// is not finite.
pub fn regularize(samples: &SampleMatrix, resolution: usize) -> Result<SampleMatrix> {
    if resolution == 0 {
        return Err(CalibrationError::invalid("resolution", resolution));
    }
    ensure_finite(samples)?;

    let polar_bands = resolution;
    let azimuth_sectors = 2 * resolution;
    let mut sums = vec![Vector3::<f64>::zeros(); bin_count(resolution)];
    let mut counts = vec![0usize; bin_count(resolution)];

    let (min, max) = samples.column_extents();
    let midpoint = (min + max) * 0.5;

    let mut skipped = 0;
    for p in samples.points() {
        let d = p - midpoint;
        let r = d.norm();
        if r == 0.0 {
            skipped += 1;
            continue;
        }

        let theta = (d.z / r).clamp(-1.0, 1.0).acos();
        let phi = d.y.atan2(d.x);
        let band = band_index(theta / PI, polar_bands);
        let sector = band_index((phi + PI) / (2.0 * PI), azimuth_sectors);

        let bin = band * azimuth_sectors + sector;
        sums[bin] += p;
        counts[bin] += 1;
    }
    if skipped > 0 {
        warn!(skipped, "samples at the cloud midpoint have no direction");
    }

    let representatives: Vec<Vector3<f64>> = sums
        .iter()
        .zip(&counts)
        .filter(|(_, count)| **count > 0)
        .map(|(sum, count)| sum / *count as f64)
        .collect();

    if representatives.len() < MIN_FIT_SAMPLES {
        return Err(CalibrationError::InsufficientCoverage {
            stage: Stage::Regularizer,
            found: representatives.len(),
            required: MIN_FIT_SAMPLES,
        });
    }

    info!(
        input = samples.nrows(),
        output = representatives.len(),
        bins = bin_count(resolution),
        "regularized samples"
    );

    Ok(SampleMatrix::from_points(&representatives))
}

/// Map a fraction in `[0, 1]` to one of `divisions` equal bins
fn band_index(fraction: f64, divisions: usize) -> usize {
    ((fraction * divisions as f64) as usize).min(divisions - 1)
}
