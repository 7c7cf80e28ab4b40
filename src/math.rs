//! Numeric helpers and nalgebra extensions shared by the calibration stages

use nalgebra::{Matrix3, Vector3};

use crate::error::{CalibrationError, Result, Stage};
use crate::types::SampleMatrix;

/// Singular values below `PINV_RCOND * largest` are treated as zero by [`pinv`]
///
/// Same relative cutoff as numpy's `pinv` default.
pub const PINV_RCOND: f64 = 1e-15;

/// Moore-Penrose pseudoinverse of a 3x3 matrix
///
/// Near-singular inputs degrade to a rank-reduced inverse rather than an error.
/// The zero matrix maps to the zero matrix.
pub fn pinv(matrix: &Matrix3<f64>, stage: Stage) -> Result<Matrix3<f64>> {
    let largest = matrix.singular_values().max();
    if largest == 0.0 {
        return Ok(Matrix3::zeros());
    }

    matrix
        .pseudo_inverse(PINV_RCOND * largest)
        .map_err(|reason| CalibrationError::SingularFit { stage, reason })
}

/// Reject matrices holding a NaN or infinite reading
///
/// A single non-finite value poisons every column statistic, so stages check
/// this before computing means, extents or fits.
pub(crate) fn ensure_finite(samples: &SampleMatrix) -> Result<()> {
    match samples.points().position(|p| !p.iter().all(|v| v.is_finite())) {
        Some(row) => Err(CalibrationError::invalid(
            "samples",
            format!("non-finite reading at row {}", row),
        )),
        None => Ok(()),
    }
}

/// Extension trait for N x 3 sample matrices
pub trait SampleMatrixExt {
    /// Build a matrix with one row per point
    fn from_points(points: &[Vector3<f64>]) -> SampleMatrix;

    /// Row `i` as a column vector
    fn point(&self, i: usize) -> Vector3<f64>;

    /// Iterate rows as column vectors
    fn points(&self) -> impl Iterator<Item = Vector3<f64>> + '_;

    /// Per-axis mean and population standard deviation
    fn column_mean_std(&self) -> (Vector3<f64>, Vector3<f64>);

    /// Per-axis minimum and maximum
    fn column_extents(&self) -> (Vector3<f64>, Vector3<f64>);
}

impl SampleMatrixExt for SampleMatrix {
    fn from_points(points: &[Vector3<f64>]) -> SampleMatrix {
        SampleMatrix::from_fn(points.len(), |i, j| points[i][j])
    }

    fn point(&self, i: usize) -> Vector3<f64> {
        self.row(i).transpose()
    }

    fn points(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.row_iter().map(|row| row.transpose())
    }

    fn column_mean_std(&self) -> (Vector3<f64>, Vector3<f64>) {
        let n = self.nrows().max(1) as f64;
        let mean = self.points().fold(Vector3::zeros(), |acc, p| acc + p) / n;
        let variance = self
            .points()
            .map(|p| (p - mean).map(|d| d * d))
            .fold(Vector3::zeros(), |acc, d| acc + d)
            / n;
        (mean, variance.map(f64::sqrt))
    }

    fn column_extents(&self) -> (Vector3<f64>, Vector3<f64>) {
        let init = (
            Vector3::repeat(f64::INFINITY),
            Vector3::repeat(f64::NEG_INFINITY),
        );
        self.points().fold(init, |(min, max), p| (min.inf(&p), max.sup(&p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_statistics() {
        let samples = SampleMatrix::from_points(&[
            Vector3::new(1.0, -2.0, 0.0),
            Vector3::new(3.0, 2.0, 0.0),
        ]);

        let (mean, std) = samples.column_mean_std();
        assert_eq!(mean, Vector3::new(2.0, 0.0, 0.0));
        // population standard deviation, not the sample estimator
        assert!((std - Vector3::new(1.0, 2.0, 0.0)).norm() < 1e-12);

        let (min, max) = samples.column_extents();
        assert_eq!(min, Vector3::new(1.0, -2.0, 0.0));
        assert_eq!(max, Vector3::new(3.0, 2.0, 0.0));
    }

    #[test]
    fn test_points_round_trip_rows() {
        let points = [Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0)];
        let samples = SampleMatrix::from_points(&points);
        assert_eq!(samples.nrows(), 2);
        assert_eq!(samples.point(1), points[1]);
        assert_eq!(samples.points().collect::<Vec<_>>(), points.to_vec());
    }

    #[test]
    fn test_pinv_matches_inverse_when_regular() {
        let m = Matrix3::new(2.0, 0.5, 0.0, 0.5, 3.0, 0.1, 0.0, 0.1, 4.0);
        let p = pinv(&m, Stage::EllipsoidCalibration).unwrap();
        assert!((p * m - Matrix3::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_pinv_degrades_gracefully_when_singular() {
        let m = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let p = pinv(&m, Stage::EllipsoidCalibration).unwrap();
        assert!((p - m).norm() < 1e-12);

        let zero = pinv(&Matrix3::zeros(), Stage::EllipsoidCalibration).unwrap();
        assert_eq!(zero, Matrix3::zeros());
    }

    #[test]
    fn test_pinv_keeps_small_singular_values() {
        // 1e-13 relative is above the cutoff and must be inverted, not dropped
        let m = Matrix3::from_diagonal(&Vector3::new(1.0, 1e-13, 0.0));
        let p = pinv(&m, Stage::EllipsoidCalibration).unwrap();

        assert!((p[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((p[(1, 1)] / 1e13 - 1.0).abs() < 1e-9);
        assert!(p[(2, 2)].abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_rows_are_reported() {
        let samples = SampleMatrix::from_points(&[
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(1.0, f64::INFINITY, 3.0),
            Vector3::new(f64::NAN, 2.0, 3.0),
        ]);

        assert_eq!(
            ensure_finite(&samples),
            Err(CalibrationError::InvalidParameter {
                name: "samples",
                value: "non-finite reading at row 1".to_string(),
            })
        );
        assert_eq!(ensure_finite(&samples.rows(0, 1).into_owned()), Ok(()));
    }
}
