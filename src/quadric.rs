//! Least-squares quadric fitting and ellipsoid decomposition
//!
//! The fitted surface is
//!
//! ```text
//! v0 x² + v1 y² + v2 z² + 2 v3 xy + 2 v4 xz + 2 v5 yz + 2 v6 x + 2 v7 y + 2 v8 z + v9 = 0
//! ```
//!
//! normalized so that `v0 + v1 + v2 = -3`. Under this convention a sphere of
//! radius `m` centred at the origin has coefficients
//! `(-1, -1, -1, 0, 0, 0, 0, 0, 0, m²)`, which is what both the ellipsoid
//! calibration and the coefficient SOD score rely on.

use nalgebra::{DMatrix, DVector, Matrix3, Matrix4, Vector3, Vector4};
use tracing::debug;

use crate::error::{CalibrationError, Result, Stage};
use crate::math::{SampleMatrixExt, ensure_finite};
use crate::types::SampleMatrix;

/// Minimum number of samples for a determined quadric fit
pub const MIN_FIT_SAMPLES: usize = 9;

/// Coefficients `(A, B, C, D, E, F, G, H, I, J)` of a fitted quadric
///
/// Cross and linear terms carry an implicit factor of two, see the module docs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadricCoefficients(pub [f64; 10]);

impl QuadricCoefficients {
    /// Symmetric matrix of the quadratic form
    pub fn quadratic_form(&self) -> Matrix3<f64> {
        let v = &self.0;
        Matrix3::new(v[0], v[3], v[4], v[3], v[1], v[5], v[4], v[5], v[2])
    }

    /// Linear term `(G, H, I)`
    pub fn linear(&self) -> Vector3<f64> {
        Vector3::new(self.0[6], self.0[7], self.0[8])
    }

    /// Constant term `J`
    pub fn constant(&self) -> f64 {
        self.0[9]
    }

    /// 4x4 algebraic (homogeneous) form of the quadric
    pub fn algebraic(&self) -> Matrix4<f64> {
        let v = &self.0;
        Matrix4::new(
            v[0], v[3], v[4], v[6], //
            v[3], v[1], v[5], v[7], //
            v[4], v[5], v[2], v[8], //
            v[6], v[7], v[8], v[9],
        )
    }

    /// Read coefficients back from a symmetric 4x4 algebraic form
    pub fn from_algebraic(q: &Matrix4<f64>) -> Self {
        QuadricCoefficients([
            q[(0, 0)],
            q[(1, 1)],
            q[(2, 2)],
            q[(0, 1)],
            q[(0, 2)],
            q[(1, 2)],
            q[(0, 3)],
            q[(1, 3)],
            q[(2, 3)],
            q[(3, 3)],
        ])
    }

    /// Left-hand side of the quadric equation at `p`; zero on the surface
    pub fn evaluate(&self, p: &Vector3<f64>) -> f64 {
        p.dot(&(self.quadratic_form() * p)) + 2.0 * self.linear().dot(p) + self.constant()
    }
}

impl core::ops::Index<usize> for QuadricCoefficients {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

/// Geometric description of a fitted quadric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadricDecomposition {
    pub center: Vector3<f64>,
    /// Orthonormal principal axes, one per column
    pub axes: Matrix3<f64>,
    /// Signed semi-axis lengths; negative entries mark a non-ellipsoidal axis
    pub radii: Vector3<f64>,
    pub eigenvalues: Vector3<f64>,
    pub coefficients: QuadricCoefficients,
}

impl QuadricDecomposition {
    /// True if every principal direction closes (all radii positive)
    pub fn is_ellipsoid(&self) -> bool {
        self.eigenvalues.iter().all(|&l| l > 0.0)
    }
}

/// Fits a general second-degree surface to a point cloud
///
/// Implementations must use the coefficient convention described in the
/// module documentation.
pub trait QuadricFitter {
    fn fit(&self, samples: &SampleMatrix) -> Result<QuadricDecomposition>;
}

/// SVD least-squares fitter
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSquaresFitter;

impl QuadricFitter for LeastSquaresFitter {
    fn fit(&self, samples: &SampleMatrix) -> Result<QuadricDecomposition> {
        let coefficients = fit_coefficients(samples)?;
        decompose(coefficients)
    }
}

/// Solve for the quadric coefficients of `samples`
///
/// The least-squares system is solved in centred, unit-RMS coordinates and
/// mapped back, which keeps readings with a large offset (raw magnetometer
/// counts, say) well conditioned. The fitted quadric is the same as a direct
/// fit in the original coordinates.
///
/// # Errors
/// [`CalibrationError::InsufficientCoverage`] with fewer than
/// [`MIN_FIT_SAMPLES`] rows, [`CalibrationError::SingularFit`] when the
/// samples do not determine a unique quadric (e.g. they are coplanar), and
/// [`CalibrationError::InvalidParameter`] for a non-finite reading.
pub fn fit_coefficients(samples: &SampleMatrix) -> Result<QuadricCoefficients> {
    let singular = |reason| CalibrationError::SingularFit {
        stage: Stage::QuadricFit,
        reason,
    };

    let n = samples.nrows();
    if n < MIN_FIT_SAMPLES {
        return Err(CalibrationError::InsufficientCoverage {
            stage: Stage::QuadricFit,
            found: n,
            required: MIN_FIT_SAMPLES,
        });
    }
    ensure_finite(samples)?;

    let (centroid, _) = samples.column_mean_std();
    let scale = (samples
        .points()
        .map(|p| (p - centroid).norm_squared())
        .sum::<f64>()
        / n as f64)
        .sqrt();
    if scale == 0.0 {
        return Err(singular("all samples coincide"));
    }

    // x² + y² + z² expressed through the two trace-free squared terms
    let mut design = DMatrix::<f64>::zeros(n, 9);
    let mut target = DVector::<f64>::zeros(n);
    for (i, p) in samples.points().enumerate() {
        let q = (p - centroid) / scale;
        let (x, y, z) = (q.x, q.y, q.z);
        design[(i, 0)] = x * x + y * y - 2.0 * z * z;
        design[(i, 1)] = x * x + z * z - 2.0 * y * y;
        design[(i, 2)] = 2.0 * x * y;
        design[(i, 3)] = 2.0 * x * z;
        design[(i, 4)] = 2.0 * y * z;
        design[(i, 5)] = 2.0 * x;
        design[(i, 6)] = 2.0 * y;
        design[(i, 7)] = 2.0 * z;
        design[(i, 8)] = 1.0;
        target[i] = x * x + y * y + z * z;
    }

    // numerical rank cutoff, as in LAPACK-backed lstsq
    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    let tolerance = f64::EPSILON * n as f64 * largest;
    if !(largest > 0.0 && svd.singular_values.min() > tolerance) {
        return Err(singular("design matrix is rank-deficient"));
    }

    let u = svd.solve(&target, tolerance).map_err(singular)?;

    let local = QuadricCoefficients([
        u[0] + u[1] - 1.0,
        u[0] - 2.0 * u[1] - 1.0,
        u[1] - 2.0 * u[0] - 1.0,
        u[2],
        u[3],
        u[4],
        u[5],
        u[6],
        u[7],
        u[8],
    ]);

    // q = (p - centroid) / scale in homogeneous form
    let mut to_local = Matrix4::from_diagonal(&Vector4::new(1.0 / scale, 1.0 / scale, 1.0 / scale, 1.0));
    to_local
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&(-centroid / scale));
    let global = to_local.transpose() * local.algebraic() * to_local;

    let trace = global.fixed_view::<3, 3>(0, 0).trace();
    if trace == 0.0 || !trace.is_finite() {
        return Err(singular("quadratic form has zero trace"));
    }
    let coefficients = QuadricCoefficients::from_algebraic(&(global * (-3.0 / trace)));
    debug!(?coefficients, scale, "quadric coefficients");

    Ok(coefficients)
}

/// Centre, principal axes and radii of a quadric
///
/// # Errors
/// [`CalibrationError::SingularFit`] when the quadric has no unique centre or
/// its centred constant term vanishes.
pub fn decompose(coefficients: QuadricCoefficients) -> Result<QuadricDecomposition> {
    let form = coefficients.quadratic_form();
    let center = (-form)
        .lu()
        .solve(&coefficients.linear())
        .ok_or(CalibrationError::SingularFit {
            stage: Stage::QuadricFit,
            reason: "quadric has no unique centre",
        })?;

    let mut translation = Matrix4::<f64>::identity();
    translation
        .fixed_view_mut::<1, 3>(3, 0)
        .copy_from(&center.transpose());
    let centred = translation * coefficients.algebraic() * translation.transpose();

    let constant = centred[(3, 3)];
    if constant == 0.0 || !constant.is_finite() {
        return Err(CalibrationError::SingularFit {
            stage: Stage::QuadricFit,
            reason: "quadric degenerates to a cone",
        });
    }

    let shape: Matrix3<f64> = centred.fixed_view::<3, 3>(0, 0) / -constant;
    let eigen = shape.symmetric_eigen();
    let radii = eigen
        .eigenvalues
        .map(|l| l.signum() * (1.0 / l.abs()).sqrt());

    Ok(QuadricDecomposition {
        center,
        axes: eigen.eigenvectors,
        radii,
        eigenvalues: eigen.eigenvalues,
        coefficients,
    })
}
