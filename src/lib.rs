//! Sphere Cal - offset, scale and cross-axis calibration for 3-axis sensors
//!
//! Raw accelerometer and magnetometer readings trace a shifted, stretched and
//! sheared ellipsoid instead of a sphere. This crate derives the correction
//! that maps those readings back onto a sphere of known radius (1 g for an
//! accelerometer, the local field strength for a magnetometer).
//!
//! # Features
//!
//! - Z-score outlier rejection
//! - Angular regularization against over-sampled orientations
//! - Min/max extent calibration (offset and diagonal gain)
//! - Ellipsoid calibration (offset, gain and cross-axis coupling)
//! - Coefficient sum-of-deviations score from a refit of the calibrated data
//! - Pluggable quadric fitter
//!
//! Every stage is a plain function over an N x 3 [`SampleMatrix`], so any
//! combination can be composed; [`calibrate`] runs the usual sequence.
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use sphere_cal::{
//!     calibrate, CalibrationMethod, CalibrationSettings, Preprocessing, SampleMatrix,
//!     SampleMatrixExt, SensorProfile,
//! };
//!
//! // Readings collected while rotating the sensor through every orientation
//! let readings: Vec<Vector3<f64>> = (0..600)
//!     .map(|i| {
//!         let z = 1.0 - 2.0 * (i as f64 + 0.5) / 600.0;
//!         let r = (1.0 - z * z).sqrt();
//!         let phi = 2.399963 * i as f64;
//!         Vector3::new(12.0 + 60.0 * r * phi.cos(), -4.0 + 52.0 * r * phi.sin(), 7.0 + 57.0 * z)
//!     })
//!     .collect();
//!
//! let settings = CalibrationSettings {
//!     sensor: SensorProfile::Magnetometer,
//!     method: CalibrationMethod::Ellipsoid,
//!     preprocessing: Preprocessing::Outliers,
//!     ..Default::default()
//! };
//!
//! let report = calibrate(&SampleMatrix::from_points(&readings), &settings).unwrap();
//! let corrected = report.model.apply(Vector3::new(72.0, -4.0, 7.0));
//! assert!((corrected.norm() - 57.0572).abs() < 1e-6);
//! ```

pub mod calibration;
pub mod ellipsoid;
mod error;
pub mod extent;
mod math;
pub mod outliers;
pub mod pipeline;
pub mod quadric;
pub mod quality;
pub mod regularize;
mod types;

// Re-export all public types and functions
pub use calibration::CalibrationModel;
pub use ellipsoid::{CrossAxis, EllipsoidCalibration, calibration_from_coefficients, ellipsoid_calibration};
pub use error::{Axis, CalibrationError, Result, Stage};
pub use extent::extent_calibration;
pub use math::{PINV_RCOND, SampleMatrixExt, pinv};
pub use outliers::{OutlierReport, remove_outliers};
pub use pipeline::{CalibrationReport, calibrate, calibrate_with, preprocess};
pub use quadric::{
    LeastSquaresFitter, MIN_FIT_SAMPLES, QuadricCoefficients, QuadricDecomposition, QuadricFitter,
    decompose, fit_coefficients,
};
pub use quality::{QualityReport, coefficient_sod, evaluate};
pub use regularize::{bin_count, regularize};
pub use types::*;
