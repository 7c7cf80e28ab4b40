//! Error types for the calibration pipeline

use core::fmt;

use thiserror::Error;

/// Pipeline stage that raised a [`CalibrationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Z-score outlier rejection
    OutlierFilter,
    /// Angular resampling over the sphere
    Regularizer,
    /// Least-squares quadric fit and its decomposition
    QuadricFit,
    /// Min/max extent calibration
    ExtentCalibration,
    /// Ellipsoid (offset, scale, cross-axis) calibration
    EllipsoidCalibration,
    /// Settings validation and parsing
    Settings,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::OutlierFilter => "outlier filter",
            Stage::Regularizer => "angular regularizer",
            Stage::QuadricFit => "quadric fit",
            Stage::ExtentCalibration => "extent calibration",
            Stage::EllipsoidCalibration => "ellipsoid calibration",
            Stage::Settings => "settings",
        };
        f.write_str(name)
    }
}

/// Sensor axis, used to report which column of a sample matrix is degenerate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in column order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Column index of this axis in a sample matrix
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Errors raised while deriving a calibration
///
/// Every variant aborts the run. The same input and settings always produce
/// the same error, so there is nothing to retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// An axis has zero variance or zero range
    #[error("{stage}: axis {axis} is degenerate (zero spread)")]
    DegenerateAxis { stage: Stage, axis: Axis },

    /// A least-squares system or derived matrix has no usable solution
    #[error("{stage}: singular fit: {reason}")]
    SingularFit { stage: Stage, reason: &'static str },

    /// Not enough samples (or populated bins) for a well-posed fit
    #[error("{stage}: insufficient coverage: {found} available, {required} required")]
    InsufficientCoverage {
        stage: Stage,
        found: usize,
        required: usize,
    },

    /// Unrecognized method, preprocessing combination, sensor profile or value
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

impl CalibrationError {
    /// Stage that raised the error
    pub fn stage(&self) -> Stage {
        match self {
            CalibrationError::DegenerateAxis { stage, .. }
            | CalibrationError::SingularFit { stage, .. }
            | CalibrationError::InsufficientCoverage { stage, .. } => *stage,
            CalibrationError::InvalidParameter { .. } => Stage::Settings,
        }
    }

    pub(crate) fn invalid(name: &'static str, value: impl fmt::Display) -> Self {
        CalibrationError::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, CalibrationError>;
