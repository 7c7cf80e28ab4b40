//! Core types and settings for the calibration pipeline

use core::str::FromStr;

use nalgebra::MatrixXx3;

use crate::error::CalibrationError;

/// Raw or calibrated sensor readings, one row per reading, columns x, y, z
pub type SampleMatrix = MatrixXx3<f64>;

/// Default z-score cut for outlier rejection
pub const DEFAULT_THRESHOLD: f64 = 2.5;

/// Default number of polar divisions used by the angular regularizer
pub const DEFAULT_RESOLUTION: usize = 8;

/// Expected magnitude of a calibrated accelerometer reading (g)
pub const ACCELEROMETER_MULTIPLIER: f64 = 1.0;

/// Expected magnitude of a calibrated magnetometer reading (µT, Sydney)
pub const MAGNETOMETER_MULTIPLIER: f64 = 57.0572;

/// Calibration algorithm
///
/// Parses from the short codes `mm` / `e` or the long names.
///
/// # Example
/// ```
/// use sphere_cal::CalibrationMethod;
///
/// let method: CalibrationMethod = "e".parse().unwrap();
/// assert_eq!(method, CalibrationMethod::Ellipsoid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationMethod {
    /// Per-axis min/max extents; offset and diagonal gain only
    Extent,
    /// General quadric fit; offset, gain and cross-axis coupling
    #[default]
    Ellipsoid,
}

impl FromStr for CalibrationMethod {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mm" | "extent" | "max-min" => Ok(CalibrationMethod::Extent),
            "e" | "ellipsoid" => Ok(CalibrationMethod::Ellipsoid),
            other => Err(CalibrationError::invalid("method", other)),
        }
    }
}

/// Preprocessing stages applied before calibration
///
/// Parses from the short codes `-`, `o`, `r` and `or`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preprocessing {
    #[default]
    None,
    /// Z-score outlier rejection only
    Outliers,
    /// Angular regularization only
    Regularize,
    /// Outlier rejection followed by angular regularization
    OutliersThenRegularize,
}

impl Preprocessing {
    pub fn removes_outliers(self) -> bool {
        matches!(
            self,
            Preprocessing::Outliers | Preprocessing::OutliersThenRegularize
        )
    }

    pub fn regularizes(self) -> bool {
        matches!(
            self,
            Preprocessing::Regularize | Preprocessing::OutliersThenRegularize
        )
    }
}

impl FromStr for Preprocessing {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" | "none" => Ok(Preprocessing::None),
            "o" | "outliers" => Ok(Preprocessing::Outliers),
            "r" | "regularize" => Ok(Preprocessing::Regularize),
            "or" | "outliers-regularize" => Ok(Preprocessing::OutliersThenRegularize),
            other => Err(CalibrationError::invalid("preprocessing", other)),
        }
    }
}

/// Sensor profile: expected calibrated magnitude and a display range
///
/// The multiplier is the radius of the sphere calibrated readings should lie
/// on. The axis limit is only used when plotting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SensorProfile {
    /// Accelerometer in g
    #[default]
    Accelerometer,
    /// Magnetometer in the local field units
    Magnetometer,
    /// Any other sensor or deployment location
    Custom { multiplier: f64, axis_limit: f64 },
}

impl SensorProfile {
    pub fn multiplier(&self) -> f64 {
        match self {
            SensorProfile::Accelerometer => ACCELEROMETER_MULTIPLIER,
            SensorProfile::Magnetometer => MAGNETOMETER_MULTIPLIER,
            SensorProfile::Custom { multiplier, .. } => *multiplier,
        }
    }

    pub fn axis_limit(&self) -> f64 {
        match self {
            SensorProfile::Accelerometer => 1.5,
            SensorProfile::Magnetometer => 90.0,
            SensorProfile::Custom { axis_limit, .. } => *axis_limit,
        }
    }
}

impl FromStr for SensorProfile {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "accelerometer" => Ok(SensorProfile::Accelerometer),
            "m" | "magnetometer" => Ok(SensorProfile::Magnetometer),
            other => Err(CalibrationError::invalid("sensor", other)),
        }
    }
}

/// Calibration pipeline settings
///
/// # Example
/// ```
/// use sphere_cal::{CalibrationMethod, CalibrationSettings, Preprocessing, SensorProfile};
///
/// let settings = CalibrationSettings {
///     sensor: SensorProfile::Magnetometer,
///     method: CalibrationMethod::Ellipsoid,
///     preprocessing: Preprocessing::OutliersThenRegularize,
///     ..Default::default()
/// };
/// assert_eq!(settings.threshold, 2.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSettings {
    /// Z-score cut; rows with any |z| >= threshold are dropped
    pub threshold: f64,
    /// Polar divisions of the regularizer grid (2 * resolution² bins)
    pub resolution: usize,
    pub sensor: SensorProfile,
    pub method: CalibrationMethod,
    pub preprocessing: Preprocessing,
}

impl CalibrationSettings {
    /// Check that every numeric setting is usable
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(CalibrationError::invalid("threshold", self.threshold));
        }
        if self.resolution == 0 {
            return Err(CalibrationError::invalid("resolution", self.resolution));
        }
        let multiplier = self.sensor.multiplier();
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(CalibrationError::invalid("sensor multiplier", multiplier));
        }
        Ok(())
    }
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            resolution: DEFAULT_RESOLUTION,
            sensor: SensorProfile::default(),
            method: CalibrationMethod::default(),
            preprocessing: Preprocessing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_codes() {
        assert_eq!("mm".parse::<CalibrationMethod>(), Ok(CalibrationMethod::Extent));
        assert_eq!("e".parse::<CalibrationMethod>(), Ok(CalibrationMethod::Ellipsoid));

        assert_eq!("-".parse::<Preprocessing>(), Ok(Preprocessing::None));
        assert_eq!("o".parse::<Preprocessing>(), Ok(Preprocessing::Outliers));
        assert_eq!("r".parse::<Preprocessing>(), Ok(Preprocessing::Regularize));
        assert_eq!(
            "or".parse::<Preprocessing>(),
            Ok(Preprocessing::OutliersThenRegularize)
        );

        assert_eq!("a".parse::<SensorProfile>(), Ok(SensorProfile::Accelerometer));
        assert_eq!("m".parse::<SensorProfile>(), Ok(SensorProfile::Magnetometer));
    }

    #[test]
    fn test_parse_rejects_unknown_codes() {
        assert!(matches!(
            "x".parse::<CalibrationMethod>(),
            Err(CalibrationError::InvalidParameter { name: "method", .. })
        ));
        assert!(matches!(
            "ro".parse::<Preprocessing>(),
            Err(CalibrationError::InvalidParameter { name: "preprocessing", .. })
        ));
        assert!(matches!(
            "g".parse::<SensorProfile>(),
            Err(CalibrationError::InvalidParameter { name: "sensor", .. })
        ));
    }

    #[test]
    fn test_preprocessing_stage_flags() {
        assert!(!Preprocessing::None.removes_outliers());
        assert!(!Preprocessing::None.regularizes());
        assert!(Preprocessing::Outliers.removes_outliers());
        assert!(!Preprocessing::Outliers.regularizes());
        assert!(Preprocessing::Regularize.regularizes());
        assert!(Preprocessing::OutliersThenRegularize.removes_outliers());
        assert!(Preprocessing::OutliersThenRegularize.regularizes());
    }

    #[test]
    fn test_sensor_profiles() {
        assert_eq!(SensorProfile::Accelerometer.multiplier(), 1.0);
        assert_eq!(SensorProfile::Magnetometer.multiplier(), 57.0572);
        assert_eq!(SensorProfile::Magnetometer.axis_limit(), 90.0);

        let custom = SensorProfile::Custom {
            multiplier: 48.5,
            axis_limit: 80.0,
        };
        assert_eq!(custom.multiplier(), 48.5);
        assert_eq!(custom.axis_limit(), 80.0);
    }

    #[test]
    fn test_settings_validation() {
        assert!(CalibrationSettings::default().validate().is_ok());

        let bad_threshold = CalibrationSettings {
            threshold: 0.0,
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());

        let bad_resolution = CalibrationSettings {
            resolution: 0,
            ..Default::default()
        };
        assert!(bad_resolution.validate().is_err());

        let bad_multiplier = CalibrationSettings {
            sensor: SensorProfile::Custom {
                multiplier: f64::NAN,
                axis_limit: 1.0,
            },
            ..Default::default()
        };
        assert!(bad_multiplier.validate().is_err());
    }
}
