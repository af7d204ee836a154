//! Osculating orbital elements to a planar state vector.
//!
//! HORIZONS reports elements in degrees, degrees/second and kilometres.
//! The state vector is in metres and metres/second, in the ecliptic plane
//! with the inclination ignored.

use serde::Serialize;

use crate::error::{HorizonsError, Result};
use crate::record::{Field, ResultRecord};

/// Position and velocity in the reference plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StateVector {
    /// Metres from the coordinate centre.
    pub position: [f64; 2],
    /// Metres per second.
    pub velocity: [f64; 2],
}

/// Elements needed for the conversion, as reported by HORIZONS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    /// EC
    pub eccentricity: f64,
    /// OM, degrees
    pub ascending_node: f64,
    /// W, degrees
    pub perifocus: f64,
    /// N, degrees/second
    pub mean_motion: f64,
    /// TA, degrees
    pub true_anomaly: f64,
    /// A, kilometres
    pub semi_major_axis: f64,
}

impl OrbitalElements {
    /// Take the six elements from a record.
    ///
    /// # Errors
    ///
    /// - [`HorizonsError::MissingField`] if an element was not extracted
    /// - [`HorizonsError::InvalidElements`] for non-elliptic orbits
    pub fn from_record(record: &ResultRecord) -> Result<Self> {
        let elements = Self {
            eccentricity: record.require(Field::Eccentricity)?,
            ascending_node: record.require(Field::AscendingNode)?,
            perifocus: record.require(Field::Perifocus)?,
            mean_motion: record.require(Field::MeanMotion)?,
            true_anomaly: record.require(Field::TrueAnomaly)?,
            semi_major_axis: record.require(Field::SemiMajorAxis)?,
        };
        elements.validate()?;
        Ok(elements)
    }

    /// Reject orbits the closed-form conversion can't handle.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(HorizonsError::InvalidElements(format!(
                "eccentricity {} is not in [0, 1)",
                self.eccentricity
            )));
        }
        if self.semi_major_axis <= 0.0 {
            return Err(HorizonsError::InvalidElements(format!(
                "semi-major axis {} km is not positive",
                self.semi_major_axis
            )));
        }
        Ok(())
    }

    /// Distance from the focus in metres.
    pub fn radius(&self) -> f64 {
        let e = self.eccentricity;
        let a = self.semi_major_axis * 1e3;
        a * (1.0 - e * e) / (1.0 + e * self.true_anomaly.to_radians().cos())
    }

    /// Position and velocity in the reference plane.
    pub fn state_vector(&self) -> StateVector {
        let e = self.eccentricity;
        let a = self.semi_major_axis * 1e3;
        let n = self.mean_motion.to_radians();
        let nu = self.true_anomaly.to_radians();
        let theta = (self.true_anomaly + self.perifocus + self.ascending_node).to_radians();
        let (sin_theta, cos_theta) = theta.sin_cos();

        let r = self.radius();
        let v_radial = n * e * nu.sin() * r / (1.0 - e * e).sqrt();
        let v_transverse = n * a;

        StateVector {
            position: [r * cos_theta, r * sin_theta],
            velocity: [
                v_radial * cos_theta - v_transverse * sin_theta,
                v_radial * sin_theta + v_transverse * cos_theta,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordBuilder;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "{} != {} (tolerance {})",
            actual,
            expected,
            tolerance
        );
    }

    fn earth() -> OrbitalElements {
        OrbitalElements {
            eccentricity: 1.721107296809000E-02,
            ascending_node: 1.245752380286001E+02,
            perifocus: 3.361773303000747E+02,
            mean_motion: 1.142214289946943E-05,
            true_anomaly: 1.232355108860352E+02,
            semi_major_axis: 1.494701057043585E+08,
        }
    }

    #[test]
    fn test_circular_orbit() {
        let elements = OrbitalElements {
            eccentricity: 0.0,
            ascending_node: 0.0,
            perifocus: 0.0,
            mean_motion: 1e-3,
            true_anomaly: 90.0,
            semi_major_axis: 1000.0,
        };

        let state = elements.state_vector();
        assert_close(state.position[0], 0.0, 1e-6);
        assert_close(state.position[1], 1e6, 1e-6);

        // Prograde and perpendicular to the radius.
        let speed = 1e-3_f64.to_radians() * 1e6;
        assert_close(state.velocity[0], -speed, 1e-9);
        assert_close(state.velocity[1], 0.0, 1e-9);
    }

    #[test]
    fn test_earth_is_about_one_au_out() {
        let state = earth().state_vector();
        let distance = state.position[0].hypot(state.position[1]);
        let speed = state.velocity[0].hypot(state.velocity[1]);

        assert!((1.47e11..1.53e11).contains(&distance), "distance {}", distance);
        assert!((29_000.0..31_000.0).contains(&speed), "speed {}", speed);
        assert_close(distance, earth().radius(), 1.0);
    }

    #[test]
    fn test_from_record() {
        let mut builder = RecordBuilder::new("earth");
        let e = earth();
        builder.set(Field::Eccentricity, e.eccentricity);
        builder.set(Field::AscendingNode, e.ascending_node);
        builder.set(Field::Perifocus, e.perifocus);
        builder.set(Field::MeanMotion, e.mean_motion);
        builder.set(Field::TrueAnomaly, e.true_anomaly);
        builder.set(Field::SemiMajorAxis, e.semi_major_axis);

        assert_eq!(OrbitalElements::from_record(&builder.finish()).unwrap(), e);
    }

    #[test]
    fn test_missing_and_invalid_elements() {
        let mut builder = RecordBuilder::new("earth");
        builder.set(Field::Eccentricity, 0.5);
        let err = OrbitalElements::from_record(&builder.finish()).unwrap_err();
        assert!(matches!(err, HorizonsError::MissingField(Field::AscendingNode)));

        let hyperbolic = OrbitalElements {
            eccentricity: 1.2,
            ..earth()
        };
        assert!(matches!(
            hyperbolic.validate(),
            Err(HorizonsError::InvalidElements(_))
        ));
    }
}
