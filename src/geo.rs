use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 point. Plain value type, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = 35.6812)]
    pub latitude: f64,
    #[schema(example = 139.7671)]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AppError> {
        let c = Coordinate {
            latitude,
            longitude,
        };
        c.validate()?;
        Ok(c)
    }

    /// Rejects non-finite values and out-of-range degrees.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(AppError::Validation(
                "coordinate must be a finite number".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::Validation(
                "latitude must be between -90 and 90".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::Validation(
                "longitude must be between -180 and 180".into(),
            ));
        }
        Ok(())
    }
}

/// Great-circle distance in meters (haversine).
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // clamp guards asin against h drifting past 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Coordinate::new(35.6812, 139.7671).unwrap();
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(1.0, 0.0).unwrap();
        let expected = EARTH_RADIUS_METERS * 1f64.to_radians();
        assert!((distance_meters(a, b) - expected).abs() < 1e-6);
    }

    #[test]
    fn symmetric() {
        let tokyo = Coordinate::new(35.6812, 139.7671).unwrap();
        let osaka = Coordinate::new(34.7025, 135.4959).unwrap();
        let d1 = distance_meters(tokyo, osaka);
        let d2 = distance_meters(osaka, tokyo);
        assert!((d1 - d2).abs() < 1e-9);
        // roughly 400 km apart
        assert!(d1 > 390_000.0 && d1 < 410_000.0);
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(0.0, 180.0).unwrap();
        let d = distance_meters(a, b);
        assert!(d.is_finite());
        assert!((d - EARTH_RADIUS_METERS * std::f64::consts::PI).abs() < 1.0);
    }

    #[test]
    fn rejects_invalid_coordinates() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }
}
