use serde::{Deserialize, Serialize};

use crate::errors::PunchError;

/// Signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting NaN and out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, PunchError> {
        let c = Self { lat, lon };
        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), PunchError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(PunchError::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}
