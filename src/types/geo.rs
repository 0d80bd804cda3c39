use crate::error::StratusError;
use serde::{Deserialize, Serialize};

const E4: f64 = 10_000.0;

/// Round to 4 decimal places (~11 m), the precision used for favorite identity and
/// cache keys.
pub fn round4(value: f64) -> f64 {
    (value * E4).round() / E4
}

/// The 4-decimal value scaled to an integer, for exact equality in SQL.
pub fn scaled_e4(value: f64) -> i64 {
    (value * E4).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Validate ranges and reject non-finite input.
    pub fn new(lat: f64, lon: f64) -> Result<Self, StratusError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(StratusError::Validation(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(StratusError::Validation(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    pub fn rounded(self) -> Self {
        Self {
            lat: round4(self.lat),
            lon: round4(self.lon),
        }
    }
}
