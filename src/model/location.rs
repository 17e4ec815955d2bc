use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::geo::Coordinate;

pub const MIN_RADIUS_METERS: f64 = 10.0;
pub const MAX_RADIUS_METERS: f64 = 10_000.0;

/// A circular geofence clock events are validated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeofencedLocation {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Head Office")]
    pub name: String,
    pub coordinate: Coordinate,
    #[schema(example = 100.0)]
    pub radius_meters: f64,
    #[schema(example = true)]
    pub enabled: bool,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for a location.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LocationDraft {
    #[schema(example = "Head Office")]
    pub name: String,
    pub coordinate: Coordinate,
    #[schema(example = 100.0)]
    pub radius_meters: f64,
    #[serde(default = "default_enabled")]
    #[schema(example = true)]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl LocationDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("location name is required".into()));
        }
        self.coordinate.validate()?;
        if !self.radius_meters.is_finite()
            || !(MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&self.radius_meters)
        {
            return Err(AppError::Validation(format!(
                "radius must be between {MIN_RADIUS_METERS} and {MAX_RADIUS_METERS} meters"
            )));
        }
        Ok(())
    }
}

/// What a rejected clock submission shows the user about nearby geofences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationCandidate {
    #[schema(example = "Head Office")]
    pub name: String,
    #[schema(example = 100.0)]
    pub radius_meters: f64,
}

impl From<&GeofencedLocation> for LocationCandidate {
    fn from(loc: &GeofencedLocation) -> Self {
        LocationCandidate {
            name: loc.name.clone(),
            radius_meters: loc.radius_meters,
        }
    }
}
