use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::geo::Coordinate;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClockKind {
    ClockIn,
    ClockOut,
}

impl ClockKind {
    pub fn opposite(self) -> Self {
        match self {
            ClockKind::ClockIn => ClockKind::ClockOut,
            ClockKind::ClockOut => ClockKind::ClockIn,
        }
    }
}

/// Immutable clock event. `coordinate` and `location_id` are empty for
/// records materialized from an approved correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClockRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub kind: ClockKind,
    #[schema(example = "2026-01-05T09:00:00Z", format = "date-time", value_type = String)]
    pub recorded_at: DateTime<Utc>,
    #[schema(nullable = true)]
    pub coordinate: Option<Coordinate>,
    #[schema(example = 1, nullable = true)]
    pub location_id: Option<u64>,
}

/// A record about to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockDraft {
    pub employee_id: u64,
    pub kind: ClockKind,
    pub recorded_at: DateTime<Utc>,
    pub coordinate: Option<Coordinate>,
    pub location_id: Option<u64>,
}
