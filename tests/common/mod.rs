#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use hrm_attendance::geo::Coordinate;
use hrm_attendance::model::employee::Employee;
use hrm_attendance::model::location::{GeofencedLocation, LocationDraft};
use hrm_attendance::model::role::Role;
use hrm_attendance::service::{AppState, EngineSettings};
use hrm_attendance::store::memory::MemoryStore;

pub const GLOBAL_ADMIN: u64 = 1;
pub const NURSING_ADMIN: u64 = 2;
pub const RADIOLOGY_ADMIN: u64 = 3;
pub const NURSE: u64 = 10;
pub const RADIOGRAPHER: u64 = 11;

/// Tokyo Station.
pub const OFFICE: Coordinate = Coordinate {
    latitude: 35.6812,
    longitude: 139.7671,
};

const METERS_PER_DEGREE_LAT: f64 = 111_195.0;

/// A point `meters` due north of `origin`.
pub fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
    Coordinate {
        latitude: origin.latitude + meters / METERS_PER_DEGREE_LAT,
        longitude: origin.longitude,
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minutes)
}

fn employee(id: u64, name: &str, dept: Option<&str>, role: Role, scope: Option<&str>) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        department: dept.map(str::to_string),
        role,
        managed_department: scope.map(str::to_string),
    }
}

pub struct Fixture {
    pub store: MemoryStore,
    pub state: AppState,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        for e in [
            employee(GLOBAL_ADMIN, "Grace Hopper", None, Role::Admin, None),
            employee(NURSING_ADMIN, "Nadia Ito", Some("Nursing"), Role::Admin, Some("Nursing")),
            employee(
                RADIOLOGY_ADMIN,
                "Ren Sato",
                Some("Radiology"),
                Role::Admin,
                Some("Radiology"),
            ),
            employee(NURSE, "Aiko Tanaka", Some("Nursing"), Role::Staff, None),
            employee(RADIOGRAPHER, "Kenji Mori", Some("Radiology"), Role::Staff, None),
        ] {
            store.add_employee(e).await;
        }

        let state = AppState::new(Arc::new(store.clone()), &EngineSettings::default());
        Fixture { store, state }
    }

    pub async fn add_location(&self, name: &str, center: Coordinate, radius: f64) -> GeofencedLocation {
        self.state
            .locations
            .create(
                GLOBAL_ADMIN,
                &LocationDraft {
                    name: name.to_string(),
                    coordinate: center,
                    radius_meters: radius,
                    enabled: true,
                },
                base_time(),
            )
            .await
            .unwrap()
    }
}
