use crate::geo::{Coordinate, distance_meters};
use crate::model::location::GeofencedLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// No enabled location exists at all.
    NoLocationsConfigured,
    /// Enabled locations exist but none contains the point.
    NoMatch,
}

/// Returns the first enabled location, in the given order, whose geofence
/// contains `point`. The boundary counts as inside.
///
/// Overlapping geofences resolve by declaration order, not by the nearest
/// center.
pub fn match_location(
    point: Coordinate,
    locations: &[GeofencedLocation],
) -> Result<&GeofencedLocation, MatchError> {
    let mut any_enabled = false;
    for loc in locations.iter().filter(|l| l.enabled) {
        any_enabled = true;
        if distance_meters(point, loc.coordinate) <= loc.radius_meters {
            return Ok(loc);
        }
    }

    if any_enabled {
        Err(MatchError::NoMatch)
    } else {
        Err(MatchError::NoLocationsConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn location(id: u64, lat: f64, lon: f64, radius: f64) -> GeofencedLocation {
        GeofencedLocation {
            id,
            name: format!("site-{id}"),
            coordinate: Coordinate {
                latitude: lat,
                longitude: lon,
            },
            radius_meters: radius,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    fn north_of(c: Coordinate, meters: f64) -> Coordinate {
        Coordinate {
            latitude: c.latitude + (meters / crate::geo::EARTH_RADIUS_METERS).to_degrees(),
            longitude: c.longitude,
        }
    }

    #[test]
    fn empty_set_is_not_configured() {
        let p = Coordinate {
            latitude: 0.0,
            longitude: 0.0,
        };
        assert_eq!(
            match_location(p, &[]).unwrap_err(),
            MatchError::NoLocationsConfigured
        );
    }

    #[test]
    fn only_disabled_locations_is_not_configured() {
        let mut loc = location(1, 35.0, 139.0, 100.0);
        loc.enabled = false;
        assert_eq!(
            match_location(loc.coordinate, &[loc.clone()]).unwrap_err(),
            MatchError::NoLocationsConfigured
        );
    }

    #[test]
    fn boundary_is_inclusive() {
        let center = location(1, 35.6812, 139.7671, 100.0);
        let p = north_of(center.coordinate, 60.0);
        let exact = distance_meters(p, center.coordinate);

        let mut on_edge = center.clone();
        on_edge.radius_meters = exact;
        assert_eq!(match_location(p, &[on_edge]).unwrap().id, 1);

        let mut just_short = center.clone();
        just_short.radius_meters = exact - 1e-6;
        assert_eq!(
            match_location(p, &[just_short]).unwrap_err(),
            MatchError::NoMatch
        );
    }

    #[test]
    fn first_declared_match_wins_over_nearest() {
        // the wide fence is declared first, the tight one is centered on the point
        let wide = location(1, 35.6800, 139.7671, 1_000.0);
        let tight = location(2, 35.6812, 139.7671, 50.0);
        let p = tight.coordinate;

        assert_eq!(match_location(p, &[wide.clone(), tight.clone()]).unwrap().id, 1);
        assert_eq!(match_location(p, &[tight, wide]).unwrap().id, 2);
    }

    #[test]
    fn disabled_locations_are_skipped() {
        let mut first = location(1, 35.6812, 139.7671, 100.0);
        first.enabled = false;
        let second = location(2, 35.6812, 139.7671, 100.0);
        assert_eq!(
            match_location(second.coordinate, &[first, second.clone()])
                .unwrap()
                .id,
            2
        );
    }
}
