use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::geo::Coordinate;
use crate::model::clock_record::{ClockDraft, ClockKind, ClockRecord};
use crate::model::employee::Employee;
use crate::model::location::LocationCandidate;
use crate::service::location_matcher::{MatchError, match_location};
use crate::service::locations::LocationRegistry;
use crate::store::{Store, StoreTx};

/// Default duplicate-suppression window.
pub const DUPLICATE_WINDOW_SECS: i64 = 5 * 60;

/// Whether `next` may follow `previous` (the employee's latest record kind).
pub fn check_alternation(previous: Option<ClockKind>, next: ClockKind) -> Result<(), AppError> {
    match previous {
        None if next == ClockKind::ClockOut => Err(AppError::MissingClockIn),
        None => Ok(()),
        Some(state) if state == next => Err(AppError::AlreadyInThatState { state }),
        Some(_) => Ok(()),
    }
}

/// Whether a record of `kind` at `at` fits between its neighbours in
/// timestamp order. `after` is the first record at or after `at`.
pub fn check_correction_slot(
    before: Option<&ClockRecord>,
    after: Option<&ClockRecord>,
    kind: ClockKind,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    let fits_before = match before {
        None => kind == ClockKind::ClockIn,
        Some(prev) => prev.kind != kind,
    };
    let fits_after = match after {
        None => true,
        Some(next) => next.recorded_at > at && next.kind == kind.opposite(),
    };

    if fits_before && fits_after {
        Ok(())
    } else {
        Err(AppError::CorrectionOutOfSequence)
    }
}

pub struct ClockLedger {
    store: Arc<dyn Store>,
    locations: Arc<LocationRegistry>,
    duplicate_window: Duration,
}

impl ClockLedger {
    pub fn new(
        store: Arc<dyn Store>,
        locations: Arc<LocationRegistry>,
        duplicate_window: Duration,
    ) -> Self {
        Self {
            store,
            locations,
            duplicate_window,
        }
    }

    /// Records a geofenced clock event.
    #[instrument(skip(self, coordinate, now))]
    pub async fn submit(
        &self,
        employee_id: u64,
        kind: ClockKind,
        coordinate: Coordinate,
        now: DateTime<Utc>,
    ) -> Result<ClockRecord, AppError> {
        coordinate.validate()?;

        let locations = self.locations.enabled().await?;
        let location = match match_location(coordinate, &locations) {
            Ok(loc) => loc,
            Err(MatchError::NoLocationsConfigured) => return Err(AppError::NoLocationsConfigured),
            Err(MatchError::NoMatch) => {
                return Err(AppError::OutOfRange {
                    candidates: locations.iter().map(LocationCandidate::from).collect(),
                });
            }
        };

        let mut tx = self.store.begin().await?;
        if tx.lock_employee(employee_id).await?.is_none() {
            return Err(AppError::not_found(format!("employee {employee_id}")));
        }

        let since = now - self.duplicate_window;
        if tx
            .count_clock_records_since(employee_id, kind, since)
            .await?
            > 0
        {
            return Err(AppError::DuplicateSubmission { kind });
        }

        let latest = tx.latest_clock_record(employee_id).await?;
        check_alternation(latest.map(|r| r.kind), kind)?;

        let record = tx
            .insert_clock_record(&ClockDraft {
                employee_id,
                kind,
                recorded_at: now,
                coordinate: Some(coordinate),
                location_id: Some(location.id),
            })
            .await?;
        tx.commit().await?;

        info!(
            employee_id,
            record_id = record.id,
            location_id = location.id,
            location = %location.name,
            "Clock event recorded"
        );
        Ok(record)
    }

    /// Materializes the clock record of an approved correction inside the
    /// caller's transaction. Geofence and duplicate checks do not apply; the
    /// record must still keep the employee's sequence alternating.
    pub async fn submit_correction(
        &self,
        tx: &mut dyn StoreTx,
        employee_id: u64,
        kind: ClockKind,
        requested_at: DateTime<Utc>,
    ) -> Result<ClockRecord, AppError> {
        if tx.lock_employee(employee_id).await?.is_none() {
            return Err(AppError::not_found(format!("employee {employee_id}")));
        }

        let before = tx.clock_record_before(employee_id, requested_at).await?;
        let after = tx.clock_record_at_or_after(employee_id, requested_at).await?;
        check_correction_slot(before.as_ref(), after.as_ref(), kind, requested_at)?;

        let record = tx
            .insert_clock_record(&ClockDraft {
                employee_id,
                kind,
                recorded_at: requested_at,
                coordinate: None,
                location_id: None,
            })
            .await?;
        Ok(record)
    }

    /// Records of `employee_id` ascending by timestamp, as seen by `actor_id`.
    pub async fn history(
        &self,
        actor_id: u64,
        employee_id: u64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClockRecord>, AppError> {
        self.ensure_can_view(actor_id, employee_id).await?;
        Ok(self.store.clock_records(employee_id, from, to).await?)
    }

    /// Latest record, which tells whether the employee is clocked in.
    pub async fn current_state(
        &self,
        actor_id: u64,
        employee_id: u64,
    ) -> Result<Option<ClockRecord>, AppError> {
        self.ensure_can_view(actor_id, employee_id).await?;
        Ok(self.store.latest_clock_record(employee_id).await?)
    }

    async fn ensure_can_view(&self, actor_id: u64, employee_id: u64) -> Result<(), AppError> {
        if actor_id == employee_id {
            return Ok(());
        }
        let actor = self.store.find_employee(actor_id).await?;
        let target = self
            .store
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {employee_id}")))?;

        match actor {
            Some(actor) if can_view(&actor, &target) => Ok(()),
            _ => {
                warn!(actor_id, employee_id, "Attendance read refused");
                Err(AppError::forbidden("Not allowed to view this employee's attendance"))
            }
        }
    }
}

fn can_view(actor: &Employee, target: &Employee) -> bool {
    if !actor.is_admin() {
        return false;
    }
    match actor.scope() {
        None => true,
        Some(scope) => target.department.as_deref() == Some(scope),
    }
}
