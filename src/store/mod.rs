//! Persistence contract the core runs against.
//!
//! `Store` covers plain reads and single-statement writes. Anything that
//! reads-then-writes goes through a `StoreTx`: the clock alternation checks run
//! with the employee locked, and request transitions are compare-and-set on
//! `Pending`. A `StoreTx` dropped without `commit` leaves no trace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::clock_record::{ClockDraft, ClockKind, ClockRecord};
use crate::model::employee::Employee;
use crate::model::location::{GeofencedLocation, LocationDraft};
use crate::model::request::{ApprovableRequest, RequestDraft, RequestFilter, StatusChange};

pub mod memory;
pub mod mysql;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, StoreError>;
    async fn list_admins(&self) -> Result<Vec<Employee>, StoreError>;

    /// Locations in declaration order (ascending id).
    async fn list_locations(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<GeofencedLocation>, StoreError>;
    async fn find_location(&self, id: u64) -> Result<Option<GeofencedLocation>, StoreError>;
    async fn insert_location(
        &self,
        draft: &LocationDraft,
        now: DateTime<Utc>,
    ) -> Result<GeofencedLocation, StoreError>;
    async fn update_location(
        &self,
        id: u64,
        draft: &LocationDraft,
    ) -> Result<Option<GeofencedLocation>, StoreError>;
    async fn delete_location(&self, id: u64) -> Result<bool, StoreError>;

    /// Records ascending by timestamp, optionally bounded (inclusive).
    async fn clock_records(
        &self,
        employee_id: u64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClockRecord>, StoreError>;
    async fn latest_clock_record(&self, employee_id: u64)
    -> Result<Option<ClockRecord>, StoreError>;

    async fn find_request(&self, id: u64) -> Result<Option<ApprovableRequest>, StoreError>;
    async fn insert_request(&self, draft: &RequestDraft) -> Result<ApprovableRequest, StoreError>;
    /// Newest first, with the total row count ignoring pagination.
    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<ApprovableRequest>, u64), StoreError>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Locks the employee for the rest of the transaction; all clock writes
    /// for that employee serialize on this.
    async fn lock_employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError>;
    async fn find_employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError>;

    async fn latest_clock_record(&mut self, employee_id: u64)
    -> Result<Option<ClockRecord>, StoreError>;
    /// Latest record strictly before `at`.
    async fn clock_record_before(
        &mut self,
        employee_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<ClockRecord>, StoreError>;
    /// Earliest record at or after `at`.
    async fn clock_record_at_or_after(
        &mut self,
        employee_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<ClockRecord>, StoreError>;
    async fn count_clock_records_since(
        &mut self,
        employee_id: u64,
        kind: ClockKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
    async fn insert_clock_record(&mut self, draft: &ClockDraft) -> Result<ClockRecord, StoreError>;

    async fn lock_request(&mut self, id: u64) -> Result<Option<ApprovableRequest>, StoreError>;
    /// Applies `change` only if the request is still pending. Returns whether
    /// a row changed.
    async fn transition_request(
        &mut self,
        id: u64,
        change: &StatusChange,
    ) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
