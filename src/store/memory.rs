//! In-process backend. A transaction holds the single state lock and works on
//! a staged copy that replaces the state on commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreError;
use crate::model::clock_record::{ClockDraft, ClockKind, ClockRecord};
use crate::model::employee::Employee;
use crate::model::location::{GeofencedLocation, LocationDraft};
use crate::model::request::{
    ApprovableRequest, RequestDraft, RequestFilter, RequestStatus, StatusChange,
};
use crate::model::role::Role;
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    employees: BTreeMap<u64, Employee>,
    locations: BTreeMap<u64, GeofencedLocation>,
    clock_records: BTreeMap<u64, ClockRecord>,
    requests: BTreeMap<u64, ApprovableRequest>,
    last_id: u64,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Records for one employee ordered by (timestamp, id).
    fn records_of(&self, employee_id: u64) -> Vec<&ClockRecord> {
        let mut out: Vec<&ClockRecord> = self
            .clock_records
            .values()
            .filter(|r| r.employee_id == employee_id)
            .collect();
        out.sort_by_key(|r| (r.recorded_at, r.id));
        out
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Employees come from the identity collaborator; this seeds them.
    pub async fn add_employee(&self, employee: Employee) {
        let mut state = self.state.lock().await;
        state.last_id = state.last_id.max(employee.id);
        state.employees.insert(employee.id, employee);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }

    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        Ok(self.state.lock().await.employees.get(&id).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .employees
            .values()
            .filter(|e| e.role == Role::Admin)
            .cloned()
            .collect())
    }

    async fn list_locations(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<GeofencedLocation>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .locations
            .values()
            .filter(|l| include_disabled || l.enabled)
            .cloned()
            .collect())
    }

    async fn find_location(&self, id: u64) -> Result<Option<GeofencedLocation>, StoreError> {
        Ok(self.state.lock().await.locations.get(&id).cloned())
    }

    async fn insert_location(
        &self,
        draft: &LocationDraft,
        now: DateTime<Utc>,
    ) -> Result<GeofencedLocation, StoreError> {
        let mut state = self.state.lock().await;
        let location = GeofencedLocation {
            id: state.next_id(),
            name: draft.name.clone(),
            coordinate: draft.coordinate,
            radius_meters: draft.radius_meters,
            enabled: draft.enabled,
            created_at: now,
        };
        state.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update_location(
        &self,
        id: u64,
        draft: &LocationDraft,
    ) -> Result<Option<GeofencedLocation>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.locations.get_mut(&id).map(|loc| {
            loc.name = draft.name.clone();
            loc.coordinate = draft.coordinate;
            loc.radius_meters = draft.radius_meters;
            loc.enabled = draft.enabled;
            loc.clone()
        }))
    }

    async fn delete_location(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.locations.remove(&id).is_some())
    }

    async fn clock_records(
        &self,
        employee_id: u64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClockRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .records_of(employee_id)
            .into_iter()
            .filter(|r| from.is_none_or(|f| r.recorded_at >= f))
            .filter(|r| to.is_none_or(|t| r.recorded_at <= t))
            .cloned()
            .collect())
    }

    async fn latest_clock_record(
        &self,
        employee_id: u64,
    ) -> Result<Option<ClockRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.records_of(employee_id).last().map(|r| (*r).clone()))
    }

    async fn find_request(&self, id: u64) -> Result<Option<ApprovableRequest>, StoreError> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn insert_request(&self, draft: &RequestDraft) -> Result<ApprovableRequest, StoreError> {
        let mut state = self.state.lock().await;
        let request = ApprovableRequest {
            id: state.next_id(),
            submitter_id: draft.submitter_id,
            payload: draft.payload.clone(),
            status: RequestStatus::Pending,
            assigned_approver_id: draft.assigned_approver_id,
            decided_by: None,
            decided_at: None,
            decision_comment: None,
            submitted_at: draft.submitted_at,
        };
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<ApprovableRequest>, u64), StoreError> {
        let state = self.state.lock().await;
        let mut matching: Vec<&ApprovableRequest> = state
            .requests
            .values()
            .filter(|r| filter.submitter_id.is_none_or(|id| r.submitter_id == id))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .filter(|r| filter.kind.is_none_or(|k| r.payload.kind() == k))
            .filter(|r| {
                filter
                    .assigned_approver_id
                    .is_none_or(|id| r.assigned_approver_id == Some(id))
            })
            .filter(|r| match filter.submitter_department.as_deref() {
                None => true,
                Some(dept) => state
                    .employees
                    .get(&r.submitter_id)
                    .and_then(|e| e.department.as_deref())
                    == Some(dept),
            })
            .collect();
        matching.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.per_page as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError> {
        // the whole state is already held by this transaction
        Ok(self.staged.employees.get(&id).cloned())
    }

    async fn find_employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError> {
        Ok(self.staged.employees.get(&id).cloned())
    }

    async fn latest_clock_record(
        &mut self,
        employee_id: u64,
    ) -> Result<Option<ClockRecord>, StoreError> {
        Ok(self
            .staged
            .records_of(employee_id)
            .last()
            .map(|r| (*r).clone()))
    }

    async fn clock_record_before(
        &mut self,
        employee_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<ClockRecord>, StoreError> {
        Ok(self
            .staged
            .records_of(employee_id)
            .into_iter()
            .filter(|r| r.recorded_at < at)
            .next_back()
            .cloned())
    }

    async fn clock_record_at_or_after(
        &mut self,
        employee_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<ClockRecord>, StoreError> {
        Ok(self
            .staged
            .records_of(employee_id)
            .into_iter()
            .find(|r| r.recorded_at >= at)
            .cloned())
    }

    async fn count_clock_records_since(
        &mut self,
        employee_id: u64,
        kind: ClockKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self
            .staged
            .records_of(employee_id)
            .into_iter()
            .filter(|r| r.kind == kind && r.recorded_at >= since)
            .count() as u64)
    }

    async fn insert_clock_record(&mut self, draft: &ClockDraft) -> Result<ClockRecord, StoreError> {
        let record = ClockRecord {
            id: self.staged.next_id(),
            employee_id: draft.employee_id,
            kind: draft.kind,
            recorded_at: draft.recorded_at,
            coordinate: draft.coordinate,
            location_id: draft.location_id,
        };
        self.staged.clock_records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn lock_request(&mut self, id: u64) -> Result<Option<ApprovableRequest>, StoreError> {
        Ok(self.staged.requests.get(&id).cloned())
    }

    async fn transition_request(
        &mut self,
        id: u64,
        change: &StatusChange,
    ) -> Result<bool, StoreError> {
        match self.staged.requests.get_mut(&id) {
            Some(r) if r.status == RequestStatus::Pending => {
                r.status = change.to;
                r.decided_by = Some(change.decided_by);
                r.decided_at = Some(change.decided_at);
                r.decision_comment = change.comment.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
