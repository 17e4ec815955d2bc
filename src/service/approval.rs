//! Request lifecycle shared by corrections, leave and overtime.
//!
//! ```text
//! Pending --approve--> Approved
//!         --reject---> Rejected
//!         --cancel---> Cancelled
//! ```
//!
//! Terminal states never change. Transitions are compare-and-set on
//! `Pending` inside a store transaction, so of two concurrent deciders only
//! one wins and the other sees `AlreadyDecided`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::model::employee::Employee;
use crate::model::request::{
    ApprovableRequest, ApprovalEffect, Outcome, RequestDraft, RequestFilter, RequestPayload,
    RequestStatus, StatusChange,
};
use crate::service::clock_ledger::ClockLedger;
use crate::service::router::RequestRouter;
use crate::store::{Store, StoreTx};

/// Whether `actor` may approve or reject `request`. Global admins may decide
/// anything; scoped admins only requests assigned to them from their own
/// department.
pub fn authorize_decision(
    actor: &Employee,
    request: &ApprovableRequest,
    submitter: Option<&Employee>,
) -> Result<(), AppError> {
    if !actor.is_admin() {
        return Err(AppError::forbidden("Admin only"));
    }
    let Some(scope) = actor.scope() else {
        return Ok(());
    };

    let assigned_to_actor = request.assigned_approver_id == Some(actor.id);
    let same_department = submitter.and_then(|s| s.department.as_deref()) == Some(scope);
    if assigned_to_actor && same_department {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Request is outside your department or not assigned to you",
        ))
    }
}

pub struct ApprovalWorkflow {
    store: Arc<dyn Store>,
    router: RequestRouter,
    ledger: Arc<ClockLedger>,
}

impl ApprovalWorkflow {
    pub fn new(store: Arc<dyn Store>, router: RequestRouter, ledger: Arc<ClockLedger>) -> Self {
        Self {
            store,
            router,
            ledger,
        }
    }

    /// Files a new pending request. `assigned_approver_id` of `None` leaves it
    /// open to any global admin.
    pub async fn submit(
        &self,
        submitter_id: u64,
        payload: RequestPayload,
        assigned_approver_id: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<ApprovableRequest, AppError> {
        payload.validate(now)?;

        let submitter = self
            .store
            .find_employee(submitter_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employee {submitter_id}")))?;

        if let Some(approver_id) = assigned_approver_id {
            let valid = self
                .router
                .validate_assignment(submitter.department.as_deref(), approver_id)
                .await?;
            if !valid {
                warn!(submitter_id, approver_id, "Request routed to ineligible approver");
                return Err(AppError::InvalidApprover);
            }
        }

        let request = self
            .store
            .insert_request(&RequestDraft {
                submitter_id,
                payload,
                assigned_approver_id,
                submitted_at: now,
            })
            .await?;

        info!(
            request_id = request.id,
            submitter_id,
            kind = %request.payload.kind(),
            assigned_approver_id,
            "Request submitted"
        );
        Ok(request)
    }

    /// Approves or rejects a pending request. Approving a time-card
    /// correction writes its clock record in the same transaction.
    pub async fn decide(
        &self,
        request_id: u64,
        actor_id: u64,
        outcome: Outcome,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApprovableRequest, AppError> {
        let mut tx = self.store.begin().await?;

        let mut request = load_request(tx.as_mut(), request_id).await?;
        if request.status.is_terminal() {
            return Err(AppError::AlreadyDecided {
                status: request.status,
            });
        }

        let actor = tx.find_employee(actor_id).await?.ok_or_else(|| {
            warn!(actor_id, request_id, "Decision by unknown actor");
            AppError::forbidden("Admin only")
        })?;
        let submitter = tx.find_employee(request.submitter_id).await?;
        if let Err(e) = authorize_decision(&actor, &request, submitter.as_ref()) {
            warn!(actor_id, request_id, "Decision refused");
            return Err(e);
        }

        let change = StatusChange {
            to: outcome.status(),
            decided_by: actor_id,
            decided_at: now,
            comment,
        };
        transition(tx.as_mut(), &mut request, change).await?;

        if outcome == Outcome::Approve {
            if let ApprovalEffect::MaterializeClockRecord { kind, at } = request.payload.on_approve()
            {
                let record = self
                    .ledger
                    .submit_correction(tx.as_mut(), request.submitter_id, kind, at)
                    .await
                    .map_err(|e| match e {
                        AppError::Store(inner) => {
                            error!(error = %inner, request_id, "Correction record write failed during approval");
                            AppError::Consistency(format!(
                                "request {request_id} could not materialize its clock record"
                            ))
                        }
                        other => other,
                    })?;
                info!(request_id, record_id = record.id, "Correction materialized");
            }
        }

        tx.commit().await?;

        info!(request_id, actor_id, status = %request.status, "Request decided");
        Ok(request)
    }

    /// Withdraws a pending request. Only its submitter may do so.
    pub async fn cancel(
        &self,
        request_id: u64,
        actor_id: u64,
        now: DateTime<Utc>,
    ) -> Result<ApprovableRequest, AppError> {
        let mut tx = self.store.begin().await?;

        let mut request = load_request(tx.as_mut(), request_id).await?;
        if request.submitter_id != actor_id {
            warn!(actor_id, request_id, "Cancel refused: not the submitter");
            return Err(AppError::forbidden("Only the submitter can cancel a request"));
        }
        if request.status.is_terminal() {
            return Err(AppError::AlreadyDecided {
                status: request.status,
            });
        }

        let change = StatusChange {
            to: RequestStatus::Cancelled,
            decided_by: actor_id,
            decided_at: now,
            comment: None,
        };
        transition(tx.as_mut(), &mut request, change).await?;
        tx.commit().await?;

        info!(request_id, actor_id, "Request cancelled");
        Ok(request)
    }

    /// Visible to its submitter and to admins allowed to decide it.
    pub async fn get(&self, actor_id: u64, request_id: u64) -> Result<ApprovableRequest, AppError> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("request {request_id}")))?;
        if request.submitter_id == actor_id {
            return Ok(request);
        }

        let actor = self
            .store
            .find_employee(actor_id)
            .await?
            .ok_or_else(|| AppError::forbidden("Not allowed to view this request"))?;
        let submitter = self.store.find_employee(request.submitter_id).await?;
        authorize_decision(&actor, &request, submitter.as_ref())
            .map_err(|_| AppError::forbidden("Not allowed to view this request"))?;
        Ok(request)
    }

    pub async fn list_mine(
        &self,
        actor_id: u64,
        mut filter: RequestFilter,
    ) -> Result<(Vec<ApprovableRequest>, u64), AppError> {
        filter.submitter_id = Some(actor_id);
        Ok(self.store.list_requests(&filter).await?)
    }

    /// Requests the actor may decide. Scoped admins see only what is
    /// assigned to them from their own department.
    pub async fn inbox(
        &self,
        actor_id: u64,
        mut filter: RequestFilter,
    ) -> Result<(Vec<ApprovableRequest>, u64), AppError> {
        let actor = self
            .store
            .find_employee(actor_id)
            .await?
            .filter(Employee::is_admin)
            .ok_or_else(|| AppError::forbidden("Admin only"))?;

        if let Some(scope) = actor.scope() {
            filter.assigned_approver_id = Some(actor.id);
            filter.submitter_department = Some(scope.to_string());
        }
        Ok(self.store.list_requests(&filter).await?)
    }
}

async fn load_request(
    tx: &mut dyn StoreTx,
    request_id: u64,
) -> Result<ApprovableRequest, AppError> {
    tx.lock_request(request_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("request {request_id}")))
}

/// Compare-and-set from `Pending`; the loser of a race sees `AlreadyDecided`.
async fn transition(
    tx: &mut dyn StoreTx,
    request: &mut ApprovableRequest,
    change: StatusChange,
) -> Result<(), AppError> {
    if !tx.transition_request(request.id, &change).await? {
        let status = tx
            .lock_request(request.id)
            .await?
            .map(|r| r.status)
            .unwrap_or(request.status);
        return Err(AppError::AlreadyDecided { status });
    }

    request.status = change.to;
    request.decided_by = Some(change.decided_by);
    request.decided_at = Some(change.decided_at);
    request.decision_comment = change.comment;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::{LeavePayload, LeaveType};
    use crate::model::role::Role;
    use chrono::NaiveDate;

    fn employee(id: u64, dept: Option<&str>, role: Role, scope: Option<&str>) -> Employee {
        Employee {
            id,
            name: format!("e{id}"),
            department: dept.map(str::to_string),
            role,
            managed_department: scope.map(str::to_string),
        }
    }

    fn request(submitter_id: u64, assigned: Option<u64>) -> ApprovableRequest {
        ApprovableRequest {
            id: 1,
            submitter_id,
            payload: RequestPayload::Leave(LeavePayload {
                leave_type: LeaveType::Annual,
                start_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
                reason: None,
            }),
            status: RequestStatus::Pending,
            assigned_approver_id: assigned,
            decided_by: None,
            decided_at: None,
            decision_comment: None,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn staff_cannot_decide() {
        let actor = employee(2, Some("Nursing"), Role::Staff, None);
        let submitter = employee(1, Some("Nursing"), Role::Staff, None);
        assert!(authorize_decision(&actor, &request(1, Some(2)), Some(&submitter)).is_err());
    }

    #[test]
    fn global_admin_decides_anything() {
        let actor = employee(9, None, Role::Admin, None);
        let submitter = employee(1, Some("Radiology"), Role::Staff, None);
        assert!(authorize_decision(&actor, &request(1, None), Some(&submitter)).is_ok());
        assert!(authorize_decision(&actor, &request(1, Some(42)), Some(&submitter)).is_ok());
    }

    #[test]
    fn scoped_admin_needs_assignment_and_department() {
        let nursing = employee(5, Some("Nursing"), Role::Admin, Some("Nursing"));
        let nurse = employee(1, Some("Nursing"), Role::Staff, None);
        let radiographer = employee(2, Some("Radiology"), Role::Staff, None);

        assert!(authorize_decision(&nursing, &request(1, Some(5)), Some(&nurse)).is_ok());
        // not assigned
        assert!(authorize_decision(&nursing, &request(1, None), Some(&nurse)).is_err());
        // assigned, but wrong department
        assert!(
            authorize_decision(&nursing, &request(2, Some(5)), Some(&radiographer)).is_err()
        );
    }
}
