use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::clock_record::ClockKind;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    TimeCardCorrection,
    Leave,
    Overtime,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionPayload {
    pub clock_kind: ClockKind,
    pub requested_at: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeavePayload {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimePayload {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: String,
}

/// Kind-specific body of an approvable request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestPayload {
    TimeCardCorrection(CorrectionPayload),
    Leave(LeavePayload),
    Overtime(OvertimePayload),
}

/// Side effect a payload asks for when its request is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalEffect {
    None,
    MaterializeClockRecord {
        kind: ClockKind,
        at: DateTime<Utc>,
    },
}

impl RequestPayload {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestPayload::TimeCardCorrection(_) => RequestKind::TimeCardCorrection,
            RequestPayload::Leave(_) => RequestKind::Leave,
            RequestPayload::Overtime(_) => RequestKind::Overtime,
        }
    }

    pub fn on_approve(&self) -> ApprovalEffect {
        match self {
            RequestPayload::TimeCardCorrection(c) => ApprovalEffect::MaterializeClockRecord {
                kind: c.clock_kind,
                at: c.requested_at,
            },
            RequestPayload::Leave(_) | RequestPayload::Overtime(_) => ApprovalEffect::None,
        }
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        match self {
            RequestPayload::TimeCardCorrection(c) => {
                if c.reason.trim().is_empty() {
                    return Err(AppError::Validation("reason is required".into()));
                }
                if c.requested_at > now {
                    return Err(AppError::Validation(
                        "requested_at cannot be in the future".into(),
                    ));
                }
            }
            RequestPayload::Leave(l) => {
                if l.start_date > l.end_date {
                    return Err(AppError::Validation(
                        "start_date cannot be after end_date".into(),
                    ));
                }
            }
            RequestPayload::Overtime(o) => {
                if o.start_at >= o.end_at {
                    return Err(AppError::Validation(
                        "start_at must be before end_at".into(),
                    ));
                }
                if o.reason.trim().is_empty() {
                    return Err(AppError::Validation("reason is required".into()));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "submitter_id": 1000,
    "payload": {
        "kind": "leave",
        "leave_type": "sick",
        "start_date": "2026-01-05",
        "end_date": "2026-01-06",
        "reason": null
    },
    "status": "pending",
    "assigned_approver_id": 7,
    "decided_by": null,
    "decided_at": null,
    "decision_comment": null,
    "submitted_at": "2026-01-04T08:00:00Z"
}))]
pub struct ApprovableRequest {
    pub id: u64,
    pub submitter_id: u64,
    #[schema(value_type = Object)]
    pub payload: RequestPayload,
    pub status: RequestStatus,
    /// `None` means any global approver may pick it up.
    #[schema(nullable = true)]
    pub assigned_approver_id: Option<u64>,
    #[schema(nullable = true)]
    pub decided_by: Option<u64>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(nullable = true)]
    pub decision_comment: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDraft {
    pub submitter_id: u64,
    pub payload: RequestPayload,
    pub assigned_approver_id: Option<u64>,
    pub submitted_at: DateTime<Utc>,
}

/// Pending -> terminal transition applied as a compare-and-set.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub to: RequestStatus,
    pub decided_by: u64,
    pub decided_at: DateTime<Utc>,
    pub comment: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approve,
    Reject,
}

impl Outcome {
    pub fn status(self) -> RequestStatus {
        match self {
            Outcome::Approve => RequestStatus::Approved,
            Outcome::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub submitter_id: Option<u64>,
    pub status: Option<RequestStatus>,
    pub kind: Option<RequestKind>,
    pub assigned_approver_id: Option<u64>,
    pub submitter_department: Option<String>,
    pub page: u64,
    pub per_page: u64,
}

impl RequestFilter {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }
}
