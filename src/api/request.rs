use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::clock_record::ClockKind;
use crate::model::employee::Employee;
use crate::model::request::{
    ApprovableRequest, CorrectionPayload, LeavePayload, LeaveType, Outcome, OvertimePayload,
    RequestFilter, RequestKind, RequestPayload, RequestStatus,
};
use crate::service::AppState;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;

#[derive(Deserialize, ToSchema)]
pub struct CreateCorrection {
    #[schema(example = "clock_out")]
    pub clock_kind: ClockKind,
    /// The time that should have been recorded
    #[schema(example = "2026-01-05T18:00:00Z", format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    #[schema(example = "Phone battery died before clocking out")]
    pub reason: String,
    /// Leave empty to route to any global admin
    #[schema(example = 7)]
    pub approver_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-02", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    pub reason: Option<String>,
    #[schema(example = 7)]
    pub approver_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateOvertime {
    #[schema(example = "2026-01-05T18:00:00Z", format = "date-time", value_type = String)]
    pub start_at: DateTime<Utc>,
    #[schema(example = "2026-01-05T21:00:00Z", format = "date-time", value_type = String)]
    pub end_at: DateTime<Utc>,
    #[schema(example = "Month-end close")]
    pub reason: String,
    #[schema(example = 7)]
    pub approver_id: Option<u64>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct Decision {
    #[schema(example = "Enjoy the time off")]
    pub comment: Option<String>,
}

/// An empty body means "no comment"; anything else must be a valid `Decision`.
fn parse_decision(body: &[u8]) -> Result<Decision, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Decision::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid decision body: {e}")))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RequestQuery {
    /// Filter by request status
    #[schema(example = "pending")]
    pub status: Option<RequestStatus>,
    /// Filter by request kind
    #[schema(example = "leave")]
    pub kind: Option<RequestKind>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Items per page, at most 100
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

impl RequestQuery {
    fn to_filter(&self, default_status: Option<RequestStatus>) -> RequestFilter {
        RequestFilter {
            status: self.status.or(default_status),
            kind: self.kind,
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
            ..RequestFilter::default()
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<ApprovableRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

impl RequestListResponse {
    fn new((data, total): (Vec<ApprovableRequest>, u64), filter: &RequestFilter) -> Self {
        RequestListResponse {
            data,
            page: filter.page,
            per_page: filter.per_page,
            total,
        }
    }
}

async fn submit(
    auth: &AuthUser,
    state: &AppState,
    payload: RequestPayload,
    approver_id: Option<u64>,
) -> actix_web::Result<HttpResponse> {
    let request = state
        .approvals
        .submit(auth.employee_id, payload, approver_id, Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(request))
}

async fn decide(
    auth: &AuthUser,
    state: &AppState,
    request_id: u64,
    outcome: Outcome,
    body: &[u8],
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let comment = parse_decision(body)?.comment;
    let request = state
        .approvals
        .decide(request_id, auth.employee_id, outcome, comment, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Submit requests
========================= */
/// File a time-card correction
#[utoipa::path(
    post,
    path = "/api/requests/corrections",
    request_body(
        content = CreateCorrection,
        description = "Correction payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Correction submitted", body = ApprovableRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Approver not eligible", body = Object, example = json!({
            "error": "invalid_approver",
            "message": "approver is not eligible for this request"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn create_correction(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateCorrection>,
) -> actix_web::Result<impl Responder> {
    let body = payload.into_inner();
    let request = RequestPayload::TimeCardCorrection(CorrectionPayload {
        clock_kind: body.clock_kind,
        requested_at: body.requested_at,
        reason: body.reason,
    });
    submit(&auth, &state, request, body.approver_id).await
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/requests/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = ApprovableRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Approver not eligible")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let body = payload.into_inner();
    let request = RequestPayload::Leave(LeavePayload {
        leave_type: body.leave_type,
        start_date: body.start_date,
        end_date: body.end_date,
        reason: body.reason,
    });
    submit(&auth, &state, request, body.approver_id).await
}

/// Apply for overtime
#[utoipa::path(
    post,
    path = "/api/requests/overtime",
    request_body(
        content = CreateOvertime,
        description = "Overtime request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Overtime request submitted", body = ApprovableRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Approver not eligible")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn create_overtime(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateOvertime>,
) -> actix_web::Result<impl Responder> {
    let body = payload.into_inner();
    let request = RequestPayload::Overtime(OvertimePayload {
        start_at: body.start_at,
        end_at: body.end_at,
        reason: body.reason,
    });
    submit(&auth, &state, request, body.approver_id).await
}

/* =========================
Read requests
========================= */
/// The caller's own requests, newest first
#[utoipa::path(
    get,
    path = "/api/requests",
    params(RequestQuery),
    responses(
        (status = 200, description = "Paginated requests", body = RequestListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn list_mine(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<RequestQuery>,
) -> actix_web::Result<impl Responder> {
    let filter = query.to_filter(None);
    let page = state
        .approvals
        .list_mine(auth.employee_id, filter.clone())
        .await?;
    Ok(HttpResponse::Ok().json(RequestListResponse::new(page, &filter)))
}

/// Requests awaiting the caller's decision. Defaults to pending ones.
#[utoipa::path(
    get,
    path = "/api/requests/inbox",
    params(RequestQuery),
    responses(
        (status = 200, description = "Paginated requests", body = RequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn inbox(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<RequestQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let filter = query.to_filter(Some(RequestStatus::Pending));
    let page = state
        .approvals
        .inbox(auth.employee_id, filter.clone())
        .await?;
    Ok(HttpResponse::Ok().json(RequestListResponse::new(page, &filter)))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(
        ("id" = u64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request found", body = ApprovableRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn get_request(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = state
        .approvals
        .get(auth.employee_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Admins the caller may route a request to
#[utoipa::path(
    get,
    path = "/api/requests/approvers",
    responses(
        (status = 200, description = "Department admins first, then global admins", body = [Employee]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn approvers(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let approvers = state.router.approvers_for(auth.employee_id).await?;
    Ok(HttpResponse::Ok().json(approvers))
}

/* =========================
Decide requests
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{id}/approve",
    params(
        ("id" = u64, Path, description = "ID of the request to approve")
    ),
    request_body(
        content = Decision,
        description = "Optional decision comment",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request approved", body = ApprovableRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already decided", body = Object, example = json!({
            "error": "already_decided",
            "message": "request is already approved",
            "status": "approved"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn approve_request(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    decide(&auth, &state, path.into_inner(), Outcome::Approve, &body).await
}

#[utoipa::path(
    put,
    path = "/api/requests/{id}/reject",
    params(
        ("id" = u64, Path, description = "ID of the request to reject")
    ),
    request_body(
        content = Decision,
        description = "Optional decision comment",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request rejected", body = ApprovableRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn reject_request(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    decide(&auth, &state, path.into_inner(), Outcome::Reject, &body).await
}

/// Withdraw a pending request (submitter only)
#[utoipa::path(
    put,
    path = "/api/requests/{id}/cancel",
    params(
        ("id" = u64, Path, description = "ID of the request to cancel")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = ApprovableRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn cancel_request(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = state
        .approvals
        .cancel(path.into_inner(), auth.employee_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}
