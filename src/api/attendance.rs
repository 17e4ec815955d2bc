use crate::auth::auth::AuthUser;
use crate::geo::Coordinate;
use crate::model::clock_record::{ClockKind, ClockRecord};
use crate::service::AppState;
use crate::service::report::AttendanceReport;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RecordsQuery {
    /// Whose records to read; defaults to the caller
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Inclusive lower bound
    #[schema(example = "2026-01-16T00:00:00Z", format = "date-time", value_type = String)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    #[schema(example = "2026-02-15T23:59:59Z", format = "date-time", value_type = String)]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatusQuery {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = 2026)]
    pub year: i32,
    /// Month whose 15th closes the period
    #[schema(example = 2)]
    pub month: u32,
}

#[derive(Serialize, ToSchema)]
pub struct ClockStatus {
    #[schema(example = true)]
    pub clocked_in: bool,
    #[schema(nullable = true)]
    pub latest: Option<ClockRecord>,
}

async fn clock(
    auth: &AuthUser,
    state: &AppState,
    kind: ClockKind,
    coordinate: Coordinate,
) -> actix_web::Result<HttpResponse> {
    let record = state
        .ledger
        .submit(auth.employee_id, kind, coordinate, Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    request_body(
        content = Coordinate,
        description = "Where the employee is right now",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Clocked in", body = ClockRecord),
        (status = 400, description = "Malformed coordinate"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Rejected by a business rule", body = Object, example = json!({
            "error": "out_of_range",
            "message": "you are not within range of any attendance location",
            "candidates": [{ "name": "Head Office", "radius_meters": 100.0 }]
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<Coordinate>,
) -> actix_web::Result<impl Responder> {
    clock(&auth, &state, ClockKind::ClockIn, payload.into_inner()).await
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    request_body(
        content = Coordinate,
        description = "Where the employee is right now",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Clocked out", body = ClockRecord),
        (status = 400, description = "Malformed coordinate"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Rejected by a business rule", body = Object, example = json!({
            "error": "missing_clock_in",
            "message": "clock_in is required before clock_out"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<Coordinate>,
) -> actix_web::Result<impl Responder> {
    clock(&auth, &state, ClockKind::ClockOut, payload.into_inner()).await
}

/// Clock records, oldest first
#[utoipa::path(
    get,
    path = "/api/attendance/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Clock records", body = [ClockRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_records(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<RecordsQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = query.employee_id.unwrap_or(auth.employee_id);
    let records = state
        .ledger
        .history(auth.employee_id, employee_id, query.from, query.to)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Whether the employee is currently clocked in
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Current state", body = ClockStatus),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn status(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<StatusQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = query.employee_id.unwrap_or(auth.employee_id);
    let latest = state
        .ledger
        .current_state(auth.employee_id, employee_id)
        .await?;

    Ok(HttpResponse::Ok().json(ClockStatus {
        clocked_in: latest.as_ref().map(|r| r.kind) == Some(ClockKind::ClockIn),
        latest,
    }))
}

/// Paired clock-in/clock-out data for one cutoff period
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Attendance for the period", body = AttendanceReport),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn report(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = query.employee_id.unwrap_or(auth.employee_id);
    let report = state
        .reports
        .monthly(auth.employee_id, employee_id, query.year, query.month)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
