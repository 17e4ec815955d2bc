use crate::auth::auth::AuthUser;
use crate::service::cutoff::{self, CutoffPeriod};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DateQuery {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
}

/// Cutoff period a calendar date falls in
#[utoipa::path(
    get,
    path = "/api/periods/containing",
    params(DateQuery),
    responses(
        (status = 200, description = "Period found", body = CutoffPeriod),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Period"
)]
pub async fn containing(
    _auth: AuthUser,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(cutoff::period_containing(query.date)?))
}

/// The period closing on the 15th of the given month
#[utoipa::path(
    get,
    path = "/api/periods/{year}/{month}",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1 to 12")
    ),
    responses(
        (status = 200, description = "Period found", body = CutoffPeriod),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Period"
)]
pub async fn for_month(
    _auth: AuthUser,
    path: web::Path<(i32, u32)>,
) -> actix_web::Result<impl Responder> {
    let (year, month) = path.into_inner();
    Ok(HttpResponse::Ok().json(cutoff::period_for_year_month(year, month)?))
}

#[utoipa::path(
    get,
    path = "/api/periods/{year}",
    params(
        ("year" = i32, Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "January 1st through December 31st", body = CutoffPeriod),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Period"
)]
pub async fn for_year(
    _auth: AuthUser,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(cutoff::year_period(path.into_inner())?))
}
