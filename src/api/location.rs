use crate::auth::auth::AuthUser;
use crate::model::location::{GeofencedLocation, LocationDraft};
use crate::service::AppState;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LocationFilter {
    /// Include disabled locations
    #[schema(example = false)]
    #[serde(default)]
    pub include_disabled: bool,
}

/// List attendance locations
#[utoipa::path(
    get,
    path = "/api/locations",
    params(LocationFilter),
    responses(
        (status = 200, description = "Locations in declaration order", body = [GeofencedLocation]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Location"
)]
pub async fn list_locations(
    _auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LocationFilter>,
) -> actix_web::Result<impl Responder> {
    let locations = state.locations.list(query.include_disabled).await?;
    Ok(HttpResponse::Ok().json(locations.as_slice()))
}

#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    params(
        ("id" = u64, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Location found", body = GeofencedLocation),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Location not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Location"
)]
pub async fn get_location(
    _auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let location = state.locations.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(location))
}

/// Register a new location (global admin)
#[utoipa::path(
    post,
    path = "/api/locations",
    request_body(
        content = LocationDraft,
        description = "Location payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Location created", body = GeofencedLocation),
        (status = 400, description = "Invalid location"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Location"
)]
pub async fn create_location(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<LocationDraft>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let location = state
        .locations
        .create(auth.employee_id, &payload, Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(location))
}

/// Replace a location's fields (global admin)
#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    params(
        ("id" = u64, Path, description = "Location ID")
    ),
    request_body(
        content = LocationDraft,
        description = "Location payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Location updated", body = GeofencedLocation),
        (status = 400, description = "Invalid location"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Location not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Location"
)]
pub async fn update_location(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<LocationDraft>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let location = state
        .locations
        .update(auth.employee_id, path.into_inner(), &payload)
        .await?;
    Ok(HttpResponse::Ok().json(location))
}

#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    params(
        ("id" = u64, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Location deleted", body = Object, example = json!({
            "message": "Location deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Location not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Location"
)]
pub async fn delete_location(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    state
        .locations
        .delete(auth.employee_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Location deleted"
    })))
}
