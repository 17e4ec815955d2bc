use crate::api::attendance::{ClockStatus, RecordsQuery, ReportQuery, StatusQuery};
use crate::api::location::LocationFilter;
use crate::api::period::DateQuery;
use crate::api::request::{
    CreateCorrection, CreateLeave, CreateOvertime, Decision, RequestListResponse, RequestQuery,
};
use crate::geo::Coordinate;
use crate::model::clock_record::{ClockKind, ClockRecord};
use crate::model::employee::Employee;
use crate::model::location::{GeofencedLocation, LocationCandidate, LocationDraft};
use crate::model::request::{ApprovableRequest, LeaveType, RequestKind, RequestStatus};
use crate::model::role::Role;
use crate::service::cutoff::CutoffPeriod;
use crate::service::report::{AttendancePair, AttendanceReport};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Geofenced Attendance & Approvals

Clock-in/clock-out validated against registered office locations, plus a
single approval workflow for time-card corrections, leave and overtime.

### 🔹 Key Features
- **Attendance**
  - Clock in and out within range of a registered location
  - Records, current state and per-period reports
- **Locations**
  - Geofenced locations managed by global admins
- **Requests**
  - Corrections, leave and overtime routed to department or global admins
  - Approving a correction writes the missing clock record
- **Periods**
  - Payroll cutoff periods from the 16th to the 15th

### 🔐 Security
Every endpoint requires a **JWT Bearer** access token.

### 📦 Response Format
- JSON-based RESTful responses
- Errors carry a stable `error` code and a `message`
"#,
    ),
    paths(
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::list_records,
        crate::api::attendance::status,
        crate::api::attendance::report,

        crate::api::location::list_locations,
        crate::api::location::get_location,
        crate::api::location::create_location,
        crate::api::location::update_location,
        crate::api::location::delete_location,

        crate::api::request::create_correction,
        crate::api::request::create_leave,
        crate::api::request::create_overtime,
        crate::api::request::list_mine,
        crate::api::request::inbox,
        crate::api::request::get_request,
        crate::api::request::approvers,
        crate::api::request::approve_request,
        crate::api::request::reject_request,
        crate::api::request::cancel_request,

        crate::api::period::containing,
        crate::api::period::for_month,
        crate::api::period::for_year
    ),
    components(
        schemas(
            Coordinate,
            ClockKind,
            ClockRecord,
            ClockStatus,
            RecordsQuery,
            StatusQuery,
            ReportQuery,
            AttendancePair,
            AttendanceReport,
            GeofencedLocation,
            LocationDraft,
            LocationCandidate,
            LocationFilter,
            Employee,
            Role,
            ApprovableRequest,
            RequestStatus,
            RequestKind,
            LeaveType,
            CreateCorrection,
            CreateLeave,
            CreateOvertime,
            Decision,
            RequestQuery,
            RequestListResponse,
            CutoffPeriod,
            DateQuery
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Clock-in/clock-out APIs"),
        (name = "Location", description = "Geofenced location management APIs"),
        (name = "Request", description = "Approval workflow APIs"),
        (name = "Period", description = "Payroll cutoff period APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
