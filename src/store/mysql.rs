use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, MySqlConnection, MySqlPool, Transaction};

use crate::error::StoreError;
use crate::geo::Coordinate;
use crate::model::clock_record::{ClockDraft, ClockKind, ClockRecord};
use crate::model::employee::Employee;
use crate::model::location::{GeofencedLocation, LocationDraft};
use crate::model::request::{
    ApprovableRequest, RequestDraft, RequestFilter, RequestPayload, RequestStatus, StatusChange,
};
use crate::model::role::Role;
use crate::store::{Store, StoreTx};

// =====================
// Row types
// =====================

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    name: String,
    department: Option<String>,
    role: String,
    managed_department: Option<String>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: row.id,
            name: row.name,
            department: row.department,
            role: parse(&row.role)?,
            managed_department: row.managed_department,
        })
    }
}

#[derive(FromRow)]
struct LocationRow {
    id: u64,
    name: String,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl From<LocationRow> for GeofencedLocation {
    fn from(row: LocationRow) -> Self {
        GeofencedLocation {
            id: row.id,
            name: row.name,
            coordinate: Coordinate {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            radius_meters: row.radius_meters,
            enabled: row.enabled,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ClockRecordRow {
    id: u64,
    employee_id: u64,
    kind: String,
    recorded_at: DateTime<Utc>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_id: Option<u64>,
}

impl TryFrom<ClockRecordRow> for ClockRecord {
    type Error = StoreError;

    fn try_from(row: ClockRecordRow) -> Result<Self, Self::Error> {
        let coordinate = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Ok(ClockRecord {
            id: row.id,
            employee_id: row.employee_id,
            kind: parse(&row.kind)?,
            recorded_at: row.recorded_at,
            coordinate,
            location_id: row.location_id,
        })
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    submitter_id: u64,
    payload: String,
    status: String,
    assigned_approver_id: Option<u64>,
    decided_by: Option<u64>,
    decided_at: Option<DateTime<Utc>>,
    decision_comment: Option<String>,
    submitted_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for ApprovableRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let payload: RequestPayload = serde_json::from_str(&row.payload)
            .map_err(|e| StoreError::Decode(format!("request {} payload: {e}", row.id)))?;
        Ok(ApprovableRequest {
            id: row.id,
            submitter_id: row.submitter_id,
            payload,
            status: parse(&row.status)?,
            assigned_approver_id: row.assigned_approver_id,
            decided_by: row.decided_by,
            decided_at: row.decided_at,
            decision_comment: row.decision_comment,
            submitted_at: row.submitted_at,
        })
    }
}

fn parse<T: FromStr>(value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Decode(format!("unexpected value '{value}'")))
}

const EMPLOYEE_COLUMNS: &str = "id, name, department, role, managed_department";
const LOCATION_COLUMNS: &str = "id, name, latitude, longitude, radius_meters, enabled, created_at";
const CLOCK_COLUMNS: &str = "id, employee_id, kind, recorded_at, latitude, longitude, location_id";
const REQUEST_COLUMNS: &str = "r.id, r.submitter_id, r.payload, r.status, r.assigned_approver_id, \
     r.decided_by, r.decided_at, r.decision_comment, r.submitted_at";

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

// =====================
// Store
// =====================

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlTx { tx }))
    }

    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn list_admins(&self) -> Result<Vec<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE role = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(Role::Admin.as_ref())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }

    async fn list_locations(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<GeofencedLocation>, StoreError> {
        let sql = if include_disabled {
            format!("SELECT {LOCATION_COLUMNS} FROM geofenced_locations ORDER BY id")
        } else {
            format!("SELECT {LOCATION_COLUMNS} FROM geofenced_locations WHERE enabled = TRUE ORDER BY id")
        };
        let rows = sqlx::query_as::<_, LocationRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GeofencedLocation::from).collect())
    }

    async fn find_location(&self, id: u64) -> Result<Option<GeofencedLocation>, StoreError> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM geofenced_locations WHERE id = ?");
        let row = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(GeofencedLocation::from))
    }

    async fn insert_location(
        &self,
        draft: &LocationDraft,
        now: DateTime<Utc>,
    ) -> Result<GeofencedLocation, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO geofenced_locations
                (name, latitude, longitude, radius_meters, enabled, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.name)
        .bind(draft.coordinate.latitude)
        .bind(draft.coordinate.longitude)
        .bind(draft.radius_meters)
        .bind(draft.enabled)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(GeofencedLocation {
            id: result.last_insert_id(),
            name: draft.name.clone(),
            coordinate: draft.coordinate,
            radius_meters: draft.radius_meters,
            enabled: draft.enabled,
            created_at: now,
        })
    }

    async fn update_location(
        &self,
        id: u64,
        draft: &LocationDraft,
    ) -> Result<Option<GeofencedLocation>, StoreError> {
        sqlx::query(
            r#"
            UPDATE geofenced_locations
            SET name = ?, latitude = ?, longitude = ?, radius_meters = ?, enabled = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.name)
        .bind(draft.coordinate.latitude)
        .bind(draft.coordinate.longitude)
        .bind(draft.radius_meters)
        .bind(draft.enabled)
        .bind(id)
        .execute(&self.pool)
        .await?;

        // rows_affected is 0 for an unchanged row too, so re-read
        self.find_location(id).await
    }

    async fn delete_location(&self, id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM geofenced_locations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clock_records(
        &self,
        employee_id: u64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClockRecord>, StoreError> {
        let mut sql = format!("SELECT {CLOCK_COLUMNS} FROM clock_records WHERE employee_id = ?");
        if from.is_some() {
            sql.push_str(" AND recorded_at >= ?");
        }
        if to.is_some() {
            sql.push_str(" AND recorded_at <= ?");
        }
        sql.push_str(" ORDER BY recorded_at ASC, id ASC");

        let mut q = sqlx::query_as::<_, ClockRecordRow>(&sql).bind(employee_id);
        if let Some(from) = from {
            q = q.bind(from);
        }
        if let Some(to) = to {
            q = q.bind(to);
        }

        q.fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ClockRecord::try_from)
            .collect()
    }

    async fn latest_clock_record(
        &self,
        employee_id: u64,
    ) -> Result<Option<ClockRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        latest_clock_record(&mut conn, employee_id).await
    }

    async fn find_request(&self, id: u64) -> Result<Option<ApprovableRequest>, StoreError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM approval_requests r WHERE r.id = ?");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ApprovableRequest::try_from)
            .transpose()
    }

    async fn insert_request(&self, draft: &RequestDraft) -> Result<ApprovableRequest, StoreError> {
        let payload = serde_json::to_string(&draft.payload)
            .map_err(|e| StoreError::Decode(format!("request payload: {e}")))?;

        let result = sqlx::query(
            r#"
            INSERT INTO approval_requests
                (submitter_id, kind, payload, status, assigned_approver_id, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.submitter_id)
        .bind(draft.payload.kind().as_ref())
        .bind(payload)
        .bind(RequestStatus::Pending.as_ref())
        .bind(draft.assigned_approver_id)
        .bind(draft.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(ApprovableRequest {
            id: result.last_insert_id(),
            submitter_id: draft.submitter_id,
            payload: draft.payload.clone(),
            status: RequestStatus::Pending,
            assigned_approver_id: draft.assigned_approver_id,
            decided_by: None,
            decided_at: None,
            decision_comment: None,
            submitted_at: draft.submitted_at,
        })
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<ApprovableRequest>, u64), StoreError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(id) = filter.submitter_id {
            where_sql.push_str(" AND r.submitter_id = ?");
            args.push(FilterValue::U64(id));
        }
        if let Some(status) = filter.status {
            where_sql.push_str(" AND r.status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }
        if let Some(kind) = filter.kind {
            where_sql.push_str(" AND r.kind = ?");
            args.push(FilterValue::Str(kind.to_string()));
        }
        if let Some(id) = filter.assigned_approver_id {
            where_sql.push_str(" AND r.assigned_approver_id = ?");
            args.push(FilterValue::U64(id));
        }
        if let Some(dept) = &filter.submitter_department {
            where_sql.push_str(" AND e.department = ?");
            args.push(FilterValue::Str(dept.clone()));
        }

        let from_sql = " FROM approval_requests r JOIN employees e ON e.id = r.submitter_id";

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*){from_sql}{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            "SELECT {REQUEST_COLUMNS}{from_sql}{where_sql} \
             ORDER BY r.submitted_at DESC, r.id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, RequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        let rows = data_q
            .bind(filter.per_page)
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let requests = rows
            .into_iter()
            .map(ApprovableRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((requests, total.max(0) as u64))
    }
}

async fn latest_clock_record(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> Result<Option<ClockRecord>, StoreError> {
    let sql = format!(
        "SELECT {CLOCK_COLUMNS} FROM clock_records WHERE employee_id = ? \
         ORDER BY recorded_at DESC, id DESC LIMIT 1"
    );
    sqlx::query_as::<_, ClockRecordRow>(&sql)
        .bind(employee_id)
        .fetch_optional(conn)
        .await?
        .map(ClockRecord::try_from)
        .transpose()
}

// =====================
// Transaction
// =====================

pub struct MySqlTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl StoreTx for MySqlTx {
    async fn lock_employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? FOR UPDATE");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn latest_clock_record(
        &mut self,
        employee_id: u64,
    ) -> Result<Option<ClockRecord>, StoreError> {
        latest_clock_record(&mut self.tx, employee_id).await
    }

    async fn clock_record_before(
        &mut self,
        employee_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<ClockRecord>, StoreError> {
        let sql = format!(
            "SELECT {CLOCK_COLUMNS} FROM clock_records WHERE employee_id = ? AND recorded_at < ? \
             ORDER BY recorded_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, ClockRecordRow>(&sql)
            .bind(employee_id)
            .bind(at)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(ClockRecord::try_from)
            .transpose()
    }

    async fn clock_record_at_or_after(
        &mut self,
        employee_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<ClockRecord>, StoreError> {
        let sql = format!(
            "SELECT {CLOCK_COLUMNS} FROM clock_records WHERE employee_id = ? AND recorded_at >= ? \
             ORDER BY recorded_at ASC, id ASC LIMIT 1"
        );
        sqlx::query_as::<_, ClockRecordRow>(&sql)
            .bind(employee_id)
            .bind(at)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(ClockRecord::try_from)
            .transpose()
    }

    async fn count_clock_records_since(
        &mut self,
        employee_id: u64,
        kind: ClockKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM clock_records
            WHERE employee_id = ?
            AND kind = ?
            AND recorded_at >= ?
            "#,
        )
        .bind(employee_id)
        .bind(kind.as_ref())
        .bind(since)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_clock_record(&mut self, draft: &ClockDraft) -> Result<ClockRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO clock_records
                (employee_id, kind, recorded_at, latitude, longitude, location_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.employee_id)
        .bind(draft.kind.as_ref())
        .bind(draft.recorded_at)
        .bind(draft.coordinate.map(|c| c.latitude))
        .bind(draft.coordinate.map(|c| c.longitude))
        .bind(draft.location_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(ClockRecord {
            id: result.last_insert_id(),
            employee_id: draft.employee_id,
            kind: draft.kind,
            recorded_at: draft.recorded_at,
            coordinate: draft.coordinate,
            location_id: draft.location_id,
        })
    }

    async fn lock_request(&mut self, id: u64) -> Result<Option<ApprovableRequest>, StoreError> {
        let sql =
            format!("SELECT {REQUEST_COLUMNS} FROM approval_requests r WHERE r.id = ? FOR UPDATE");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(ApprovableRequest::try_from)
            .transpose()
    }

    async fn transition_request(
        &mut self,
        id: u64,
        change: &StatusChange,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE approval_requests
            SET status = ?, decided_by = ?, decided_at = ?, decision_comment = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(change.to.as_ref())
        .bind(change.decided_by)
        .bind(change.decided_at)
        .bind(change.comment.as_deref())
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
