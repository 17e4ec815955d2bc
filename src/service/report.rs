use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::clock_record::{ClockKind, ClockRecord};
use crate::service::clock_ledger::ClockLedger;
use crate::service::cutoff::{CutoffPeriod, period_for_year_month};

/// One worked shift. Either side can be missing at the edges of a period.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendancePair {
    #[schema(nullable = true)]
    pub clock_in: Option<ClockRecord>,
    #[schema(nullable = true)]
    pub clock_out: Option<ClockRecord>,
    #[schema(example = 28800, nullable = true)]
    pub worked_seconds: Option<i64>,
}

impl AttendancePair {
    fn new(clock_in: Option<ClockRecord>, clock_out: Option<ClockRecord>) -> Self {
        let worked_seconds = match (&clock_in, &clock_out) {
            (Some(i), Some(o)) => Some((o.recorded_at - i.recorded_at).num_seconds()),
            _ => None,
        };
        AttendancePair {
            clock_in,
            clock_out,
            worked_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceReport {
    pub employee_id: u64,
    pub period: CutoffPeriod,
    pub pairs: Vec<AttendancePair>,
    pub total_worked_seconds: i64,
}

/// Pairs timestamp-ordered records into shifts.
pub fn pair_records(records: &[ClockRecord]) -> Vec<AttendancePair> {
    let mut pairs = Vec::new();
    let mut open: Option<ClockRecord> = None;

    for record in records {
        match record.kind {
            ClockKind::ClockIn => {
                if let Some(dangling) = open.replace(record.clone()) {
                    pairs.push(AttendancePair::new(Some(dangling), None));
                }
            }
            ClockKind::ClockOut => {
                pairs.push(AttendancePair::new(open.take(), Some(record.clone())));
            }
        }
    }
    if let Some(dangling) = open {
        pairs.push(AttendancePair::new(Some(dangling), None));
    }
    pairs
}

/// Builds per-period attendance data for the reporting/export side.
/// Period bounds are local calendar times at `offset`.
pub struct AttendanceReports {
    ledger: Arc<ClockLedger>,
    offset: FixedOffset,
}

impl AttendanceReports {
    pub fn new(ledger: Arc<ClockLedger>, offset: FixedOffset) -> Self {
        Self { ledger, offset }
    }

    pub async fn monthly(
        &self,
        actor_id: u64,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> Result<AttendanceReport, AppError> {
        let period = period_for_year_month(year, month)?;
        let from = self.to_utc(period.start)?;
        let to = self.to_utc(period.end)?;

        let records = self
            .ledger
            .history(actor_id, employee_id, Some(from), Some(to))
            .await?;
        let pairs = pair_records(&records);
        let total_worked_seconds = pairs.iter().filter_map(|p| p.worked_seconds).sum();

        Ok(AttendanceReport {
            employee_id,
            period,
            pairs,
            total_worked_seconds,
        })
    }

    fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, AppError> {
        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| AppError::Validation("period is out of range".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: u64, kind: ClockKind, hour: u32) -> ClockRecord {
        ClockRecord {
            id,
            employee_id: 1,
            kind,
            recorded_at: Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap(),
            coordinate: None,
            location_id: None,
        }
    }

    #[test]
    fn pairs_complete_shifts() {
        let records = vec![
            rec(1, ClockKind::ClockIn, 9),
            rec(2, ClockKind::ClockOut, 17),
            rec(3, ClockKind::ClockIn, 18),
            rec(4, ClockKind::ClockOut, 20),
        ];
        let pairs = pair_records(&records);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].worked_seconds, Some(8 * 3600));
        assert_eq!(pairs[1].worked_seconds, Some(2 * 3600));
    }

    #[test]
    fn edges_of_the_period_stay_half_open() {
        // shift started before the period and one still running at its end
        let records = vec![
            rec(1, ClockKind::ClockOut, 2),
            rec(2, ClockKind::ClockIn, 9),
        ];
        let pairs = pair_records(&records);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].clock_in.is_none());
        assert_eq!(pairs[0].clock_out.as_ref().map(|r| r.id), Some(1));
        assert_eq!(pairs[1].clock_in.as_ref().map(|r| r.id), Some(2));
        assert!(pairs[1].clock_out.is_none());
        assert!(pairs.iter().all(|p| p.worked_seconds.is_none()));
    }

    #[test]
    fn empty_input() {
        assert!(pair_records(&[]).is_empty());
    }
}
