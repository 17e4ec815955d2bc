use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, FixedOffset, Offset, Utc};

use crate::store::Store;

pub mod approval;
pub mod clock_ledger;
pub mod cutoff;
pub mod location_matcher;
pub mod locations;
pub mod report;
pub mod router;

use approval::ApprovalWorkflow;
use clock_ledger::ClockLedger;
use locations::LocationRegistry;
use report::AttendanceReports;
use router::RequestRouter;

/// Tunables the services need from configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub duplicate_window: Duration,
    pub location_cache_ttl: StdDuration,
    pub report_offset: FixedOffset,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            duplicate_window: Duration::seconds(clock_ledger::DUPLICATE_WINDOW_SECS),
            location_cache_ttl: StdDuration::from_secs(30),
            report_offset: Utc.fix(),
        }
    }
}

/// Everything the HTTP layer calls into, built once over one store.
pub struct AppState {
    pub locations: Arc<LocationRegistry>,
    pub ledger: Arc<ClockLedger>,
    pub router: RequestRouter,
    pub approvals: ApprovalWorkflow,
    pub reports: AttendanceReports,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: &EngineSettings) -> Self {
        let locations = Arc::new(LocationRegistry::new(
            store.clone(),
            settings.location_cache_ttl,
        ));
        let ledger = Arc::new(ClockLedger::new(
            store.clone(),
            locations.clone(),
            settings.duplicate_window,
        ));
        let router = RequestRouter::new(store.clone());
        let approvals = ApprovalWorkflow::new(store, router.clone(), ledger.clone());
        let reports = AttendanceReports::new(ledger.clone(), settings.report_offset);

        Self {
            locations,
            ledger,
            router,
            approvals,
            reports,
        }
    }
}
