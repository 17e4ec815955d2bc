use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::model::clock_record::ClockKind;
use crate::model::location::LocationCandidate;
use crate::model::request::RequestStatus;

/// Failures raised by a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("no attendance locations are configured")]
    NoLocationsConfigured,

    #[error("you are not within range of any attendance location")]
    OutOfRange { candidates: Vec<LocationCandidate> },

    #[error("a {kind} was already recorded in the last few minutes")]
    DuplicateSubmission { kind: ClockKind },

    #[error("already recorded {state}")]
    AlreadyInThatState { state: ClockKind },

    #[error("clock_in is required before clock_out")]
    MissingClockIn,

    #[error("request is already {status}")]
    AlreadyDecided { status: RequestStatus },

    #[error("the chosen approver cannot approve requests from this department")]
    InvalidApprover,

    #[error("the corrected clock event does not fit between existing records")]
    CorrectionOutOfSequence,

    #[error("consistency failure: {0}")]
    Consistency(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Stable identifier clients can switch on.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::NoLocationsConfigured => "no_locations_configured",
            AppError::OutOfRange { .. } => "out_of_range",
            AppError::DuplicateSubmission { .. } => "duplicate_submission",
            AppError::AlreadyInThatState { .. } => "already_in_that_state",
            AppError::MissingClockIn => "missing_clock_in",
            AppError::AlreadyDecided { .. } => "already_decided",
            AppError::InvalidApprover => "invalid_approver",
            AppError::CorrectionOutOfSequence => "correction_out_of_sequence",
            AppError::Consistency(_) => "consistency_failure",
            AppError::Store(_) => "internal",
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    fn is_internal(&self) -> bool {
        matches!(self, AppError::Consistency(_) | AppError::Store(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoLocationsConfigured
            | AppError::OutOfRange { .. }
            | AppError::DuplicateSubmission { .. }
            | AppError::AlreadyInThatState { .. }
            | AppError::MissingClockIn
            | AppError::AlreadyDecided { .. }
            | AppError::InvalidApprover
            | AppError::CorrectionOutOfSequence => StatusCode::CONFLICT,
            AppError::Consistency(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            error!(error = %self, code = self.code(), "Request failed with an internal error");
            return HttpResponse::build(self.status_code()).json(json!({
                "error": self.code(),
                "message": "Internal Server Error"
            }));
        }

        let mut body = json!({
            "error": self.code(),
            "message": self.to_string()
        });
        match self {
            AppError::OutOfRange { candidates } => body["candidates"] = json!(candidates),
            AppError::AlreadyInThatState { state } => body["state"] = json!(state),
            AppError::DuplicateSubmission { kind } => body["kind"] = json!(kind),
            AppError::AlreadyDecided { status } => body["status"] = json!(status),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn only_internal_errors_are_logged() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            AppError::Store(StoreError::Decode("bad enum".into())).error_response();
            AppError::MissingClockIn.error_response();
            AppError::forbidden("Admin only").error_response();
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out.lines().count(), 1, "{out}");
        assert!(out.contains("ERROR"));
        assert!(out.contains("bad enum"));
        assert!(out.contains("internal"));
    }

    #[actix_web::test]
    async fn out_of_range_lists_candidates() {
        let err = AppError::OutOfRange {
            candidates: vec![LocationCandidate {
                name: "Head Office".into(),
                radius_meters: 100.0,
            }],
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"], "out_of_range");
        assert_eq!(v["candidates"][0]["name"], "Head Office");
        assert_eq!(v["candidates"][0]["radius_meters"], 100.0);
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let err = AppError::Consistency("clock insert failed after approval".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"], "consistency_failure");
        assert_eq!(v["message"], "Internal Server Error");
    }

    #[test]
    fn conflicts_map_to_409() {
        let cases = [
            AppError::MissingClockIn,
            AppError::InvalidApprover,
            AppError::AlreadyDecided {
                status: RequestStatus::Approved,
            },
            AppError::AlreadyInThatState {
                state: ClockKind::ClockIn,
            },
        ];
        for e in cases {
            assert_eq!(e.status_code(), StatusCode::CONFLICT, "{}", e.code());
        }
    }
}
