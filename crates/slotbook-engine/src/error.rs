//! Engine error types.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use slotbook_core::{CalendarEventResponse, TimeWindow, ValidationError};
use slotbook_providers::ProviderError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, SchedulingError>;

/// Stable, machine-readable category of a [`SchedulingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Validation,
    NoAvailability,
    CalendarUnavailable,
    Booking,
    NotificationVerification,
    Verification,
    Timeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NoAvailability => "no_availability",
            Self::CalendarUnavailable => "calendar_unavailable",
            Self::Booking => "booking",
            Self::NotificationVerification => "notification_verification",
            Self::Verification => "verification",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Errors that end (or degrade) a scheduling run.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// The request or event details are malformed.
    #[error("invalid meeting: {0}")]
    Validation(#[from] ValidationError),

    /// No free slot in the search window.
    #[error("no available slot between {} and {}", .window.start, .window.end)]
    NoAvailability { window: TimeWindow },

    /// Busy intervals could not be read.
    #[error("calendar unavailable: {0}")]
    CalendarUnavailable(#[source] ProviderError),

    /// Event creation failed, after retries for transient errors.
    #[error("event creation failed after {attempts} attempt(s): {source}")]
    Booking {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// The event exists but not every attendee shows up as invited.
    #[error("event {} created but invitation not confirmed for: {}", .event.event_id, join(.missing))]
    NotificationVerification {
        event: Box<CalendarEventResponse>,
        missing: BTreeSet<String>,
    },

    /// The created event does not match what was requested.
    #[error("event does not match the request: {}", .failures.join("; "))]
    Verification { failures: Vec<String> },

    /// The request deadline passed.
    #[error("request timed out after {}s", .limit.as_secs_f64())]
    Timeout { limit: Duration },
}

impl SchedulingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::NoAvailability { .. } => ErrorCode::NoAvailability,
            Self::CalendarUnavailable(_) => ErrorCode::CalendarUnavailable,
            Self::Booking { .. } => ErrorCode::Booking,
            Self::NotificationVerification { .. } => ErrorCode::NotificationVerification,
            Self::Verification { .. } => ErrorCode::Verification,
            Self::Timeout { .. } => ErrorCode::Timeout,
        }
    }

    /// The created event, if the error happened after creation.
    pub fn event(&self) -> Option<&CalendarEventResponse> {
        match self {
            Self::NotificationVerification { event, .. } => Some(event.as_ref()),
            _ => None,
        }
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::NoAvailability.as_str(), "no_availability");
        assert_eq!(ErrorCode::CalendarUnavailable.to_string(), "calendar_unavailable");
        assert_eq!(
            serde_json::to_string(&ErrorCode::NotificationVerification).unwrap(),
            r#""notification_verification""#
        );
    }

    #[test]
    fn error_messages() {
        let err = SchedulingError::Booking {
            attempts: 3,
            source: ProviderError::server("backend error"),
        };
        assert_eq!(err.code(), ErrorCode::Booking);
        assert_eq!(
            err.to_string(),
            "event creation failed after 3 attempt(s): server_error: backend error"
        );

        let err = SchedulingError::Verification {
            failures: vec!["title mismatch".into(), "no conference link".into()],
        };
        assert_eq!(
            err.to_string(),
            "event does not match the request: title mismatch; no conference link"
        );

        let err = SchedulingError::from(ValidationError::EmptyTitle);
        assert_eq!(err.code(), ErrorCode::Validation);
        assert!(err.event().is_none());
    }

    #[test]
    fn notification_error_keeps_event() {
        let event = CalendarEventResponse {
            event_id: "evt1".into(),
            meet_link: None,
            html_link: None,
            title: "Sync".into(),
            start: Utc.with_ymd_and_hms(2025, 3, 17, 10, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 17, 10, 30, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
            notified_attendees: BTreeSet::new(),
        };
        let err = SchedulingError::NotificationVerification {
            event: Box::new(event),
            missing: ["a@x.com".to_string(), "b@x.com".to_string()].into_iter().collect(),
        };
        assert_eq!(
            err.to_string(),
            "event evt1 created but invitation not confirmed for: a@x.com, b@x.com"
        );
        assert_eq!(err.event().map(|e| e.event_id.as_str()), Some("evt1"));
    }
}
