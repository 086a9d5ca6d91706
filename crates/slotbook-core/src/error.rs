//! Validation errors for meeting requests and event details.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// A meeting request or event payload that violates its invariants.
///
/// Validation errors are never retried; they surface immediately to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The attendee set is empty.
    #[error("at least one attendee is required")]
    NoAttendees,

    /// An attendee is not a plausible email address.
    #[error("invalid attendee email address: {0}")]
    InvalidEmail(String),

    /// The meeting title is empty or only whitespace.
    #[error("meeting title must not be empty")]
    EmptyTitle,

    /// The meeting duration is zero or negative.
    #[error("meeting duration must be positive (got {minutes} minutes)")]
    NonPositiveDuration { minutes: i64 },

    /// The event ends at or before its start.
    #[error("event end {end} is not after start {start}")]
    EndNotAfterStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The event starts on a Saturday or Sunday.
    #[error("event falls on a weekend ({0})")]
    Weekend(NaiveDate),

    /// The event is not contained in the business hours of a single day.
    #[error("event {start}..{end} is outside business hours {work_start}-{work_end}")]
    OutsideBusinessHours {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        work_start: NaiveTime,
        work_end: NaiveTime,
    },

    /// The timezone is not a known IANA identifier.
    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),

    /// A wall-clock time could not be parsed.
    #[error("invalid time of day {0:?} (expected HH:MM)")]
    InvalidTime(String),

    /// Business hours do not describe a non-empty range.
    #[error("business hours must start before they end ({start} >= {end})")]
    InvalidBusinessHours { start: NaiveTime, end: NaiveTime },
}
