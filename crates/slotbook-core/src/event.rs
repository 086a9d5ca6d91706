//! Meeting and event types.
//!
//! - [`MeetingRequest`]: what the caller asks for (attendees, title, duration, timezone)
//! - [`CalendarEventDetails`]: the event to create, bound to a chosen slot
//! - [`CalendarEventResponse`]: local mirror of the event the calendar created

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::{BusinessHours, TimeSlot, is_weekend};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
});

/// Returns true if `value` looks like an email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

fn validate_attendees(attendees: &BTreeSet<String>) -> Result<(), ValidationError> {
    if attendees.is_empty() {
        return Err(ValidationError::NoAttendees);
    }
    if let Some(bad) = attendees.iter().find(|a| !is_valid_email(a)) {
        return Err(ValidationError::InvalidEmail(bad.clone()));
    }
    Ok(())
}

/// A request to schedule a meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    /// Attendee emails, trimmed and lowercased.
    pub attendees: BTreeSet<String>,
    pub title: String,
    pub duration: Duration,
    pub description: Option<String>,
    /// Timezone in which business hours are evaluated and the event is created.
    pub timezone: Tz,
}

impl MeetingRequest {
    /// Creates a new request. Attendee emails are normalized and deduplicated.
    pub fn new<I, S>(attendees: I, title: impl Into<String>, duration: Duration, timezone: Tz) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            attendees: attendees
                .into_iter()
                .map(|a| normalize_email(a.as_ref()))
                .filter(|a| !a.is_empty())
                .collect(),
            title: title.into(),
            duration,
            description: None,
            timezone,
        }
    }

    /// Builder method to set the description. Blank descriptions are dropped.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.trim().is_empty()).then_some(description);
        self
    }

    /// Checks the request shape before any calendar call is made.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_attendees(&self.attendees)?;
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.duration <= Duration::zero() {
            return Err(ValidationError::NonPositiveDuration {
                minutes: self.duration.num_minutes(),
            });
        }
        Ok(())
    }

    /// Builds the event details for a chosen slot.
    pub fn details_for(&self, slot: &TimeSlot) -> CalendarEventDetails {
        CalendarEventDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            start: slot.start().with_timezone(&self.timezone),
            end: slot.end().with_timezone(&self.timezone),
            attendees: self.attendees.clone(),
            timezone: self.timezone,
        }
    }
}

/// The event to create on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEventDetails {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub attendees: BTreeSet<String>,
    pub timezone: Tz,
}

impl CalendarEventDetails {
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    /// Checks attendees, title, ordering, weekday and business hours.
    pub fn validate(&self, hours: &BusinessHours) -> Result<(), ValidationError> {
        validate_attendees(&self.attendees)?;
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.end <= self.start {
            return Err(ValidationError::EndNotAfterStart {
                start: self.start_utc(),
                end: self.end_utc(),
            });
        }

        let start = self.start.with_timezone(&self.timezone);
        let end = self.end.with_timezone(&self.timezone);
        if is_weekend(start.date_naive()) {
            return Err(ValidationError::Weekend(start.date_naive()));
        }
        if !hours.contains(&start, &end) {
            return Err(ValidationError::OutsideBusinessHours {
                start: self.start_utc(),
                end: self.end_utc(),
                work_start: hours.start,
                work_end: hours.end,
            });
        }
        Ok(())
    }
}

/// An event as created on the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventResponse {
    pub event_id: String,
    /// Video-conferencing link generated for the event.
    pub meet_link: Option<String>,
    /// URL of the event in the calendar UI.
    pub html_link: Option<String>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Attendees the calendar reports as invited.
    pub notified_attendees: BTreeSet<String>,
}

impl CalendarEventResponse {
    /// Returns requested attendees absent from the notified set.
    pub fn missing_attendees(&self, requested: &BTreeSet<String>) -> BTreeSet<String> {
        requested
            .difference(&self.notified_attendees)
            .cloned()
            .collect()
    }

    /// Returns true if every requested attendee was notified.
    pub fn notified_all(&self, requested: &BTreeSet<String>) -> bool {
        requested.is_subset(&self.notified_attendees)
    }
}
