//! Event payloads exchanged with calendar services.
//!
//! [`NewEvent`] is what the booker asks a calendar to create; [`RemoteEvent`]
//! is what the calendar reports back, either from the insert call or from a
//! later read.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotbook_core::CalendarEventResponse;

/// How a reminder is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderMethod {
    Email,
    Popup,
}

impl ReminderMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Popup => "popup",
        }
    }
}

/// A reminder override on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub method: ReminderMethod,
    pub minutes_before: u32,
}

impl Reminder {
    pub fn email(minutes_before: u32) -> Self {
        Self {
            method: ReminderMethod::Email,
            minutes_before,
        }
    }

    pub fn popup(minutes_before: u32) -> Self {
        Self {
            method: ReminderMethod::Popup,
            minutes_before,
        }
    }
}

/// Who may change the event after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestPermissions {
    pub can_modify: bool,
    pub can_invite_others: bool,
    pub can_see_other_guests: bool,
}

impl Default for GuestPermissions {
    fn default() -> Self {
        Self {
            can_modify: false,
            can_invite_others: false,
            can_see_other_guests: true,
        }
    }
}

/// An event to be created.
///
/// `id` is chosen by the caller so that a retried insert can be detected on
/// the remote side; `conference_request_id` asks the service to generate a
/// video-conferencing link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA identifier the event is displayed in.
    pub timezone: String,
    pub attendees: Vec<String>,
    pub conference_request_id: Option<String>,
    pub reminders: Vec<Reminder>,
    pub guests: GuestPermissions,
}

impl NewEvent {
    pub fn new(
        id: impl Into<String>,
        summary: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            description: None,
            start,
            end,
            timezone: timezone.into(),
            attendees: Vec::new(),
            conference_request_id: None,
            reminders: Vec::new(),
            guests: GuestPermissions::default(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = attendees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conference(mut self, request_id: impl Into<String>) -> Self {
        self.conference_request_id = Some(request_id.into());
        self
    }

    pub fn with_reminder(mut self, reminder: Reminder) -> Self {
        self.reminders.push(reminder);
        self
    }
}

/// The response status for an event attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    /// Invited, no answer yet.
    NeedsAction,
    #[default]
    Unknown,
}

/// An attendee as reported by the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAttendee {
    pub email: String,
    pub response_status: ResponseStatus,
}

impl RemoteAttendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            response_status: ResponseStatus::NeedsAction,
        }
    }
}

/// An event as stored on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub html_link: Option<String>,
    pub meet_link: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub attendees: Vec<RemoteAttendee>,
}

impl RemoteEvent {
    pub fn new(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            summary: None,
            start,
            end,
            html_link: None,
            meet_link: None,
            created: None,
            attendees: Vec::new(),
        }
    }

    /// Lowercased emails of every attendee the calendar lists.
    pub fn attendee_emails(&self) -> BTreeSet<String> {
        self.attendees
            .iter()
            .map(|a| a.email.trim().to_lowercase())
            .collect()
    }

    /// Converts into the local mirror of the event.
    ///
    /// `observed_at` stands in for the creation time when the service does not
    /// report one.
    pub fn into_response(self, observed_at: DateTime<Utc>) -> CalendarEventResponse {
        let notified_attendees = self.attendee_emails();
        CalendarEventResponse {
            event_id: self.id,
            meet_link: self.meet_link,
            html_link: self.html_link,
            title: self.summary.unwrap_or_default(),
            start: self.start,
            end: self.end,
            created_at: self.created.unwrap_or(observed_at),
            notified_attendees,
        }
    }
}
