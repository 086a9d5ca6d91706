//! Event booker.
//!
//! Creates the calendar event for a chosen slot and confirms that every
//! attendee was invited:
//!
//! 1. validate the details (no remote call on failure)
//! 2. build the payload with a client-generated event id
//! 3. insert, retrying transient failures with exponential backoff; before a
//!    retry the booker reads the event id back, so an insert whose response
//!    was lost is adopted rather than duplicated
//! 4. re-read the event until all attendees are listed, or give up and report
//!    a partial success

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use slotbook_core::{CalendarEventDetails, CalendarEventResponse, ValidationError};
use slotbook_providers::{
    CalendarClient, NewEvent, ProviderError, ProviderErrorCode, Reminder, RemoteEvent,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BookerConfig;
use crate::error::SchedulingError;

/// Errors returned by [`EventBooker::book`].
#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("event creation failed after {attempts} attempt(s): {source}")]
    Booking {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// The event was created; some attendees never showed up as invited.
    #[error("invitation not confirmed for {} attendee(s)", .missing.len())]
    NotificationUnconfirmed {
        event: Box<CalendarEventResponse>,
        missing: BTreeSet<String>,
    },
}

impl From<BookError> for SchedulingError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(e) => Self::Validation(e),
            BookError::Booking { attempts, source } => Self::Booking { attempts, source },
            BookError::NotificationUnconfirmed { event, missing } => {
                Self::NotificationVerification { event, missing }
            }
        }
    }
}

/// A created and confirmed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub event: CalendarEventResponse,
    /// Insert attempts made, including the successful one.
    pub attempts: u32,
}

/// Books events on one calendar.
pub struct EventBooker {
    client: Arc<dyn CalendarClient>,
    config: BookerConfig,
}

impl EventBooker {
    pub fn new(client: Arc<dyn CalendarClient>, config: BookerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &BookerConfig {
        &self.config
    }

    /// Creates the event described by `details` and confirms its invitations.
    ///
    /// # Errors
    ///
    /// - [`BookError::Validation`] if the details are malformed; nothing is created
    /// - [`BookError::Booking`] if the insert failed permanently or retries ran out
    /// - [`BookError::NotificationUnconfirmed`] if the event exists but some
    ///   attendees are missing from it
    pub async fn book(&self, details: &CalendarEventDetails) -> Result<Booking, BookError> {
        let created = self.create(details).await?;
        let event = self.confirm_notified(created.event, &details.attendees).await?;
        Ok(Booking {
            event,
            attempts: created.attempts,
        })
    }

    /// Creates the event without waiting for its invitations.
    ///
    /// # Errors
    ///
    /// [`BookError::Validation`] or [`BookError::Booking`], as for [`Self::book`].
    pub async fn create(&self, details: &CalendarEventDetails) -> Result<Booking, BookError> {
        details.validate(&self.config.hours)?;

        let payload = self.payload(details);
        let (remote, attempts) = self.insert(&payload).await?;
        log_responses(&remote);

        let event = remote.into_response(Utc::now());
        info!(
            event_id = %event.event_id,
            attempts,
            meet_link = event.meet_link.as_deref().unwrap_or("-"),
            "event created"
        );
        Ok(Booking { event, attempts })
    }

    /// Builds the insert payload. The event id is fixed for all retries.
    pub fn payload(&self, details: &CalendarEventDetails) -> NewEvent {
        NewEvent::new(
            Uuid::new_v4().simple().to_string(),
            details.title.trim(),
            details.start_utc(),
            details.end_utc(),
            details.timezone.name(),
        )
        .with_description(details.description.clone())
        .with_attendees(details.attendees.iter().cloned())
        .with_conference(Uuid::new_v4().to_string())
        .with_reminder(Reminder::email(self.config.email_reminder_minutes))
        .with_reminder(Reminder::popup(self.config.popup_reminder_minutes))
    }

    async fn insert(&self, payload: &NewEvent) -> Result<(RemoteEvent, u32), BookError> {
        let calendar_id = self.config.calendar_id.as_str();
        let max_attempts = self.config.max_insert_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            if attempt > 1 {
                let delay = self.config.backoff_delay(attempt - 1);
                debug!(attempt, ?delay, "backing off before retry");
                tokio::time::sleep(delay).await;

                match self.client.get_event(calendar_id, &payload.id).await {
                    Ok(Some(existing)) => {
                        info!(event_id = %existing.id, "previous attempt created the event, adopting it");
                        return Ok((existing, attempt - 1));
                    }
                    Ok(None) => {}
                    Err(e) => debug!(error = %e, "probe for existing event failed"),
                }
            }

            match self.client.insert_event(calendar_id, payload).await {
                Ok(remote) => return Ok((remote, attempt)),
                Err(e) if e.code() == ProviderErrorCode::Conflict => {
                    info!(event_id = %payload.id, "event id already exists, reading it back");
                    return match self.client.get_event(calendar_id, &payload.id).await {
                        Ok(Some(existing)) => Ok((existing, attempt)),
                        Ok(None) => Err(BookError::Booking {
                            attempts: attempt,
                            source: e,
                        }),
                        Err(read_err) => Err(BookError::Booking {
                            attempts: attempt,
                            source: read_err,
                        }),
                    };
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(attempt, max_attempts, error = %e, "insert failed, will retry");
                }
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "insert failed, retries exhausted");
                    if let Ok(Some(existing)) = self.client.get_event(calendar_id, &payload.id).await {
                        info!(event_id = %existing.id, "last attempt created the event, adopting it");
                        return Ok((existing, attempt));
                    }
                    return Err(BookError::Booking {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "insert failed, giving up");
                    return Err(BookError::Booking {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    /// Re-reads `event` until every requested attendee is listed.
    ///
    /// # Errors
    ///
    /// [`BookError::NotificationUnconfirmed`] once the re-reads run out.
    pub async fn confirm_notified(
        &self,
        mut event: CalendarEventResponse,
        requested: &BTreeSet<String>,
    ) -> Result<CalendarEventResponse, BookError> {
        let mut reads = 0;
        while !event.notified_all(requested) && reads < self.config.verify_attempts {
            reads += 1;
            debug!(
                reads,
                missing = event.missing_attendees(requested).len(),
                "attendees missing, re-reading event"
            );
            tokio::time::sleep(self.config.verify_delay).await;

            match self
                .client
                .get_event(&self.config.calendar_id, &event.event_id)
                .await
            {
                Ok(Some(remote)) => {
                    log_responses(&remote);
                    event = refresh(event, remote);
                }
                Ok(None) => warn!(event_id = %event.event_id, "event not found on re-read"),
                Err(e) => warn!(error = %e, "re-read of event failed"),
            }
        }

        if event.notified_all(requested) {
            return Ok(event);
        }

        let missing = event.missing_attendees(requested);
        warn!(
            event_id = %event.event_id,
            missing = ?missing,
            "invitations not confirmed"
        );
        Err(BookError::NotificationUnconfirmed {
            event: Box::new(event),
            missing,
        })
    }
}

/// Replaces the mirror with a fresher read, keeping links the read omits.
fn refresh(previous: CalendarEventResponse, remote: RemoteEvent) -> CalendarEventResponse {
    let fresh = remote.into_response(previous.created_at);
    CalendarEventResponse {
        meet_link: fresh.meet_link.or(previous.meet_link),
        html_link: fresh.html_link.or(previous.html_link),
        ..fresh
    }
}

fn log_responses(remote: &RemoteEvent) {
    for attendee in &remote.attendees {
        debug!(
            event_id = %remote.id,
            email = %attendee.email,
            status = ?attendee.response_status,
            "attendee response status"
        );
    }
}
