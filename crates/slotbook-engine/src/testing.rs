//! Scripted in-memory calendar for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use slotbook_core::{BusyInterval, TimeWindow};
use slotbook_providers::{
    BoxFuture, CalendarClient, NewEvent, ProviderError, ProviderErrorCode, ProviderResult,
    RemoteAttendee, RemoteEvent,
};

pub(crate) const MEET_LINK: &str = "https://meet.google.com/fak-ecal-end";

/// What the next insert call does.
#[derive(Debug, Clone, Copy)]
pub(crate) enum InsertStep {
    /// Fail without storing anything.
    Fail(ProviderErrorCode),
    /// Store the event, then fail as if the response was lost.
    LoseResponse(ProviderErrorCode),
}

#[derive(Default)]
pub(crate) struct FakeCalendar {
    busy: Vec<BusyInterval>,
    busy_error: Option<ProviderErrorCode>,
    insert_steps: Mutex<VecDeque<InsertStep>>,
    /// Attendee lists reported by successive insert/get responses.
    notified: Mutex<VecDeque<Vec<String>>>,
    insert_delay: Option<Duration>,
    stored: Mutex<Option<RemoteEvent>>,
    drop_conference: bool,
    pub inserts: AtomicU32,
    pub gets: AtomicU32,
    pub busy_reads: AtomicU32,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_busy(mut self, busy: Vec<BusyInterval>) -> Self {
        self.busy = busy;
        self
    }

    pub fn with_busy_error(mut self, code: ProviderErrorCode) -> Self {
        self.busy_error = Some(code);
        self
    }

    pub fn with_insert_steps(self, steps: impl IntoIterator<Item = InsertStep>) -> Self {
        self.insert_steps
            .lock()
            .unwrap()
            .extend(steps);
        self
    }

    pub fn with_notified<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = Vec<S>>,
        S: Into<String>,
    {
        self.notified.lock().unwrap().extend(
            responses
                .into_iter()
                .map(|list| list.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    pub fn without_conference(mut self) -> Self {
        self.drop_conference = true;
        self
    }

    pub fn stored(&self) -> Option<RemoteEvent> {
        self.stored.lock().unwrap().clone()
    }

    fn next_attendees(&self, fallback: &[String]) -> Vec<RemoteAttendee> {
        let list = self
            .notified
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| fallback.to_vec());
        list.into_iter().map(RemoteAttendee::new).collect()
    }

    fn store(&self, event: &NewEvent) -> RemoteEvent {
        let mut remote = RemoteEvent::new(&event.id, event.start, event.end);
        remote.summary = Some(event.summary.clone());
        remote.html_link = Some(format!("https://calendar.example.com/event?eid={}", event.id));
        remote.meet_link = (!self.drop_conference && event.conference_request_id.is_some())
            .then(|| MEET_LINK.to_string());
        remote.created = Some(created_at());
        remote.attendees = self.next_attendees(&event.attendees);
        *self.stored.lock().unwrap() = Some(remote.clone());
        remote
    }
}

pub(crate) fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
}

fn error(code: ProviderErrorCode) -> ProviderError {
    ProviderError::new(code, "scripted failure").with_provider("fake")
}

impl CalendarClient for FakeCalendar {
    fn name(&self) -> &str {
        "fake"
    }

    fn query_busy<'a>(
        &'a self,
        _calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<BusyInterval>>> {
        Box::pin(async move {
            self.busy_reads.fetch_add(1, Ordering::SeqCst);
            if let Some(code) = self.busy_error {
                return Err(error(code));
            }
            Ok(self
                .busy
                .iter()
                .filter(|b| b.overlaps(window.start, window.end))
                .copied()
                .collect())
        })
    }

    fn insert_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        event: &'a NewEvent,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.insert_delay {
                tokio::time::sleep(delay).await;
            }
            let step = self.insert_steps.lock().unwrap().pop_front();
            match step {
                Some(InsertStep::Fail(code)) => Err(error(code)),
                Some(InsertStep::LoseResponse(code)) => {
                    self.store(event);
                    Err(error(code))
                }
                None => {
                    let exists = self
                        .stored
                        .lock()
                        .unwrap()
                        .as_ref()
                        .is_some_and(|e| e.id == event.id);
                    if exists {
                        return Err(error(ProviderErrorCode::Conflict));
                    }
                    Ok(self.store(event))
                }
            }
        })
    }

    fn get_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteEvent>>> {
        Box::pin(async move {
            self.gets.fetch_add(1, Ordering::SeqCst);
            let mut stored = self.stored.lock().unwrap();
            let Some(event) = stored.as_mut().filter(|e| e.id == event_id) else {
                return Ok(None);
            };
            if let Some(list) = self.notified.lock().unwrap().pop_front() {
                event.attendees = list.into_iter().map(RemoteAttendee::new).collect();
            }
            Ok(Some(event.clone()))
        })
    }
}
