//! Five-stage scheduling pipeline.
//!
//! ```text
//! FIND_SLOTS → PROCESS_SLOTS → CREATE_EVENT → VERIFY_DETAILS → SUMMARIZE → DONE
//!      └─────────────┴──────────────┴───────────────┴─────────────┴──→ FAILED
//! ```
//!
//! Each stage is a plain function of what earlier stages produced. Results
//! are appended to a [`PipelineContext`] which moves forward with the run;
//! no stage calls back into an earlier one and no stage retries another.
//! The first failure short-circuits the rest and is reported together with
//! the stage it happened in and the created event, if there is one.
//!
//! The whole run shares one deadline. Each stage is awaited with
//! [`tokio::time::timeout_at`] against it, so expiry fails whichever stage is
//! in flight.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use slotbook_core::{
    AvailableSlotsResult, BusyInterval, CalendarEventDetails, CalendarEventResponse,
    MeetingRequest, SlotSearch, TimeSlot, TimeWindow, ValidationError, business_days_from,
    is_weekend,
};
use slotbook_providers::CalendarClient;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::booker::{BookError, EventBooker};
use crate::config::PipelineConfig;
use crate::error::{EngineResult, ErrorCode, SchedulingError};
use crate::summary::{Summarizer, SummaryInput, TemplateSummarizer};

/// Slots are offered on quarter-hour boundaries from "now" onwards.
const NOW_GRANULARITY_SECS: i64 = 15 * 60;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    FindSlots,
    ProcessSlots,
    CreateEvent,
    VerifyDetails,
    Summarize,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::FindSlots,
        Stage::ProcessSlots,
        Stage::CreateEvent,
        Stage::VerifyDetails,
        Stage::Summarize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindSlots => "FIND_SLOTS",
            Self::ProcessSlots => "PROCESS_SLOTS",
            Self::CreateEvent => "CREATE_EVENT",
            Self::VerifyDetails => "VERIFY_DETAILS",
            Self::Summarize => "SUMMARIZE",
        }
    }

    /// Role label attached to the stage span.
    pub fn role(&self) -> &'static str {
        match self {
            Self::FindSlots | Self::ProcessSlots => "scheduler",
            Self::CreateEvent => "calendar",
            Self::VerifyDetails => "verifier",
            Self::Summarize => "summarizer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Stage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The event produced by CREATE_EVENT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedEvent {
    pub event: CalendarEventResponse,
    /// Requested attendees the calendar never listed. Non-empty means partial success.
    pub unconfirmed: BTreeSet<String>,
}

impl BookedEvent {
    pub fn is_partial(&self) -> bool {
        !self.unconfirmed.is_empty()
    }
}

/// State accumulated by one run.
///
/// Only grows: each `with_*` consumes the context and returns it extended.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    request: MeetingRequest,
    now: DateTime<Utc>,
    slots: Option<AvailableSlotsResult>,
    details: Option<CalendarEventDetails>,
    booked: Option<BookedEvent>,
    summary: Option<String>,
}

impl PipelineContext {
    pub fn new(request: MeetingRequest, now: DateTime<Utc>) -> Self {
        Self {
            request,
            now,
            slots: None,
            details: None,
            booked: None,
            summary: None,
        }
    }

    pub fn with_slots(self, slots: AvailableSlotsResult) -> Self {
        Self {
            slots: Some(slots),
            ..self
        }
    }

    pub fn with_details(self, details: CalendarEventDetails) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }

    pub fn with_booked(self, booked: BookedEvent) -> Self {
        Self {
            booked: Some(booked),
            ..self
        }
    }

    pub fn with_summary(self, summary: String) -> Self {
        Self {
            summary: Some(summary),
            ..self
        }
    }

    pub fn request(&self) -> &MeetingRequest {
        &self.request
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn slots(&self) -> Option<&AvailableSlotsResult> {
        self.slots.as_ref()
    }

    pub fn details(&self) -> Option<&CalendarEventDetails> {
        self.details.as_ref()
    }

    pub fn booked(&self) -> Option<&BookedEvent> {
        self.booked.as_ref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

/// Overall result status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// A failure or warning as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub stage: Stage,
    pub message: String,
}

impl ErrorReport {
    fn new(stage: Stage, error: &SchedulingError) -> Self {
        Self {
            code: error.code(),
            stage,
            message: error.to_string(),
        }
    }
}

/// What a scheduling run returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleOutcome {
    pub status: OutcomeStatus,
    /// The event exists but a downstream confirmation did not pass.
    pub partial: bool,
    pub slot: Option<TimeSlot>,
    pub event: Option<CalendarEventResponse>,
    pub summary: Option<String>,
    pub notes: Option<String>,
    /// Degradations that did not stop the run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ErrorReport>,
    pub error: Option<ErrorReport>,
}

impl ScheduleOutcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    fn from_context(ctx: PipelineContext, error: Option<ErrorReport>) -> Self {
        let warnings = match ctx.booked {
            Some(ref booked) if booked.is_partial() => {
                let err = SchedulingError::NotificationVerification {
                    event: Box::new(booked.event.clone()),
                    missing: booked.unconfirmed.clone(),
                };
                vec![ErrorReport::new(Stage::CreateEvent, &err)]
            }
            _ => Vec::new(),
        };

        let partial = ctx.booked.as_ref().is_some_and(BookedEvent::is_partial)
            || (error.is_some() && ctx.booked.is_some());

        Self {
            status: if error.is_some() {
                OutcomeStatus::Error
            } else {
                OutcomeStatus::Success
            },
            partial,
            slot: ctx.slots.as_ref().and_then(|s| s.selected.clone()),
            notes: ctx.slots.map(|s| s.notes),
            event: ctx.booked.map(|b| b.event),
            summary: ctx.summary,
            warnings,
            error,
        }
    }
}

/// A run that stopped at `stage`.
struct Failed {
    ctx: PipelineContext,
    stage: Stage,
    error: SchedulingError,
}

impl Failed {
    fn new(ctx: PipelineContext, stage: Stage, error: SchedulingError) -> Self {
        Self { ctx, stage, error }
    }
}

/// Runs scheduling requests against one calendar.
///
/// Holds no per-request state; `run` may be called concurrently.
pub struct Pipeline {
    client: Arc<dyn CalendarClient>,
    booker: EventBooker,
    summarizer: Arc<dyn Summarizer>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(client: Arc<dyn CalendarClient>, config: PipelineConfig) -> Self {
        Self {
            booker: EventBooker::new(client.clone(), config.booker.clone()),
            client,
            summarizer: Arc::new(TemplateSummarizer),
            config,
        }
    }

    /// Builder: use a custom summarizer.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Schedules a meeting with the configured deadline.
    pub async fn run(&self, request: MeetingRequest) -> ScheduleOutcome {
        self.run_at(request, Utc::now(), self.config.request_timeout)
            .await
    }

    /// Schedules a meeting as if the current time were `now`.
    pub async fn run_at(
        &self,
        request: MeetingRequest,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> ScheduleOutcome {
        let span = info_span!(
            "schedule",
            title = %request.title,
            attendees = request.attendees.len(),
            tz = %request.timezone
        );
        async move {
            let deadline = Instant::now() + timeout;
            let ctx = PipelineContext::new(request, now);
            match self.drive(ctx, deadline, timeout).await {
                Ok(ctx) => {
                    info!("meeting scheduled");
                    ScheduleOutcome::from_context(ctx, None)
                }
                Err(Failed { ctx, stage, error }) => {
                    warn!(stage = %stage, code = %error.code(), "scheduling failed: {}", error);
                    let report = ErrorReport::new(stage, &error);
                    let mut outcome = ScheduleOutcome::from_context(ctx, Some(report));
                    if outcome.event.is_none() {
                        outcome.event = error.event().cloned();
                    }
                    outcome
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        ctx: PipelineContext,
        deadline: Instant,
        limit: Duration,
    ) -> Result<PipelineContext, Failed> {
        let result = self
            .within(Stage::FindSlots, deadline, limit, self.find_slots(&ctx.request, ctx.now))
            .await;
        let slots = match result {
            Ok(slots) => slots,
            Err(error) => return Err(Failed::new(ctx, Stage::FindSlots, error)),
        };

        let result = self
            .within(
                Stage::ProcessSlots,
                deadline,
                limit,
                async { process_slots(&ctx.request, &slots) },
            )
            .await;
        let ctx = ctx.with_slots(slots);
        let details = match result {
            Ok(details) => details,
            Err(error) => return Err(Failed::new(ctx, Stage::ProcessSlots, error)),
        };

        let result = self
            .within(Stage::CreateEvent, deadline, limit, self.create_event(&details))
            .await;
        let ctx = ctx.with_details(details.clone());
        let event = match result {
            Ok(event) => event,
            Err(error) => return Err(Failed::new(ctx, Stage::CreateEvent, error)),
        };

        // The event exists from here on; a failure while confirming must still report it.
        let result = self
            .within(
                Stage::CreateEvent,
                deadline,
                limit,
                self.confirm_notified(event.clone(), &details.attendees),
            )
            .await;
        let booked = match result {
            Ok(booked) => booked,
            Err(error) => {
                let pending = BookedEvent {
                    unconfirmed: event.missing_attendees(&details.attendees),
                    event,
                };
                return Err(Failed::new(ctx.with_booked(pending), Stage::CreateEvent, error));
            }
        };
        let ctx = ctx.with_booked(booked.clone());

        let result = self
            .within(
                Stage::VerifyDetails,
                deadline,
                limit,
                async { self.verify_details(&ctx.request, &details, &booked) },
            )
            .await;
        if let Err(error) = result {
            return Err(Failed::new(ctx, Stage::VerifyDetails, error));
        }

        let input = SummaryInput::new(&details, &booked.event, booked.unconfirmed.clone());
        let result = self
            .within(Stage::Summarize, deadline, limit, self.summarize(&input))
            .await;
        match result {
            Ok(summary) => Ok(ctx.with_summary(summary)),
            Err(error) => Err(Failed::new(ctx, Stage::Summarize, error)),
        }
    }

    /// Awaits one stage against the run deadline.
    async fn within<T, F>(
        &self,
        stage: Stage,
        deadline: Instant,
        limit: Duration,
        fut: F,
    ) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        let span = info_span!("stage", stage = %stage, role = stage.role());
        async move {
            debug!("stage started");
            match tokio::time::timeout_at(deadline, fut).await {
                Ok(result) => {
                    debug!(ok = result.is_ok(), "stage finished");
                    result
                }
                Err(_) => Err(SchedulingError::Timeout { limit }),
            }
        }
        .instrument(span)
        .await
    }

    /// Searches for candidate slots without booking anything.
    ///
    /// The window covers today (in the request timezone) through the next
    /// `search_business_days` business days. Time before `now` counts as busy.
    /// An empty result is not an error here.
    pub async fn search(
        &self,
        duration: chrono::Duration,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> EngineResult<(TimeWindow, AvailableSlotsResult)> {
        if duration <= chrono::Duration::zero() {
            return Err(ValidationError::NonPositiveDuration {
                minutes: duration.num_minutes(),
            }
            .into());
        }

        let today = now.with_timezone(&tz).date_naive();
        let last = match self.config.search_business_days {
            0 => today,
            days => today
                .succ_opt()
                .map(|tomorrow| business_days_from(tomorrow, days))
                .unwrap_or(today),
        };
        let window = TimeWindow::for_local_dates(today, last, &tz)
            .ok_or_else(|| ValidationError::InvalidTimezone(tz.name().to_string()))?;

        let mut busy = self
            .client
            .query_busy(&self.config.calendar_id, &window)
            .await
            .map_err(SchedulingError::CalendarUnavailable)?;
        debug!(busy = busy.len(), from = %window.start, to = %window.end, "busy intervals read");

        let earliest = round_up(now);
        if earliest > window.start {
            busy.push(BusyInterval::new(window.start, earliest.min(window.end)));
        }

        let mut search = SlotSearch::new(today, last, duration, tz).with_hours(self.config.hours);
        if let Some(step) = self.config.slot_step {
            search = search.with_step(step);
        }
        let result = search.run(&busy).select(self.config.preference);
        info!(candidates = result.candidates.len(), "{}", result.notes);

        Ok((window, result))
    }

    async fn find_slots(
        &self,
        request: &MeetingRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<AvailableSlotsResult> {
        request.validate()?;
        let (window, result) = self.search(request.duration, request.timezone, now).await?;
        if result.is_empty() {
            return Err(SchedulingError::NoAvailability { window });
        }
        Ok(result)
    }

    async fn create_event(&self, details: &CalendarEventDetails) -> EngineResult<CalendarEventResponse> {
        let created = self.booker.create(details).await?;
        Ok(created.event)
    }

    async fn confirm_notified(
        &self,
        event: CalendarEventResponse,
        requested: &BTreeSet<String>,
    ) -> EngineResult<BookedEvent> {
        match self.booker.confirm_notified(event, requested).await {
            Ok(event) => Ok(BookedEvent {
                event,
                unconfirmed: BTreeSet::new(),
            }),
            Err(BookError::NotificationUnconfirmed { event, missing }) => {
                warn!(
                    event_id = %event.event_id,
                    missing = missing.len(),
                    "continuing with unconfirmed invitations"
                );
                Ok(BookedEvent {
                    event: *event,
                    unconfirmed: missing,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cross-checks the created event against the request.
    fn verify_details(
        &self,
        request: &MeetingRequest,
        details: &CalendarEventDetails,
        booked: &BookedEvent,
    ) -> EngineResult<()> {
        let event = &booked.event;
        let mut failures = Vec::new();

        if event.title.trim() != request.title.trim() {
            failures.push(format!(
                "title {:?} does not match requested {:?}",
                event.title, request.title
            ));
        }
        if event.start != details.start_utc() || event.end != details.end_utc() {
            failures.push(format!(
                "event time {} - {} differs from slot {} - {}",
                event.start,
                event.end,
                details.start_utc(),
                details.end_utc()
            ));
        }
        if !booked.is_partial() && !event.notified_all(&request.attendees) {
            let missing = event.missing_attendees(&request.attendees);
            failures.push(format!(
                "attendees missing from event: {}",
                missing.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
        if event.meet_link.is_none() {
            failures.push("event has no conference link".to_string());
        }

        let start = event.start.with_timezone(&request.timezone);
        let end = event.end.with_timezone(&request.timezone);
        if is_weekend(start.date_naive()) || !self.config.hours.contains(&start, &end) {
            failures.push(format!(
                "event {} - {} is outside business hours {} - {}",
                start.format("%a %H:%M"),
                end.format("%H:%M"),
                self.config.hours.start.format("%H:%M"),
                self.config.hours.end.format("%H:%M")
            ));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SchedulingError::Verification { failures })
        }
    }

    async fn summarize(&self, input: &SummaryInput) -> EngineResult<String> {
        match self.summarizer.summarize(input).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                warn!("summarizer returned empty text, using template");
                Ok(TemplateSummarizer.render(input))
            }
            Err(e) => {
                warn!(error = %e, "summarizer failed, using template");
                Ok(TemplateSummarizer.render(input))
            }
        }
    }
}

/// Picks the selected slot and binds it to the request.
fn process_slots(
    request: &MeetingRequest,
    slots: &AvailableSlotsResult,
) -> EngineResult<CalendarEventDetails> {
    let slot = slots.selected.as_ref().ok_or_else(|| {
        ValidationError::InvalidTime("no slot selected from candidates".to_string())
    })?;
    info!(start = %slot.start(), end = %slot.end(), "slot selected");
    Ok(request.details_for(slot))
}

fn round_up(now: DateTime<Utc>) -> DateTime<Utc> {
    let secs = now.timestamp() + i64::from(now.timestamp_subsec_nanos() > 0);
    let rounded = (secs + NOW_GRANULARITY_SECS - 1).div_euclid(NOW_GRANULARITY_SECS) * NOW_GRANULARITY_SECS;
    DateTime::from_timestamp(rounded, 0).unwrap_or(now)
}
