//! Human-readable summaries of a booked meeting.
//!
//! The pipeline asks a [`Summarizer`] for the final text. Any summarizer may
//! fail (a remote text generator, say); the pipeline then falls back to
//! [`TemplateSummarizer`], which cannot.

use std::collections::BTreeSet;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use slotbook_core::{CalendarEventDetails, CalendarEventResponse};
use slotbook_providers::BoxFuture;
use thiserror::Error;

/// A summarizer failure.
#[derive(Debug, Error)]
#[error("summarizer failed: {0}")]
pub struct SummaryError(pub String);

/// Everything a summary may mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryInput {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub attendees: BTreeSet<String>,
    pub event_id: String,
    pub meet_link: Option<String>,
    pub html_link: Option<String>,
    /// Attendees whose invitation could not be confirmed.
    pub unconfirmed: BTreeSet<String>,
}

impl SummaryInput {
    pub fn new(
        details: &CalendarEventDetails,
        event: &CalendarEventResponse,
        unconfirmed: BTreeSet<String>,
    ) -> Self {
        Self {
            title: details.title.clone(),
            description: details.description.clone(),
            start: details.start,
            end: details.end,
            attendees: details.attendees.clone(),
            event_id: event.event_id.clone(),
            meet_link: event.meet_link.clone(),
            html_link: event.html_link.clone(),
            unconfirmed,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.unconfirmed.is_empty()
    }
}

/// Produces the closing text of a scheduling run.
pub trait Summarizer: Send + Sync {
    fn summarize<'a>(&'a self, input: &'a SummaryInput) -> BoxFuture<'a, Result<String, SummaryError>>;
}

/// Fixed-layout summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

impl TemplateSummarizer {
    pub fn render(&self, input: &SummaryInput) -> String {
        let mut lines = vec![
            format!("Meeting scheduled: {}", input.title),
            format!(
                "When: {}-{} ({})",
                input.start.format("%A, %B %-d, %Y %H:%M"),
                input.end.format("%H:%M"),
                input.start.timezone().name()
            ),
            format!("Attendees: {}", join(&input.attendees)),
        ];
        if let Some(ref description) = input.description {
            lines.push(format!("Description: {}", description));
        }
        lines.push(format!(
            "Meet link: {}",
            input.meet_link.as_deref().unwrap_or("none")
        ));
        if let Some(ref link) = input.html_link {
            lines.push(format!("Calendar link: {}", link));
        }
        lines.push(format!("Event ID: {}", input.event_id));
        if input.is_partial() {
            lines.push(format!(
                "Warning: invitation not confirmed for: {}",
                join(&input.unconfirmed)
            ));
        }
        lines.join("\n")
    }
}

impl Summarizer for TemplateSummarizer {
    fn summarize<'a>(&'a self, input: &'a SummaryInput) -> BoxFuture<'a, Result<String, SummaryError>> {
        let text = self.render(input);
        Box::pin(async move { Ok(text) })
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
