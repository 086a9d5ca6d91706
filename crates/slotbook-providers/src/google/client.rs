//! Google Calendar API client.
//!
//! Wraps the three endpoints scheduling needs: `freeBusy`, `events.insert`
//! and `events.get`. HTTP statuses are classified into [`ProviderError`]
//! codes so that the booker can tell transient failures from permanent ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotbook_core::{BusyInterval, TimeWindow};
use tracing::{debug, warn};

use super::config::GoogleConfig;
use crate::client::{BoxFuture, CalendarClient};
use crate::error::{ProviderError, ProviderResult};
use crate::event::{NewEvent, RemoteAttendee, RemoteEvent, ResponseStatus};

const PROVIDER_NAME: &str = "google";

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleCalendarClient {
    /// Creates a client from a validated configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_provider(PROVIDER_NAME)
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Queries busy intervals for one calendar.
    pub async fn free_busy(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<BusyInterval>> {
        let url = format!("{}/freeBusy", self.config.api_root());
        let body = FreeBusyRequest {
            time_min: window.start.to_rfc3339(),
            time_max: window.end.to_rfc3339(),
            items: vec![FreeBusyItem { id: calendar_id }],
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;
        let response = check_status(response).await?;
        let parsed: FreeBusyResponse = read_json(response).await?;

        let calendar = parsed.calendars.get(calendar_id).ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "freeBusy response has no entry for calendar {}",
                calendar_id
            ))
        })?;

        if let Some(error) = calendar.errors.first() {
            return Err(match error.reason.as_str() {
                "notFound" => ProviderError::not_found(format!("calendar {} not found", calendar_id)),
                "backendError" => ProviderError::server("freeBusy backend error"),
                other => ProviderError::bad_request(format!(
                    "freeBusy failed for {}: {}",
                    calendar_id, other
                )),
            });
        }

        let mut busy = Vec::with_capacity(calendar.busy.len());
        for period in &calendar.busy {
            let start = parse_rfc3339(&period.start, "busy start")?;
            let end = parse_rfc3339(&period.end, "busy end")?;
            busy.push(BusyInterval::new(start, end));
        }

        debug!(
            "calendar {} has {} busy intervals between {} and {}",
            calendar_id,
            busy.len(),
            window.start,
            window.end
        );
        Ok(busy)
    }

    /// Inserts an event, requesting a Meet link and invitation emails.
    pub async fn insert(&self, calendar_id: &str, event: &NewEvent) -> ProviderResult<RemoteEvent> {
        let url = format!(
            "{}/calendars/{}/events",
            self.config.api_root(),
            urlencoding::encode(calendar_id)
        );
        let body = ApiNewEvent::from(event);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;
        let response = check_status(response).await?;
        let api_event: ApiEvent = read_json(response).await?;

        api_event.into_remote()
    }

    /// Reads an event. Returns `Ok(None)` for missing or deleted events.
    pub async fn get(&self, calendar_id: &str, event_id: &str) -> ProviderResult<Option<RemoteEvent>> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.config.api_root(),
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let api_event: ApiEvent = read_json(response).await?;

        if api_event.status.as_deref() == Some("cancelled") {
            return Ok(None);
        }
        api_event.into_remote().map(Some)
    }
}

impl CalendarClient for GoogleCalendarClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn query_busy<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<BusyInterval>>> {
        Box::pin(async move { self.free_busy(calendar_id, window).await.map_err(tag) })
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NewEvent,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move { self.insert(calendar_id, event).await.map_err(tag) })
    }

    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteEvent>>> {
        Box::pin(async move { self.get(calendar_id, event_id).await.map_err(tag) })
    }
}

fn tag(error: ProviderError) -> ProviderError {
    if error.provider().is_some() {
        error
    } else {
        error.with_provider(PROVIDER_NAME)
    }
}

fn send_error(e: reqwest::Error) -> ProviderError {
    let error = if e.is_timeout() {
        ProviderError::network("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    };
    error.with_source(e)
}

/// Maps non-success statuses to classified errors.
async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )));
    }

    let body = response.text().await.unwrap_or_default();
    let error = match status {
        reqwest::StatusCode::UNAUTHORIZED => {
            ProviderError::authentication("access token expired or invalid")
        }
        // Google reports quota exhaustion as 403 with a rate-limit reason.
        reqwest::StatusCode::FORBIDDEN if is_rate_limit_body(&body) => {
            ProviderError::rate_limited("quota exceeded")
        }
        reqwest::StatusCode::FORBIDDEN => ProviderError::authorization("access denied to calendar"),
        reqwest::StatusCode::NOT_FOUND => ProviderError::not_found(api_message(&body, status)),
        reqwest::StatusCode::CONFLICT => ProviderError::conflict(api_message(&body, status)),
        reqwest::StatusCode::BAD_REQUEST => ProviderError::bad_request(api_message(&body, status)),
        _ => ProviderError::server(api_message(&body, status)),
    };
    warn!(%status, "calendar API call failed: {}", error.message());
    Err(error)
}

fn is_rate_limit_body(body: &str) -> bool {
    body.contains("rateLimitExceeded") || body.contains("userRateLimitExceeded")
}

fn api_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| format!("API error ({}): {}", status, e.error.message))
        .unwrap_or_else(|_| format!("API error ({}): {}", status, body))
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> ProviderResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::invalid_response(format!("failed to parse response: {}", e)))
}

fn parse_rfc3339(value: &str, what: &str) -> ProviderResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ProviderError::invalid_response(format!("invalid {} {:?}: {}", what, value, e)))
}

/// Request body for the freeBusy endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: String,
    time_max: String,
    items: Vec<FreeBusyItem<'a>>,
}

#[derive(Debug, Serialize)]
struct FreeBusyItem<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: std::collections::HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<FreeBusyPeriod>,
    #[serde(default)]
    errors: Vec<FreeBusyError>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyPeriod {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyError {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Request body for events.insert.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiNewEvent<'a> {
    id: &'a str,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start: ApiNewEventTime<'a>,
    end: ApiNewEventTime<'a>,
    attendees: Vec<ApiNewAttendee<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conference_data: Option<ApiConferenceRequest<'a>>,
    reminders: ApiReminders,
    guests_can_modify: bool,
    guests_can_invite_others: bool,
    guests_can_see_other_guests: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiNewEventTime<'a> {
    date_time: String,
    time_zone: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiNewAttendee<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiConferenceRequest<'a> {
    create_request: ApiCreateConference<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiCreateConference<'a> {
    request_id: &'a str,
    conference_solution_key: ApiSolutionKey,
}

#[derive(Debug, Serialize)]
struct ApiSolutionKey {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiReminders {
    use_default: bool,
    overrides: Vec<ApiReminder>,
}

#[derive(Debug, Serialize)]
struct ApiReminder {
    method: &'static str,
    minutes: u32,
}

impl<'a> From<&'a NewEvent> for ApiNewEvent<'a> {
    fn from(event: &'a NewEvent) -> Self {
        Self {
            id: &event.id,
            summary: &event.summary,
            description: event.description.as_deref(),
            start: ApiNewEventTime {
                date_time: event.start.to_rfc3339(),
                time_zone: &event.timezone,
            },
            end: ApiNewEventTime {
                date_time: event.end.to_rfc3339(),
                time_zone: &event.timezone,
            },
            attendees: event
                .attendees
                .iter()
                .map(|email| ApiNewAttendee { email })
                .collect(),
            conference_data: event.conference_request_id.as_deref().map(|request_id| {
                ApiConferenceRequest {
                    create_request: ApiCreateConference {
                        request_id,
                        conference_solution_key: ApiSolutionKey { kind: "hangoutsMeet" },
                    },
                }
            }),
            reminders: ApiReminders {
                use_default: event.reminders.is_empty(),
                overrides: event
                    .reminders
                    .iter()
                    .map(|r| ApiReminder {
                        method: r.method.as_str(),
                        minutes: r.minutes_before,
                    })
                    .collect(),
            },
            guests_can_modify: event.guests.can_modify,
            guests_can_invite_others: event.guests.can_invite_others,
            guests_can_see_other_guests: event.guests.can_see_other_guests,
        }
    }
}

/// An event as returned by events.insert and events.get.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    status: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
    html_link: Option<String>,
    hangout_link: Option<String>,
    created: Option<String>,
    attendees: Option<Vec<ApiAttendee>>,
    conference_data: Option<ApiConferenceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAttendee {
    email: Option<String>,
    response_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiConferenceData {
    entry_points: Option<Vec<ApiEntryPoint>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEntryPoint {
    entry_point_type: String,
    uri: Option<String>,
}

impl ApiEvent {
    fn into_remote(self) -> ProviderResult<RemoteEvent> {
        let id = self
            .id
            .ok_or_else(|| ProviderError::invalid_response("event has no id"))?;
        let start = self
            .start
            .date_time
            .ok_or_else(|| ProviderError::invalid_response(format!("event {} has no start time", id)))?;
        let end = self
            .end
            .date_time
            .ok_or_else(|| ProviderError::invalid_response(format!("event {} has no end time", id)))?;
        let start = parse_rfc3339(&start, "event start")?;
        let end = parse_rfc3339(&end, "event end")?;

        let created = match self.created {
            Some(ref value) => match parse_rfc3339(value, "created") {
                Ok(dt) => Some(dt),
                Err(e) => {
                    warn!("ignoring created timestamp of event {}: {}", id, e.message());
                    None
                }
            },
            None => None,
        };

        let meet_link = self.hangout_link.or_else(|| {
            self.conference_data
                .and_then(|cd| cd.entry_points)
                .unwrap_or_default()
                .into_iter()
                .find(|ep| ep.entry_point_type == "video")
                .and_then(|ep| ep.uri)
        });

        let attendees = self
            .attendees
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| {
                let email = a.email?;
                let response_status = match a.response_status.as_deref() {
                    Some("accepted") => ResponseStatus::Accepted,
                    Some("declined") => ResponseStatus::Declined,
                    Some("tentative") => ResponseStatus::Tentative,
                    Some("needsAction") => ResponseStatus::NeedsAction,
                    _ => ResponseStatus::Unknown,
                };
                Some(RemoteAttendee {
                    email,
                    response_status,
                })
            })
            .collect();

        let mut remote = RemoteEvent::new(id, start, end);
        remote.summary = self.summary;
        remote.html_link = self.html_link;
        remote.meet_link = meet_link;
        remote.created = created;
        remote.attendees = attendees;
        Ok(remote)
    }
}
