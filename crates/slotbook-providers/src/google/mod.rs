//! Google Calendar client.
//!
//! Busy intervals come from the `freeBusy` endpoint. Events are inserted with
//! `conferenceDataVersion=1` so Google attaches a Meet link, and with
//! `sendUpdates=all` so every attendee receives an invitation email.
//!
//! Authentication is a pre-issued OAuth access token; obtaining and refreshing
//! it is left to the caller.
//!
//! ```ignore
//! use slotbook_providers::google::{GoogleCalendarClient, GoogleConfig};
//!
//! let client = GoogleCalendarClient::new(GoogleConfig::new(token))?;
//! let busy = client.query_busy("primary", &window).await?;
//! ```

mod client;
mod config;

pub use client::GoogleCalendarClient;
pub use config::{CALENDAR_API_BASE, DEFAULT_TIMEOUT, GoogleConfig};
