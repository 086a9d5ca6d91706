//! Calendar access for slotbook.
//!
//! - [`CalendarClient`] - The trait the scheduling engine talks to
//! - [`NewEvent`] / [`RemoteEvent`] - Event payloads sent to and read from a calendar
//! - [`ProviderError`] - Classified errors, with [`ProviderError::is_retryable`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ Google Calendar API  │
//! └──────────┬───────────┘
//!            │ freeBusy / events.insert / events.get
//!            ▼
//! ┌──────────────────────┐
//! │ GoogleCalendarClient │
//! └──────────┬───────────┘
//!            │  CalendarClient
//!            ▼
//! ┌──────────────────────┐
//! │   slotbook-engine    │
//! └──────────────────────┘
//! ```

pub mod client;
pub mod error;
pub mod event;
#[cfg(feature = "google")]
pub mod google;

pub use client::{BoxFuture, CalendarClient, UnavailableClient};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use event::{
    GuestPermissions, NewEvent, Reminder, ReminderMethod, RemoteAttendee, RemoteEvent,
    ResponseStatus,
};
