//! CalendarClient trait definition.
//!
//! [`CalendarClient`] is the seam between the scheduling engine and a remote
//! calendar service. It covers exactly what scheduling needs: reading busy
//! intervals, inserting an event and reading an event back.

use std::future::Future;
use std::pin::Pin;

use slotbook_core::{BusyInterval, TimeWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::event::{NewEvent, RemoteEvent};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so the engine can hold an
/// `Arc<dyn CalendarClient>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Access to a remote calendar.
///
/// Implementations must be `Send + Sync`; the engine shares one client
/// between concurrent scheduling runs.
///
/// ```ignore
/// impl CalendarClient for MyCalendar {
///     fn name(&self) -> &str { "mine" }
///
///     fn query_busy<'a>(
///         &'a self,
///         calendar_id: &'a str,
///         window: &'a TimeWindow,
///     ) -> BoxFuture<'a, ProviderResult<Vec<BusyInterval>>> {
///         Box::pin(async move { Ok(Vec::new()) })
///     }
///     // ... other methods
/// }
/// ```
pub trait CalendarClient: Send + Sync {
    /// Returns the name of this client (e.g. "google").
    fn name(&self) -> &str;

    /// Returns the busy intervals of `calendar_id` intersecting `window`.
    fn query_busy<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<BusyInterval>>>;

    /// Creates an event and notifies its attendees.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderErrorCode::Conflict`](crate::ProviderErrorCode::Conflict)
    /// error if an event with `event.id` already exists.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NewEvent,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>>;

    /// Reads an event back. Returns `Ok(None)` if it does not exist.
    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteEvent>>>;
}

/// A client that always returns an error.
///
/// Stands in when the real client fails to initialize, so the failure is
/// reported through the normal scheduling outcome.
#[derive(Debug)]
pub struct UnavailableClient {
    name: String,
    error: ProviderError,
}

impl UnavailableClient {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> ProviderError {
        ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name)
    }
}

impl CalendarClient for UnavailableClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn query_busy<'a>(
        &'a self,
        _calendar_id: &'a str,
        _window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<BusyInterval>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn insert_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        _event: &'a NewEvent,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn get_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        _event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteEvent>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn unavailable_client_reports_its_error() {
        let client = UnavailableClient::new(
            "google",
            ProviderError::configuration("missing access token"),
        );
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 18, 0, 0, 0).unwrap(),
        );

        let err = client.query_busy("primary", &window).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("google"));

        let err = client.get_event("primary", "evt1").await.unwrap_err();
        assert_eq!(err.message(), "missing access token");
    }

    #[test]
    fn client_is_object_safe() {
        fn assert_dyn(_: &dyn CalendarClient) {}
        let client = UnavailableClient::new("x", ProviderError::configuration("boom"));
        assert_dyn(&client);
        assert_eq!(client.name(), "x");
    }
}
