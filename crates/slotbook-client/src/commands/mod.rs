//! Command implementations.

pub mod config;
pub mod schedule;
pub mod slots;

use std::sync::Arc;

use slotbook_providers::CalendarClient;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds the calendar client named by the configuration.
///
/// A client that fails to initialize is replaced by one that reports the
/// failure on every call, so it shows up as `calendar_unavailable` in the
/// outcome instead of aborting the command.
#[cfg(feature = "google")]
pub fn calendar_client(config: &ClientConfig) -> ClientResult<Arc<dyn CalendarClient>> {
    use slotbook_providers::UnavailableClient;
    use slotbook_providers::google::GoogleCalendarClient;

    let google = config.google.as_ref().ok_or_else(|| {
        ClientError::Config(format!(
            "no [google] section in {}",
            ClientConfig::default_path().display()
        ))
    })?;
    let provider_config = google.to_provider_config().map_err(ClientError::Secret)?;

    match GoogleCalendarClient::new(provider_config) {
        Ok(client) => Ok(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "google client unavailable");
            Ok(Arc::new(UnavailableClient::new("google", e)))
        }
    }
}

#[cfg(not(feature = "google"))]
pub fn calendar_client(_config: &ClientConfig) -> ClientResult<Arc<dyn CalendarClient>> {
    Err(ClientError::Config(
        "slotbook was built without a calendar provider".to_string(),
    ))
}
