//! Google Calendar client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`GoogleCalendarClient`](super::GoogleCalendarClient).
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth 2.0 bearer token with the calendar scope.
    pub access_token: String,
    pub timeout: Duration,
    /// API root; overridden in tests to point at a mock server.
    pub base_url: String,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GoogleConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            timeout: DEFAULT_TIMEOUT,
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Checks the token is present and the base URL is an http(s) URL.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.access_token.trim().is_empty() {
            return Err(ProviderError::configuration("access token is empty").with_provider("google"));
        }
        let url = Url::parse(&self.base_url).map_err(|e| {
            ProviderError::configuration(format!("invalid base url {:?}: {}", self.base_url, e))
                .with_provider("google")
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::configuration(format!(
                "base url must be http or https, got {}",
                url.scheme()
            ))
            .with_provider("google"));
        }
        if self.timeout.is_zero() {
            return Err(ProviderError::configuration("timeout must be greater than zero")
                .with_provider("google"));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub(crate) fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn defaults() {
        let config = GoogleConfig::new("token");
        assert_eq!(config.base_url, CALENDAR_API_BASE);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_redacts_token() {
        let config = GoogleConfig::new("secret-token");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn validation_errors() {
        let err = GoogleConfig::new("  ").validate().unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);

        let err = GoogleConfig::new("t").with_base_url("not a url").validate().unwrap_err();
        assert!(err.message().contains("invalid base url"));

        let err = GoogleConfig::new("t")
            .with_base_url("ftp://example.com")
            .validate()
            .unwrap_err();
        assert!(err.message().contains("http or https"));

        let err = GoogleConfig::new("t")
            .with_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.message().contains("timeout"));
    }

    #[test]
    fn api_root_trims_slash() {
        let config = GoogleConfig::new("t").with_base_url("http://127.0.0.1:1234/");
        assert_eq!(config.api_root(), "http://127.0.0.1:1234");
    }
}
