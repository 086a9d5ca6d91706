//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/slotbook/config.toml` by default.
//!
//! ```toml
//! request_timeout_secs = 120
//!
//! [google]
//! access_token = "env::GOOGLE_ACCESS_TOKEN"
//! calendar_id = "primary"
//!
//! [scheduling]
//! work_start = "10:00"
//! work_end = "17:00"
//! default_timezone = "Europe/Berlin"
//! preference = "after 14:00"
//!
//! [booking]
//! max_attempts = 3
//! ```
//!
//! `access_token` supports secret references, see [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slotbook_core::{BusinessHours, parse_timezone};
use slotbook_engine::{BookerConfig, PipelineConfig, parse_preference};

/// Configuration for the slotbook client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Deadline for a whole scheduling run, in seconds.
    pub request_timeout_secs: u64,

    /// Debug logging.
    pub debug: bool,

    /// Google Calendar settings.
    #[cfg(feature = "google")]
    pub google: Option<GoogleSettings>,

    /// Slot search settings.
    pub scheduling: SchedulingSettings,

    /// Event creation settings.
    pub booking: BookingSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            debug: false,
            #[cfg(feature = "google")]
            google: None,
            scheduling: SchedulingSettings::default(),
            booking: BookingSettings::default(),
        }
    }
}

/// Slot search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingSettings {
    /// Start of the working day, `HH:MM`.
    pub work_start: String,
    /// End of the working day, `HH:MM`.
    pub work_end: String,
    /// Business days searched after today.
    pub search_business_days: u32,
    /// IANA timezone used when a request does not name one.
    pub default_timezone: String,
    /// Enumerate candidates every N minutes instead of one per free gap.
    pub slot_step_minutes: Option<u32>,
    /// `earliest`, `latest` or `after HH:MM`.
    pub preference: String,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            work_start: "10:00".to_string(),
            work_end: "17:00".to_string(),
            search_business_days: 5,
            default_timezone: "UTC".to_string(),
            slot_step_minutes: None,
            preference: "earliest".to_string(),
        }
    }
}

impl SchedulingSettings {
    pub fn hours(&self) -> Result<BusinessHours, String> {
        BusinessHours::parse(&self.work_start, &self.work_end).map_err(|e| {
            format!(
                "invalid business hours {}-{}: {}",
                self.work_start, self.work_end, e
            )
        })
    }

    /// Resolves `name`, falling back to `default_timezone`.
    pub fn timezone(&self, name: Option<&str>) -> Result<Tz, String> {
        let name = name.unwrap_or(&self.default_timezone);
        parse_timezone(name).map_err(|e| e.to_string())
    }
}

/// Event creation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    /// Insert attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub backoff_multiplier: f64,
    /// Re-reads while waiting for invitations to show up.
    pub verify_attempts: u32,
    pub verify_delay_secs: u64,
    pub email_reminder_minutes: u32,
    pub popup_reminder_minutes: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        let defaults = BookerConfig::default();
        Self {
            max_attempts: defaults.max_insert_attempts,
            initial_backoff_secs: defaults.initial_backoff.as_secs(),
            max_backoff_secs: defaults.max_backoff.as_secs(),
            backoff_multiplier: defaults.backoff_multiplier,
            verify_attempts: defaults.verify_attempts,
            verify_delay_secs: defaults.verify_delay.as_secs(),
            email_reminder_minutes: defaults.email_reminder_minutes,
            popup_reminder_minutes: defaults.popup_reminder_minutes,
        }
    }
}

impl BookingSettings {
    pub fn to_booker_config(&self) -> BookerConfig {
        let mut config = BookerConfig::default()
            .with_max_attempts(self.max_attempts)
            .with_backoff(
                Duration::from_secs(self.initial_backoff_secs),
                Duration::from_secs(self.max_backoff_secs),
                self.backoff_multiplier,
            )
            .with_verification(
                self.verify_attempts,
                Duration::from_secs(self.verify_delay_secs),
            );
        config.email_reminder_minutes = self.email_reminder_minutes;
        config.popup_reminder_minutes = self.popup_reminder_minutes;
        config
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if there is no file.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slotbook")
    }

    /// Calendar used for busy reads and event creation.
    pub fn calendar_id(&self) -> &str {
        #[cfg(feature = "google")]
        if let Some(ref google) = self.google {
            return &google.calendar_id;
        }
        "primary"
    }

    /// Builds the engine configuration.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig, String> {
        let scheduling = &self.scheduling;
        let preference = parse_preference(&scheduling.preference)
            .map_err(|e| format!("invalid preference {:?}: {}", scheduling.preference, e))?;
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }

        let mut config = PipelineConfig::default()
            .with_booker(self.booking.to_booker_config())
            .with_calendar(self.calendar_id())
            .with_hours(scheduling.hours()?)
            .with_search_days(scheduling.search_business_days)
            .with_preference(preference)
            .with_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(step) = scheduling.slot_step_minutes {
            config = config.with_step(chrono::Duration::minutes(i64::from(step)));
        }
        Ok(config)
    }

    /// Checks every setting that can be checked offline.
    pub fn validate(&self) -> Result<(), String> {
        self.to_pipeline_config()?;
        self.scheduling.timezone(None)?;
        Ok(())
    }
}

/// Google Calendar provider settings.
#[cfg(feature = "google")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSettings {
    /// OAuth access token (supports `pass::`, `env::` and `file::` prefixes).
    pub access_token: Option<String>,

    /// Calendar to read busy time from and create events in.
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_google_timeout")]
    pub timeout_secs: u64,

    /// API base URL override.
    pub base_url: Option<String>,
}

#[cfg(feature = "google")]
fn default_calendar_id() -> String {
    "primary".to_string()
}

#[cfg(feature = "google")]
fn default_google_timeout() -> u64 {
    slotbook_providers::google::DEFAULT_TIMEOUT.as_secs()
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Converts to provider configuration, resolving the access token.
    pub fn to_provider_config(&self) -> Result<slotbook_providers::google::GoogleConfig, String> {
        use slotbook_providers::google::GoogleConfig;

        let token = self
            .access_token
            .as_deref()
            .ok_or("google.access_token is not set")?;
        let token = crate::secret::resolve(token)
            .map_err(|e| format!("google.access_token: {}", e))?;

        let mut config =
            GoogleConfig::new(token).with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref base_url) = self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use slotbook_core::SlotPreference;
    use std::io::Write;

    #[test]
    fn defaults_match_engine() {
        let config = ClientConfig::default().to_pipeline_config().unwrap();
        let engine = PipelineConfig::default();

        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.hours, engine.hours);
        assert_eq!(config.search_business_days, engine.search_business_days);
        assert_eq!(config.request_timeout, engine.request_timeout);
        assert_eq!(config.booker.max_insert_attempts, 3);
        assert_eq!(config.booker.initial_backoff, Duration::from_secs(2));
        assert!(config.slot_step.is_none());
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.scheduling.work_start, "10:00");
        assert_eq!(config.booking.verify_attempts, 3);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
request_timeout_secs = 60

[scheduling]
work_start = "09:00"
work_end = "18:00"
search_business_days = 2
default_timezone = "Europe/Berlin"
slot_step_minutes = 15
preference = "after 14:00"

[booking]
max_attempts = 5
initial_backoff_secs = 1
"#
        )
        .unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        let pipeline = config.to_pipeline_config().unwrap();

        assert_eq!(pipeline.hours, BusinessHours::parse("09:00", "18:00").unwrap());
        assert_eq!(pipeline.booker.hours, pipeline.hours);
        assert_eq!(pipeline.search_business_days, 2);
        assert_eq!(pipeline.slot_step, Some(chrono::Duration::minutes(15)));
        assert_eq!(
            pipeline.preference,
            SlotPreference::NotBefore(NaiveTime::from_hms_opt(14, 0, 0).unwrap())
        );
        assert_eq!(pipeline.request_timeout, Duration::from_secs(60));
        assert_eq!(pipeline.booker.max_insert_attempts, 5);
        assert_eq!(pipeline.booker.initial_backoff, Duration::from_secs(1));
        assert_eq!(
            config.scheduling.timezone(None).unwrap(),
            chrono_tz::Europe::Berlin
        );
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[test]
    fn parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[scheduling\n").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(err.contains("failed to parse"));
    }

    #[test]
    fn invalid_settings_rejected() {
        let mut config = ClientConfig::default();
        config.scheduling.work_start = "18:00".to_string();
        assert!(config.validate().unwrap_err().contains("business hours"));

        let mut config = ClientConfig::default();
        config.scheduling.preference = "whenever".to_string();
        assert!(config.validate().unwrap_err().contains("preference"));

        let mut config = ClientConfig::default();
        config.scheduling.default_timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn timezone_override() {
        let settings = SchedulingSettings::default();
        assert_eq!(settings.timezone(None).unwrap(), chrono_tz::UTC);
        assert_eq!(
            settings.timezone(Some("America/New_York")).unwrap(),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn dump_parses_back() {
        let mut config = ClientConfig::default();
        config.scheduling.slot_step_minutes = Some(30);
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.scheduling.slot_step_minutes, Some(30));
        assert_eq!(parsed.request_timeout_secs, 120);
    }

    #[cfg(feature = "google")]
    mod google {
        use super::*;

        #[test]
        fn calendar_id_flows_into_pipeline() {
            let config: ClientConfig = toml::from_str(
                r#"
[google]
access_token = "ya29.plain"
calendar_id = "team@x.com"
"#,
            )
            .unwrap();

            let google = config.google.as_ref().unwrap();
            assert_eq!(google.timeout_secs, 30);

            let pipeline = config.to_pipeline_config().unwrap();
            assert_eq!(pipeline.calendar_id, "team@x.com");
            assert_eq!(pipeline.booker.calendar_id, "team@x.com");
        }

        #[test]
        fn token_from_env_reference() {
            unsafe {
                std::env::set_var("_SLOTBOOK_TEST_ACCESS_TOKEN", "ya29.from-env");
            }
            let config: ClientConfig = toml::from_str(
                r#"
[google]
access_token = "env::_SLOTBOOK_TEST_ACCESS_TOKEN"
timeout_secs = 5
base_url = "http://127.0.0.1:1234"
"#,
            )
            .unwrap();

            let provider = config.google.unwrap().to_provider_config().unwrap();
            assert_eq!(provider.access_token, "ya29.from-env");
            assert_eq!(provider.timeout, Duration::from_secs(5));
            assert_eq!(provider.base_url, "http://127.0.0.1:1234");
            unsafe {
                std::env::remove_var("_SLOTBOOK_TEST_ACCESS_TOKEN");
            }
        }

        #[test]
        fn missing_token_errors() {
            let config: ClientConfig = toml::from_str("[google]\n").unwrap();
            let err = config.google.unwrap().to_provider_config().unwrap_err();
            assert!(err.contains("access_token"));
        }

        #[test]
        fn unresolvable_token_errors() {
            let config: ClientConfig = toml::from_str(
                "[google]\naccess_token = \"env::_SLOTBOOK_NONEXISTENT_TOKEN_987\"\n",
            )
            .unwrap();
            let err = config.google.unwrap().to_provider_config().unwrap_err();
            assert!(err.contains("not set"));
        }
    }
}
