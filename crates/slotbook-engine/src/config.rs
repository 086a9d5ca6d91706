//! Engine configuration.

use std::time::Duration;

use chrono::NaiveTime;
use slotbook_core::{BusinessHours, SlotPreference};

use crate::error::SchedulingError;

/// Event booker configuration.
#[derive(Debug, Clone)]
pub struct BookerConfig {
    /// Calendar events are created on.
    pub calendar_id: String,
    /// Business hours the event must fall in.
    pub hours: BusinessHours,
    /// Total insert attempts, including the first one.
    pub max_insert_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Maximum delay between retries.
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Re-reads of the event while waiting for attendees to show up.
    pub verify_attempts: u32,
    /// Fixed delay before each re-read.
    pub verify_delay: Duration,
    /// Reminders attached to every event, in minutes before start.
    pub email_reminder_minutes: u32,
    pub popup_reminder_minutes: u32,
}

impl Default for BookerConfig {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            hours: BusinessHours::default(),
            max_insert_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            verify_attempts: 3,
            verify_delay: Duration::from_secs(1),
            email_reminder_minutes: 24 * 60,
            popup_reminder_minutes: 30,
        }
    }
}

impl BookerConfig {
    /// Builder: set the calendar.
    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    /// Builder: set business hours.
    pub fn with_hours(mut self, hours: BusinessHours) -> Self {
        self.hours = hours;
        self
    }

    /// Builder: set insert attempts. At least one attempt is always made.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_insert_attempts = attempts.max(1);
        self
    }

    /// Builder: set backoff parameters.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Builder: set notification verification parameters.
    pub fn with_verification(mut self, attempts: u32, delay: Duration) -> Self {
        self.verify_attempts = attempts;
        self.verify_delay = delay;
        self
    }

    /// Delay before the retry following `failures` consecutive failed attempts.
    pub fn backoff_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let multiplier = self.backoff_multiplier.powi(failures as i32 - 1);
        let delay = base * multiplier;
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Calendar whose busy time is read.
    pub calendar_id: String,
    pub hours: BusinessHours,
    /// Business days searched after today.
    pub search_business_days: u32,
    /// When set, enumerate candidates every `slot_step` inside free gaps.
    pub slot_step: Option<chrono::Duration>,
    pub preference: SlotPreference,
    /// Default deadline for a whole run.
    pub request_timeout: Duration,
    pub booker: BookerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            hours: BusinessHours::default(),
            search_business_days: 5,
            slot_step: None,
            preference: SlotPreference::Earliest,
            request_timeout: Duration::from_secs(120),
            booker: BookerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Builder: set the calendar for both busy reads and event creation.
    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        let calendar_id = calendar_id.into();
        self.booker.calendar_id = calendar_id.clone();
        self.calendar_id = calendar_id;
        self
    }

    /// Builder: set business hours for slot search and booking validation.
    pub fn with_hours(mut self, hours: BusinessHours) -> Self {
        self.booker.hours = hours;
        self.hours = hours;
        self
    }

    pub fn with_search_days(mut self, days: u32) -> Self {
        self.search_business_days = days;
        self
    }

    /// Builder: enumerate candidates at a fixed step. Non-positive steps disable it.
    pub fn with_step(mut self, step: chrono::Duration) -> Self {
        self.slot_step = (step > chrono::Duration::zero()).then_some(step);
        self
    }

    pub fn with_preference(mut self, preference: SlotPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder: replace the booker configuration, keeping calendar and hours in sync.
    pub fn with_booker(mut self, booker: BookerConfig) -> Self {
        self.booker = BookerConfig {
            calendar_id: self.calendar_id.clone(),
            hours: self.hours,
            ..booker
        };
        self
    }
}

/// Parses a preference name: `earliest`, `latest` or `after HH:MM`.
pub fn parse_preference(value: &str) -> Result<SlotPreference, SchedulingError> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "earliest" | "" => return Ok(SlotPreference::Earliest),
        "latest" => return Ok(SlotPreference::Latest),
        _ => {}
    }
    let time = value
        .strip_prefix("after ")
        .or_else(|| value.strip_prefix("after:"))
        .map(str::trim)
        .ok_or_else(|| {
            SchedulingError::Validation(slotbook_core::ValidationError::InvalidTime(value.to_string()))
        })?;
    let time: NaiveTime = slotbook_core::parse_time_of_day(time)?;
    Ok(SlotPreference::NotBefore(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_booker_config() {
        let config = BookerConfig::default();
        assert_eq!(config.max_insert_attempts, 3);
        assert_eq!(config.verify_attempts, 3);
        assert_eq!(config.email_reminder_minutes, 1440);
        assert_eq!(config.popup_reminder_minutes, 30);
    }

    #[test]
    fn backoff_calculation() {
        let config = BookerConfig::default().with_backoff(
            Duration::from_secs(2),
            Duration::from_secs(10),
            2.0,
        );

        assert_eq!(config.backoff_delay(0), Duration::ZERO);
        assert_eq!(config.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(8));
        assert_eq!(config.backoff_delay(4), Duration::from_secs(10));
    }

    #[test]
    fn attempts_never_zero() {
        assert_eq!(BookerConfig::default().with_max_attempts(0).max_insert_attempts, 1);
    }

    #[test]
    fn pipeline_keeps_booker_in_sync() {
        let hours = BusinessHours::parse("09:00", "18:00").unwrap();
        let config = PipelineConfig::default()
            .with_booker(BookerConfig::default().with_max_attempts(5))
            .with_calendar("team@x.com")
            .with_hours(hours);

        assert_eq!(config.booker.calendar_id, "team@x.com");
        assert_eq!(config.booker.hours, hours);
        assert_eq!(config.booker.max_insert_attempts, 5);
    }

    #[test]
    fn step_must_be_positive() {
        let config = PipelineConfig::default().with_step(chrono::Duration::minutes(15));
        assert_eq!(config.slot_step, Some(chrono::Duration::minutes(15)));
        let config = config.with_step(chrono::Duration::zero());
        assert!(config.slot_step.is_none());
    }

    #[test]
    fn preference_parsing() {
        assert_eq!(parse_preference("earliest").unwrap(), SlotPreference::Earliest);
        assert_eq!(parse_preference("Latest").unwrap(), SlotPreference::Latest);
        assert_eq!(
            parse_preference("after 14:00").unwrap(),
            SlotPreference::NotBefore(NaiveTime::from_hms_opt(14, 0, 0).unwrap())
        );
        assert!(parse_preference("whenever").is_err());
        assert!(parse_preference("after 25:00").is_err());
    }
}
