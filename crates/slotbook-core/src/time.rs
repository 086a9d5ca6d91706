//! Time types for slot search and booking.
//!
//! This module provides [`TimeSlot`] for a candidate or chosen meeting window,
//! [`BusyInterval`] for obstacles reported by the calendar, [`BusinessHours`]
//! for the daily bookable window, and [`TimeWindow`] for UTC query ranges.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Parses an IANA timezone identifier (e.g. `"Europe/Paris"`).
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::InvalidTimezone(name.to_string()))
}

/// Parses a wall-clock time in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

/// Returns true for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Returns the last date of the shortest range starting at `start` that
/// contains `count` business days.
///
/// A `count` of zero returns `start` itself.
pub fn business_days_from(start: NaiveDate, count: u32) -> NaiveDate {
    let mut remaining = count;
    let mut day = start;
    loop {
        if !is_weekend(day) {
            remaining = remaining.saturating_sub(1);
        }
        if remaining == 0 {
            return day;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => return day,
        }
    }
}

/// Resolves a local wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) take the earliest instant; times that do
/// not exist (DST spring-forward gap) return `None`.
pub fn local_datetime(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(time)).earliest()
}

fn local_start_of_day(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    local_datetime(tz, date, NaiveTime::MIN)
        .or_else(|| local_datetime(tz, date, NaiveTime::from_hms_opt(1, 0, 0)?))
}

/// The daily window in which meetings may be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    /// Earliest local start time (inclusive).
    pub start: NaiveTime,
    /// Latest local end time (inclusive).
    pub end: NaiveTime,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
            end: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
        }
    }
}

impl BusinessHours {
    /// Creates business hours, rejecting empty or inverted ranges.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidBusinessHours { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses business hours from two `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    /// Returns the bookable window for `date` in `tz`.
    ///
    /// Returns `None` when either boundary falls in a DST gap.
    pub fn window_on(&self, date: NaiveDate, tz: &Tz) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
        let start = local_datetime(tz, date, self.start)?;
        let end = local_datetime(tz, date, self.end)?;
        (start < end).then_some((start, end))
    }

    /// Checks that `[start, end]` lies within the business hours of the
    /// local day on which it starts.
    pub fn contains(&self, start: &DateTime<Tz>, end: &DateTime<Tz>) -> bool {
        let tz = start.timezone();
        match self.window_on(start.date_naive(), &tz) {
            Some((window_start, window_end)) => *start >= window_start && *end <= window_end,
            None => false,
        }
    }
}

/// A contiguous meeting window with an exact duration.
///
/// Slots are immutable once produced; the only constructor takes a start and a
/// positive duration so `end > start` always holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimeSlot {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl TimeSlot {
    /// Creates a slot starting at `start` and lasting `duration`.
    ///
    /// Returns `None` for a zero or negative duration.
    pub fn new(start: DateTime<Tz>, duration: Duration) -> Option<Self> {
        if duration <= Duration::zero() {
            return None;
        }
        Some(Self {
            start,
            end: start + duration,
        })
    }

    /// Start of the slot, in the timezone it was searched in.
    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    /// End of the slot.
    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    /// Returns true if the slot shares any instant with `busy`.
    pub fn overlaps(&self, busy: &BusyInterval) -> bool {
        busy.overlaps(self.start_utc(), self.end_utc())
    }
}

/// A time range during which the calendar owner is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Creates a busy interval from instants in any timezone.
    pub fn from_local<T: TimeZone>(start: DateTime<T>, end: DateTime<T>) -> Self {
        Self::new(start.with_timezone(&Utc), end.with_timezone(&Utc))
    }

    /// Returns true if the interval covers no time at all.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `[start, end)` intersects this interval.
    ///
    /// Touching endpoints do not count as overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// A time window for calendar queries.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a window covering the local days `first..=last` in `tz`.
    ///
    /// Returns `None` if `last` precedes `first`.
    pub fn for_local_dates(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Option<Self> {
        if last < first {
            return None;
        }
        let start = local_start_of_day(tz, first)?.with_timezone(&Utc);
        let end = local_start_of_day(tz, last.succ_opt()?)?.with_timezone(&Utc);
        Some(Self::new(start, end))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
