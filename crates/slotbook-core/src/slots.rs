//! Slot search over business hours.
//!
//! [`SlotSearch`] walks the weekdays of a date range, builds the business-hours
//! window of each day in the caller's timezone, subtracts the merged busy
//! intervals and emits candidate [`TimeSlot`]s in chronological order.
//!
//! By default each free gap contributes a single candidate at its start
//! (greedy earliest). [`SlotSearch::with_step`] additionally enumerates later
//! starts inside the same gap.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

use crate::time::{BusinessHours, BusyInterval, TimeSlot, is_weekend};

/// Which candidate becomes the selected slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotPreference {
    /// The first candidate (default).
    #[default]
    Earliest,
    /// The last candidate in the range.
    Latest,
    /// The first candidate starting at or after this local time of day.
    /// Falls back to the earliest candidate if none qualifies.
    NotBefore(NaiveTime),
}

/// Outcome of a slot search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableSlotsResult {
    /// Candidates in strictly increasing start order.
    pub candidates: Vec<TimeSlot>,
    /// The chosen candidate, if any.
    pub selected: Option<TimeSlot>,
    /// Human-readable description of the search.
    pub notes: String,
}

impl AvailableSlotsResult {
    /// Creates a result selecting the earliest candidate.
    pub fn from_candidates(candidates: Vec<TimeSlot>, notes: impl Into<String>) -> Self {
        let selected = candidates.first().cloned();
        Self {
            candidates,
            selected,
            notes: notes.into(),
        }
    }

    /// Returns true if no candidate was found.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Re-selects a candidate according to `preference`.
    pub fn select(mut self, preference: SlotPreference) -> Self {
        self.selected = match preference {
            SlotPreference::Earliest => self.candidates.first().cloned(),
            SlotPreference::Latest => self.candidates.last().cloned(),
            SlotPreference::NotBefore(time) => self
                .candidates
                .iter()
                .find(|slot| slot.start().time() >= time)
                .or_else(|| {
                    debug!(%time, "no candidate after preferred time, using earliest");
                    self.candidates.first()
                })
                .cloned(),
        };
        self
    }
}

/// Parameters of a slot search.
#[derive(Debug, Clone)]
pub struct SlotSearch {
    range_start: NaiveDate,
    range_end: NaiveDate,
    duration: Duration,
    hours: BusinessHours,
    timezone: Tz,
    step: Option<Duration>,
}

impl SlotSearch {
    /// Creates a search over the inclusive date range with default business hours.
    pub fn new(range_start: NaiveDate, range_end: NaiveDate, duration: Duration, timezone: Tz) -> Self {
        Self {
            range_start,
            range_end,
            duration,
            hours: BusinessHours::default(),
            timezone,
            step: None,
        }
    }

    /// Builder: set business hours.
    pub fn with_hours(mut self, hours: BusinessHours) -> Self {
        self.hours = hours;
        self
    }

    /// Builder: enumerate additional candidates every `step` inside each gap.
    ///
    /// A zero or negative step is ignored.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = (step > Duration::zero()).then_some(step);
        self
    }

    /// Runs the search against the given busy intervals.
    pub fn run(&self, busy: &[BusyInterval]) -> AvailableSlotsResult {
        if self.duration <= Duration::zero() {
            return AvailableSlotsResult::from_candidates(
                Vec::new(),
                "meeting duration must be positive",
            );
        }

        let merged = merge_busy(busy.iter().copied());
        let mut candidates = Vec::new();

        let mut day = self.range_start;
        while day <= self.range_end {
            if !is_weekend(day) {
                match self.hours.window_on(day, &self.timezone) {
                    Some((start, end)) => self.collect_day(
                        start.with_timezone(&Utc),
                        end.with_timezone(&Utc),
                        &merged,
                        &mut candidates,
                    ),
                    None => warn!(%day, tz = %self.timezone, "business hours fall in a DST gap, skipping day"),
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        debug!(
            candidates = candidates.len(),
            busy = merged.len(),
            "slot search finished"
        );

        let notes = if candidates.is_empty() {
            format!(
                "No available slots between {} and {} from {} to {}",
                self.hours.start.format("%H:%M"),
                self.hours.end.format("%H:%M"),
                self.range_start,
                self.range_end
            )
        } else {
            format!(
                "Found {} available slots between {} and {}",
                candidates.len(),
                self.hours.start.format("%H:%M"),
                self.hours.end.format("%H:%M")
            )
        };

        AvailableSlotsResult::from_candidates(candidates, notes)
    }

    fn collect_day(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        merged: &[BusyInterval],
        out: &mut Vec<TimeSlot>,
    ) {
        let mut cursor = window_start;
        for busy in merged.iter().filter(|b| b.overlaps(window_start, window_end)) {
            if busy.start > cursor {
                self.emit_gap(cursor, busy.start, out);
            }
            cursor = cursor.max(busy.end);
        }
        if cursor < window_end {
            self.emit_gap(cursor, window_end, out);
        }
    }

    fn emit_gap(&self, gap_start: DateTime<Utc>, gap_end: DateTime<Utc>, out: &mut Vec<TimeSlot>) {
        let mut start = gap_start;
        while start + self.duration <= gap_end {
            if let Some(slot) = TimeSlot::new(start.with_timezone(&self.timezone), self.duration) {
                out.push(slot);
            }
            match self.step {
                Some(step) => start += step,
                None => break,
            }
        }
    }
}

/// Finds candidate slots in `[range_start, range_end]` inside `hours`.
pub fn find_slots(
    range_start: NaiveDate,
    range_end: NaiveDate,
    duration: Duration,
    hours: BusinessHours,
    busy: &[BusyInterval],
    timezone: Tz,
) -> AvailableSlotsResult {
    SlotSearch::new(range_start, range_end, duration, timezone)
        .with_hours(hours)
        .run(busy)
}

/// Sorts busy intervals and merges overlapping or adjacent ones.
///
/// Empty intervals are dropped.
pub fn merge_busy(busy: impl IntoIterator<Item = BusyInterval>) -> Vec<BusyInterval> {
    let mut sorted: Vec<BusyInterval> = busy.into_iter().filter(|b| !b.is_empty()).collect();
    sorted.sort();

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Weekday};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Busy interval on 2025-03-17 (a Monday) in local time of `tz`.
    fn busy_on(tz: Tz, d: u32, from: (u32, u32), to: (u32, u32)) -> BusyInterval {
        BusyInterval::from_local(
            tz.with_ymd_and_hms(2025, 3, d, from.0, from.1, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 3, d, to.0, to.1, 0).unwrap(),
        )
    }

    fn starts(result: &AvailableSlotsResult) -> Vec<NaiveTime> {
        result.candidates.iter().map(|s| s.start().time()).collect()
    }

    #[test]
    fn free_weekday_starts_at_work_start() {
        let monday = date(2025, 3, 17);
        let result = find_slots(
            monday,
            monday,
            Duration::minutes(30),
            BusinessHours::default(),
            &[],
            chrono_tz::UTC,
        );

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(starts(&result), vec![hm(10, 0)]);
        assert_eq!(result.selected.as_ref(), result.candidates.first());
    }

    #[test]
    fn busy_morning_moves_first_candidate() {
        let tz = chrono_tz::UTC;
        let monday = date(2025, 3, 17);
        let busy = [busy_on(tz, 17, (10, 0), (11, 0))];
        let result = find_slots(
            monday,
            monday,
            Duration::minutes(30),
            BusinessHours::default(),
            &busy,
            tz,
        );

        assert_eq!(starts(&result), vec![hm(11, 0)]);
    }

    #[test]
    fn candidates_use_caller_timezone() {
        let tz = chrono_tz::America::Los_Angeles;
        let monday = date(2025, 3, 17);
        let result = find_slots(monday, monday, Duration::hours(1), BusinessHours::default(), &[], tz);

        let slot = result.selected.unwrap();
        assert_eq!(slot.start().time(), hm(10, 0));
        // PDT is UTC-7
        assert_eq!(slot.start_utc(), Utc.with_ymd_and_hms(2025, 3, 17, 17, 0, 0).unwrap());
    }

    #[test]
    fn weekend_only_range_is_empty() {
        let result = find_slots(
            date(2025, 3, 15),
            date(2025, 3, 16),
            Duration::minutes(30),
            BusinessHours::default(),
            &[],
            chrono_tz::UTC,
        );

        assert!(result.is_empty());
        assert!(result.selected.is_none());
        assert!(result.notes.starts_with("No available slots"));
    }

    #[test]
    fn fully_busy_day_contributes_nothing() {
        let tz = chrono_tz::UTC;
        let busy = [
            busy_on(tz, 17, (9, 0), (12, 0)),
            busy_on(tz, 17, (12, 20), (17, 30)),
        ];
        let result = find_slots(
            date(2025, 3, 17),
            date(2025, 3, 17),
            Duration::minutes(30),
            BusinessHours::default(),
            &busy,
            tz,
        );

        assert!(result.is_empty());
    }

    #[test]
    fn gap_exactly_duration_yields_one_candidate() {
        let tz = chrono_tz::UTC;
        let busy = [
            busy_on(tz, 17, (10, 0), (12, 0)),
            busy_on(tz, 17, (12, 30), (17, 0)),
        ];
        let result = find_slots(
            date(2025, 3, 17),
            date(2025, 3, 17),
            Duration::minutes(30),
            BusinessHours::default(),
            &busy,
            tz,
        );

        assert_eq!(starts(&result), vec![hm(12, 0)]);
    }

    #[test]
    fn one_candidate_per_gap_across_days() {
        let tz = chrono_tz::UTC;
        let busy = [
            busy_on(tz, 17, (11, 0), (14, 0)),
            busy_on(tz, 18, (10, 0), (10, 30)),
        ];
        let result = find_slots(
            date(2025, 3, 17),
            date(2025, 3, 18),
            Duration::minutes(30),
            BusinessHours::default(),
            &busy,
            tz,
        );

        let got: Vec<_> = result
            .candidates
            .iter()
            .map(|s| (s.start().day(), s.start().time()))
            .collect();
        assert_eq!(got, vec![(17, hm(10, 0)), (17, hm(14, 0)), (18, hm(10, 30))]);
    }

    #[test]
    fn overlapping_and_adjacent_busy_leave_no_spurious_gap() {
        let tz = chrono_tz::UTC;
        let busy = [
            busy_on(tz, 17, (10, 0), (11, 0)),
            busy_on(tz, 17, (11, 0), (12, 0)),
            busy_on(tz, 17, (11, 30), (13, 0)),
        ];
        let result = find_slots(
            date(2025, 3, 17),
            date(2025, 3, 17),
            Duration::minutes(15),
            BusinessHours::default(),
            &busy,
            tz,
        );

        assert_eq!(starts(&result), vec![hm(13, 0)]);
    }

    #[test]
    fn step_enumerates_within_gap() {
        let tz = chrono_tz::UTC;
        let busy = [busy_on(tz, 17, (11, 0), (17, 0))];
        let result = SlotSearch::new(date(2025, 3, 17), date(2025, 3, 17), Duration::minutes(30), tz)
            .with_step(Duration::minutes(15))
            .run(&busy);

        assert_eq!(starts(&result), vec![hm(10, 0), hm(10, 15), hm(10, 30)]);
    }

    #[test]
    fn non_positive_duration_yields_nothing() {
        let monday = date(2025, 3, 17);
        let result = SlotSearch::new(monday, monday, Duration::zero(), chrono_tz::UTC).run(&[]);
        assert!(result.is_empty());
    }

    #[test]
    fn preference_overrides_selection() {
        let tz = chrono_tz::UTC;
        let busy = [busy_on(tz, 17, (11, 0), (14, 0))];
        let result = find_slots(
            date(2025, 3, 17),
            date(2025, 3, 18),
            Duration::minutes(30),
            BusinessHours::default(),
            &busy,
            tz,
        );

        let latest = result.clone().select(SlotPreference::Latest);
        assert_eq!(latest.selected.as_ref(), latest.candidates.last());

        let afternoon = result.clone().select(SlotPreference::NotBefore(hm(12, 0)));
        assert_eq!(afternoon.selected.unwrap().start().time(), hm(14, 0));

        let late = result.select(SlotPreference::NotBefore(hm(16, 45)));
        assert_eq!(late.selected.unwrap().start().time(), hm(10, 0));
    }

    #[test]
    fn merge_busy_sorts_and_joins() {
        let tz = chrono_tz::UTC;
        let merged = merge_busy([
            busy_on(tz, 17, (14, 0), (15, 0)),
            busy_on(tz, 17, (10, 0), (11, 0)),
            busy_on(tz, 17, (10, 30), (12, 0)),
            busy_on(tz, 17, (12, 0), (12, 15)),
            busy_on(tz, 17, (16, 0), (16, 0)),
        ]);

        assert_eq!(
            merged,
            vec![
                busy_on(tz, 17, (10, 0), (12, 15)),
                busy_on(tz, 17, (14, 0), (15, 0)),
            ]
        );
    }

    fn busy_strategy() -> impl Strategy<Value = BusyInterval> {
        (0u32..7, 0u32..(24 * 60), 1i64..300).prop_map(|(day, minute, len)| {
            let start = Utc.with_ymd_and_hms(2025, 3, 17 + day, minute / 60, minute % 60, 0).unwrap();
            BusyInterval::new(start, start + Duration::minutes(len))
        })
    }

    proptest! {
        #[test]
        fn candidates_respect_invariants(
            busy in proptest::collection::vec(busy_strategy(), 0..12),
            minutes in 15i64..240,
            step in proptest::option::of(5i64..60),
        ) {
            let tz = chrono_tz::Europe::Berlin;
            let hours = BusinessHours::default();
            let duration = Duration::minutes(minutes);
            let mut search = SlotSearch::new(date(2025, 3, 17), date(2025, 3, 23), duration, tz);
            if let Some(step) = step {
                search = search.with_step(Duration::minutes(step));
            }

            let result = search.run(&busy);

            for slot in &result.candidates {
                let weekday = slot.start().weekday();
                prop_assert!(weekday != Weekday::Sat && weekday != Weekday::Sun);
                prop_assert!(slot.start().time() >= hours.start);
                prop_assert!(slot.end().time() <= hours.end);
                prop_assert_eq!(slot.end().date_naive(), slot.start().date_naive());
                prop_assert_eq!(slot.duration(), duration);
                prop_assert!(busy.iter().all(|b| !slot.overlaps(b)));
            }
            for pair in result.candidates.windows(2) {
                prop_assert!(pair[0].start() < pair[1].start());
            }

            // Same inputs, same answer.
            prop_assert_eq!(search.run(&busy), result);
        }
    }
}
