//! Core types: time slots, busy intervals, meeting requests, slot search

pub mod error;
pub mod event;
pub mod slots;
pub mod time;
pub mod tracing;

pub use error::ValidationError;
pub use event::{CalendarEventDetails, CalendarEventResponse, MeetingRequest, is_valid_email};
pub use slots::{AvailableSlotsResult, SlotPreference, SlotSearch, find_slots, merge_busy};
pub use time::{
    BusinessHours, BusyInterval, TimeSlot, TimeWindow, business_days_from, is_weekend,
    local_datetime, parse_time_of_day, parse_timezone,
};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
