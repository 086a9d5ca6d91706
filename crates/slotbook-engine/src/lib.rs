//! Scheduling engine for slotbook.
//!
//! - [`Pipeline`] - Runs a [`MeetingRequest`](slotbook_core::MeetingRequest)
//!   through the five stages and returns a [`ScheduleOutcome`]
//! - [`EventBooker`] - Creates the event with bounded retries and confirms
//!   attendee notification
//! - [`Summarizer`] - Produces the closing text; [`TemplateSummarizer`] is the default
//!
//! ```ignore
//! use std::sync::Arc;
//! use slotbook_engine::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(Arc::new(client), PipelineConfig::default());
//! let outcome = pipeline.run(request).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! ```

pub mod booker;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod summary;

#[cfg(test)]
mod testing;

pub use booker::{BookError, Booking, EventBooker};
pub use config::{BookerConfig, PipelineConfig, parse_preference};
pub use error::{EngineResult, ErrorCode, SchedulingError};
pub use pipeline::{
    BookedEvent, ErrorReport, OutcomeStatus, Pipeline, PipelineContext, ScheduleOutcome, Stage,
};
pub use summary::{Summarizer, SummaryError, SummaryInput, TemplateSummarizer};
