//! `slotbook schedule`.

use std::time::Duration;

use slotbook_core::MeetingRequest;
use slotbook_engine::{Pipeline, ScheduleOutcome, parse_preference};

use crate::cli::ScheduleArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Runs one scheduling request. Returns whether the run succeeded.
pub async fn run(args: ScheduleArgs, config: &ClientConfig) -> ClientResult<bool> {
    let tz = config
        .scheduling
        .timezone(args.timezone.as_deref())
        .map_err(ClientError::Usage)?;

    let mut pipeline_config = config.to_pipeline_config().map_err(ClientError::Config)?;
    if let Some(ref prefer) = args.prefer {
        let preference = parse_preference(prefer).map_err(|e| ClientError::Usage(e.to_string()))?;
        pipeline_config = pipeline_config.with_preference(preference);
    }
    if let Some(secs) = args.timeout {
        pipeline_config = pipeline_config.with_timeout(Duration::from_secs(secs));
    }

    let mut request = MeetingRequest::new(
        args.attendees,
        args.title,
        chrono::Duration::minutes(args.duration),
        tz,
    );
    if let Some(description) = args.description {
        request = request.with_description(description);
    }

    let pipeline = Pipeline::new(super::calendar_client(config)?, pipeline_config);
    let outcome = pipeline.run(request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.is_success() {
        println!("{}", render(&outcome));
    } else {
        eprintln!("{}", render(&outcome));
    }

    Ok(outcome.is_success())
}

/// Renders an outcome for the terminal.
pub fn render(outcome: &ScheduleOutcome) -> String {
    let mut lines = Vec::new();

    if let Some(ref summary) = outcome.summary {
        lines.push(summary.clone());
    } else {
        for warning in &outcome.warnings {
            lines.push(format!("warning [{}]: {}", warning.code, warning.message));
        }
    }

    if let Some(ref error) = outcome.error {
        lines.push(format!(
            "error [{}] at {}: {}",
            error.code, error.stage, error.message
        ));
        if let Some(ref event) = outcome.event {
            lines.push(format!(
                "event {} was created and has been left in place",
                event.event_id
            ));
            if let Some(ref link) = event.html_link {
                lines.push(format!("Calendar link: {}", link));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use slotbook_core::CalendarEventResponse;
    use slotbook_engine::{ErrorCode, ErrorReport, OutcomeStatus, Stage};
    use std::collections::BTreeSet;

    fn failed(code: ErrorCode, stage: Stage, message: &str) -> ScheduleOutcome {
        ScheduleOutcome {
            status: OutcomeStatus::Error,
            partial: false,
            slot: None,
            event: None,
            summary: None,
            notes: None,
            warnings: Vec::new(),
            error: Some(ErrorReport {
                code,
                stage,
                message: message.to_string(),
            }),
        }
    }

    #[test]
    fn render_failure_before_booking() {
        let outcome = failed(
            ErrorCode::NoAvailability,
            Stage::FindSlots,
            "no free slot between 2025-03-15 and 2025-03-17",
        );
        assert_eq!(
            render(&outcome),
            "error [no_availability] at FIND_SLOTS: no free slot between 2025-03-15 and 2025-03-17"
        );
    }

    #[test]
    fn render_failure_after_booking() {
        let mut outcome = failed(ErrorCode::Verification, Stage::VerifyDetails, "title mismatch");
        outcome.partial = true;
        outcome.event = Some(CalendarEventResponse {
            event_id: "evt1".to_string(),
            meet_link: None,
            html_link: Some("https://calendar.example.com/event?eid=evt1".to_string()),
            title: "Kickoff".to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 17, 10, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 17, 10, 30, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
            notified_attendees: BTreeSet::new(),
        });

        let text = render(&outcome);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "error [verification] at VERIFY_DETAILS: title mismatch");
        assert_eq!(lines[1], "event evt1 was created and has been left in place");
        assert_eq!(lines[2], "Calendar link: https://calendar.example.com/event?eid=evt1");
    }

    #[test]
    fn render_success_prints_summary() {
        let outcome = ScheduleOutcome {
            status: OutcomeStatus::Success,
            summary: Some("Meeting scheduled: Kickoff".to_string()),
            error: None,
            ..failed(ErrorCode::Validation, Stage::FindSlots, "")
        };
        assert_eq!(render(&outcome), "Meeting scheduled: Kickoff");
    }
}
