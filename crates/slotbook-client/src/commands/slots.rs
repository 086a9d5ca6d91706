//! `slotbook slots`.

use chrono::Utc;
use serde::Serialize;
use slotbook_core::{AvailableSlotsResult, TimeSlot, TimeWindow};
use slotbook_engine::Pipeline;

use crate::cli::SlotsArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Serialize)]
struct SlotsOutput<'a> {
    window: &'a TimeWindow,
    #[serde(flatten)]
    result: &'a AvailableSlotsResult,
}

/// Lists free slots in the configured search window.
pub async fn run(args: SlotsArgs, config: &ClientConfig) -> ClientResult<()> {
    let tz = config
        .scheduling
        .timezone(args.timezone.as_deref())
        .map_err(ClientError::Usage)?;

    let mut pipeline_config = config.to_pipeline_config().map_err(ClientError::Config)?;
    if let Some(days) = args.days {
        pipeline_config = pipeline_config.with_search_days(days);
    }
    if let Some(step) = args.step {
        pipeline_config = pipeline_config.with_step(chrono::Duration::minutes(i64::from(step)));
    }

    let pipeline = Pipeline::new(super::calendar_client(config)?, pipeline_config);
    let (window, result) = pipeline
        .search(chrono::Duration::minutes(args.duration), tz, Utc::now())
        .await?;

    if args.json {
        let output = SlotsOutput {
            window: &window,
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render(&result));
    }
    Ok(())
}

/// One line per candidate, the selected one marked with `*`.
pub fn render(result: &AvailableSlotsResult) -> String {
    if result.is_empty() {
        return format!("No free slot. {}", result.notes);
    }

    let mut lines: Vec<String> = result
        .candidates
        .iter()
        .map(|slot| {
            let marker = if result.selected.as_ref() == Some(slot) {
                '*'
            } else {
                ' '
            };
            format!("{} {}", marker, format_slot(slot))
        })
        .collect();
    lines.push(result.notes.clone());
    lines.join("\n")
}

fn format_slot(slot: &TimeSlot) -> String {
    format!(
        "{}-{} ({})",
        slot.start().format("%a %Y-%m-%d %H:%M"),
        slot.end().format("%H:%M"),
        slot.timezone().name()
    )
}
