//! Chat text for scheduling outcomes and failures.

use crate::errors::ChronosError;
use crate::models::schedule::{CreatedEvent, ScheduleResult};

pub const GREETING: &str = "Hi! I'm Chronos, your AI scheduling assistant. How can I help you today?";
pub const PLACEHOLDER: &str = "Processing your request...";
pub const NO_EVENTS_CREATED: &str =
    "No events were created. Try rephrasing your request with a day and time.";
pub const RESPONSE_FORMAT_ISSUE: &str =
    "There was an issue with the response format. Please try again.";
pub const REPHRASE_REQUEST: &str =
    "I had trouble understanding that request. Could you rephrase it with a bit more detail?";
pub const GENERIC_FAILURE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";
pub const BUSY: &str = "Still working on your previous request. Please wait for it to finish.";

/// Substring the backend puts in its error text when the model output could
/// not be parsed.
pub const MALFORMED_JSON_MARKER: &str = "Failed to parse JSON";

const TITLE_SEPARATOR: &str = ", ";

pub fn format_created(events: &[CreatedEvent]) -> String {
    match events {
        [] => NO_EVENTS_CREATED.to_string(),
        [only] => format!("Done! I've added \"{}\" to your calendar.", only.title()),
        many => {
            let titles: Vec<&str> = many.iter().map(CreatedEvent::title).collect();
            format!(
                "Done! I've added {} events to your calendar: {}.",
                many.len(),
                titles.join(TITLE_SEPARATOR)
            )
        }
    }
}

/// Summary for a completed request. A payload without an `events` list
/// yields the response-format message instead of an error.
pub fn format_outcome(result: Option<&ScheduleResult>) -> String {
    match result.and_then(|r| r.events.as_deref()) {
        Some(events) => format_created(events),
        None => RESPONSE_FORMAT_ISSUE.to_string(),
    }
}

pub fn classify_error_text(text: &str) -> &'static str {
    if text.contains(MALFORMED_JSON_MARKER) {
        REPHRASE_REQUEST
    } else {
        GENERIC_FAILURE
    }
}

pub fn classify_error(err: &ChronosError) -> &'static str {
    match err {
        ChronosError::Status { body, .. } => classify_error_text(body),
        other => classify_error_text(&other.to_string()),
    }
}
