use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const DEFAULT_EVENT_COLOR: &str = "#3b82f6";
pub const UNTITLED_EVENT: &str = "(No title)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

/// Calendar event as the calendar grid sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
}

fn default_color() -> String {
    DEFAULT_EVENT_COLOR.to_string()
}

impl Event {
    pub fn new(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            start,
            end,
            color: default_color(),
            attendees: None,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// `start`/`end` of a provider event: timed events carry `dateTime`, all-day
/// events only `date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEventTime {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl RawEventTime {
    pub fn resolve(&self, tz: Tz) -> Option<DateTime<Utc>> {
        if let Some(date_time) = &self.date_time {
            return DateTime::parse_from_rfc3339(date_time)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        let local = tz
            .from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight));
        Some(local.with_timezone(&Utc))
    }
}

/// Event in the shape the backend returns from `/api/events`. Fields the
/// client does not read are kept in `extra` so the payload can be sent back
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "colorId", default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(default)]
    pub start: RawEventTime,
    #[serde(default)]
    pub end: RawEventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    /// `None` when either time cannot be read or the event ends before it
    /// starts.
    pub fn to_event(&self, tz: Tz) -> Option<Event> {
        let (Some(start), Some(end)) = (self.start.resolve(tz), self.end.resolve(tz)) else {
            warn!(event_id = %self.id, "skipping event with unreadable start/end");
            return None;
        };
        if end < start {
            warn!(event_id = %self.id, %start, %end, "skipping event that ends before it starts");
            return None;
        }
        Some(Event {
            id: self.id.clone(),
            title: self
                .summary
                .clone()
                .unwrap_or_else(|| UNTITLED_EVENT.to_string()),
            description: self.description.clone().filter(|d| !d.is_empty()),
            start,
            end,
            color: color_for_id(self.color_id.as_deref()).to_string(),
            attendees: self.attendees.clone(),
        })
    }
}

/// Converts a fetched batch, skipping events [`RawEvent::to_event`] rejects.
pub fn transform_events(raw: &[RawEvent], tz: Tz) -> Vec<Event> {
    raw.iter().filter_map(|event| event.to_event(tz)).collect()
}

/// Provider color ids to hex colors.
pub fn color_for_id(color_id: Option<&str>) -> &'static str {
    match color_id {
        Some("1") => "#7986cb",
        Some("2") => "#33b679",
        Some("3") => "#8e24aa",
        Some("4") => "#e67c73",
        Some("5") => "#f6c026",
        Some("6") => "#f5511d",
        Some("7") => "#039be5",
        Some("8") => "#616161",
        Some("9") => "#3f51b5",
        Some("10") => "#0b8043",
        _ => DEFAULT_EVENT_COLOR,
    }
}
