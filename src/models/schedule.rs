use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::UNTITLED_EVENT;

/// Body of every `/api/schedule/status` call. The whole request is resent on
/// each poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulingRequest {
    pub query: String,
    pub preferences: Vec<String>,
}

impl SchedulingRequest {
    pub fn new(query: &str, preferences: Vec<String>) -> Self {
        Self {
            query: query.trim().to_string(),
            preferences,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub response: Option<ScheduleResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn display_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.stage.clone())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Processing your request...".to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleResult {
    #[serde(default)]
    pub events: Option<Vec<CreatedEvent>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedEvent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreatedEvent {
    pub fn titled(summary: &str) -> Self {
        Self {
            summary: Some(summary.to_string()),
            extra: Map::new(),
        }
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or(UNTITLED_EVENT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Submitting,
    Polling { stage: String },
    Complete,
    Failed,
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackerState::Complete | TrackerState::Failed)
    }
}

/// Progress of one tracked request, delivered in the order responses resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerUpdate {
    Stage {
        request_id: String,
        stage: Option<String>,
        message: String,
    },
    Completed {
        request_id: String,
        summary: String,
        created: Vec<CreatedEvent>,
    },
    Failed {
        request_id: String,
        error: String,
        message: String,
    },
}

impl TrackerUpdate {
    pub fn request_id(&self) -> &str {
        match self {
            TrackerUpdate::Stage { request_id, .. }
            | TrackerUpdate::Completed { request_id, .. }
            | TrackerUpdate::Failed { request_id, .. } => request_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrackerUpdate::Stage { .. })
    }

    /// Text shown in place of the chat placeholder.
    pub fn text(&self) -> &str {
        match self {
            TrackerUpdate::Stage { message, .. } => message,
            TrackerUpdate::Completed { summary, .. } => summary,
            TrackerUpdate::Failed { message, .. } => message,
        }
    }
}
