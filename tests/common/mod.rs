#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::UTC;

use chronos::clients::ChronosApi;
use chronos::errors::{ChronosError, Result};
use chronos::models::api::{
    AuthStatus, EditOrDeleteResponse, EditStatus, SearchResponse, SpeechToTextResponse,
};
use chronos::models::event::{Event, RawEvent};
use chronos::models::schedule::{CreatedEvent, ScheduleResult, SchedulingRequest, StatusResponse};
use chronos::service::tracker::TrackerConfig;

/// Backend fake: status responses are served in order, then an endless
/// incomplete response. Every call is counted.
#[derive(Default)]
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<StatusResponse>>>,
    events: Mutex<Vec<RawEvent>>,
    pub fail_events: AtomicBool,
    pub status_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub requests: Mutex<Vec<SchedulingRequest>>,
}

impl ScriptedApi {
    pub fn new(statuses: Vec<Result<StatusResponse>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn with_events(self, events: Vec<RawEvent>) -> Self {
        *self.events.lock().unwrap() = events;
        self
    }

    pub fn push_status(&self, status: Result<StatusResponse>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChronosApi for ScriptedApi {
    async fn auth_status(&self) -> Result<AuthStatus> {
        Ok(AuthStatus { is_authenticated: true })
    }

    async fn list_events(&self) -> Result<Vec<RawEvent>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(ChronosError::Status {
                status: 502,
                body: "upstream calendar unavailable".to_string(),
            });
        }
        Ok(self.events.lock().unwrap().clone())
    }

    async fn schedule_status(&self, request: &SchedulingRequest) -> Result<StatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(StatusResponse::default()))
    }

    async fn welcome_message(&self, events: &[RawEvent]) -> Result<Option<String>> {
        Ok(Some(format!("You have {} events coming up.", events.len())))
    }

    async fn search(&self, _query: &str) -> Result<SearchResponse> {
        Ok(SearchResponse::default())
    }

    async fn edit_or_delete(&self, _query: &str, _event: &Event) -> Result<EditOrDeleteResponse> {
        Ok(EditOrDeleteResponse {
            status: EditStatus::Success,
            message: None,
        })
    }

    async fn speech_to_text(&self, _audio: Vec<u8>, _file_name: &str) -> Result<SpeechToTextResponse> {
        Ok(SpeechToTextResponse::Transcribed {
            text: String::new(),
        })
    }
}

pub fn in_progress(stage: &str, message: &str) -> Result<StatusResponse> {
    Ok(StatusResponse {
        stage: Some(stage.to_string()),
        message: Some(message.to_string()),
        ..StatusResponse::default()
    })
}

pub fn finished(titles: &[&str]) -> Result<StatusResponse> {
    Ok(StatusResponse {
        complete: true,
        response: Some(ScheduleResult {
            events: Some(titles.iter().map(|title| CreatedEvent::titled(title)).collect()),
        }),
        ..StatusResponse::default()
    })
}

pub fn raw_event(id: &str, summary: &str, start: &str, end: &str) -> RawEvent {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "summary": summary,
        "start": { "dateTime": start },
        "end": { "dateTime": end },
    }))
    .unwrap()
}

pub fn fast_config(max_attempts: u32) -> TrackerConfig {
    TrackerConfig {
        poll_interval: Duration::from_millis(1),
        max_attempts,
        timezone: UTC,
    }
}
