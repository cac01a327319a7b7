//! Drives one natural-language scheduling request to completion.
//!
//! The full request is re-posted to `/api/schedule/status` until a response
//! reports `complete`. Each incomplete response becomes a
//! [`TrackerUpdate::Stage`]; the run ends with exactly one `Completed` or
//! `Failed` update, after which the tracker is idle again. Only one request
//! may be in flight per tracker; further submissions are rejected until it
//! settles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::event_store::{refresh_events, EventStore};
use super::summary::{classify_error, format_outcome};
use crate::clients::ChronosApi;
use crate::config::Settings;
use crate::errors::{ChronosError, Result};
use crate::events::queue::EventBus;
use crate::models::schedule::{
    CreatedEvent, SchedulingRequest, StatusResponse, TrackerState, TrackerUpdate,
};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    /// Incomplete responses tolerated before giving up.
    pub max_attempts: u32,
    pub timezone: Tz,
}

impl From<&Settings> for TrackerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            max_attempts: settings.poll_max_attempts,
            timezone: settings.timezone,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerOutcome {
    Completed {
        request_id: String,
        summary: String,
        created: Vec<CreatedEvent>,
    },
    Failed {
        request_id: String,
        message: String,
        error: String,
    },
}

impl TrackerOutcome {
    pub fn message(&self) -> &str {
        match self {
            TrackerOutcome::Completed { summary, .. } => summary,
            TrackerOutcome::Failed { message, .. } => message,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TrackerOutcome::Completed { .. })
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A request that holds the tracker's in-flight claim.
pub struct PendingRequest<'a> {
    _guard: InFlightGuard<'a>,
    request_id: String,
    request: SchedulingRequest,
}

impl PendingRequest<'_> {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

pub struct SchedulingTracker {
    api: Arc<dyn ChronosApi>,
    events: EventStore,
    bus: EventBus,
    config: TrackerConfig,
    state: Mutex<TrackerState>,
    in_flight: AtomicBool,
}

impl SchedulingTracker {
    pub fn new(api: Arc<dyn ChronosApi>, events: EventStore, bus: EventBus, config: TrackerConfig) -> Self {
        Self {
            api,
            events,
            bus,
            config,
            state: Mutex::new(TrackerState::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> TrackerState {
        self.state.lock().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn set_state(&self, next: TrackerState) {
        let mut state = self.state.lock().await;
        *state = next;
    }

    /// Claims the tracker for one request without touching the network.
    /// Fails when the query is blank or another request is in flight; the
    /// claim is released when the returned request is dropped.
    pub fn start(&self, query: &str, preferences: Vec<String>) -> Result<PendingRequest<'_>> {
        if query.trim().is_empty() {
            return Err(ChronosError::InvalidInput("query must not be empty".to_string()));
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("rejecting scheduling request while another is in flight");
            return Err(ChronosError::RequestInFlight);
        }
        Ok(PendingRequest {
            _guard: InFlightGuard(&self.in_flight),
            request_id: Uuid::new_v4().to_string(),
            request: SchedulingRequest::new(query, preferences),
        })
    }

    /// Polls a claimed request to its outcome, then goes back to idle.
    pub async fn run(&self, pending: PendingRequest<'_>) -> TrackerOutcome {
        let request_id = pending.request_id.as_str();
        info!(%request_id, preferences = pending.request.preferences.len(), "submitting scheduling request");
        self.set_state(TrackerState::Submitting).await;

        let outcome = match self.poll_until_complete(request_id, &pending.request).await {
            Ok(response) => self.complete(request_id, response).await,
            Err(err) => self.fail(request_id, err).await,
        };
        self.set_state(TrackerState::Idle).await;
        outcome
    }

    /// [`start`](Self::start) followed by [`run`](Self::run). `Err` is only
    /// returned when the request was not started; every failure after that
    /// is reported as [`TrackerOutcome::Failed`].
    pub async fn submit(&self, query: &str, preferences: Vec<String>) -> Result<TrackerOutcome> {
        let pending = self.start(query, preferences)?;
        Ok(self.run(pending).await)
    }

    async fn poll_until_complete(&self, request_id: &str, request: &SchedulingRequest) -> Result<StatusResponse> {
        let mut attempts: u32 = 0;
        loop {
            let response = self.api.schedule_status(request).await?;
            if let Some(error) = response.error.clone().filter(|e| !e.trim().is_empty()) {
                return Err(ChronosError::Backend(error));
            }
            if response.complete {
                return Ok(response);
            }

            attempts += 1;
            let message = response.display_message();
            debug!(request_id, attempt = attempts, stage = ?response.stage, "scheduling request in progress");
            self.set_state(TrackerState::Polling {
                stage: response.stage.clone().unwrap_or_else(|| message.clone()),
            })
            .await;
            self.bus
                .emit(TrackerUpdate::Stage {
                    request_id: request_id.to_string(),
                    stage: response.stage,
                    message,
                })
                .await;

            if attempts >= self.config.max_attempts {
                return Err(ChronosError::PollTimeout { attempts });
            }
            sleep(self.config.poll_interval).await;
        }
    }

    async fn complete(&self, request_id: &str, response: StatusResponse) -> TrackerOutcome {
        self.set_state(TrackerState::Complete).await;
        let summary = format_outcome(response.response.as_ref());
        let created = response
            .response
            .and_then(|result| result.events)
            .unwrap_or_default();
        info!(request_id, created = created.len(), "scheduling request complete");

        if let Err(err) = refresh_events(self.api.as_ref(), &self.events, self.config.timezone).await {
            warn!(request_id, error = %err, "failed to refresh events after scheduling");
        }

        self.bus
            .emit(TrackerUpdate::Completed {
                request_id: request_id.to_string(),
                summary: summary.clone(),
                created: created.clone(),
            })
            .await;

        TrackerOutcome::Completed {
            request_id: request_id.to_string(),
            summary,
            created,
        }
    }

    async fn fail(&self, request_id: &str, err: ChronosError) -> TrackerOutcome {
        self.set_state(TrackerState::Failed).await;
        let message = classify_error(&err).to_string();
        error!(request_id, error = %err, "scheduling request failed");

        self.bus
            .emit(TrackerUpdate::Failed {
                request_id: request_id.to_string(),
                error: err.to_string(),
                message: message.clone(),
            })
            .await;

        TrackerOutcome::Failed {
            request_id: request_id.to_string(),
            message,
            error: err.to_string(),
        }
    }
}
