use std::sync::Arc;

use inquire::Text;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clients::ChronosApi;
use crate::config::Settings;
use crate::events::queue::EventBus;
use crate::events::worker::run_update_worker;
use crate::handlers::chat::{ChatHandler, ChatReply, ChatTranscript};
use crate::handlers::chat_responder::TerminalResponder;
use crate::service::event_store::{refresh_events, EventStore};
use crate::service::preferences::Preferences;
use crate::service::tracker::{SchedulingTracker, TrackerConfig};
use crate::tasks::refresh_loop::run_refresh_loop;
use crate::tasks::task_runner::TaskRunner;

const UPDATE_BUFFER: usize = 64;

/// Tracker, update worker and transcript wired together for the terminal.
pub struct ChatRuntime {
    handler: ChatHandler,
    events: EventStore,
    settled: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl ChatRuntime {
    pub fn new(api: Arc<dyn ChronosApi>, settings: &Settings) -> Self {
        let events = EventStore::new();
        let (bus, rx) = EventBus::new(UPDATE_BUFFER);
        let tracker = Arc::new(SchedulingTracker::new(
            api,
            events.clone(),
            bus,
            TrackerConfig::from(settings),
        ));
        let transcript = Arc::new(Mutex::new(ChatTranscript::new()));
        let settled = Arc::new(Notify::new());
        let responder = Arc::new(TerminalResponder::new(settled.clone()));
        let worker = tokio::spawn(run_update_worker(rx, transcript.clone(), responder));

        Self {
            handler: ChatHandler::new(tracker, transcript),
            events,
            settled,
            worker,
        }
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    /// Sends one message and returns once its outcome has been printed.
    pub async fn send(&self, text: &str, preferences: Vec<String>) -> ChatReply {
        let reply = self.handler.handle_message(text, preferences).await;
        match &reply {
            ChatReply::Submitted(_) => self.settled.notified().await,
            ChatReply::Rejected(message) => println!("Chronos: {}", message),
            ChatReply::Ignored => {}
        }
        reply
    }
}

impl Drop for ChatRuntime {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

/// Interactive session: prints the greeting and welcome message, keeps the
/// event snapshot fresh in the background and reads requests until the user
/// quits.
pub async fn run_chat(api: Arc<dyn ChronosApi>, settings: &Settings, preferences: &Preferences) -> anyhow::Result<()> {
    let runtime = ChatRuntime::new(api.clone(), settings);
    {
        let transcript = runtime.handler.transcript();
        let transcript = transcript.lock().await;
        if let Some(greeting) = transcript.last() {
            println!("Chronos: {}", greeting.text);
        }
    }

    match refresh_events(api.as_ref(), runtime.events(), settings.timezone).await {
        Ok(count) if count > 0 => {
            let snapshot = runtime.events().snapshot().await;
            match api.welcome_message(&snapshot.raw).await {
                Ok(Some(message)) => println!("Chronos: {}", message),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "failed to fetch welcome message"),
            }
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "initial event fetch failed"),
    }

    let mut runner = TaskRunner::new();
    runner.add_task(
        "events-refresh",
        run_refresh_loop(
            api.clone(),
            runtime.events().clone(),
            settings.timezone,
            settings.refresh_interval,
        ),
    );
    let handles = runner.start_all();

    loop {
        let input = tokio::task::spawn_blocking(|| Text::new("You:").prompt()).await?;
        let text = match input {
            Ok(text) => text,
            Err(err) => {
                debug!(error = %err, "prompt closed");
                break;
            }
        };
        if matches!(text.trim(), "/quit" | "/exit") {
            break;
        }
        runtime.send(&text, preferences.snapshot()).await;
    }

    for handle in handles {
        handle.abort();
    }
    Ok(())
}
