use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::ChronosError;
use crate::models::schedule::TrackerUpdate;
use crate::service::summary::{classify_error, BUSY, GREETING, PLACEHOLDER};
use crate::service::tracker::{SchedulingTracker, TrackerOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    Placeholder,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub kind: MessageKind,
    /// Tracked request a placeholder (and its final reply) belongs to.
    pub request_id: Option<String>,
}

impl ChatMessage {
    pub fn is_user(&self) -> bool {
        self.kind == MessageKind::User
    }
}

/// Chat history. An accepted submission adds the user's text and a
/// placeholder tagged with its request id; updates for that id rewrite that
/// placeholder and nothing else.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTranscript {
    pub fn new() -> Self {
        let mut transcript = Self {
            messages: Vec::new(),
            next_id: 1,
        };
        transcript.push(GREETING, MessageKind::Assistant, None);
        transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    fn push(&mut self, text: &str, kind: MessageKind, request_id: Option<&str>) -> &ChatMessage {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            text: text.to_string(),
            kind,
            request_id: request_id.map(str::to_string),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn push_user(&mut self, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(self.push(text, MessageKind::User, None))
    }

    pub fn push_assistant(&mut self, text: &str) -> &ChatMessage {
        self.push(text, MessageKind::Assistant, None)
    }

    pub fn push_placeholder(&mut self, request_id: &str) -> &ChatMessage {
        self.push(PLACEHOLDER, MessageKind::Placeholder, Some(request_id))
    }

    /// Rewrites the placeholder of `request_id`, or appends when it has none.
    pub fn settle(&mut self, request_id: &str, text: &str, kind: MessageKind) -> &ChatMessage {
        let placeholder = self.messages.iter().rposition(|m| {
            m.kind == MessageKind::Placeholder && m.request_id.as_deref() == Some(request_id)
        });
        match placeholder {
            Some(idx) => {
                let message = &mut self.messages[idx];
                message.text = text.to_string();
                message.kind = kind;
                &self.messages[idx]
            }
            None => self.push(text, kind, Some(request_id)),
        }
    }

    pub fn apply(&mut self, update: &TrackerUpdate) -> &ChatMessage {
        let kind = match update {
            TrackerUpdate::Stage { .. } => MessageKind::Placeholder,
            TrackerUpdate::Completed { .. } => MessageKind::Assistant,
            TrackerUpdate::Failed { .. } => MessageKind::Error,
        };
        self.settle(update.request_id(), update.text(), kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// Blank input, nothing was added.
    Ignored,
    /// The request never reached the backend.
    Rejected(String),
    Submitted(TrackerOutcome),
}

/// Turns chat input into tracked scheduling requests. Progress and the final
/// outcome reach the transcript through the update worker.
pub struct ChatHandler {
    tracker: Arc<SchedulingTracker>,
    transcript: Arc<Mutex<ChatTranscript>>,
}

impl ChatHandler {
    pub fn new(tracker: Arc<SchedulingTracker>, transcript: Arc<Mutex<ChatTranscript>>) -> Self {
        Self { tracker, transcript }
    }

    pub fn transcript(&self) -> Arc<Mutex<ChatTranscript>> {
        self.transcript.clone()
    }

    /// The in-flight claim is taken before anything is added to the
    /// transcript, so a rejected message never gets a placeholder of its own.
    pub async fn handle_message(&self, text: &str, preferences: Vec<String>) -> ChatReply {
        let text = text.trim();
        if text.is_empty() {
            return ChatReply::Ignored;
        }

        let pending = match self.tracker.start(text, preferences) {
            Ok(pending) => pending,
            Err(err) => {
                debug!(error = %err, "chat message not submitted");
                let message = match err {
                    ChronosError::RequestInFlight => BUSY,
                    other => classify_error(&other),
                };
                let mut transcript = self.transcript.lock().await;
                transcript.push_user(text);
                transcript.push_assistant(message);
                return ChatReply::Rejected(message.to_string());
            }
        };

        {
            let mut transcript = self.transcript.lock().await;
            transcript.push_user(text);
            transcript.push_placeholder(pending.request_id());
        }

        ChatReply::Submitted(self.tracker.run(pending).await)
    }
}
