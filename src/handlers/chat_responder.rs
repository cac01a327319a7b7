use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::chat::{ChatMessage, MessageKind};

/// Where rewritten chat messages are shown.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn progress(&self, message: &ChatMessage);
    async fn settled(&self, message: &ChatMessage);
}

/// Prints to stdout and wakes the prompt loop once a request settles.
pub struct TerminalResponder {
    settled: Arc<Notify>,
}

impl TerminalResponder {
    pub fn new(settled: Arc<Notify>) -> Self {
        Self { settled }
    }
}

#[async_trait]
impl ChatResponder for TerminalResponder {
    async fn progress(&self, message: &ChatMessage) {
        println!("  ... {}", message.text);
    }

    async fn settled(&self, message: &ChatMessage) {
        match message.kind {
            MessageKind::Error => println!("Chronos (error): {}", message.text),
            _ => println!("Chronos: {}", message.text),
        }
        self.settled.notify_one();
    }
}
