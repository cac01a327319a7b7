use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::handlers::chat::ChatTranscript;
use crate::handlers::chat_responder::ChatResponder;
use crate::models::schedule::TrackerUpdate;

/// Applies tracker updates to the transcript in arrival order and hands the
/// rewritten message to the responder. Ends when every bus handle is dropped.
pub async fn run_update_worker(
    mut rx: mpsc::Receiver<TrackerUpdate>,
    transcript: Arc<Mutex<ChatTranscript>>,
    responder: Arc<dyn ChatResponder>,
) {
    while let Some(update) = rx.recv().await {
        debug!(request_id = update.request_id(), terminal = update.is_terminal(), "applying tracker update");
        let message = {
            let mut transcript = transcript.lock().await;
            transcript.apply(&update).clone()
        };
        if update.is_terminal() {
            responder.settled(&message).await;
        } else {
            responder.progress(&message).await;
        }
    }
}
