use tokio::sync::mpsc;

use crate::models::schedule::TrackerUpdate;

#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<TrackerUpdate>,
}

impl EventBus {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<TrackerUpdate>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Drops the update when nobody is listening.
    pub async fn emit(&self, update: TrackerUpdate) {
        let _ = self.tx.send(update).await;
    }
}
