use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::ChronosApi;
use crate::errors::Result;
use crate::models::event::{transform_events, Event, RawEvent};

/// One fetched batch of events: raw payload plus the converted form.
#[derive(Debug, Clone, Default)]
pub struct EventSnapshot {
    pub raw: Vec<RawEvent>,
    pub events: Vec<Event>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Holder of the current snapshot. Refreshes swap the whole snapshot so
/// readers never see a partial one.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    current: Arc<RwLock<Arc<EventSnapshot>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Arc<EventSnapshot> {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, raw: Vec<RawEvent>, tz: Tz, fetched_at: DateTime<Utc>) {
        let events = transform_events(&raw, tz);
        let next = Arc::new(EventSnapshot {
            raw,
            events,
            fetched_at: Some(fetched_at),
        });
        *self.current.write().await = next;
    }
}

/// Fetches `/api/events` and swaps the snapshot. Returns the number of
/// usable events.
pub async fn refresh_events(api: &dyn ChronosApi, store: &EventStore, tz: Tz) -> Result<usize> {
    let raw = api.list_events().await?;
    store.replace(raw, tz, Utc::now()).await;
    let count = store.snapshot().await.events.len();
    info!(count, "event snapshot refreshed");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn raw(id: &str) -> RawEvent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "summary": id,
            "start": {"dateTime": "2026-10-19T09:00:00Z"},
            "end": {"dateTime": "2026-10-19T10:00:00Z"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn replace_swaps_whole_snapshot() {
        let store = EventStore::new();
        assert!(store.snapshot().await.events.is_empty());

        store.replace(vec![raw("a"), raw("b")], UTC, Utc::now()).await;
        let first = store.snapshot().await;
        assert_eq!(first.events.len(), 2);

        store.replace(vec![raw("c")], UTC, Utc::now()).await;
        let second = store.snapshot().await;
        assert_eq!(second.events.len(), 1);
        assert_eq!(second.events[0].id, "c");
        // Earlier readers keep their own complete snapshot.
        assert_eq!(first.events.len(), 2);
    }
}
