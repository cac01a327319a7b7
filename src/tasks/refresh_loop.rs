use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tokio::time::sleep;
use tracing::warn;

use crate::clients::ChronosApi;
use crate::errors::Result;
use crate::service::event_store::{refresh_events, EventStore};

/// Re-fetches the event snapshot every `interval`. A failed fetch keeps the
/// previous snapshot.
pub async fn run_refresh_loop(api: Arc<dyn ChronosApi>, store: EventStore, tz: Tz, interval: Duration) {
    loop {
        sleep(interval).await;
        let _ = refresh_tick(api.as_ref(), &store, tz).await;
    }
}

pub async fn refresh_tick(api: &dyn ChronosApi, store: &EventStore, tz: Tz) -> Result<usize> {
    refresh_events(api, store, tz).await.inspect_err(|err| {
        warn!(error = %err, "background event refresh failed, keeping previous snapshot");
    })
}
