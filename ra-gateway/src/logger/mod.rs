pub mod service;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{store::UserDataStorageConnector, types::log::Log};

const LIVE_CHANNEL_CAPACITY: usize = 256;

/// Fan-out target for completed logs: the persistent store plus any live
/// subscribers.
#[derive(Debug, Clone)]
pub struct LogSink {
    store: Arc<dyn UserDataStorageConnector>,
    live: broadcast::Sender<Arc<Log>>,
}

impl LogSink {
    #[must_use]
    pub fn new(store: Arc<dyn UserDataStorageConnector>) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self { store, live }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Log>> {
        self.live.subscribe()
    }

    /// Persists and broadcasts one log record. Storage failures are logged
    /// and swallowed; log emission never fails a request.
    pub async fn emit(&self, log: Log) {
        let shared = Arc::new(log.clone());
        // a send error only means nobody is subscribed
        let _ = self.live.send(shared);
        if let Err(e) = self.store.insert_log(log).await {
            tracing::error!(error = %e, "failed to persist log record");
        }
    }
}
