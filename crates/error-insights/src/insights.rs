//! Owned wiring of config, log ring buffer and event store.

use std::sync::Arc;

use tracing::debug;

use crate::capture::LogCaptureLayer;
use crate::config::InsightsConfig;
use crate::event::{ErrorEvent, EventKind};
use crate::log_buffer::LogRingBuffer;
use crate::store::ErrorEventStore;

/// The capture pipeline as one explicitly constructed component.
///
/// Construct it once, hand [`ErrorInsights::layer`] to the tracing
/// subscriber, and share the store with whatever boundary records or
/// queries events. There is no global instance.
pub struct ErrorInsights {
    config: InsightsConfig,
    logs: Arc<LogRingBuffer>,
    store: Arc<ErrorEventStore>,
}

impl ErrorInsights {
    pub fn new(config: InsightsConfig) -> Self {
        let logs = Arc::new(LogRingBuffer::new(config.log_buffer_capacity));
        let store = Arc::new(ErrorEventStore::new(
            config.max_events,
            config.dedup_window(),
        ));
        Self {
            config,
            logs,
            store,
        }
    }

    /// Layer that mirrors WARN+ log emissions into the ring buffer.
    pub fn layer(&self) -> LogCaptureLayer {
        LogCaptureLayer::new(Arc::clone(&self.logs))
    }

    pub fn store(&self) -> Arc<ErrorEventStore> {
        Arc::clone(&self.store)
    }

    pub fn log_buffer(&self) -> Arc<LogRingBuffer> {
        Arc::clone(&self.logs)
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    /// Captures an error: builds an event of the given kind, attaches a
    /// snapshot of the recent log lines, and saves it. Returns the stored
    /// event id, or `None` when the pipeline is disabled or the event was
    /// deduplicated.
    pub fn capture<E>(&self, kind: EventKind, err: &E) -> Option<String>
    where
        E: std::error::Error,
    {
        if !self.config.enabled {
            return None;
        }
        let built = ErrorEvent::builder()
            .kind(kind)
            .error(err)
            .recent_logs(self.logs.snapshot(self.config.log_buffer_capacity))
            .build();
        match built {
            Ok(event) => self.save(event),
            Err(err) => {
                debug!(%err, "error event rejected");
                None
            }
        }
    }

    /// Saves a pre-built event, for callers that attach HTTP or extra
    /// context through the builder themselves.
    pub fn save(&self, event: ErrorEvent) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let id = event.id.clone();
        if self.store.save(event) {
            Some(id)
        } else {
            None
        }
    }
}
