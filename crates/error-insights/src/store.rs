//! Bounded error-event retention with time-windowed deduplication.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::Duration;
use tracing::debug;

use crate::error::InsightsError;
use crate::event::{ErrorEvent, Explanation};

/// Fixed-capacity FIFO of captured error events.
///
/// A `save` whose fingerprint matches a retained event inside the dedup
/// window is dropped silently. At capacity the single oldest event is
/// evicted, insertion order only. Explanations live in a side table keyed
/// by event id and die with their event.
///
/// Every operation takes the one internal lock, so the dedup scan and the
/// insert are observed atomically by concurrent callers. The scan is
/// linear; fine at the configured tens of entries, but capacities orders
/// of magnitude larger would need a fingerprint index.
pub struct ErrorEventStore {
    max_events: usize,
    dedup_window: Duration,
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    events: VecDeque<ErrorEvent>,
    explanations: HashMap<String, Explanation>,
}

impl ErrorEventStore {
    pub fn new(max_events: usize, dedup_window: Duration) -> Self {
        Self {
            max_events,
            dedup_window,
            inner: Mutex::new(StoreInner {
                events: VecDeque::with_capacity(max_events),
                explanations: HashMap::new(),
            }),
        }
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Saves an event unless it duplicates a retained fingerprint inside
    /// the dedup window. Returns whether the event was stored.
    pub fn save(&self, event: ErrorEvent) -> bool {
        let mut inner = self.inner.lock().unwrap();

        if self.is_duplicate(&inner.events, &event) {
            debug!(fingerprint = %event.fingerprint, "duplicate error event dropped");
            return false;
        }
        if self.max_events == 0 {
            return false;
        }

        while inner.events.len() >= self.max_events {
            if let Some(evicted) = inner.events.pop_front() {
                inner.explanations.remove(&evicted.id);
            }
        }
        inner.events.push_back(event);
        true
    }

    fn is_duplicate(&self, events: &VecDeque<ErrorEvent>, incoming: &ErrorEvent) -> bool {
        // An empty fingerprint opts out of dedup entirely.
        if incoming.fingerprint.is_empty() {
            return false;
        }
        let window_start = incoming.timestamp - self.dedup_window;
        events.iter().any(|existing| {
            existing.fingerprint == incoming.fingerprint && existing.timestamp > window_start
        })
    }

    /// Up to `limit` events, newest first, as owned copies.
    pub fn get_recent(&self, limit: usize) -> Vec<ErrorEvent> {
        let inner = self.inner.lock().unwrap();
        inner.events.iter().rev().take(limit).cloned().collect()
    }

    /// Point lookup by event id. A miss is `None`, never an error.
    pub fn find_by_id(&self, id: &str) -> Option<ErrorEvent> {
        let inner = self.inner.lock().unwrap();
        inner.events.iter().find(|event| event.id == id).cloned()
    }

    /// Attaches the explanation produced by the downstream enrichment
    /// step. Each event accepts exactly one; later writes are rejected.
    pub fn set_explanation(
        &self,
        id: &str,
        explanation: Explanation,
    ) -> Result<(), InsightsError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.events.iter().any(|event| event.id == id) {
            return Err(InsightsError::UnknownEvent(id.to_string()));
        }
        if inner.explanations.contains_key(id) {
            return Err(InsightsError::ExplanationAlreadySet(id.to_string()));
        }
        inner.explanations.insert(id.to_string(), explanation);
        Ok(())
    }

    pub fn explanation(&self, id: &str) -> Option<Explanation> {
        self.inner.lock().unwrap().explanations.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties the store. Test and ops reset only.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.events.clear();
        inner.explanations.clear();
    }
}
