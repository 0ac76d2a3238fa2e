//! Activity reporter: a bounded, append-only log of progress events with
//! subscriber callbacks.
//!
//! Producers (the upload coordinator and the generation workflow) call
//! [`ActivityReporter::record`]. Presentation code either polls
//! [`ActivityReporter::snapshot`] or registers a handler with
//! [`ActivityReporter::subscribe`].

use scriptcast_core::models::{EventKind, ProgressEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub type EventHandler = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct ActivityReporter {
    capacity: usize,
    events: Mutex<VecDeque<ProgressEvent>>,
    subscribers: Mutex<Vec<(SubscriptionId, EventHandler)>>,
    next_id: AtomicU64,
}

impl ActivityReporter {
    /// `capacity` is the trailing window kept by [`snapshot`](Self::snapshot).
    /// Zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event, dropping the oldest once the window is full, then notify subscribers.
    pub fn record(&self, event: ProgressEvent) {
        mirror_to_tracing(&event);

        {
            let mut events = lock(&self.events);
            if events.len() == self.capacity {
                events.pop_front();
            }
            events.push_back(event.clone());
        }

        // Handlers may re-enter the reporter or the workflow, so no lock is held here.
        let handlers: Vec<EventHandler> = lock(&self.subscribers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }
    }

    /// Retained events, most recent first.
    pub fn snapshot(&self) -> Vec<ProgressEvent> {
        lock(&self.events).iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.subscribers).push((id, Arc::new(handler)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock(&self.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }
}

impl Default for ActivityReporter {
    fn default() -> Self {
        Self::new(scriptcast_core::constants::DEFAULT_ACTIVITY_LOG_CAPACITY)
    }
}

impl std::fmt::Debug for ActivityReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityReporter")
            .field("capacity", &self.capacity)
            .field("events", &self.len())
            .field("subscribers", &lock(&self.subscribers).len())
            .finish()
    }
}

fn mirror_to_tracing(event: &ProgressEvent) {
    let subject = event.subject.as_str();
    let kind = event.kind;
    match event.kind {
        EventKind::Info | EventKind::Success => {
            tracing::info!(subject = %subject, kind = %kind, "{}", event.message)
        }
        EventKind::Warning => {
            tracing::warn!(subject = %subject, kind = %kind, "{}", event.message)
        }
        EventKind::Error => {
            tracing::error!(subject = %subject, kind = %kind, "{}", event.message)
        }
    }
}

/// A panicking subscriber must not take the log down with it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_snapshot_is_most_recent_first() {
        let reporter = ActivityReporter::new(10);
        reporter.record(ProgressEvent::info("a", "first"));
        reporter.record(ProgressEvent::success("b", "second"));

        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].message, "second");
        assert_eq!(snapshot[1].message, "first");
    }

    #[test]
    fn test_window_is_bounded() {
        let reporter = ActivityReporter::new(3);
        for i in 0..5 {
            reporter.record(ProgressEvent::info("file", format!("event {}", i)));
        }

        let messages: Vec<_> = reporter
            .snapshot()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["event 4", "event 3", "event 2"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let reporter = ActivityReporter::new(0);
        reporter.record(ProgressEvent::info("a", "x"));
        reporter.record(ProgressEvent::info("a", "y"));
        assert_eq!(reporter.capacity(), 1);
        assert_eq!(reporter.snapshot()[0].message, "y");
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let reporter = ActivityReporter::new(10);
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        let id = reporter.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        reporter.record(ProgressEvent::info("a", "one"));
        assert!(reporter.unsubscribe(id));
        assert!(!reporter.unsubscribe(id));
        reporter.record(ProgressEvent::info("a", "two"));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_can_read_reporter() {
        let reporter = Arc::new(ActivityReporter::new(10));
        let lengths = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&reporter);
        let sink = Arc::clone(&lengths);
        reporter.subscribe(move |_| {
            sink.lock().unwrap().push(inner.len());
        });
        reporter.record(ProgressEvent::warning("a", "one"));
        reporter.record(ProgressEvent::error("a", "two"));

        assert_eq!(*lengths.lock().unwrap(), vec![1, 2]);
    }
}
