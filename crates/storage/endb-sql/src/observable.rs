//! Connection lifecycle events for observability
//!
//! Bootstrap happens off the call stack of any single operation, so its
//! outcome is published here instead of being returned to a caller.

use crate::error::StorageError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default buffer size of the event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Lifecycle event published by an adapter
#[derive(Debug, Clone)]
pub enum AdapterEvent {
    /// The connector produced an executor and the table exists
    Connected,
    /// Bootstrap failed; the adapter is degraded for the rest of its lifetime
    Failed(Arc<StorageError>),
}

impl AdapterEvent {
    /// The bootstrap error, if this is a failure event
    pub fn error(&self) -> Option<&Arc<StorageError>> {
        match self {
            AdapterEvent::Failed(err) => Some(err),
            AdapterEvent::Connected => None,
        }
    }
}

/// Serializable summary of an event, for structured log sinks
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    /// `"connected"` or `"failed"`
    pub event_type: &'static str,
    /// Error message for failures
    pub error: Option<String>,
    /// Timestamp in milliseconds
    pub timestamp: u64,
}

impl From<&AdapterEvent> for EventRecord {
    fn from(event: &AdapterEvent) -> Self {
        let (event_type, error) = match event {
            AdapterEvent::Connected => ("connected", None),
            AdapterEvent::Failed(err) => ("failed", Some(err.to_string())),
        };
        Self {
            event_type,
            error,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
        }
    }
}

/// Broadcast channel carrying [`AdapterEvent`]s to any number of subscribers
#[derive(Debug, Clone)]
pub struct ErrorSignal {
    sender: broadcast::Sender<AdapterEvent>,
}

impl ErrorSignal {
    /// Create a signal buffering up to `capacity` undelivered events
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub(crate) fn emit(&self, event: AdapterEvent) {
        // No receivers is fine; the event is purely observational
        let _ = self.sender.send(event);
    }
}

impl Default for ErrorSignal {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let signal = ErrorSignal::default();
        let mut first = signal.subscribe();
        let mut second = signal.subscribe();
        assert_eq!(signal.subscriber_count(), 2);

        signal.emit(AdapterEvent::Failed(Arc::new(StorageError::connect("refused"))));

        for rx in [&mut first, &mut second] {
            let event = rx.recv().await.unwrap();
            let err = event.error().expect("failure event");
            assert!(err.is_bootstrap());
        }
    }

    #[test]
    fn test_emit_without_subscribers() {
        let signal = ErrorSignal::new(0);
        signal.emit(AdapterEvent::Connected);
    }

    #[test]
    fn test_event_record() {
        let record = EventRecord::from(&AdapterEvent::Failed(Arc::new(StorageError::connect("x"))));
        assert_eq!(record.event_type, "failed");
        assert!(record.error.unwrap().contains("Connection failed"));

        let json = serde_json::to_value(EventRecord::from(&AdapterEvent::Connected)).unwrap();
        assert_eq!(json["event_type"], "connected");
        assert!(json["error"].is_null());
    }
}
