//! Manager events and the sinks that receive them
//!
//! Managers emit one [`Event`] per lifecycle change or completed
//! operation. Delivery is fire-and-forget: [`emit_safely`] swallows
//! panics raised inside a sink so observability can never fail a
//! storage operation.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use mnemos_core::RecordId;

use crate::manager::MigrationStatus;

/// Something that happened to a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Backend connected
    Connected {
        /// Collection name
        collection: String,
    },
    /// Backend disconnected
    Disconnected {
        /// Collection name
        collection: String,
    },
    /// Batch inserted
    Inserted {
        /// Collection name
        collection: String,
        /// Records in the batch
        count: usize,
    },
    /// Record replaced
    Updated {
        /// Collection name
        collection: String,
        /// Record id
        id: RecordId,
    },
    /// Delete requested
    Deleted {
        /// Collection name
        collection: String,
        /// Record id
        id: RecordId,
        /// Whether a record was removed
        existed: bool,
    },
    /// Search completed
    Searched {
        /// Collection name
        collection: String,
        /// Requested result count
        k: usize,
        /// Returned result count
        results: usize,
    },
    /// Normalization migration finished
    Normalized {
        /// Collection name
        collection: String,
        /// Records re-embedded
        processed: usize,
        /// Records left unchanged
        skipped: usize,
        /// Outcome
        status: MigrationStatus,
    },
}

impl Event {
    /// Event name as seen by subscribers
    pub fn name(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::Disconnected { .. } => "disconnected",
            Event::Inserted { .. } => "inserted",
            Event::Updated { .. } => "updated",
            Event::Deleted { .. } => "deleted",
            Event::Searched { .. } => "searched",
            Event::Normalized { .. } => "normalized",
        }
    }

    /// Collection the event refers to
    pub fn collection(&self) -> &str {
        match self {
            Event::Connected { collection }
            | Event::Disconnected { collection }
            | Event::Inserted { collection, .. }
            | Event::Updated { collection, .. }
            | Event::Deleted { collection, .. }
            | Event::Searched { collection, .. }
            | Event::Normalized { collection, .. } => collection,
        }
    }
}

/// Receiver of manager events
pub trait EventSink: Send + Sync {
    /// Handle one event; must not block for long
    fn emit(&self, event: &Event);
}

/// Deliver `event`, catching and logging a panicking sink
pub fn emit_safely(sink: &dyn EventSink, event: &Event) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.emit(event))) {
        let message: &str = if let Some(s) = e.downcast_ref::<&str>() {
            s
        } else if let Some(s) = e.downcast_ref::<String>() {
            s
        } else {
            "(non-string panic)"
        };
        warn!(
            target: "mnemos::manager",
            event = event.name(),
            collection = event.collection(),
            panic = message,
            "Event sink panicked"
        );
    }
}

/// Forwards events to `tracing`
///
/// Lifecycle events log at `info`, operations at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &Event) {
        match event {
            Event::Connected { collection } | Event::Disconnected { collection } => info!(
                target: "mnemos::manager",
                event = event.name(),
                collection = collection.as_str(),
                "Collection event"
            ),
            Event::Normalized {
                collection,
                processed,
                skipped,
                status,
            } => info!(
                target: "mnemos::manager",
                event = event.name(),
                collection = collection.as_str(),
                processed,
                skipped,
                status = status.name(),
                "Collection event"
            ),
            _ => debug!(
                target: "mnemos::manager",
                event = event.name(),
                collection = event.collection(),
                "Collection event"
            ),
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &Event) {}
}

/// Records events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Names of the events received so far
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(Event::name).collect()
    }

    /// Drop recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct PanickingSink;

    impl EventSink for PanickingSink {
        fn emit(&self, _event: &Event) {
            panic!("sink exploded");
        }
    }

    fn connected() -> Event {
        Event::Connected {
            collection: "knowledge".to_string(),
        }
    }

    #[test]
    fn test_memory_sink_records() {
        let sink = MemorySink::new();
        emit_safely(&sink, &connected());
        emit_safely(
            &sink,
            &Event::Searched {
                collection: "knowledge".to_string(),
                k: 3,
                results: 1,
            },
        );
        assert_eq!(sink.names(), vec!["connected", "searched"]);
        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        emit_safely(&PanickingSink, &connected());
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::Deleted {
            collection: "reflection".to_string(),
            id: RecordId::from(4),
            existed: true,
        };
        assert_eq!(event.collection(), "reflection");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "deleted", "collection": "reflection", "id": 4, "existed": true})
        );
    }
}
