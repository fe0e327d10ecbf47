//! Port for publishing lifecycle events.
//!
//! Defines the [`EventSink`] trait receiving every committed
//! [`ProposalEvent`]. This is separate from `tracing`-based operation logs:
//! tracing handles human-readable diagnostics, while this port carries the
//! machine-readable history of what happened to each proposal.

use staged_domain::ProposalEvent;
use std::sync::Mutex;

/// Port receiving committed events.
///
/// `publish` is intentionally synchronous and non-fallible: a sink failure
/// must never undo an operation that already committed.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &ProposalEvent);
}

/// No-op implementation for tests and when event output is disabled.
pub struct NoEventSink;

impl EventSink for NoEventSink {
    fn publish(&self, _event: &ProposalEvent) {}
}

/// Keeps every published event in memory.
#[derive(Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<ProposalEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events published so far
    pub fn events(&self) -> Vec<ProposalEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Remove and return the events published so far
    pub fn drain(&self) -> Vec<ProposalEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, event: &ProposalEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Publishes to several sinks in order
pub struct FanoutEventSink {
    sinks: Vec<std::sync::Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<std::sync::Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutEventSink {
    fn publish(&self, event: &ProposalEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn event() -> ProposalEvent {
        ProposalEvent::TrustedForwarderUpdated { forwarder: None }
    }

    #[test]
    fn test_memory_sink_drain_empties() {
        let sink = MemoryEventSink::new();
        sink.publish(&event());
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(MemoryEventSink::new());
        let b = Arc::new(MemoryEventSink::new());
        let fanout = FanoutEventSink::new(vec![a.clone(), b.clone(), Arc::new(NoEventSink)]);
        fanout.publish(&event());
        assert_eq!(a.events(), vec![event()]);
        assert_eq!(b.events(), vec![event()]);
    }
}
