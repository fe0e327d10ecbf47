//! Per-operation write buffer
//!
//! Sub-decision handles and events produced while an operation runs are
//! collected here and applied only once the operation has succeeded. Dropping
//! a transaction discards them.

use crate::ports::event_sink::EventSink;
use crate::stores::{LedgerKey, ResultLedger};
use crate::use_cases::dispatch::DispatchOutcome;
use staged_domain::{ProposalEvent, SubDecisionHandle};

#[derive(Debug, Default)]
pub(super) struct Transaction {
    handles: Vec<(LedgerKey, SubDecisionHandle)>,
    events: Vec<ProposalEvent>,
}

impl Transaction {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn emit(&mut self, event: ProposalEvent) {
        self.events.push(event);
    }

    pub(super) fn absorb(&mut self, outcomes: Vec<DispatchOutcome>) {
        for outcome in outcomes {
            self.handles.push((outcome.key, outcome.handle));
            self.events.push(outcome.event);
        }
    }

    pub(super) fn append(&mut self, other: Transaction) {
        self.handles.extend(other.handles);
        self.events.extend(other.events);
    }

    /// Write the buffered handles, then publish the buffered events in order
    pub(super) fn commit(self, ledger: &mut ResultLedger, sink: &dyn EventSink) {
        for (key, handle) in self.handles {
            ledger.record_handle(key, handle);
        }
        for event in &self.events {
            sink.publish(event);
        }
    }
}
