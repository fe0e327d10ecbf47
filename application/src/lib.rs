//! Application layer for staged-quorum
//!
//! This crate contains use cases, port definitions, in-memory stores, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod stores;
pub mod use_cases;

// Re-export commonly used types
pub use config::CoordinatorSettings;
pub use ports::{
    action_executor::{ActionExecutor, ExecutionError, ExecutionReceipt, ExecutionRequest},
    authorizer::Authorizer,
    body::{
        BodyCallFailure, BodyDirectory, CallBudget, Correlation, ResultCallback, SubDecisionBody,
        SubDecisionReceipt, SubDecisionRequest,
    },
    capability_probe::{Capability, CapabilityProbe},
    clock::Clock,
    event_sink::{EventSink, FanoutEventSink, MemoryEventSink, NoEventSink},
};
pub use stores::{LedgerKey, ProposalStore, ResultLedger, StageConfigStore};
pub use use_cases::coordinator::{
    AdvanceOutcome, CallContext, Coordinator, CoordinatorError, CoordinatorPorts,
    CoordinatorState, CreateProposalInput,
};
pub use use_cases::dispatch::{BudgetMeter, DispatchError};
