//! In-memory stores owned by the coordinator
//!
//! - [`StageConfigStore`]: versioned, append-only stage configurations
//! - [`ProposalStore`]: proposal records
//! - [`ResultLedger`]: per-body verdicts and sub-decision handles
//!
//! All three are plain serializable data; durability is the job of whoever
//! snapshots the coordinator.

pub mod proposal_store;
pub mod result_ledger;
pub mod stage_config_store;

pub use proposal_store::ProposalStore;
pub use result_ledger::{LedgerKey, ResultLedger};
pub use stage_config_store::StageConfigStore;
