//! Domain layer for staged-quorum
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns, and
//! performs no I/O: every check here is a pure function of its inputs.
//!
//! # Core Concepts
//!
//! ## Stages
//!
//! A proposal is evaluated by an ordered sequence of stages. Each stage has a
//! set of bodies, timing windows and approval/veto thresholds. Configurations
//! are immutable and versioned; a proposal keeps the version it was created with.
//!
//! ## Quorum
//!
//! A stage passes when its [`Tally`] meets the approval threshold and, for
//! veto-gated stages, stays below the veto threshold after the vote ends.

pub mod config;
pub mod core;
pub mod events;
pub mod proposal;
pub mod quorum;
pub mod stage;

// Re-export commonly used types
pub use config::OutputFormat;
pub use core::{
    error::{ConfigurationError, ProposalError},
    identity::Identity,
    permission::Permission,
};
pub use events::ProposalEvent;
pub use proposal::{
    Action, AllowFailureMap, ExecutionMode, Proposal, ProposalId, ProposalStatus,
    SubDecisionHandle, SubDecisionId, TargetConfig,
};
pub use quorum::Tally;
pub use stage::{
    Body, ConfigIndex, ResultKind, Stage, StageConfiguration, StageId, StageWindow,
    validate_stages,
};
