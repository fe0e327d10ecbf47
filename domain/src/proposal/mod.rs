//! Proposal domain
//!
//! A [`Proposal`] moves through the stages of the configuration it was created
//! under and, once the final stage passes, is executed exactly once.
//!
//! ```text
//! InStage(0) ──advance──▶ InStage(1) ──▶ … ──▶ InFinalStage ──execute──▶ Executed
//! ```

pub mod entities;
pub mod value_objects;

pub use entities::{Proposal, ProposalStatus};
pub use value_objects::{
    Action, AllowFailureMap, ExecutionMode, ProposalId, SubDecisionHandle, SubDecisionId,
    TargetConfig,
};
