//! Stage configuration domain
//!
//! A configuration is an ordered list of [`Stage`]s. Each stage names the
//! [`Body`]s that evaluate it, the timing windows a proposal must respect
//! while in that stage, and the approval/veto thresholds.
//!
//! ```text
//! last transition
//!      │── min_advance ──│
//!      │── vote_duration ───────│
//!      │── max_advance ─────────────────────────│
//!      ▼                 ▼      ▼               ▼
//!  ────●─────────────────●──────●───────────────●──── time
//!        (too early)       advance allowed       (expired)
//! ```

pub mod body;
pub mod configuration;
pub mod definition;

pub use body::{Body, ResultKind};
pub use configuration::{ConfigIndex, StageConfiguration, validate_stages};
pub use definition::{Stage, StageId, StageWindow};
