//! Stage quorum
//!
//! Each stage passes when enough of its bodies approve and not enough veto.
//! Vetoes only count in stages with a non-zero veto threshold.

pub mod tally;

pub use tally::Tally;
