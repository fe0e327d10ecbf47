//! Clock port
//!
//! Every timing window is evaluated against the coordinator's own clock.
//! Each operation reads it once, so all checks within an operation agree.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
