//! Approval/veto tally for one stage of a proposal

use crate::stage::{ResultKind, Stage};
use serde::{Deserialize, Serialize};

/// Counted verdicts for a proposal's current stage
///
/// # Example
///
/// ```
/// use staged_domain::{ResultKind, Tally};
///
/// let tally: Tally = [ResultKind::Approval, ResultKind::Veto, ResultKind::None]
///     .into_iter()
///     .collect();
/// assert_eq!(tally.approvals, 1);
/// assert_eq!(tally.vetoes, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    pub approvals: usize,
    pub vetoes: usize,
}

impl Tally {
    pub fn new(approvals: usize, vetoes: usize) -> Self {
        Self { approvals, vetoes }
    }

    /// Count one verdict; `None` counts toward nothing
    pub fn record(&mut self, kind: ResultKind) {
        match kind {
            ResultKind::Approval => self.approvals += 1,
            ResultKind::Veto => self.vetoes += 1,
            ResultKind::None => {}
        }
    }

    /// Whether this tally passes `stage`'s thresholds
    ///
    /// A met veto threshold blocks the stage regardless of approvals.
    pub fn thresholds_met(&self, stage: &Stage) -> bool {
        if stage.is_veto_gated() && self.vetoes >= stage.veto_threshold {
            return false;
        }
        self.approvals >= stage.approval_threshold
    }

    /// Visual summary, e.g. "[●●✕]"
    pub fn summary(&self) -> String {
        let mut summary = String::from("[");
        summary.extend(std::iter::repeat_n('●', self.approvals));
        summary.extend(std::iter::repeat_n('✕', self.vetoes));
        summary.push(']');
        summary
    }
}

impl FromIterator<ResultKind> for Tally {
    fn from_iter<I: IntoIterator<Item = ResultKind>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for kind in iter {
            tally.record(kind);
        }
        tally
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} approvals, {} vetoes", self.approvals, self.vetoes)
    }
}
