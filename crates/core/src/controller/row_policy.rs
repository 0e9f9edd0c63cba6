//! Row precharge policies.
//!
//! When the scheduler finds nothing ready to issue, the row policy may name a
//! victim row to close speculatively:
//! - **Closed / ClosedAp** close any open row whose precharge is ready (the
//!   AP variant exists for configuration symmetry; victim selection is
//!   identical).
//! - **Opened** never speculates.
//! - **Timeout** closes rows that have idled at least `timeout` cycles.

use super::Controller;
use crate::spec::Command;

/// Row policy selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowPolicyKind {
    Closed,
    ClosedAp,
    Opened,
    Timeout,
}

/// Row policy state.
#[derive(Clone, Copy, Debug)]
pub struct RowPolicy {
    pub kind: RowPolicyKind,
    /// Idle cycles before Timeout closes a row.
    pub timeout: i64,
}

impl Default for RowPolicy {
    fn default() -> Self {
        Self {
            kind: RowPolicyKind::Opened,
            timeout: 50,
        }
    }
}

impl Controller {
    /// Address of a row group to close speculatively with `cmd`, if the
    /// policy wants one and its timing checks pass.
    pub(crate) fn victim(&self, cmd: Command) -> Option<Vec<i32>> {
        match self.row_policy.kind {
            RowPolicyKind::Opened => None,
            RowPolicyKind::Closed | RowPolicyKind::ClosedAp => self
                .row_table
                .table
                .keys()
                .find(|key| self.is_ready_cmd(cmd, key))
                .cloned(),
            RowPolicyKind::Timeout => self
                .row_table
                .table
                .iter()
                .find(|(key, entry)| {
                    self.clk - entry.timestamp >= self.row_policy.timeout
                        && self.is_ready_cmd(cmd, key)
                })
                .map(|(key, _)| key.clone()),
        }
    }
}
