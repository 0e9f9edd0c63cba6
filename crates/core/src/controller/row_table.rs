//! Open-row metadata.
//!
//! Maps each row group (the address prefix above the Row level, i.e. a bank
//! or a subarray) to its open row, consecutive hit count, and last access
//! clock. The scheduler's hit cap and the timeout row policy read this table;
//! the controller updates it on every issued command.

use std::collections::BTreeMap;

use crate::dram::addr_at;
use crate::spec::{Command, Spec};

/// Metadata for one open row.
#[derive(Clone, Copy, Debug)]
pub struct RowEntry {
    pub row: i32,
    pub hits: u64,
    /// Clock of the opening or most recent access.
    pub timestamp: i64,
}

/// Row-group keyed table of open rows. Ordered so victim scans are
/// deterministic.
#[derive(Debug, Default)]
pub struct RowTable {
    pub(crate) table: BTreeMap<Vec<i32>, RowEntry>,
}

impl RowTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn rowgroup(spec: &Spec, addr: &[i32]) -> Vec<i32> {
        (0..spec.row_level()).map(|i| addr_at(addr, i)).collect()
    }

    /// Applies an issued command.
    ///
    /// # Panics
    ///
    /// Panics if an accessing command finds no entry or a mismatched row, or
    /// if a closing command removes nothing; both are invariant violations.
    pub fn update(&mut self, spec: &Spec, cmd: Command, addr: &[i32], clk: i64) {
        let rowgroup = Self::rowgroup(spec, addr);
        let row = addr_at(addr, spec.row_level());

        if spec.is_opening(cmd) {
            // opening replaces whatever entry the group held
            let _ = self.table.insert(
                rowgroup.clone(),
                RowEntry {
                    row,
                    hits: 0,
                    timestamp: clk,
                },
            );
        }

        if spec.is_accessing(cmd) {
            let entry = self
                .table
                .get_mut(&rowgroup)
                .unwrap_or_else(|| panic!("access at {:?} with no open row entry", addr));
            assert_eq!(
                entry.row, row,
                "access at {:?} does not match open row {}",
                addr, entry.row
            );
            entry.hits += 1;
            entry.timestamp = clk;
        }

        if spec.is_closing(cmd) {
            // Auto-precharging CAS commands close exactly their own row group;
            // plain closing commands remove everything under their scope.
            let scope = if spec.is_accessing(cmd) {
                spec.row_level() - 1
            } else {
                spec.scope_of(cmd)
            };
            let prefix: Vec<i32> = (0..=scope).map(|i| addr_at(addr, i)).collect();
            let before = self.table.len();
            self.table.retain(|key, _| key[..=scope] != prefix[..]);
            assert!(
                self.table.len() < before,
                "closing command {} at {:?} removed no rows",
                cmd,
                addr
            );
        }
    }

    /// Consecutive hit count for the row addressed by `addr`; zero when the
    /// group is closed or (unless `to_opened_row`) a different row is open.
    pub fn hits(&self, spec: &Spec, addr: &[i32], to_opened_row: bool) -> u64 {
        let rowgroup = Self::rowgroup(spec, addr);
        let row = addr_at(addr, spec.row_level());
        match self.table.get(&rowgroup) {
            Some(e) if to_opened_row || e.row == row => e.hits,
            _ => 0,
        }
    }

    /// The open row of `addr`'s row group, if any.
    pub fn open_row(&self, spec: &Spec, addr: &[i32]) -> Option<i32> {
        self.table.get(&Self::rowgroup(spec, addr)).map(|e| e.row)
    }

    /// Number of open row groups.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standards::ddr3;

    fn spec() -> Spec {
        ddr3::spec("DDR3_2Gb_x8", "DDR3_1600K").unwrap()
    }

    #[test]
    fn open_access_close_lifecycle() {
        let spec = spec();
        let mut rt = RowTable::new();
        let addr = [0, 0, 2, 7, 0];

        rt.update(&spec, Command::Act, &addr, 0);
        assert_eq!(rt.open_row(&spec, &addr), Some(7));
        assert_eq!(rt.hits(&spec, &addr, false), 0);

        rt.update(&spec, Command::Rd, &addr, 11);
        rt.update(&spec, Command::Rd, &addr, 15);
        assert_eq!(rt.hits(&spec, &addr, false), 2);
        // a different row in the same bank reports zero hits
        assert_eq!(rt.hits(&spec, &[0, 0, 2, 8, 0], false), 0);
        assert_eq!(rt.hits(&spec, &[0, 0, 2, 8, 0], true), 2);

        rt.update(&spec, Command::Pre, &addr, 30);
        assert!(rt.is_empty());
    }

    #[test]
    fn auto_precharge_closes_own_group() {
        let spec = spec();
        let mut rt = RowTable::new();
        rt.update(&spec, Command::Act, &[0, 0, 2, 7, 0], 0);
        rt.update(&spec, Command::Act, &[0, 0, 3, 9, 0], 5);
        rt.update(&spec, Command::Rda, &[0, 0, 2, 7, 0], 11);
        assert_eq!(rt.len(), 1);
        assert_eq!(rt.open_row(&spec, &[0, 0, 3, 0, 0]), Some(9));
    }

    #[test]
    fn precharge_all_clears_rank_scope() {
        let spec = spec();
        let mut rt = RowTable::new();
        rt.update(&spec, Command::Act, &[0, 0, 2, 7, 0], 0);
        rt.update(&spec, Command::Act, &[0, 0, 3, 9, 0], 5);
        rt.update(&spec, Command::Prea, &[0, 0, -1, -1, -1], 40);
        assert!(rt.is_empty());
    }

    #[test]
    #[should_panic(expected = "removed no rows")]
    fn closing_nothing_is_an_invariant_violation() {
        let spec = spec();
        let mut rt = RowTable::new();
        rt.update(&spec, Command::Act, &[0, 0, 2, 7, 0], 0);
        rt.update(&spec, Command::Pre, &[0, 1, 0, -1, -1], 10);
    }
}
