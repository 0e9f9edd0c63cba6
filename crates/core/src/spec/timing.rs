//! Timing constraints between commands.
//!
//! Every standard is encoded as a table of [`TimingEntry`] rows per
//! `(level, command)`: after command `A` is issued at a node, each entry in
//! `A`'s row forbids its `cmd` on that node (or on each sibling, for
//! `sibling` entries) until `val` cycles have elapsed. `dist > 1` gates on
//! the `dist`-th most recent issue of `A`, which is how the four-activate
//! window (tFAW, `dist = 4`) is expressed.

use super::command::{Command, COMMAND_COUNT};

/// One timing constraint attached to a prior command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingEntry {
    /// The command being gated.
    pub cmd: Command,
    /// Which past issue of the prior command the gate counts from (1 = most recent).
    pub dist: usize,
    /// Minimum separation in DRAM cycles.
    pub val: i64,
    /// Constrains sibling nodes instead of the issuing node. Always `dist == 1`.
    pub sibling: bool,
}

/// Per-(level, command) table of timing entries.
pub struct TimingTable {
    rows: Vec<[Vec<TimingEntry>; COMMAND_COUNT]>,
}

impl TimingTable {
    /// Creates an empty table for a hierarchy of `levels` levels.
    pub fn new(levels: usize) -> Self {
        Self {
            rows: (0..levels)
                .map(|_| std::array::from_fn(|_| Vec::new()))
                .collect(),
        }
    }

    /// Adds a same-node constraint: at `level`, `later` must wait `val` cycles
    /// after the most recent issue of `prior`.
    pub fn add(&mut self, level: usize, prior: Command, later: Command, val: i64) {
        self.add_dist(level, prior, later, 1, val);
    }

    /// Adds a windowed constraint counting from the `dist`-th most recent issue
    /// of `prior` (e.g. tFAW with `dist = 4`).
    pub fn add_dist(&mut self, level: usize, prior: Command, later: Command, dist: usize, val: i64) {
        assert!(dist >= 1, "timing distance must be at least 1");
        self.rows[level][prior.index()].push(TimingEntry {
            cmd: later,
            dist,
            val,
            sibling: false,
        });
    }

    /// Adds a sibling constraint: issuing `prior` at one node gates `later` on
    /// every sibling at the same level.
    pub fn add_sibling(&mut self, level: usize, prior: Command, later: Command, val: i64) {
        self.rows[level][prior.index()].push(TimingEntry {
            cmd: later,
            dist: 1,
            val,
            sibling: true,
        });
    }

    /// Entries attached to `cmd` at `level`.
    #[inline]
    pub fn entries(&self, level: usize, cmd: Command) -> &[TimingEntry] {
        &self.rows[level][cmd.index()]
    }

    /// Largest `dist` among the non-sibling entries of `cmd` at `level`,
    /// i.e. the issue-history depth a node must keep for `cmd`.
    pub fn history_depth(&self, level: usize, cmd: Command) -> usize {
        self.rows[level][cmd.index()]
            .iter()
            .map(|t| t.dist)
            .max()
            .unwrap_or(0)
    }

    /// Number of hierarchy levels this table covers.
    pub fn levels(&self) -> usize {
        self.rows.len()
    }
}

/// Bounded newest-first history of issue clocks for one command at one node.
///
/// Sized by the largest `dist` in the command's timing entries; empty slots
/// hold the "never issued" sentinel.
#[derive(Clone, Debug)]
pub struct History {
    slots: Vec<i64>,
}

impl History {
    /// The "never issued" clock value.
    pub const NEVER: i64 = -1;

    /// A history of `depth` slots (zero depth records nothing).
    pub fn new(depth: usize) -> Self {
        Self {
            slots: vec![Self::NEVER; depth],
        }
    }

    /// Records an issue at `clk`, evicting the oldest slot.
    pub fn record(&mut self, clk: i64) {
        if self.slots.is_empty() {
            return;
        }
        self.slots.rotate_right(1);
        self.slots[0] = clk;
    }

    /// Clock of the `dist`-th most recent issue (1 = newest), or
    /// [`History::NEVER`] if not enough history.
    #[inline]
    pub fn get(&self, dist: usize) -> i64 {
        self.slots.get(dist - 1).copied().unwrap_or(Self::NEVER)
    }

    /// True if this history records nothing.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_newest_first() {
        let mut h = History::new(4);
        assert_eq!(h.get(1), History::NEVER);
        h.record(10);
        h.record(20);
        h.record(30);
        assert_eq!(h.get(1), 30);
        assert_eq!(h.get(2), 20);
        assert_eq!(h.get(3), 10);
        assert_eq!(h.get(4), History::NEVER);
    }

    #[test]
    fn history_bounded() {
        let mut h = History::new(2);
        h.record(1);
        h.record(2);
        h.record(3);
        assert_eq!(h.get(1), 3);
        assert_eq!(h.get(2), 2);
        // depth 2: the oldest issue is gone
        assert_eq!(h.get(3), History::NEVER);
    }

    #[test]
    fn zero_depth_history_records_nothing() {
        let mut h = History::new(0);
        h.record(5);
        assert!(h.is_empty());
        assert_eq!(h.get(1), History::NEVER);
    }

    #[test]
    fn table_tracks_max_dist() {
        let mut t = TimingTable::new(3);
        t.add(1, Command::Act, Command::Act, 5);
        t.add_dist(1, Command::Act, Command::Act, 4, 24);
        t.add_sibling(1, Command::Rd, Command::Rd, 6);
        assert_eq!(t.history_depth(1, Command::Act), 4);
        assert_eq!(t.history_depth(1, Command::Rd), 1);
        assert_eq!(t.history_depth(0, Command::Act), 0);
    }
}
