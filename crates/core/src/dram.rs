//! The DRAM organization tree and command-timing engine.
//!
//! One [`Node`] type models every level of every standard's hierarchy; the
//! tree for a channel is built from the spec's organization entry and is the
//! single source of truth for
//! 1. **Legality:** is command X at address A allowed at clock T
//!    ([`Node::check`]), and what must issue first ([`Node::decode`])?
//! 2. **Effects:** applying an issued command's state transitions and timing
//!    constraints ([`Node::update`]).
//!
//! Rows are not instantiated as nodes; a bank (or subarray) tracks its rows'
//! states in a map, which is empty exactly when the bank is closed.

use std::collections::HashMap;

use crate::spec::{Command, History, Spec, State, COMMAND_COUNT};

/// Reads `addr[i]`, treating anything past the end as a wildcard.
#[inline(always)]
pub(crate) fn addr_at(addr: &[i32], i: usize) -> i32 {
    addr.get(i).copied().unwrap_or(-1)
}

/// One node of the organization tree (channel, vault, rank, bank group,
/// bank, or subarray).
pub struct Node {
    /// Index into the spec's level list.
    pub level: usize,
    /// Index among siblings.
    pub id: usize,
    pub state: Option<State>,
    /// Row index to row state; present means open. Maintained by the level
    /// that owns rows (bank or subarray).
    pub row_state: HashMap<i32, State>,
    pub children: Vec<Node>,
    cur_clk: i64,
    /// Earliest clock at which each command may issue here; -1 means any.
    next: [i64; COMMAND_COUNT],
    /// Recent issue clocks per command, newest first, sized by the largest
    /// `dist` among the command's timing entries at this level.
    prev: [History; COMMAND_COUNT],
}

impl Node {
    /// Builds the tree for one channel (or vault), recursively sized from the
    /// spec's organization counts. Construction stops above the Row level or
    /// where the count is unspecified.
    pub fn channel(spec: &Spec, id: usize) -> Self {
        Self::build(spec, 0, id)
    }

    fn build(spec: &Spec, level: usize, id: usize) -> Self {
        let mut node = Self {
            level,
            id,
            state: spec.start[level],
            row_state: HashMap::new(),
            children: Vec::new(),
            cur_clk: 0,
            next: [-1; COMMAND_COUNT],
            prev: std::array::from_fn(|c| {
                History::new(spec.timing.history_depth(level, crate::spec::ALL_COMMANDS[c]))
            }),
        };

        let child_level = level + 1;
        if child_level == spec.row_level() {
            return node; // rows are tracked in row_state, not as nodes
        }
        let child_count = spec.org.count[child_level] as usize;
        if child_count == 0 {
            return node;
        }
        node.children = (0..child_count)
            .map(|i| Self::build(spec, child_level, i))
            .collect();
        node
    }

    /// Attaches an externally built child (used when channel/rank counts come
    /// from the system configuration rather than the org table).
    pub fn insert(&mut self, mut child: Node) {
        child.id = self.children.len();
        self.children.push(child);
    }

    /// Resolves `cmd` at `addr` into the command that must actually issue
    /// next: the first level whose prerequisite names a different command
    /// short-circuits the walk.
    pub fn decode(&self, spec: &Spec, cmd: Command, addr: &[i32]) -> Command {
        if let Some(f) = spec.prereq.get(self.level, cmd) {
            if let Some(required) = f(spec, self, cmd, addr) {
                return required; // prerequisite (or readiness) decided here
            }
        }

        let child_id = addr_at(addr, self.level + 1);
        if child_id < 0 || self.children.is_empty() {
            return cmd; // no prerequisite at any level
        }
        self.children[child_id as usize].decode(spec, cmd, addr)
    }

    /// True if `cmd` at `addr` violates no timing constraint at any level
    /// down to the command's scope.
    pub fn check(&self, spec: &Spec, cmd: Command, addr: &[i32], clk: i64) -> bool {
        let next = self.next[cmd.index()];
        if next != -1 && clk < next {
            return false;
        }

        let child_id = addr_at(addr, self.level + 1);
        if child_id < 0 || self.level == spec.scope_of(cmd) || self.children.is_empty() {
            return true;
        }
        self.children[child_id as usize].check(spec, cmd, addr, clk)
    }

    /// Earliest clock at which `cmd` at `addr` satisfies every constraint
    /// along the path to its scope level.
    pub fn get_next(&self, spec: &Spec, cmd: Command, addr: &[i32]) -> i64 {
        let mut next_clk = self.cur_clk.max(self.next[cmd.index()]);
        let mut node = self;
        let scope = spec.scope_of(cmd);
        let mut level = self.level;
        while level < scope && !node.children.is_empty() && addr_at(addr, level + 1) >= 0 {
            node = &node.children[addr_at(addr, level + 1) as usize];
            next_clk = next_clk.max(node.next[cmd.index()]);
            level += 1;
        }
        next_clk
    }

    /// True if `cmd` at `addr` would land on the currently open row.
    pub fn check_row_hit(&self, spec: &Spec, cmd: Command, addr: &[i32]) -> bool {
        if let Some(f) = spec.row_hit.get(self.level, cmd) {
            return f(spec, self, cmd, addr);
        }
        let child_id = addr_at(addr, self.level + 1);
        if child_id < 0 || self.children.is_empty() {
            return false;
        }
        self.children[child_id as usize].check_row_hit(spec, cmd, addr)
    }

    /// True if `cmd` at `addr` targets a bank (or subarray) with some row open.
    pub fn check_row_open(&self, spec: &Spec, cmd: Command, addr: &[i32]) -> bool {
        if let Some(f) = spec.row_open.get(self.level, cmd) {
            return f(spec, self, cmd, addr);
        }
        let child_id = addr_at(addr, self.level + 1);
        if child_id < 0 || self.children.is_empty() {
            return false;
        }
        self.children[child_id as usize].check_row_open(spec, cmd, addr)
    }

    /// Records that `cmd` was issued at `addr` at `clk`: applies the state
    /// effects down to the scope level, then propagates timing constraints
    /// through the subtree (sibling entries included).
    pub fn update(&mut self, spec: &Spec, cmd: Command, addr: &[i32], clk: i64) {
        self.cur_clk = clk;
        self.update_state(spec, cmd, addr);
        self.update_timing(spec, cmd, addr, clk);
    }

    fn update_state(&mut self, spec: &Spec, cmd: Command, addr: &[i32]) {
        if let Some(f) = spec.effect.get(self.level, cmd) {
            f(spec, self, addr);
        }
        if self.level == spec.scope_of(cmd) || self.children.is_empty() {
            return;
        }
        let child_id = addr_at(addr, self.level + 1);
        assert!(
            child_id >= 0,
            "update_state: wildcard address below scope of {}",
            cmd
        );
        self.children[child_id as usize].update_state(spec, cmd, addr);
    }

    fn update_timing(&mut self, spec: &Spec, cmd: Command, addr: &[i32], clk: i64) {
        // A sibling of the target node: only sibling constraints apply, and
        // the recursion stops here.
        if self.id as i32 != addr_at(addr, self.level) {
            for t in spec.timing.entries(self.level, cmd) {
                if !t.sibling {
                    continue;
                }
                debug_assert_eq!(t.dist, 1, "sibling constraints use dist 1");
                let future = clk + t.val;
                let slot = &mut self.next[t.cmd.index()];
                *slot = (*slot).max(future);
            }
            return;
        }

        // Target node: record the issue and apply same-node constraints.
        self.prev[cmd.index()].record(clk);
        for t in spec.timing.entries(self.level, cmd) {
            if t.sibling {
                continue;
            }
            let past = self.prev[cmd.index()].get(t.dist);
            if past < 0 {
                continue; // not enough history
            }
            let future = past + t.val;
            let slot = &mut self.next[t.cmd.index()];
            *slot = (*slot).max(future);
        }

        // Some commands carry constraints below their scope level, so the
        // walk continues to the leaves, fanning out over all children.
        for child in &mut self.children {
            child.update_timing(spec, cmd, addr, clk);
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("level", &self.level)
            .field("id", &self.id)
            .field("state", &self.state)
            .field("open_rows", &self.row_state.len())
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Level, StandardKind};

    // A minimal three-level device: one channel, two banks, rows, columns.
    fn mini_spec() -> Spec {
        use Command::*;
        const CH: usize = 0;
        const BA: usize = 1;

        let mut s = Spec::blank(
            StandardKind::Ddr3,
            "MINI",
            &[Level::Channel, Level::Bank, Level::Row, Level::Column],
        );
        s.org.count = vec![1, 2, 16, 8];
        s.start[BA] = Some(State::Closed);
        s.scope[Act.index()] = 2;
        s.scope[Pre.index()] = BA;
        s.scope[Rd.index()] = 3;

        s.prereq.set(BA, Rd, |_s, node, cmd, addr| match node.state {
            Some(State::Closed) => Some(Act),
            Some(State::Opened) => {
                if node.row_state.contains_key(&addr_at(addr, 2)) {
                    Some(cmd)
                } else {
                    Some(Pre)
                }
            }
            other => panic!("bank in unexpected state {:?}", other),
        });
        s.effect.set(BA, Act, |_s, node, addr| {
            node.state = Some(State::Opened);
            let _ = node.row_state.insert(addr_at(addr, 2), State::Opened);
        });
        s.effect.set(BA, Pre, |_s, node, _addr| {
            node.state = Some(State::Closed);
            node.row_state.clear();
        });

        s.timing.add(BA, Act, Rd, 5); // an nRCD stand-in
        s.timing.add(BA, Act, Act, 20);
        s.timing.add(CH, Rd, Rd, 4);
        s
    }

    #[test]
    fn build_shapes_tree_above_rows() {
        let spec = mini_spec();
        let ch = Node::channel(&spec, 0);
        assert_eq!(ch.children.len(), 2);
        assert!(ch.children[0].children.is_empty());
    }

    #[test]
    fn decode_walks_to_prerequisite() {
        let spec = mini_spec();
        let mut ch = Node::channel(&spec, 0);
        let addr = [0, 0, 3, 0];
        assert_eq!(ch.decode(&spec, Command::Rd, &addr), Command::Act);
        ch.update(&spec, Command::Act, &addr, 0);
        assert_eq!(ch.decode(&spec, Command::Rd, &addr), Command::Rd);
        // a different row now conflicts
        assert_eq!(ch.decode(&spec, Command::Rd, &[0, 0, 4, 0]), Command::Pre);
    }

    #[test]
    fn check_honors_next_tables() {
        let spec = mini_spec();
        let mut ch = Node::channel(&spec, 0);
        let addr = [0, 0, 3, 0];
        ch.update(&spec, Command::Act, &addr, 0);
        assert!(!ch.check(&spec, Command::Rd, &addr, 4));
        assert!(ch.check(&spec, Command::Rd, &addr, 5));
        assert_eq!(ch.get_next(&spec, Command::Rd, &addr), 5);
    }

    #[test]
    fn state_tracks_open_rows() {
        let spec = mini_spec();
        let mut ch = Node::channel(&spec, 0);
        ch.update(&spec, Command::Act, &[0, 1, 7, 0], 0);
        assert_eq!(ch.children[1].state, Some(State::Opened));
        assert!(ch.children[1].row_state.contains_key(&7));
        ch.update(&spec, Command::Pre, &[0, 1, -1, -1], 30);
        assert_eq!(ch.children[1].state, Some(State::Closed));
        assert!(ch.children[1].row_state.is_empty());
    }
}
