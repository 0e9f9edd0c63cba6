//! Per-channel memory controller.
//!
//! One controller owns a channel's node tree and drives it one DRAM cycle at
//! a time. Each [`Controller::tick`]:
//! 1. Serves the pending read at the head of the completion deque.
//! 2. Runs the refresh engine.
//! 3. Updates the write-mode hysteresis (enter at 80% write-queue occupancy
//!    or an empty read queue, leave at 20% with reads waiting).
//! 4. Picks a queue (other-queue requests outrank data), asks the scheduler
//!    for the best request, and either issues its next command or lets the
//!    row policy close a victim row speculatively.
//! 5. On the completing command (the one the request kind translates to),
//!    retires the request; reads move to the pending deque with
//!    `depart = clk + read_latency`.
//!
//! Everything is deterministic: same request stream and parameters, same
//! command sequence.

pub mod hmc;
pub mod refresh;
pub mod row_policy;
pub mod row_table;
pub mod scheduler;
pub mod tldram;
pub mod trace;

pub use hmc::VaultController;
pub use refresh::RefreshState;
pub use row_policy::{RowPolicy, RowPolicyKind};
pub use row_table::RowTable;
pub use scheduler::{Scheduler, SchedulerKind};
pub use tldram::TldramController;
pub use trace::CmdTrace;

use std::collections::VecDeque;

use crate::dram::{addr_at, Node};
use crate::request::{ReqKind, Request};
use crate::spec::{Command, Level, SalpKind, Spec, Variant};
use crate::stats::ControllerStats;

/// Which request queue a selection round works on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueueSel {
    Read,
    Write,
    Other,
}

/// Per-channel controller: queues, pending reads, policies, and the node tree.
pub struct Controller {
    /// This controller's own copy of the standard descriptor (thermal
    /// retiming mutates it channel-locally).
    pub spec: Spec,
    pub channel: Node,
    pub channel_id: usize,
    pub clk: i64,
    pub write_mode: bool,
    pub(crate) readq: Vec<Request>,
    pub(crate) writeq: Vec<Request>,
    pub(crate) otherq: Vec<Request>,
    pub(crate) pending: VecDeque<Request>,
    /// Capacity of each request queue.
    pub(crate) queue_max: usize,
    pub(crate) scheduler: Scheduler,
    pub(crate) row_policy: RowPolicy,
    pub(crate) row_table: RowTable,
    pub(crate) refresh: RefreshState,
    pub stats: ControllerStats,
    pub(crate) tracer: Option<CmdTrace>,
    pub(crate) print_cmd_trace: bool,
}

impl Controller {
    /// Builds a controller over a freshly constructed channel tree.
    pub fn new(spec: Spec, channel_id: usize) -> Self {
        let channel = Node::channel(&spec, channel_id);
        let ranks = channel.children.len();
        let refresh = RefreshState::new(&spec, ranks, channel_id);
        Self {
            spec,
            channel,
            channel_id,
            clk: 0,
            write_mode: false,
            readq: Vec::new(),
            writeq: Vec::new(),
            otherq: Vec::new(),
            pending: VecDeque::new(),
            queue_max: 32,
            scheduler: Scheduler::default(),
            row_policy: RowPolicy::default(),
            row_table: RowTable::new(),
            refresh,
            stats: ControllerStats::default(),
            tracer: None,
            print_cmd_trace: false,
        }
    }

    /// Overrides the scheduler policy.
    pub fn set_scheduler(&mut self, scheduler: Scheduler) {
        self.scheduler = scheduler;
    }

    /// Overrides the row policy.
    pub fn set_row_policy(&mut self, policy: RowPolicy) {
        self.row_policy = policy;
    }

    /// Overrides the per-queue capacity.
    pub fn set_queue_max(&mut self, max: usize) {
        self.queue_max = max;
    }

    /// Attaches per-rank command trace files.
    pub fn set_cmd_trace(&mut self, tracer: CmdTrace) {
        self.tracer = Some(tracer);
    }

    /// Enables the stdout command trace.
    pub fn set_print_cmd_trace(&mut self, on: bool) {
        self.print_cmd_trace = on;
    }

    fn queue(&self, sel: QueueSel) -> &Vec<Request> {
        match sel {
            QueueSel::Read => &self.readq,
            QueueSel::Write => &self.writeq,
            QueueSel::Other => &self.otherq,
        }
    }

    fn queue_mut(&mut self, sel: QueueSel) -> &mut Vec<Request> {
        match sel {
            QueueSel::Read => &mut self.readq,
            QueueSel::Write => &mut self.writeq,
            QueueSel::Other => &mut self.otherq,
        }
    }

    fn queue_for(&mut self, kind: ReqKind) -> &mut Vec<Request> {
        match kind {
            ReqKind::Read => &mut self.readq,
            ReqKind::Write => &mut self.writeq,
            _ => &mut self.otherq,
        }
    }

    /// Requests sitting anywhere in this controller (queues plus pending).
    pub fn pending_requests(&self) -> usize {
        self.readq.len() + self.writeq.len() + self.otherq.len() + self.pending.len()
    }

    /// Accepts a request, or returns `false` when the target queue is full
    /// (the caller retries next cycle).
    ///
    /// A READ whose address matches a queued WRITE short-circuits: the data
    /// is forwarded and the request completes next cycle without touching
    /// DRAM.
    pub fn enqueue(&mut self, mut req: Request) -> bool {
        if self.queue_for(req.kind).len() == self.queue_max {
            return false;
        }
        req.arrive = self.clk;

        if req.kind == ReqKind::Read && self.writeq.iter().any(|w| w.addr == req.addr) {
            req.depart = self.clk + 1;
            self.pending.push_back(req);
            return true;
        }

        self.queue_for(req.kind).push(req);
        true
    }

    /// Advances one DRAM cycle.
    pub fn tick(&mut self) {
        self.clk += 1;
        self.stats.cycles += 1;
        self.stats.queue_len_sum += (self.readq.len() + self.writeq.len()) as u64;
        self.stats.read_queue_len_sum += self.readq.len() as u64;
        self.stats.write_queue_len_sum += self.writeq.len() as u64;

        self.serve_pending();
        self.tick_refresh();
        self.update_write_mode();

        let sel = self.select_queue();
        let Some(idx) = self.schedule(self.queue(sel)) else {
            self.speculative_precharge();
            return;
        };
        if !self.is_ready(&self.queue(sel)[idx]) {
            self.speculative_precharge();
            return;
        }

        self.account_first_command(sel, idx);
        self.issue_for(sel, idx);
    }

    /// Step 1: completed reads leave through their callback, oldest first.
    fn serve_pending(&mut self) {
        if let Some(head) = self.pending.front() {
            if head.depart <= self.clk {
                let req = self.pending.pop_front().expect("pending head vanished");
                if req.depart - req.arrive > 1 {
                    // forwarded reads never touched DRAM; keep them out of
                    // the latency average
                    self.stats.read_latency_sum += (req.depart - req.arrive) as u64;
                }
                self.stats.reads_served += 1;
                req.complete();
            }
        }
    }

    /// Step 3: write-mode hysteresis.
    fn update_write_mode(&mut self) {
        let hi = (0.8 * self.queue_max as f64) as usize;
        let lo = (0.2 * self.queue_max as f64) as usize;
        if !self.write_mode {
            if self.writeq.len() >= hi || self.readq.is_empty() {
                self.write_mode = true;
                tracing::debug!(channel = self.channel_id, clk = self.clk, "enter write mode");
            }
        } else if self.writeq.len() <= lo && !self.readq.is_empty() {
            self.write_mode = false;
            tracing::debug!(channel = self.channel_id, clk = self.clk, "leave write mode");
        }
    }

    fn select_queue(&self) -> QueueSel {
        if !self.otherq.is_empty() {
            // refresh and power requests are rare; give them precedence
            QueueSel::Other
        } else if self.write_mode {
            QueueSel::Write
        } else {
            QueueSel::Read
        }
    }

    /// Nothing schedulable: let the row policy close a victim row.
    fn speculative_precharge(&mut self) {
        if let Some(victim) = self.victim(Command::Pre) {
            self.issue_cmd(Command::Pre, &victim);
        }
    }

    /// Step 6: on the first command of a data request, classify the access.
    fn account_first_command(&mut self, sel: QueueSel, idx: usize) {
        let req = &self.queue(sel)[idx];
        if !req.is_first_command {
            return;
        }
        let kind = req.kind;
        let core = req.coreid;
        let hit = self.is_row_hit(req);
        let open = self.is_row_open(req);
        let tx = self.spec.transaction_bytes();

        let req = self.queue_mut(sel).get_mut(idx).expect("scheduled index");
        req.is_first_command = false;
        match kind {
            ReqKind::Read => {
                if hit {
                    self.stats.record_read_hit(core);
                } else if open {
                    self.stats.record_read_conflict(core);
                } else {
                    self.stats.record_read_miss(core);
                }
                self.stats.read_transaction_bytes += tx;
            }
            ReqKind::Write => {
                if hit {
                    self.stats.record_write_hit(core);
                } else if open {
                    self.stats.record_write_conflict(core);
                } else {
                    self.stats.record_write_miss(core);
                }
                self.stats.write_transaction_bytes += tx;
            }
            _ => {}
        }
    }

    /// Steps 7 and 8: issue the request's next command, retiring the request
    /// if it was the completing one.
    fn issue_for(&mut self, sel: QueueSel, idx: usize) {
        let (cmd, addr_vec, kind) = {
            let req = &self.queue(sel)[idx];
            let cmd = self.get_first_cmd(req);
            (cmd, self.issue_addr(cmd, req), req.kind)
        };
        self.issue_cmd(cmd, &addr_vec);

        if cmd != self.spec.translate(kind) {
            return; // more commands to come for this request
        }

        let mut req = self.queue_mut(sel).remove(idx);
        match kind {
            // migrations return data like reads do
            ReqKind::Read | ReqKind::Extension => {
                req.depart = self.clk + self.spec.read_latency;
                self.pending.push_back(req);
            }
            ReqKind::Write => {
                self.stats.writes_retired += 1;
                req.complete();
            }
            _ => {}
        }
    }

    /// The command that must issue next to advance `req`.
    pub(crate) fn get_first_cmd(&self, req: &Request) -> Command {
        let cmd = self.spec.translate(req.kind);
        self.channel.decode(&self.spec, cmd, &req.addr_vec)
    }

    /// Address the command actually targets. Only SALP's PRE_OTHER redirects:
    /// it precharges the *other* open subarray of the request's bank.
    pub(crate) fn issue_addr(&self, cmd: Command, req: &Request) -> Vec<i32> {
        if cmd == Command::PreOther && matches!(self.spec.variant, Variant::Salp(_)) {
            return self.offending_subarray(&req.addr_vec);
        }
        req.addr_vec.clone()
    }

    fn offending_subarray(&self, addr: &[i32]) -> Vec<i32> {
        let sa_level = self
            .spec
            .level_index(Level::SubArray)
            .expect("PRE_OTHER outside a subarray hierarchy");
        let bank = self.node_at(addr, sa_level - 1);
        let own = addr_at(addr, sa_level);
        let mut offending = addr.to_vec();
        offending[sa_level] = bank
            .children
            .iter()
            .find(|sa| sa.id as i32 != own && sa.state == Some(crate::spec::State::Opened))
            .map_or(0, |sa| sa.id as i32);
        offending[self.spec.row_level()] = -1;
        offending
    }

    fn node_at(&self, addr: &[i32], level: usize) -> &Node {
        let mut node = &self.channel;
        for lev in 0..level {
            node = &node.children[addr_at(addr, lev + 1) as usize];
        }
        node
    }

    /// True if every command of `req` up to its scope passes timing checks
    /// right now.
    pub(crate) fn is_ready(&self, req: &Request) -> bool {
        let cmd = self.get_first_cmd(req);
        if cmd == Command::PreOther && matches!(self.spec.variant, Variant::Salp(_)) {
            let addr = self.offending_subarray(&req.addr_vec);
            return self.channel.check(&self.spec, cmd, &addr, self.clk);
        }
        self.channel.check(&self.spec, cmd, &req.addr_vec, self.clk)
    }

    /// True if `cmd` at `addr` passes timing checks right now.
    pub(crate) fn is_ready_cmd(&self, cmd: Command, addr: &[i32]) -> bool {
        self.channel.check(&self.spec, cmd, addr, self.clk)
    }

    /// True if the request targets the currently open row.
    pub(crate) fn is_row_hit(&self, req: &Request) -> bool {
        let cmd = self.spec.translate(req.kind);
        self.channel.check_row_hit(&self.spec, cmd, &req.addr_vec)
    }

    /// True if the request's bank (or subarray) has some row open.
    pub(crate) fn is_row_open(&self, req: &Request) -> bool {
        let cmd = self.spec.translate(req.kind);
        self.channel.check_row_open(&self.spec, cmd, &req.addr_vec)
    }

    /// Issues `cmd` at `addr`: asserts legality, applies node and row-table
    /// effects, and emits trace records.
    pub(crate) fn issue_cmd(&mut self, cmd: Command, addr: &[i32]) {
        assert!(
            self.is_ready_cmd(cmd, addr),
            "timing violation: {} at {:?}, clk {}",
            cmd,
            addr,
            self.clk
        );
        self.channel.update(&self.spec, cmd, addr, self.clk);
        self.row_table.update(&self.spec, cmd, addr, self.clk);
        self.stats.commands_issued += 1;
        if self.spec.is_refreshing(cmd) {
            self.stats.refreshes_issued += 1;
        }
        tracing::trace!(
            channel = self.channel_id,
            clk = self.clk,
            cmd = %cmd,
            addr = ?addr,
            "issue"
        );
        if let Some(tracer) = &mut self.tracer {
            if let Err(err) = tracer.record(&self.spec, self.clk, cmd, addr) {
                tracing::warn!(%err, "command trace write failed");
            }
        }
        if self.print_cmd_trace {
            trace::print_command(&self.spec, self.clk, cmd, addr);
        }
    }

    /// MASA tie-in used by the SALP tests: the subarray currently selected in
    /// a bank, if any.
    pub fn selected_subarray(&self, addr: &[i32]) -> Option<usize> {
        let sa_level = self.spec.level_index(Level::SubArray)?;
        if !matches!(self.spec.variant, Variant::Salp(SalpKind::Masa)) {
            return None;
        }
        let bank = self.node_at(addr, sa_level - 1);
        bank.children
            .iter()
            .find(|sa| sa.state == Some(crate::spec::State::Selected))
            .map(|sa| sa.id)
    }

    /// Read access to the refresh engine state (tests, diagnostics).
    pub fn refresh_state(&self) -> &RefreshState {
        &self.refresh
    }

    /// Read access to the open-row table (tests, diagnostics).
    pub fn row_table(&self) -> &RowTable {
        &self.row_table
    }

    /// Flushes command trace files (end of simulation).
    pub fn finish(&mut self) {
        if let Some(tracer) = &mut self.tracer {
            if let Err(err) = tracer.flush() {
                tracing::warn!(%err, "command trace flush failed");
            }
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("channel_id", &self.channel_id)
            .field("clk", &self.clk)
            .field("readq", &self.readq.len())
            .field("writeq", &self.writeq.len())
            .field("otherq", &self.otherq.len())
            .field("pending", &self.pending.len())
            .field("write_mode", &self.write_mode)
            .finish()
    }
}
