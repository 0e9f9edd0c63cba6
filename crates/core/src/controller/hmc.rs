//! HMC vault controller.
//!
//! The interface the cube's logic layer drives, with the link and packet
//! framing kept outside:
//! 1. **Request-id bookkeeping.** `enqueue` takes the logic layer's request
//!    id; completions surface the id through a response queue the logic
//!    layer drains, instead of a callback contract.
//! 2. **Bursts.** A payload larger than one transaction carries a
//!    `burst_count`; the completing CAS must issue that many times before
//!    the request retires.
//! 3. **Ideal mode.** With no-DRAM-latency set, timing propagation through
//!    the vault tree is bypassed, but only one burst moves per cycle, so
//!    TSV bus throughput still bounds the system.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{Controller, QueueSel};
use crate::request::{ReqKind, Request};
use crate::spec::{Spec, Variant};

/// Per-vault controller for HMC stacks.
pub struct VaultController {
    ctrl: Controller,
    no_dram_latency: bool,
    responses: Rc<RefCell<VecDeque<u64>>>,
}

impl VaultController {
    pub fn new(spec: Spec, vault_id: usize) -> Self {
        assert!(
            matches!(spec.variant, Variant::Hmc),
            "vault controller needs an HMC spec"
        );
        Self {
            ctrl: Controller::new(spec, vault_id),
            no_dram_latency: false,
            responses: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Bypass DRAM timing, keeping only bus occupancy.
    pub fn set_no_dram_latency(&mut self, on: bool) {
        self.no_dram_latency = on;
    }

    pub fn controller(&self) -> &Controller {
        &self.ctrl
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.ctrl
    }

    pub fn pending_requests(&self) -> usize {
        self.ctrl.pending_requests()
    }

    /// Accepts a request on behalf of the logic layer. The id comes back out
    /// of [`VaultController::pop_response`] when the data (or write
    /// acknowledgment) is ready.
    pub fn enqueue(&mut self, id: u64, mut req: Request) -> bool {
        debug_assert!(req.burst_count >= 1, "burst count must be positive");
        if matches!(req.kind, ReqKind::Read | ReqKind::Write) {
            let responses = Rc::clone(&self.responses);
            let inner = req.callback.take();
            req.callback = Some(Rc::new(move |done: &Request| {
                responses.borrow_mut().push_back(id);
                if let Some(cb) = &inner {
                    cb(done);
                }
            }));
        }
        self.ctrl.enqueue(req)
    }

    /// Next completed request id, if any.
    pub fn pop_response(&mut self) -> Option<u64> {
        self.responses.borrow_mut().pop_front()
    }

    /// Advances one DRAM cycle.
    pub fn tick(&mut self) {
        let c = &mut self.ctrl;
        c.clk += 1;
        c.stats.cycles += 1;
        c.stats.queue_len_sum += (c.readq.len() + c.writeq.len()) as u64;
        c.stats.read_queue_len_sum += c.readq.len() as u64;
        c.stats.write_queue_len_sum += c.writeq.len() as u64;

        c.serve_pending();

        if self.no_dram_latency {
            self.tick_ideal();
            return;
        }

        let c = &mut self.ctrl;
        c.tick_refresh();
        c.update_write_mode();

        let sel = c.select_queue();
        let Some(idx) = c.schedule(c.queue(sel)) else {
            c.speculative_precharge();
            return;
        };
        if !c.is_ready(&c.queue(sel)[idx]) {
            c.speculative_precharge();
            return;
        }

        c.account_first_command(sel, idx);

        let (cmd, addr_vec, kind) = {
            let req = &c.queue(sel)[idx];
            let cmd = c.get_first_cmd(req);
            (cmd, req.addr_vec.clone(), req.kind)
        };
        c.issue_cmd(cmd, &addr_vec);

        if cmd != c.spec.translate(kind) {
            return;
        }

        // One CAS moves one burst; the request retires on the last one.
        let req = c.queue_mut(sel).get_mut(idx).expect("scheduled index");
        if req.burst_count > 1 {
            req.burst_count -= 1;
            return;
        }
        let mut req = c.queue_mut(sel).remove(idx);
        match kind {
            ReqKind::Read => {
                req.depart = c.clk + c.spec.read_latency;
                c.pending.push_back(req);
            }
            ReqKind::Write => {
                c.stats.writes_retired += 1;
                req.complete();
            }
            _ => {}
        }
    }

    /// Ideal mode: no array timing, one burst of bus traffic per cycle.
    fn tick_ideal(&mut self) {
        let c = &mut self.ctrl;
        let sel = if !c.readq.is_empty() {
            QueueSel::Read
        } else if !c.writeq.is_empty() {
            QueueSel::Write
        } else {
            return;
        };
        let req = &mut c.queue_mut(sel)[0];
        if req.burst_count > 1 {
            req.burst_count -= 1;
            return;
        }
        let mut req = c.queue_mut(sel).remove(0);
        match req.kind {
            ReqKind::Read => {
                req.depart = c.clk + 1;
                c.pending.push_back(req);
            }
            ReqKind::Write => {
                c.stats.writes_retired += 1;
                req.complete();
            }
            _ => {}
        }
    }
}

impl std::fmt::Debug for VaultController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultController")
            .field("inner", &self.ctrl)
            .field("no_dram_latency", &self.no_dram_latency)
            .finish()
    }
}
