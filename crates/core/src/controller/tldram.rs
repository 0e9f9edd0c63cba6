//! TLDRAM controller specialization.
//!
//! Differs from the common controller in two ways:
//! 1. Write mode engages only on write-queue occupancy; an empty read queue
//!    is not a trigger, since reads are about to be turned into migrations.
//! 2. A scheduled READ is reclassified as a migration request (Extension,
//!    first command MIG with the migration timing set) before its command
//!    issues; it then completes through the pending deque like a read.

use super::{Controller, QueueSel};
use crate::request::ReqKind;
use crate::spec::{Spec, Variant};

/// Per-channel controller for tiered-latency DRAM.
pub struct TldramController {
    inner: Controller,
}

impl TldramController {
    pub fn new(spec: Spec, channel_id: usize) -> Self {
        assert!(
            matches!(spec.variant, Variant::Tldram(_)),
            "TLDRAM controller needs a TLDRAM spec"
        );
        Self {
            inner: Controller::new(spec, channel_id),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.inner
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.inner
    }

    pub fn enqueue(&mut self, req: crate::request::Request) -> bool {
        self.inner.enqueue(req)
    }

    pub fn pending_requests(&self) -> usize {
        self.inner.pending_requests()
    }

    /// Advances one DRAM cycle.
    pub fn tick(&mut self) {
        let c = &mut self.inner;
        c.clk += 1;
        c.stats.cycles += 1;
        c.stats.queue_len_sum += (c.readq.len() + c.writeq.len()) as u64;
        c.stats.read_queue_len_sum += c.readq.len() as u64;
        c.stats.write_queue_len_sum += c.writeq.len() as u64;

        c.serve_pending();
        c.tick_refresh();

        // Write mode follows occupancy alone: an empty read queue is normal
        // here because reads migrate.
        let hi = (0.8 * c.queue_max as f64) as usize;
        let lo = (0.2 * c.queue_max as f64) as usize;
        if !c.write_mode {
            if c.writeq.len() >= hi {
                c.write_mode = true;
            }
        } else if c.writeq.len() <= lo && !c.readq.is_empty() {
            c.write_mode = false;
        }

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

        // A read entering the core becomes a data migration.
        if sel == QueueSel::Read {
            let req = c.queue_mut(sel).get_mut(idx).expect("scheduled index");
            if req.kind == ReqKind::Read {
                req.kind = ReqKind::Extension;
            }
        }

        c.issue_for(sel, idx);
    }
}

impl std::fmt::Debug for TldramController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TldramController")
            .field("inner", &self.inner)
            .finish()
    }
}
