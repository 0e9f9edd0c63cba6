//! Request scheduling policies.
//!
//! [`Controller::schedule`] selects the best request in a queue:
//! 1. **Fcfs** schedules chronologically.
//! 2. **FrFcfs** prefers requests whose commands pass every timing check
//!    right now, then falls back to arrival order.
//! 3. **FrFcfsCap** additionally stops counting a request as ready once its
//!    row has absorbed `cap` consecutive hits, so one hot row cannot
//!    monopolize the row buffer.
//! 4. **FrFcfsPriorHit** ranks row hits above readiness, and protects queued
//!    hits: it never selects a request whose first command would precharge a
//!    bank that still has row hits waiting.

use super::Controller;
use crate::request::Request;
use crate::spec::Command;

/// Scheduling policy selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerKind {
    Fcfs,
    FrFcfs,
    FrFcfsCap,
    FrFcfsPriorHit,
}

/// Scheduler state: the policy and the hit cap used by [`SchedulerKind::FrFcfsCap`].
#[derive(Clone, Copy, Debug)]
pub struct Scheduler {
    pub kind: SchedulerKind,
    pub cap: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            kind: SchedulerKind::FrFcfsCap,
            cap: 16,
        }
    }
}

impl Controller {
    /// Index of the request the policy would serve next, or `None` for an
    /// empty queue (or, under PriorHit, when every candidate would evict an
    /// about-to-hit row).
    pub(crate) fn schedule(&self, q: &[Request]) -> Option<usize> {
        if q.is_empty() {
            return None;
        }
        if self.scheduler.kind != SchedulerKind::FrFcfsPriorHit {
            let mut head = 0;
            for idx in 1..q.len() {
                head = self.compare(q, head, idx);
            }
            return Some(head);
        }
        self.schedule_prior_hit(q)
    }

    /// Winner between two queue slots under the active policy.
    fn compare(&self, q: &[Request], a: usize, b: usize) -> usize {
        let (ra, rb) = (&q[a], &q[b]);
        match self.scheduler.kind {
            SchedulerKind::Fcfs => {}
            SchedulerKind::FrFcfs => {
                let ready_a = self.is_ready(ra);
                let ready_b = self.is_ready(rb);
                if ready_a != ready_b {
                    return if ready_a { a } else { b };
                }
            }
            SchedulerKind::FrFcfsCap => {
                let cap = self.scheduler.cap;
                let ready_a =
                    self.is_ready(ra) && self.row_table.hits(&self.spec, &ra.addr_vec, false) <= cap;
                let ready_b =
                    self.is_ready(rb) && self.row_table.hits(&self.spec, &rb.addr_vec, false) <= cap;
                if ready_a != ready_b {
                    return if ready_a { a } else { b };
                }
            }
            SchedulerKind::FrFcfsPriorHit => {
                let ready_a = self.is_ready(ra) && self.is_row_hit(ra);
                let ready_b = self.is_ready(rb) && self.is_row_hit(rb);
                if ready_a != ready_b {
                    return if ready_a { a } else { b };
                }
            }
        }
        if ra.arrive <= rb.arrive {
            a
        } else {
            b
        }
    }

    fn schedule_prior_hit(&self, q: &[Request]) -> Option<usize> {
        let mut head = 0;
        for idx in 1..q.len() {
            head = self.compare(q, head, idx);
        }
        if self.is_ready(&q[head]) && self.is_row_hit(&q[head]) {
            return Some(head);
        }

        // Row groups (bank or subarray) that still have hits queued. The
        // closing command's scope defines the group width.
        let scope = self.spec.scope_of(Command::Pre);
        let rowgroup = |req: &Request| req.addr_vec[..=scope].to_vec();
        let hit_groups: Vec<Vec<i32>> = q
            .iter()
            .filter(|req| self.is_row_hit(req))
            .map(&rowgroup)
            .collect();

        // Never pick a request whose first command would precharge a group
        // with queued hits; among the rest, fall back to FR-FCFS.
        let mut best: Option<usize> = None;
        for (idx, req) in q.iter().enumerate() {
            if !self.is_row_hit(req) && self.is_row_open(req) {
                let group = rowgroup(req);
                if hit_groups.contains(&group) {
                    continue;
                }
            }
            best = Some(match best {
                None => idx,
                Some(b) => self.compare_fr_fcfs(q, b, idx),
            });
        }
        best
    }

    fn compare_fr_fcfs(&self, q: &[Request], a: usize, b: usize) -> usize {
        let ready_a = self.is_ready(&q[a]);
        let ready_b = self.is_ready(&q[b]);
        if ready_a != ready_b {
            return if ready_a { a } else { b };
        }
        if q[a].arrive <= q[b].arrive {
            a
        } else {
            b
        }
    }
}
