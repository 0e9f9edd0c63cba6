//! Refresh scheduling.
//!
//! Every standard gets the base behavior: when `nREFI` (or `nREFIpb`) cycles
//! have passed since the last refresh, inject one REFRESH request per rank
//! (or per rank with a round-robin bank pointer) into the other-queue, where
//! it outranks data requests.
//!
//! The DSARP family layers three mechanisms on top:
//! 1. **Skip (DARP):** a per-bank refresh may be skipped while reads are
//!    waiting, paid for with a backlog credit bounded in [-8, +8].
//! 2. **Early pull-in:** during read mode, banks that are deeply behind
//!    schedule get opportunistic refreshes on idle banks.
//! 3. **WRP:** on the write-mode rising edge, the lowest-demand bank of each
//!    rank is refreshed while writes drain elsewhere.
//!
//! SARP additionally rotates a per-(rank, bank) subarray pointer so
//! consecutive per-bank refreshes land on different subarrays.
//!
//! The thermal retiming hook fires from here as well; it is a no-op for
//! every standard but ALDRAM.

use super::Controller;
use crate::dram::addr_at;
use crate::request::{ReqKind, Request};
use crate::spec::{DsarpKind, Level, Spec, Temp, Variant};

/// Credit ceiling: how far ahead of schedule a bank may run.
const BACKLOG_MAX: i32 = 8;
/// Credit floor: how far behind schedule a bank may fall before refresh is
/// forced.
const BACKLOG_MIN: i32 = -8;
/// Early pull-in fires only for banks behind this credit level.
const BACKLOG_EARLY_PULL: i32 = -6;

/// Per-channel refresh engine state.
#[derive(Debug)]
pub struct RefreshState {
    clk: i64,
    refreshed: i64,
    /// Round-robin bank pointer per rank.
    bank_ref_counters: Vec<usize>,
    /// Refresh credits per (rank, bank): positive is ahead of schedule.
    backlog: Vec<Vec<i32>>,
    /// Next subarray to refresh per (rank, bank) (SARP/DSARP).
    sa_counters: Vec<Vec<usize>>,
    ranks: usize,
    banks: usize,
    subarrays: usize,
    rank_level: Option<usize>,
    bank_level: Option<usize>,
    sa_level: Option<usize>,
    /// Write mode seen on the previous tick, for edge detection.
    prev_write_mode: bool,
    /// Deterministic xorshift64* state for idle-bank picks.
    rng: u64,
}

impl RefreshState {
    pub fn new(spec: &Spec, channel_ranks: usize, channel_id: usize) -> Self {
        let rank_level = spec.level_index(Level::Rank);
        let bank_level = spec.level_index(Level::Bank);
        let sa_level = spec.level_index(Level::SubArray);

        let ranks = if rank_level.is_some() { channel_ranks } else { 1 };
        let banks = bank_level.map_or(1, |i| {
            // HMC folds bank groups into the flat bank count.
            let groups = spec
                .level_index(Level::BankGroup)
                .map_or(1, |g| spec.org.count[g].max(1));
            (spec.org.count[i].max(1) * groups) as usize
        });
        let subarrays = sa_level.map_or(1, |i| spec.org.count[i].max(1) as usize);

        Self {
            clk: 0,
            refreshed: 0,
            bank_ref_counters: vec![0; ranks],
            backlog: vec![vec![0; banks]; ranks],
            sa_counters: vec![vec![0; banks]; ranks],
            ranks,
            banks,
            subarrays,
            rank_level,
            bank_level,
            sa_level,
            prev_write_mode: false,
            rng: 0x9E37_79B9_7F4A_7C15 ^ (channel_id as u64 + 1),
        }
    }

    fn next_rand(&mut self) -> u64 {
        // xorshift64*: deterministic replacement for the usual libc rand()
        let mut x = self.rng;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Refresh credit of one (rank, bank), for tests and diagnostics.
    pub fn backlog(&self, rank: usize, bank: usize) -> i32 {
        self.backlog[rank][bank]
    }
}

impl Controller {
    /// One refresh-engine cycle; called from the controller tick before any
    /// command selection.
    pub(crate) fn tick_refresh(&mut self) {
        self.refresh.clk += 1;

        let interval = if self.spec.ref_rank {
            self.spec.speed.n_refi
        } else {
            self.spec.speed.n_refi_pb
        };
        assert!(interval > 0, "{}: refresh interval unset", self.spec.name);

        if let Variant::Dsarp(kind) = self.spec.variant {
            if matches!(kind, DsarpKind::Darp | DsarpKind::Dsarp) {
                // Write-refresh parallelization fires on the rising edge of
                // the controller's write mode.
                if !self.refresh.prev_write_mode && self.write_mode {
                    self.refresh_wrp();
                }
                self.refresh.prev_write_mode = self.write_mode;
                self.refresh_early_inject();
            }
        }

        if self.refresh.clk - self.refresh.refreshed >= interval {
            let rank_level = self.spec.ref_rank;
            self.inject_refresh(rank_level);
            self.spec.refresh_timing(Temp::Cold);
        }
    }

    fn inject_refresh(&mut self, rank_level: bool) {
        if rank_level {
            for r in 0..self.refresh.ranks {
                self.refresh_target(r as i32, -1, -1);
            }
        } else if matches!(self.spec.variant, Variant::Dsarp(_)) {
            self.inject_refresh_per_bank_dsarp();
        } else {
            // Plain per-bank refresh: all ranks at once, bank pointer
            // advancing round-robin.
            for r in 0..self.refresh.ranks {
                let b = self.refresh.bank_ref_counters[r];
                self.refresh_target(r as i32, b as i32, -1);
                self.refresh.bank_ref_counters[r] = (b + 1) % self.refresh.banks;
            }
        }
        self.refresh.refreshed = self.refresh.clk;
    }

    fn inject_refresh_per_bank_dsarp(&mut self) {
        let Variant::Dsarp(kind) = self.spec.variant else {
            unreachable!("DSARP per-bank refresh outside DSARP variant");
        };
        for r in 0..self.refresh.ranks {
            let bid = self.refresh.bank_ref_counters[r];

            // Behind schedule by one refresh until it actually issues.
            self.refresh.backlog[r][bid] -= 1;
            self.refresh.bank_ref_counters[r] = (bid + 1) % self.refresh.banks;

            if matches!(kind, DsarpKind::Darp | DsarpKind::Dsarp) {
                let pending_ref = self.otherq.iter().any(|req| req.kind == ReqKind::Refresh);
                let mut ref_now = !pending_ref && self.readq.is_empty();
                if self.refresh.backlog[r][bid] <= BACKLOG_MIN {
                    ref_now = true;
                }
                if !ref_now {
                    continue; // skip, repaid later
                }
            }

            let sa = self.refresh.sa_counters[r][bid];
            self.refresh_target(r as i32, bid as i32, sa as i32);
            self.refresh.backlog[r][bid] += 1;
            self.refresh.sa_counters[r][bid] = (sa + 1) % self.refresh.subarrays;
        }
    }

    /// During read mode, pull a refresh into an idle bank that is deeply
    /// behind schedule.
    fn refresh_early_inject(&mut self) {
        if self.write_mode {
            return;
        }
        let (ranks, banks) = (self.refresh.ranks, self.refresh.banks);
        let rank_level = self.refresh.rank_level.unwrap_or(0);
        let bank_level = self.refresh.bank_level.unwrap_or(0);

        let mut occupied = vec![false; ranks * banks];
        for req in &self.readq {
            let r = addr_at(&req.addr_vec, rank_level);
            let b = addr_at(&req.addr_vec, bank_level);
            if r >= 0 && b >= 0 {
                occupied[r as usize * banks + b as usize] = true;
            }
        }

        for r in 0..ranks {
            let start = (self.refresh.next_rand() as usize) % banks;
            for off in 0..banks {
                let b = (start + off) % banks;
                if occupied[r * banks + b] {
                    continue;
                }
                let pending = self.otherq.iter().any(|req| {
                    req.kind == ReqKind::Refresh
                        && addr_at(&req.addr_vec, rank_level) == r as i32
                        && addr_at(&req.addr_vec, bank_level) == b as i32
                });
                if pending {
                    continue;
                }
                // Only pull in when this bank is nearly out of credits.
                if self.refresh.backlog[r][b] >= BACKLOG_EARLY_PULL
                    || self.otherq.len() >= self.queue_max
                {
                    continue;
                }
                let sa = self.refresh.sa_counters[r][b];
                self.refresh_target(r as i32, b as i32, sa as i32);
                self.refresh.backlog[r][b] += 1;
                self.refresh.sa_counters[r][b] = (sa + 1) % self.refresh.subarrays;
                break;
            }
        }
    }

    /// Write-refresh parallelization: refresh the lowest-demand bank of each
    /// rank while the controller drains writes.
    fn refresh_wrp(&mut self) {
        let (ranks, banks) = (self.refresh.ranks, self.refresh.banks);
        let rank_level = self.refresh.rank_level.unwrap_or(0);
        let bank_level = self.refresh.bank_level.unwrap_or(0);

        for r in 0..ranks {
            let pending = self.otherq.iter().any(|req| {
                req.kind == ReqKind::Refresh && addr_at(&req.addr_vec, rank_level) == r as i32
            });
            if pending {
                continue;
            }

            // Demand per bank: writes first (a rank with no writes is skipped,
            // WRP only pays off when writes will occupy the rank), then reads.
            let mut demand: Vec<(u32, usize)> = (0..banks).map(|b| (0, b)).collect();
            let mut total_writes = 0u32;
            for req in &self.writeq {
                if addr_at(&req.addr_vec, rank_level) == r as i32 {
                    let b = addr_at(&req.addr_vec, bank_level);
                    if b >= 0 {
                        demand[b as usize].0 += 1;
                        total_writes += 1;
                    }
                }
            }
            if total_writes == 0 {
                continue;
            }
            for req in &self.readq {
                if addr_at(&req.addr_vec, rank_level) == r as i32 {
                    let b = addr_at(&req.addr_vec, bank_level);
                    if b >= 0 {
                        demand[b as usize].0 += 1;
                    }
                }
            }

            demand.sort();
            let least = demand[0].0;
            let ties = demand.iter().take_while(|d| d.0 == least).count();
            let pick = if ties <= 1 {
                0
            } else {
                (self.refresh.next_rand() as usize) % ties
            };
            let bid = demand[pick].1;

            if self.refresh.backlog[r][bid] < BACKLOG_MAX && self.otherq.len() < self.queue_max {
                let sa = self.refresh.sa_counters[r][bid];
                self.refresh_target(r as i32, bid as i32, sa as i32);
                self.refresh.backlog[r][bid] += 1;
                self.refresh.sa_counters[r][bid] = (sa + 1) % self.refresh.subarrays;
            }
        }
    }

    /// Enqueues one REFRESH request at the given hierarchy coordinates
    /// (wildcards below the refresh scope).
    fn refresh_target(&mut self, rank: i32, bank: i32, sa: i32) {
        let mut addr = vec![-1i32; self.spec.level_count()];
        addr[0] = self.channel_id as i32;
        if let Some(i) = self.refresh.rank_level {
            addr[i] = rank;
        }
        if let Some(i) = self.refresh.bank_level {
            addr[i] = bank;
        }
        if let Some(i) = self.refresh.sa_level {
            addr[i] = sa;
        }
        tracing::debug!(
            channel = self.channel_id,
            rank,
            bank,
            clk = self.refresh.clk,
            "refresh injected"
        );
        let req = Request::with_addr_vec(addr, ReqKind::Refresh);
        let accepted = self.enqueue(req);
        assert!(accepted, "refresh rejected: other queue overflow");
    }
}
