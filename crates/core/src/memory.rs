//! Memory front-end: per-channel controllers and address decoding.
//!
//! [`Memory`] owns one controller per channel (the plain controller, the
//! TLDRAM migration variant, or the HMC vault controller, depending on the
//! standard) and turns physical addresses into hierarchy coordinates:
//! 1. Transaction-alignment bits are stripped (and asserted zero).
//! 2. The remaining bits are sliced per level according to the mapping
//!    policy.
//! 3. The request is routed to the channel controller named by the decoded
//!    vector.
//!
//! [`Memory::build`] is the factory: it validates the configuration,
//! constructs the spec, and wires up controllers, traces, and policies.

use crate::config::{Config, MappingKind};
use crate::controller::{CmdTrace, Controller, TldramController, VaultController};
use crate::error::ConfigError;
use crate::request::Request;
use crate::spec::{Level, Spec, StandardKind};
use crate::standards;
use crate::stats::MemoryStats;

/// Address decoding policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrMapping {
    /// `Channel | Rank | Bank | Row | Column`, MSB first.
    ChRaBaRoCo,
    /// Channel and the low column bits occupy the low-order address bits.
    RoBaRaCoCh,
}

impl From<MappingKind> for AddrMapping {
    fn from(kind: MappingKind) -> Self {
        match kind {
            MappingKind::ChRaBaRoCo => AddrMapping::ChRaBaRoCo,
            MappingKind::RoBaRaCoCh => AddrMapping::RoBaRaCoCh,
        }
    }
}

/// One channel's controller, shaped by the standard.
enum ChannelCtrl {
    Std(Controller),
    Tldram(TldramController),
    Hmc(VaultController),
}

impl ChannelCtrl {
    fn controller(&self) -> &Controller {
        match self {
            ChannelCtrl::Std(c) => c,
            ChannelCtrl::Tldram(c) => c.controller(),
            ChannelCtrl::Hmc(c) => c.controller(),
        }
    }

    fn controller_mut(&mut self) -> &mut Controller {
        match self {
            ChannelCtrl::Std(c) => c,
            ChannelCtrl::Tldram(c) => c.controller_mut(),
            ChannelCtrl::Hmc(c) => c.controller_mut(),
        }
    }

    fn enqueue(&mut self, req: Request, next_id: &mut u64) -> bool {
        match self {
            ChannelCtrl::Std(c) => c.enqueue(req),
            ChannelCtrl::Tldram(c) => c.enqueue(req),
            ChannelCtrl::Hmc(c) => {
                let id = *next_id;
                let accepted = c.enqueue(id, req);
                if accepted {
                    *next_id += 1;
                }
                accepted
            }
        }
    }

    fn tick(&mut self) {
        match self {
            ChannelCtrl::Std(c) => c.tick(),
            ChannelCtrl::Tldram(c) => c.tick(),
            ChannelCtrl::Hmc(c) => c.tick(),
        }
    }

    fn pending_requests(&self) -> usize {
        self.controller().pending_requests()
    }
}

/// The DRAM system seen by the cache hierarchy.
pub struct Memory {
    /// The system-level spec copy used for address decoding.
    pub spec: Spec,
    ctrls: Vec<ChannelCtrl>,
    mapping: AddrMapping,
    /// Address bits consumed per hierarchy level.
    addr_bits: Vec<u32>,
    /// Low bits stripped for transaction alignment.
    tx_bits: u32,
    next_hmc_id: u64,
}

/// Floor log2; non-power-of-two counts (3Gb-class parts) lose the tail rows
/// to addressing, as the row-major mapping expects.
fn log2(val: u32) -> u32 {
    debug_assert!(val > 0);
    31 - val.leading_zeros()
}

fn require_power_of_two(what: &'static str, got: u32) -> Result<(), ConfigError> {
    if got == 0 || !got.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { what, got });
    }
    Ok(())
}

/// Per-standard system-shape constraints, checked before anything is built.
fn validate(spec: &Spec, config: &Config) -> Result<(), ConfigError> {
    require_power_of_two("channels", config.channels)?;
    require_power_of_two("ranks", config.ranks)?;
    match spec.standard {
        StandardKind::WideIo => {
            if config.channels != 4 {
                return Err(ConfigError::ChannelConstraint {
                    standard: "WideIO",
                    requirement: "exactly 4 channels",
                    got: config.channels,
                });
            }
            if config.ranks != 1 {
                return Err(ConfigError::ChannelConstraint {
                    standard: "WideIO",
                    requirement: "exactly 1 rank",
                    got: config.ranks,
                });
            }
        }
        StandardKind::WideIo2 => {
            if config.channels != 4 && config.channels != 8 {
                return Err(ConfigError::ChannelConstraint {
                    standard: "WideIO2",
                    requirement: "4 or 8 channels",
                    got: config.channels,
                });
            }
            if config.ranks > 2 {
                return Err(ConfigError::ChannelConstraint {
                    standard: "WideIO2",
                    requirement: "1 or 2 ranks",
                    got: config.ranks,
                });
            }
        }
        StandardKind::Hbm => {
            if config.channels != 8 {
                return Err(ConfigError::ChannelConstraint {
                    standard: "HBM",
                    requirement: "exactly 8 channels",
                    got: config.channels,
                });
            }
        }
        StandardKind::Lpddr4 => {
            if config.channels < 2 {
                return Err(ConfigError::ChannelConstraint {
                    standard: "LPDDR4",
                    requirement: "at least 2 channels",
                    got: config.channels,
                });
            }
        }
        _ => {}
    }
    // Without row-major high bits, every level must slice cleanly.
    if config.mapping != MappingKind::RoBaRaCoCh {
        let rows = spec.org.count[spec.row_level()];
        if !rows.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                what: "rows (required by this mapping)",
                got: rows,
            });
        }
    }
    Ok(())
}

impl Memory {
    /// Builds the full memory system described by `config`.
    pub fn build(config: &Config) -> Result<Self, ConfigError> {
        let mut spec = if config.standard == "TLDRAM" {
            standards::tldram::spec_with_ratio(&config.org, &config.speed, config.segment_ratio)?
        } else {
            standards::build(
                &config.standard,
                &config.org,
                &config.speed,
                config.channels,
                config.subarrays,
            )?
        };
        validate(&spec, config)?;

        if spec.standard == StandardKind::Hmc && config.unlimit_bandwidth {
            spec.speed.n_bl = 0;
            spec.speed.n_ccd_s = 1;
        }

        // Channel and rank counts come from the system, not the chip table.
        spec.org.count[0] = config.channels;
        if let Some(rank_level) = spec.level_index(Level::Rank) {
            spec.org.count[rank_level] = config.ranks;
        }

        let ctrls = (0..config.channels as usize)
            .map(|ch| -> Result<ChannelCtrl, ConfigError> {
                let mut ctrl = match spec.standard {
                    StandardKind::Tldram => {
                        let mut c = TldramController::new(spec.clone(), ch);
                        Self::configure(c.controller_mut(), config, ch);
                        return Ok(ChannelCtrl::Tldram(c));
                    }
                    StandardKind::Hmc => {
                        let mut c = VaultController::new(spec.clone(), ch);
                        c.set_no_dram_latency(config.no_dram_latency);
                        Self::configure(c.controller_mut(), config, ch);
                        return Ok(ChannelCtrl::Hmc(c));
                    }
                    _ => Controller::new(spec.clone(), ch),
                };
                Self::configure(&mut ctrl, config, ch);
                Ok(ChannelCtrl::Std(ctrl))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::assemble(spec, ctrls, config.mapping.into()))
    }

    fn configure(ctrl: &mut Controller, config: &Config, channel: usize) {
        ctrl.set_queue_max(config.queue_size);
        ctrl.set_scheduler(config.scheduler());
        ctrl.set_row_policy(config.row_policy());
        ctrl.set_print_cmd_trace(config.print_cmd_trace);
        if config.record_cmd_trace {
            let ranks = ctrl.channel.children.len().max(1);
            match CmdTrace::create(&config.cmd_trace_prefix, channel, ranks) {
                Ok(trace) => ctrl.set_cmd_trace(trace),
                Err(err) => tracing::warn!(%err, channel, "could not open command trace"),
            }
        }
    }

    fn assemble(spec: Spec, ctrls: Vec<ChannelCtrl>, mapping: AddrMapping) -> Self {
        let levels = spec.level_count();
        let mut addr_bits: Vec<u32> = (0..levels)
            .map(|lev| {
                let count = spec.org.count[lev];
                if count <= 1 {
                    0
                } else {
                    log2(count)
                }
            })
            .collect();
        // a whole prefetch burst shares one decoded column address
        addr_bits[levels - 1] -= log2(spec.prefetch_size);

        let tx = spec.transaction_bytes() as u32;
        let tx_bits = log2(tx);

        Self {
            spec,
            ctrls,
            mapping,
            addr_bits,
            tx_bits,
            next_hmc_id: 0,
        }
    }

    /// DRAM cycle time in nanoseconds.
    pub fn clk_ns(&self) -> f64 {
        self.spec.speed.t_ck
    }

    /// Advances every channel by one DRAM cycle.
    pub fn tick(&mut self) {
        for ctrl in &mut self.ctrls {
            ctrl.tick();
        }
    }

    /// Decodes and routes one request. Returns `false` when the target
    /// channel's queue is full; the caller retries next cycle.
    pub fn send(&mut self, mut req: Request) -> bool {
        req.addr_vec = self.decode(req.addr);
        let channel = req.addr_vec[0] as usize;
        self.ctrls[channel].enqueue(req, &mut self.next_hmc_id)
    }

    /// Splits a physical address into one index per hierarchy level.
    pub fn decode(&self, addr: u64) -> Vec<i32> {
        let levels = self.addr_bits.len();
        let mut vec = vec![0i32; levels];
        let mut addr = addr;

        let aligned = slice_lower_bits(&mut addr, self.tx_bits);
        assert_eq!(aligned, 0, "misaligned physical address {:#x}", addr);

        match self.mapping {
            AddrMapping::ChRaBaRoCo => {
                for lev in (0..levels).rev() {
                    vec[lev] = slice_lower_bits(&mut addr, self.addr_bits[lev]) as i32;
                }
            }
            AddrMapping::RoBaRaCoCh => {
                vec[0] = slice_lower_bits(&mut addr, self.addr_bits[0]) as i32;
                vec[levels - 1] = slice_lower_bits(&mut addr, self.addr_bits[levels - 1]) as i32;
                for lev in 1..=self.spec.row_level() {
                    vec[lev] = slice_lower_bits(&mut addr, self.addr_bits[lev]) as i32;
                }
            }
        }
        vec
    }

    /// Requests anywhere in the system: queued, in flight, or awaiting data.
    pub fn pending_requests(&self) -> usize {
        self.ctrls.iter().map(|c| c.pending_requests()).sum()
    }

    /// Aggregated statistics across all channels.
    pub fn stats(&self) -> MemoryStats {
        let mut stats = MemoryStats {
            t_ck: self.clk_ns(),
            ..MemoryStats::default()
        };
        for ctrl in &self.ctrls {
            stats.absorb(&ctrl.controller().stats);
        }
        stats
    }

    /// Channel controller access, mainly for tests and diagnostics.
    pub fn ctrl(&self, channel: usize) -> &Controller {
        self.ctrls[channel].controller()
    }

    pub fn ctrl_mut(&mut self, channel: usize) -> &mut Controller {
        self.ctrls[channel].controller_mut()
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.ctrls.len()
    }

    /// Flushes command traces at the end of a run.
    pub fn finish(&mut self) {
        for ctrl in &mut self.ctrls {
            ctrl.controller_mut().finish();
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("standard", &self.spec.name)
            .field("channels", &self.ctrls.len())
            .field("mapping", &self.mapping)
            .field("addr_bits", &self.addr_bits)
            .field("tx_bits", &self.tx_bits)
            .finish()
    }
}

fn slice_lower_bits(addr: &mut u64, bits: u32) -> u64 {
    let low = *addr & ((1u64 << bits) - 1);
    *addr >>= bits;
    low
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mapping: MappingKind) -> Config {
        let mut c = Config::default();
        c.channels = 2;
        c.ranks = 2;
        c.mapping = mapping;
        c
    }

    #[test]
    fn decode_is_in_range() {
        let mem = Memory::build(&config(MappingKind::RoBaRaCoCh)).unwrap();
        let vec = mem.decode(0x12345678 & !0x3f);
        assert_eq!(vec.len(), 5);
        assert!(vec[0] < 2);
        assert!(vec[1] < 2);
        assert!(vec[2] < 8);
    }

    #[test]
    #[should_panic(expected = "misaligned")]
    fn unaligned_addresses_rejected() {
        let mem = Memory::build(&config(MappingKind::RoBaRaCoCh)).unwrap();
        let _ = mem.decode(0x40 | 1);
    }

    #[test]
    fn channel_bits_at_bottom_under_default_mapping() {
        let mem = Memory::build(&config(MappingKind::RoBaRaCoCh)).unwrap();
        // consecutive cache lines alternate channels
        assert_ne!(mem.decode(0)[0], mem.decode(64)[0]);
    }

    #[test]
    fn validation_rejects_bad_shapes() {
        let mut c = config(MappingKind::RoBaRaCoCh);
        c.channels = 3;
        assert!(Memory::build(&c).is_err());

        let mut c = Config::default();
        c.standard = "WideIO".into();
        c.org = "WideIO_4Gb".into();
        c.speed = "WideIO_266".into();
        c.channels = 2;
        assert!(Memory::build(&c).is_err());
        c.channels = 4;
        assert!(Memory::build(&c).is_ok());

        let mut c = Config::default();
        c.standard = "HBM".into();
        c.org = "HBM_2Gb".into();
        c.speed = "HBM_1Gbps".into();
        c.channels = 4;
        assert!(Memory::build(&c).is_err());
        c.channels = 8;
        assert!(Memory::build(&c).is_ok());
    }
}
