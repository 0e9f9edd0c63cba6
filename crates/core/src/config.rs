//! Simulator configuration.
//!
//! One flat structure covering everything the simulator recognizes:
//! 1. **Device:** standard, organization, and speed-bin keys, channel/rank
//!    counts, subarray count (SALP/DSARP) and segment ratio (TLDRAM).
//! 2. **Controller:** scheduler, row policy, queue capacity.
//! 3. **Output:** command-trace switches and file prefix.
//! 4. **HMC:** ideal-latency and unlimited-bandwidth switches.
//!
//! Configuration is supplied as JSON (`serde_json`) or built in code via
//! `Config::default()`, which models a single-channel DDR3-1600K part.

use serde::Deserialize;

use crate::controller::{RowPolicy, RowPolicyKind, Scheduler, SchedulerKind};

/// Baseline values used when a field is absent.
mod defaults {
    pub const STANDARD: &str = "DDR3";
    pub const ORG: &str = "DDR3_2Gb_x8";
    pub const SPEED: &str = "DDR3_1600K";

    /// Channels and ranks default to the smallest legal system.
    pub const CHANNELS: u32 = 1;
    pub const RANKS: u32 = 1;

    /// Subarrays per bank for the SALP and DSARP families.
    pub const SUBARRAYS: u32 = 8;

    /// TLDRAM rows per near-segment row.
    pub const SEGMENT_RATIO: u32 = 16;

    /// Row-hit cap for the capped scheduler.
    pub const SCHEDULER_CAP: u64 = 16;

    /// Idle cycles before the timeout row policy closes a row.
    pub const ROW_POLICY_TIMEOUT: i64 = 50;

    /// Capacity of each controller queue.
    pub const QUEUE_SIZE: usize = 32;

    /// Command-trace file prefix.
    pub const CMD_TRACE_PREFIX: &str = "cmd-trace-";
}

/// Physical-address-to-hierarchy decoding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum MappingKind {
    /// `Channel | Rank | Bank | Row | Column`, MSB first.
    ChRaBaRoCo,
    /// Channel and low column bits at the bottom, for bank parallelism
    /// under cache-line strides.
    #[default]
    RoBaRaCoCh,
}

/// Scheduler selection, with the source-style spellings accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SchedulerChoice {
    #[serde(alias = "FCFS")]
    Fcfs,
    #[serde(alias = "FRFCFS")]
    FrFcfs,
    #[default]
    #[serde(alias = "FRFCFS_Cap")]
    FrFcfsCap,
    #[serde(alias = "FRFCFS_PriorHit")]
    FrFcfsPriorHit,
}

/// Row policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RowPolicyChoice {
    Closed,
    #[serde(alias = "ClosedAP")]
    ClosedAp,
    #[default]
    Opened,
    Timeout,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// DRAM standard name (DDR3, DDR4, LPDDR3, LPDDR4, GDDR5, WideIO,
    /// WideIO2, HBM, HMC, SALP-1, SALP-2, SALP-MASA, REFAB, REFPB, DARP,
    /// SARP, DSARP, ALDRAM, TLDRAM, PCM, STTMRAM).
    #[serde(default = "Config::default_standard")]
    pub standard: String,

    /// Organization key into the standard's org table (density and width).
    #[serde(default = "Config::default_org")]
    pub org: String,

    /// Speed key (data rate and CL grade).
    #[serde(default = "Config::default_speed")]
    pub speed: String,

    /// Channel count (vaults for HMC); must be a power of two, and some
    /// standards constrain it further.
    #[serde(default = "Config::default_channels")]
    pub channels: u32,

    /// Ranks per channel; must be a power of two.
    #[serde(default = "Config::default_ranks")]
    pub ranks: u32,

    /// Subarrays per bank (SALP and DSARP families only).
    #[serde(default = "Config::default_subarrays")]
    pub subarrays: u32,

    /// TLDRAM near-segment ratio.
    #[serde(default = "Config::default_segment_ratio")]
    pub segment_ratio: u32,

    /// Address mapping policy.
    #[serde(default)]
    pub mapping: MappingKind,

    /// Request scheduling policy.
    #[serde(default)]
    pub scheduler: SchedulerChoice,

    /// Row-hit cap for FR-FCFS-Cap.
    #[serde(default = "Config::default_scheduler_cap")]
    pub scheduler_cap: u64,

    /// Row precharge policy.
    #[serde(default)]
    pub row_policy: RowPolicyChoice,

    /// Idle threshold for the timeout row policy, in cycles.
    #[serde(default = "Config::default_row_policy_timeout")]
    pub row_policy_timeout: i64,

    /// Capacity of each of the read/write/other queues.
    #[serde(default = "Config::default_queue_size")]
    pub queue_size: usize,

    /// Write per-rank command trace files for external power tools.
    #[serde(default)]
    pub record_cmd_trace: bool,

    /// Print every issued command to stdout.
    #[serde(default)]
    pub print_cmd_trace: bool,

    /// Prefix for command trace file names.
    #[serde(default = "Config::default_cmd_trace_prefix")]
    pub cmd_trace_prefix: String,

    /// HMC: bypass vault timing, keep bus occupancy.
    #[serde(default)]
    pub no_dram_latency: bool,

    /// HMC: remove the burst-length bus constraint.
    #[serde(default)]
    pub unlimit_bandwidth: bool,
}

impl Config {
    fn default_standard() -> String {
        defaults::STANDARD.to_string()
    }

    fn default_org() -> String {
        defaults::ORG.to_string()
    }

    fn default_speed() -> String {
        defaults::SPEED.to_string()
    }

    fn default_channels() -> u32 {
        defaults::CHANNELS
    }

    fn default_ranks() -> u32 {
        defaults::RANKS
    }

    fn default_subarrays() -> u32 {
        defaults::SUBARRAYS
    }

    fn default_segment_ratio() -> u32 {
        defaults::SEGMENT_RATIO
    }

    fn default_scheduler_cap() -> u64 {
        defaults::SCHEDULER_CAP
    }

    fn default_row_policy_timeout() -> i64 {
        defaults::ROW_POLICY_TIMEOUT
    }

    fn default_queue_size() -> usize {
        defaults::QUEUE_SIZE
    }

    fn default_cmd_trace_prefix() -> String {
        defaults::CMD_TRACE_PREFIX.to_string()
    }

    /// The configured scheduler as controller state.
    pub fn scheduler(&self) -> Scheduler {
        let kind = match self.scheduler {
            SchedulerChoice::Fcfs => SchedulerKind::Fcfs,
            SchedulerChoice::FrFcfs => SchedulerKind::FrFcfs,
            SchedulerChoice::FrFcfsCap => SchedulerKind::FrFcfsCap,
            SchedulerChoice::FrFcfsPriorHit => SchedulerKind::FrFcfsPriorHit,
        };
        Scheduler {
            kind,
            cap: self.scheduler_cap,
        }
    }

    /// The configured row policy as controller state.
    pub fn row_policy(&self) -> RowPolicy {
        let kind = match self.row_policy {
            RowPolicyChoice::Closed => RowPolicyKind::Closed,
            RowPolicyChoice::ClosedAp => RowPolicyKind::ClosedAp,
            RowPolicyChoice::Opened => RowPolicyKind::Opened,
            RowPolicyChoice::Timeout => RowPolicyKind::Timeout,
        };
        RowPolicy {
            kind,
            timeout: self.row_policy_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty config deserializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_model_single_channel_ddr3() {
        let c = Config::default();
        assert_eq!(c.standard, "DDR3");
        assert_eq!(c.channels, 1);
        assert_eq!(c.queue_size, 32);
        assert_eq!(c.mapping, MappingKind::RoBaRaCoCh);
        assert_eq!(c.scheduler, SchedulerChoice::FrFcfsCap);
        assert_eq!(c.row_policy, RowPolicyChoice::Opened);
    }

    #[test]
    fn source_style_spellings_accepted() {
        let json = r#"{
            "standard": "DDR4",
            "org": "DDR4_4Gb_x8",
            "speed": "DDR4_2400R",
            "channels": 2,
            "ranks": 2,
            "scheduler": "FRFCFS_PriorHit",
            "row_policy": "ClosedAP",
            "mapping": "ChRaBaRoCo"
        }"#;
        let c: Config = serde_json::from_str(json).unwrap();
        assert_eq!(c.scheduler, SchedulerChoice::FrFcfsPriorHit);
        assert_eq!(c.row_policy, RowPolicyChoice::ClosedAp);
        assert_eq!(c.mapping, MappingKind::ChRaBaRoCo);
    }
}
