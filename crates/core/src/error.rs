//! Configuration errors.
//!
//! Only configuration problems are recoverable errors; timing or state
//! invariant violations inside the simulator are programmer errors and abort
//! with a locatable panic. Backpressure (a full queue) is not an error and
//! surfaces as a boolean.

use thiserror::Error;

/// Rejected configuration, reported before simulation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown DRAM standard '{0}'")]
    UnknownStandard(String),

    #[error("unknown organization '{org}' for standard {standard}")]
    UnknownOrg { standard: &'static str, org: String },

    #[error("unknown speed bin '{speed}' for standard {standard}")]
    UnknownSpeed {
        standard: &'static str,
        speed: String,
    },

    #[error("{what} must be a power of two, got {got}")]
    NotPowerOfTwo { what: &'static str, got: u32 },

    #[error("{standard} requires {requirement}, got {got}")]
    ChannelConstraint {
        standard: &'static str,
        requirement: &'static str,
        got: u32,
    },

    #[error("subarray count must be a power of two in [1, 128], got {0}")]
    BadSubarrays(u32),

    #[error("unknown address mapping '{0}'")]
    UnknownMapping(String),

    #[error("unknown scheduler '{0}'")]
    UnknownScheduler(String),

    #[error("unknown row policy '{0}'")]
    UnknownRowPolicy(String),

    #[error("unknown refresh mode '{0}'")]
    UnknownRefreshMode(String),
}
