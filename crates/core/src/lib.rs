//! Cycle-accurate DRAM command-timing simulator library.
//!
//! This crate models the command-level timing of modern DRAM standards with
//! the following pieces:
//! 1. **Spec:** per-standard declarative descriptors (hierarchy, command
//!    scopes, prerequisite/effect tables, timing constraints, org and speed
//!    tables) under [`spec`] and [`standards`].
//! 2. **Tree:** the generic organization tree and timing checker in
//!    [`dram`].
//! 3. **Controller:** the per-channel tick loop with scheduler, row policy,
//!    row table, and refresh engine under [`controller`], plus the TLDRAM
//!    and HMC specializations.
//! 4. **Memory:** address mapping and request routing in [`memory`].
//! 5. **Support:** configuration, statistics, requests, and errors.
//!
//! Given a stream of read/write requests by physical address, the simulator
//! reports when each request's data returns and what the command bus did to
//! get it there.

/// Simulator configuration (serde structures, defaults, policy enums).
pub mod config;
/// Per-channel controller, scheduler, row policy/table, refresh, traces.
pub mod controller;
/// The DRAM organization tree and timing engine.
pub mod dram;
/// Configuration errors.
pub mod error;
/// Memory front-end: address decoding and channel routing.
pub mod memory;
/// Memory requests and completion callbacks.
pub mod request;
/// Spec-as-data model: commands, levels, states, timing tables.
pub mod spec;
/// Per-standard spec declarations and numeric tables.
pub mod standards;
/// Statistics counters and reporting.
pub mod stats;

/// Root configuration type; deserialize from JSON or use `Config::default()`.
pub use crate::config::Config;
/// Per-channel memory controller.
pub use crate::controller::Controller;
/// Configuration error type.
pub use crate::error::ConfigError;
/// Top-level memory system; construct with `Memory::build`.
pub use crate::memory::Memory;
/// A memory request.
pub use crate::request::{ReqKind, Request};
/// A standard's declarative descriptor.
pub use crate::spec::Spec;
