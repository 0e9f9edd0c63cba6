//! Integration test suite for the DRAM timing core.
//!
//! Organized as one target: shared harness utilities under `common`, and
//! the behavioral tests under `unit`, grouped by component (node timing,
//! controller, refresh, address mapping, and the standard-specific
//! specializations).

pub mod common;
mod unit;
