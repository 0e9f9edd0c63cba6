//! Per-standard spec declarations.
//!
//! Each submodule builds the [`Spec`] for one DRAM standard: organization and
//! speed tables transcribed from the published datasheets, plus the
//! prerequisite, state-effect, row-predicate, and timing declarations that
//! standard needs. The behaviors most standards share (power-state gating,
//! open-row bookkeeping, precharge-all) live here as plain functions the
//! submodules register in their tables.

pub mod aldram;
pub mod ddr3;
pub mod ddr4;
pub mod dsarp;
pub mod gddr5;
pub mod hbm;
pub mod hmc;
pub mod lpddr3;
pub mod lpddr4;
pub mod pcm;
pub mod salp;
pub mod sttmram;
pub mod tldram;
pub mod wideio;
pub mod wideio2;

pub(crate) use crate::dram::{addr_at, Node};
pub(crate) use crate::error::ConfigError;

use crate::spec::{Command, Spec, State};

/// Builds the spec named by `standard` with its `org`/`speed` keys.
///
/// `channels` only matters for WideIO2, whose per-channel organization
/// depends on the stack configuration; `subarrays` applies to the SALP and
/// DSARP families. Both are ignored elsewhere.
pub fn build(
    standard: &str,
    org: &str,
    speed: &str,
    channels: u32,
    subarrays: u32,
) -> Result<Spec, ConfigError> {
    match standard {
        "DDR3" => ddr3::spec(org, speed),
        "DDR4" => ddr4::spec(org, speed),
        "LPDDR3" => lpddr3::spec(org, speed),
        "LPDDR4" => lpddr4::spec(org, speed),
        "GDDR5" => gddr5::spec(org, speed),
        "WideIO" => wideio::spec(org, speed),
        "WideIO2" => wideio2::spec(org, speed, channels),
        "HBM" => hbm::spec(org, speed),
        "HMC" => hmc::spec(org, speed),
        "SALP-1" | "SALP-2" | "SALP-MASA" => salp::spec(org, speed, standard, subarrays),
        "DSARP" | "REFAB" | "REFPB" | "DARP" | "SARP" => dsarp::spec(org, speed, standard, subarrays),
        "ALDRAM" => aldram::spec(org, speed),
        "TLDRAM" => tldram::spec(org, speed),
        "PCM" => pcm::spec(org, speed),
        "STTMRAM" => sttmram::spec(org, speed),
        other => Err(ConfigError::UnknownStandard(other.to_string())),
    }
}

// ───────────────────────── shared prerequisite functions ─────────────────────────

/// Rank gate for data commands: power-down and self-refresh must exit first.
pub(crate) fn rank_data_gate(
    _spec: &Spec,
    node: &Node,
    _cmd: Command,
    _addr: &[i32],
) -> Option<Command> {
    match node.state {
        Some(State::PowerUp) => None,
        Some(State::ActPowerDown) | Some(State::PrePowerDown) => Some(Command::Pdx),
        Some(State::SelfRefresh) => Some(Command::Srx),
        other => panic!("rank in unexpected state {:?}", other),
    }
}

/// Bank gate for column commands: a closed bank activates, a conflicting row
/// precharges, a hit proceeds.
pub(crate) fn bank_row_gate(
    _spec: &Spec,
    node: &Node,
    cmd: Command,
    addr: &[i32],
) -> Option<Command> {
    match node.state {
        Some(State::Closed) => Some(Command::Act),
        Some(State::Opened) => {
            if node.row_state.contains_key(&addr_at(addr, node.level + 1)) {
                Some(cmd)
            } else {
                Some(Command::Pre)
            }
        }
        other => panic!("bank in unexpected state {:?}", other),
    }
}

fn any_open_below(node: &Node) -> bool {
    node.children.iter().any(|child| {
        matches!(child.state, Some(State::Opened) | Some(State::Selected)) || any_open_below(child)
    })
}

/// Rank gate for REF: every bank (at any depth) must be closed, else
/// precharge all first.
pub(crate) fn ref_needs_prea(
    _spec: &Spec,
    node: &Node,
    _cmd: Command,
    _addr: &[i32],
) -> Option<Command> {
    if any_open_below(node) {
        Some(Command::Prea)
    } else {
        Some(Command::Ref)
    }
}

/// SALP variant of the REF gate: the rank-wide precharge is PRER.
pub(crate) fn ref_needs_prer(
    _spec: &Spec,
    node: &Node,
    _cmd: Command,
    _addr: &[i32],
) -> Option<Command> {
    if any_open_below(node) {
        Some(Command::Prer)
    } else {
        Some(Command::Ref)
    }
}

/// Per-bank refresh gate: the bank must be closed.
pub(crate) fn refpb_needs_closed_bank(
    _spec: &Spec,
    node: &Node,
    _cmd: Command,
    _addr: &[i32],
) -> Option<Command> {
    if node.state == Some(State::Closed) {
        Some(Command::RefPb)
    } else {
        Some(Command::Pre)
    }
}

/// Rank gate for PDE: allowed from any power state except self-refresh.
pub(crate) fn rank_pde_gate(
    _spec: &Spec,
    node: &Node,
    _cmd: Command,
    _addr: &[i32],
) -> Option<Command> {
    match node.state {
        Some(State::PowerUp) | Some(State::ActPowerDown) | Some(State::PrePowerDown) => {
            Some(Command::Pde)
        }
        Some(State::SelfRefresh) => Some(Command::Srx),
        other => panic!("rank in unexpected state {:?}", other),
    }
}

/// Rank gate for SRE: a powered-down rank exits power-down first.
pub(crate) fn rank_sre_gate(
    _spec: &Spec,
    node: &Node,
    _cmd: Command,
    _addr: &[i32],
) -> Option<Command> {
    match node.state {
        Some(State::PowerUp) | Some(State::SelfRefresh) => Some(Command::Sre),
        Some(State::ActPowerDown) | Some(State::PrePowerDown) => Some(Command::Pdx),
        other => panic!("rank in unexpected state {:?}", other),
    }
}

// ───────────────────────── shared row predicates ─────────────────────────

/// Row hit: the addressed row is open in this bank (or subarray).
pub(crate) fn row_hit(_spec: &Spec, node: &Node, _cmd: Command, addr: &[i32]) -> bool {
    match node.state {
        Some(State::Closed) => false,
        Some(State::Opened) | Some(State::Selected) => {
            node.row_state.contains_key(&addr_at(addr, node.level + 1))
        }
        other => panic!("bank in unexpected state {:?}", other),
    }
}

/// Row open: this bank (or subarray) has some row open.
pub(crate) fn row_open(_spec: &Spec, node: &Node, _cmd: Command, _addr: &[i32]) -> bool {
    match node.state {
        Some(State::Closed) => false,
        Some(State::Opened) | Some(State::Selected) => true,
        other => panic!("bank in unexpected state {:?}", other),
    }
}

// ───────────────────────── shared state effects ─────────────────────────

/// ACT at a bank or subarray: open the node and record the row.
pub(crate) fn open_row(_spec: &Spec, node: &mut Node, addr: &[i32]) {
    node.state = Some(State::Opened);
    let _ = node
        .row_state
        .insert(addr_at(addr, node.level + 1), State::Opened);
}

/// PRE / RDA / WRA at a bank or subarray: close it and forget its rows.
pub(crate) fn close_node(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    node.state = Some(State::Closed);
    node.row_state.clear();
}

fn close_below(node: &mut Node) {
    for child in &mut node.children {
        if child.state.is_some() {
            child.state = Some(State::Closed);
        }
        child.row_state.clear();
        close_below(child);
    }
}

/// PREA (or PRER) at a rank: close every bank and subarray beneath it.
pub(crate) fn close_subtree(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    node.row_state.clear();
    close_below(node);
}

/// PDE at a rank: active power-down if any bank is open, else precharge
/// power-down.
pub(crate) fn rank_power_down(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    if any_open_below(node) {
        node.state = Some(State::ActPowerDown);
    } else {
        node.state = Some(State::PrePowerDown);
    }
}

/// PDX / SRX at a rank.
pub(crate) fn rank_power_up(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    node.state = Some(State::PowerUp);
}

/// SRE at a rank.
pub(crate) fn rank_self_refresh(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    node.state = Some(State::SelfRefresh);
}

/// REFPB at a bank: the prerequisite guaranteed it is closed.
pub(crate) fn refpb_assert_closed(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    assert_eq!(
        node.state,
        Some(State::Closed),
        "per-bank refresh on an open bank"
    );
    node.row_state.clear();
}
