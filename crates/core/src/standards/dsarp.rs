//! DSARP refresh-parallelization family on a DDR3-class core.
//!
//! One organization (`Channel > Rank > Bank > SubArray > Row > Column`, the
//! subarray level exists to parallelize refresh with accesses, not for
//! SALP-style demand parallelism) carrying five refresh mechanisms:
//! 1. **REFAB** — baseline all-bank refresh.
//! 2. **REFPB** — per-bank refresh with a round-robin bank pointer.
//! 3. **DARP** — per-bank refresh that may be skipped against backlog
//!    credits while demand reads wait.
//! 4. **SARP** — per-bank refresh steered to idle subarrays, paying only a
//!    scaled activate spacing (1.138 x nRRD) next to demand activates.
//! 5. **DSARP** — DARP and SARP combined.
//!
//! The refresh engine picks the mechanism from the spec's variant; this file
//! contributes the state machines and timing.

use super::*;
use crate::request::ReqKind;
use crate::spec::{
    Command, DsarpKind, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State, Variant,
};

const CH: usize = 0;
const RA: usize = 1;
const BA: usize = 2;
const SA: usize = 3;
const RO: usize = 4;
const CO: usize = 5;

/// Extra activate spacing between a demand activate and a refresh in a
/// sibling subarray of the same bank.
const RRD_FACTOR: f64 = 1.138;

const LEVELS: [Level; 6] = [
    Level::Channel,
    Level::Rank,
    Level::Bank,
    Level::SubArray,
    Level::Row,
    Level::Column,
];

struct OrgRow {
    name: &'static str,
    size_mb: u32,
    dq: u32,
    banks: u32,
    columns: u32,
}

const ORGS: &[OrgRow] = &[
    OrgRow {
        name: "DSARP_8Gb_x8",
        size_mb: 8 << 10,
        dq: 8,
        banks: 8,
        columns: 1 << 11,
    },
    OrgRow {
        name: "DSARP_16Gb_x8",
        size_mb: 16 << 10,
        dq: 8,
        banks: 8,
        columns: 1 << 11,
    },
    OrgRow {
        name: "DSARP_32Gb_x8",
        size_mb: 32 << 10,
        dq: 8,
        banks: 8,
        columns: 1 << 11,
    },
];

fn speed_bin(name: &str) -> Option<SpeedEntry> {
    match name {
        "DSARP_1333" => Some(SpeedEntry {
            rate: 1333,
            freq: (400.0 / 3.0) * 5.0,
            t_ck: (3.0 / 0.4) / 5.0,
            n_bl: 4,
            n_ccd: 4,
            n_rtrs: 2,
            n_cl: 9,
            n_rcd: 9,
            n_rp_pb: 8,
            n_rp_ab: 9,
            n_cwl: 7,
            n_ras: 24,
            n_rc: 33,
            n_rtp: 5,
            n_wtr: 5,
            n_wr: 10,
            n_rrd: 5,
            n_faw: 30,
            n_pd: 4,
            n_xp: 4,
            n_xpdll: 16,
            n_ckesr: 5,
            n_xs: 114,
            n_xsdll: 512,
            ..SpeedEntry::default()
        }),
        _ => None,
    }
}

/// Density-derived refresh parameters: tRFCab extrapolated to future
/// densities, tRFCpb from the LPDDR all-bank/per-bank ratio, the intervals
/// from the high-temperature (32ms) retention point.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    const RFC_AB: [i64; 3] = [234, 354, 594];
    const RFC_PB: [i64; 3] = [109, 164, 275];
    let density = match org.size_mb >> 10 {
        8 => 0,
        16 => 1,
        32 => 2,
        gb => panic!("no refresh table for {}Gb chips", gb),
    };
    s.n_rfc_ab = RFC_AB[density];
    s.n_rfc_pb = RFC_PB[density];
    s.n_refi = 2600;
    s.n_refi_pb = 325;
}

fn kind_of(name: &str) -> Option<DsarpKind> {
    match name {
        "REFAB" => Some(DsarpKind::RefAb),
        "REFPB" => Some(DsarpKind::RefPb),
        "DARP" => Some(DsarpKind::Darp),
        "SARP" => Some(DsarpKind::Sarp),
        "DSARP" => Some(DsarpKind::Dsarp),
        _ => None,
    }
}

/// Builds a DSARP-family spec.
pub fn spec(org: &str, speed: &str, kind_name: &str, subarrays: u32) -> Result<Spec, ConfigError> {
    let kind = kind_of(kind_name)
        .ok_or_else(|| ConfigError::UnknownRefreshMode(kind_name.to_string()))?;
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "DSARP",
            org: org.to_string(),
        })?;
    if subarrays == 0 || subarrays > 128 || !subarrays.is_power_of_two() {
        return Err(ConfigError::BadSubarrays(subarrays));
    }

    let name = match kind {
        DsarpKind::RefAb => "REFAB",
        DsarpKind::RefPb => "REFPB",
        DsarpKind::Darp => "DARP",
        DsarpKind::Sarp => "SARP",
        DsarpKind::Dsarp => "DSARP",
    };
    let mut s = Spec::blank(StandardKind::Dsarp, name, &LEVELS);
    let per_subarray =
        u64::from(row.dq) * u64::from(row.banks) * u64::from(subarrays) * u64::from(row.columns);
    let rows = (u64::from(row.size_mb) << 20) / per_subarray;
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: vec![0, 0, row.banks, subarrays, rows as u32, row.columns],
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "DSARP",
        speed: speed.to_string(),
    })?;
    derive_speed(&mut s.speed, &s.org);

    s.prefetch_size = 16;
    s.channel_width = 32;
    s.read_latency = s.speed.n_cl + s.speed.n_bl;
    s.variant = Variant::Dsarp(kind);
    s.ref_rank = kind == DsarpKind::RefAb;
    s.classify.refreshing = |cmd| matches!(cmd, Command::Ref | Command::RefPb);

    s.start[RA] = Some(State::PowerUp);
    s.start[BA] = Some(State::Closed);
    s.start[SA] = Some(State::Closed);

    set_scopes(&mut s);
    ddr3::set_translate(&mut s);
    if !s.ref_rank {
        // everything except REFAB refreshes per bank
        s.translate[ReqKind::Refresh.index()] = Some(Command::RefPb);
    }
    set_prereqs(&mut s);
    set_effects(&mut s);
    set_timing(&mut s, kind);
    Ok(s)
}

fn set_scopes(s: &mut Spec) {
    use Command::*;
    s.scope[Act.index()] = RO;
    s.scope[Pre.index()] = BA;
    s.scope[Prea.index()] = RA;
    for cmd in [Rd, Wr, Rda, Wra] {
        s.scope[cmd.index()] = CO;
    }
    s.scope[RefPb.index()] = BA;
    for cmd in [Ref, Pde, Pdx, Sre, Srx] {
        s.scope[cmd.index()] = RA;
    }
}

/// Bank gate: the bank's row map is keyed by subarray here, so a hit means
/// "this subarray is the open one" and the walk continues to it.
fn bank_gate(_spec: &Spec, node: &Node, _cmd: Command, addr: &[i32]) -> Option<Command> {
    match node.state {
        Some(State::Closed) => Some(Command::Act),
        Some(State::Opened) => {
            if node.row_state.contains_key(&addr_at(addr, SA)) {
                None // the subarray decides on the actual row
            } else {
                Some(Command::Pre)
            }
        }
        other => panic!("bank in unexpected state {:?}", other),
    }
}

fn subarray_gate(_spec: &Spec, node: &Node, cmd: Command, addr: &[i32]) -> Option<Command> {
    match node.state {
        Some(State::Closed) => Some(Command::Act),
        Some(State::Opened) => {
            if node.row_state.contains_key(&addr_at(addr, RO)) {
                Some(cmd)
            } else {
                Some(Command::Pre)
            }
        }
        other => panic!("subarray in unexpected state {:?}", other),
    }
}

fn set_prereqs(s: &mut Spec) {
    use Command::*;
    for cmd in [Rd, Wr] {
        s.prereq.set(RA, cmd, rank_data_gate);
        s.prereq.set(BA, cmd, bank_gate);
        s.prereq.set(SA, cmd, subarray_gate);
        s.row_hit.set(SA, cmd, row_hit);
        s.row_open.set(SA, cmd, row_open);
    }
    s.prereq.set(RA, Ref, ref_needs_prea);
    s.prereq.set(BA, RefPb, refpb_needs_closed_bank);
    s.prereq.set(RA, Pde, rank_pde_gate);
    s.prereq.set(RA, Sre, rank_sre_gate);
}

/// ACT at the bank marks which subarray holds the open row.
fn bank_act(_spec: &Spec, node: &mut Node, addr: &[i32]) {
    node.state = Some(State::Opened);
    let _ = node.row_state.insert(addr_at(addr, SA), State::Opened);
}

/// PRE at the bank closes it and every subarray beneath.
fn bank_pre(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    node.state = Some(State::Closed);
    node.row_state.clear();
    for sa in &mut node.children {
        sa.state = Some(State::Closed);
        sa.row_state.clear();
    }
}

fn set_effects(s: &mut Spec) {
    use Command::*;
    s.effect.set(BA, Act, bank_act);
    s.effect.set(SA, Act, open_row);
    s.effect.set(BA, Pre, bank_pre);
    s.effect.set(BA, Rda, close_node);
    s.effect.set(BA, Wra, close_node);
    s.effect.set(SA, Rda, close_node);
    s.effect.set(SA, Wra, close_node);
    s.effect.set(BA, RefPb, refpb_assert_closed);
    s.effect.set(RA, Prea, close_subtree);
    s.effect.set(RA, Pde, rank_power_down);
    s.effect.set(RA, Pdx, rank_power_up);
    s.effect.set(RA, Sre, rank_self_refresh);
    s.effect.set(RA, Srx, rank_power_up);
}

fn set_timing(s: &mut Spec, kind: DsarpKind) {
    use Command::*;
    let e = s.speed;
    let t = &mut s.timing;
    const CAS: [Command; 4] = [Rd, Rda, Wr, Wra];
    const RDS: [Command; 2] = [Rd, Rda];
    const WRS: [Command; 2] = [Wr, Wra];
    let sarp = matches!(kind, DsarpKind::Sarp | DsarpKind::Dsarp);
    let rrd_scaled = ((e.n_rrd as f64) * RRD_FACTOR).ceil() as i64;

    // Channel
    for a in RDS {
        for b in RDS {
            t.add(CH, a, b, e.n_bl);
        }
    }
    for a in WRS {
        for b in WRS {
            t.add(CH, a, b, e.n_bl);
        }
    }

    // Rank: CAS to CAS
    for a in RDS {
        for b in RDS {
            t.add(RA, a, b, e.n_ccd);
        }
    }
    for a in WRS {
        for b in WRS {
            t.add(RA, a, b, e.n_ccd);
        }
    }
    for a in RDS {
        for b in WRS {
            t.add(RA, a, b, e.n_cl + e.n_ccd + 2 - e.n_cwl);
        }
    }
    for a in WRS {
        for b in RDS {
            t.add(RA, a, b, e.n_cwl + e.n_bl + e.n_wtr);
        }
    }

    // Rank: CAS to CAS between sibling ranks
    for a in CAS {
        for b in CAS {
            t.add_sibling(RA, a, b, e.n_bl + e.n_rtrs);
        }
    }
    for a in RDS {
        for b in WRS {
            t.add_sibling(RA, a, b, e.n_cl + e.n_bl + e.n_rtrs - e.n_cwl);
        }
    }
    for a in WRS {
        for b in RDS {
            t.add_sibling(RA, a, b, e.n_cwl + e.n_bl + e.n_rtrs - e.n_cl);
        }
    }

    // Rank: CAS to PREA
    t.add(RA, Rd, Prea, e.n_rtp);
    t.add(RA, Wr, Prea, e.n_cwl + e.n_bl + e.n_wr);

    // Rank: CAS to PD
    t.add(RA, Rd, Pde, e.n_cl + e.n_bl + 1);
    t.add(RA, Rda, Pde, e.n_cl + e.n_bl + 1);
    t.add(RA, Wr, Pde, e.n_cwl + e.n_bl + e.n_wr);
    t.add(RA, Wra, Pde, e.n_cwl + e.n_bl + e.n_wr + 1); // one extra for the precharge
    for b in CAS {
        t.add(RA, Pdx, b, e.n_xp);
    }

    // Rank: RAS to RAS
    t.add(RA, Act, Act, e.n_rrd);
    t.add_dist(RA, Act, Act, 4, e.n_faw);
    t.add(RA, Act, Prea, e.n_ras);
    t.add(RA, Prea, Act, e.n_rp_ab);

    // Rank: RAS to REF
    t.add(RA, Pre, Ref, e.n_rp_pb);
    t.add(RA, Prea, Ref, e.n_rp_ab);
    t.add(RA, Ref, Act, e.n_rfc_ab);

    // Rank: RAS to PD
    t.add(RA, Act, Pde, 1);
    t.add(RA, Pdx, Act, e.n_xp);
    t.add(RA, Pdx, Pre, e.n_xp);
    t.add(RA, Pdx, Prea, e.n_xp);

    // Rank: RAS to SR
    t.add(RA, Pre, Sre, e.n_rp_pb);
    t.add(RA, Prea, Sre, e.n_rp_ab);
    t.add(RA, Srx, Act, e.n_xs);

    // Rank: REF to REF, in both granularities
    t.add(RA, Ref, Ref, e.n_rfc_ab);
    t.add(RA, Ref, RefPb, e.n_rfc_ab);
    t.add(RA, RefPb, Ref, e.n_rfc_pb);
    t.add(RA, RefPb, RefPb, e.n_rfc_pb);

    // Rank: REF to PD
    t.add(RA, Ref, Pde, 1);
    t.add(RA, RefPb, Pde, 1);
    t.add(RA, Pdx, Ref, e.n_xp);
    t.add(RA, Pdx, RefPb, e.n_xp);

    // Rank: REF to SR
    t.add(RA, Srx, Ref, e.n_xs);
    t.add(RA, Srx, RefPb, e.n_xs);

    // Rank: PD and SR
    t.add(RA, Pde, Pdx, e.n_pd);
    t.add(RA, Pdx, Pde, e.n_xp);
    t.add(RA, Pdx, Sre, e.n_xp);
    t.add(RA, Srx, Pde, e.n_xs);
    t.add(RA, Sre, Srx, e.n_ckesr);
    t.add(RA, Srx, Sre, e.n_xs);

    // Bank
    for b in CAS {
        t.add(BA, Act, b, e.n_rcd);
    }
    t.add(BA, Rd, Pre, e.n_rtp);
    t.add(BA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
    t.add(BA, Rda, Act, e.n_rtp + e.n_rp_pb);
    t.add(BA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_rp_pb);
    t.add(BA, Act, Act, e.n_rc);
    t.add(BA, Act, Pre, e.n_ras);
    t.add(BA, Pre, Act, e.n_rp_pb);
    t.add(BA, Pre, RefPb, e.n_rp_pb);

    // Bank: a per-bank refresh owns its bank, and neighbors pay an activate
    // spacing
    t.add(BA, RefPb, RefPb, e.n_rfc_pb);
    t.add_sibling(BA, RefPb, RefPb, e.n_rfc_pb);
    t.add_sibling(BA, Act, RefPb, e.n_rrd);
    t.add_sibling(BA, RefPb, Act, e.n_rrd);

    if !sarp {
        // without subarray steering, a refreshing bank blocks everything
        for cmd in [Act, Rd, Rda, Wr, Wra, Pre, Prea] {
            t.add(BA, RefPb, cmd, e.n_rfc_pb);
        }
    } else {
        // SubArray: refresh in one subarray runs beside demand in another,
        // at a scaled activate spacing
        t.add_sibling(SA, Act, RefPb, rrd_scaled);
        t.add_sibling(SA, RefPb, Act, rrd_scaled);

        // the refreshed subarray itself is busy
        t.add(SA, Ref, Act, e.n_rfc_ab);
        t.add(SA, RefPb, Act, e.n_rfc_pb);

        // CAS to RAS within the subarray
        for b in CAS {
            t.add(SA, Act, b, e.n_rcd);
        }
        t.add(SA, Rd, Pre, e.n_rtp);
        t.add(SA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
        t.add(SA, Rda, Act, e.n_rtp + e.n_rp_pb);
        t.add(SA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_rp_pb);

        // RAS to RAS within the subarray
        t.add(SA, Act, Act, e.n_rc);
        t.add(SA, Act, Pre, e.n_ras);
        t.add(SA, Pre, Act, e.n_rp_pb);
        t.add(SA, Pre, RefPb, e.n_rp_pb);
        t.add(SA, Pre, Ref, e.n_rp_pb);

        // no subarray parallelism for demand requests
        t.add_sibling(SA, Act, Act, e.n_rc);
        t.add_sibling(SA, Pre, Act, e.n_rp_pb);
        t.add_sibling(SA, Rda, Act, e.n_rtp + e.n_rp_pb);
        t.add_sibling(SA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_rp_pb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_bank_refresh_except_refab() {
        let refab = spec("DSARP_8Gb_x8", "DSARP_1333", "REFAB", 8).unwrap();
        assert!(refab.ref_rank);
        assert_eq!(refab.translate(ReqKind::Refresh), Command::Ref);

        let dsarp = spec("DSARP_8Gb_x8", "DSARP_1333", "DSARP", 8).unwrap();
        assert!(!dsarp.ref_rank);
        assert_eq!(dsarp.translate(ReqKind::Refresh), Command::RefPb);
        assert_eq!(dsarp.speed.n_refi_pb, 325);
    }

    #[test]
    fn sarp_scales_sibling_activates() {
        let sarp = spec("DSARP_8Gb_x8", "DSARP_1333", "SARP", 8).unwrap();
        let entries = sarp.timing.entries(SA, Command::RefPb);
        let sibling = entries.iter().find(|t| t.sibling && t.cmd == Command::Act);
        assert_eq!(sibling.unwrap().val, 6); // ceil(5 * 1.138)
    }

    #[test]
    fn rows_recomputed_from_subarrays() {
        let s = spec("DSARP_8Gb_x8", "DSARP_1333", "REFPB", 8).unwrap();
        assert_eq!(s.org.count[RO], 8192);
    }
}
