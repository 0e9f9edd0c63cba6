//! Subarray-level parallelism (SALP) on a DDR3 core.
//!
//! Three flavors over a `Channel > Rank > Bank > SubArray > Row > Column`
//! hierarchy:
//! 1. **SALP-1** keeps one open row per bank but overlaps the precharge of
//!    one subarray with the activation of another (nPA instead of nRP).
//! 2. **SALP-2** opens rows in multiple subarrays of a bank, serializing
//!    only the shared structures (nRA / nWA windows).
//! 3. **MASA** additionally requires a subarray to be *selected* (SASEL)
//!    before column commands, so several subarrays stay open at once.
//!
//! The rank-wide precharge for refresh is PRER; a conflicting subarray is
//! closed with PRE_OTHER, whose target address the controller redirects to
//! the offending subarray.

use super::*;
use crate::spec::{
    Command, Level, OrgEntry, SalpKind, SpeedEntry, Spec, StandardKind, State, Variant,
};

const CH: usize = 0;
const RA: usize = 1;
const BA: usize = 2;
const SA: usize = 3;
const RO: usize = 4;
const CO: usize = 5;

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

#[rustfmt::skip]
const ORGS: &[OrgRow] = &[
    OrgRow { name: "SALP_512Mb_x4",  size_mb: 512,     dq: 4,  banks: 8, columns: 1 << 11 },
    OrgRow { name: "SALP_512Mb_x8",  size_mb: 512,     dq: 8,  banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_512Mb_x16", size_mb: 512,     dq: 16, banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_1Gb_x4",    size_mb: 1 << 10, dq: 4,  banks: 8, columns: 1 << 11 },
    OrgRow { name: "SALP_1Gb_x8",    size_mb: 1 << 10, dq: 8,  banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_1Gb_x16",   size_mb: 1 << 10, dq: 16, banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_2Gb_x4",    size_mb: 2 << 10, dq: 4,  banks: 8, columns: 1 << 11 },
    OrgRow { name: "SALP_2Gb_x8",    size_mb: 2 << 10, dq: 8,  banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_2Gb_x16",   size_mb: 2 << 10, dq: 16, banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_4Gb_x4",    size_mb: 4 << 10, dq: 4,  banks: 8, columns: 1 << 11 },
    OrgRow { name: "SALP_4Gb_x8",    size_mb: 4 << 10, dq: 8,  banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_4Gb_x16",   size_mb: 4 << 10, dq: 16, banks: 8, columns: 1 << 10 },
    OrgRow { name: "SALP_8Gb_x4",    size_mb: 8 << 10, dq: 4,  banks: 8, columns: 1 << 12 },
    OrgRow { name: "SALP_8Gb_x8",    size_mb: 8 << 10, dq: 8,  banks: 8, columns: 1 << 11 },
    OrgRow { name: "SALP_8Gb_x16",   size_mb: 8 << 10, dq: 16, banks: 8, columns: 1 << 10 },
];

#[allow(clippy::too_many_arguments)]
fn bin(
    rate: u32,
    mul: u32,
    cl: i64,
    rcd: i64,
    rp: i64,
    cwl: i64,
    ras: i64,
    rc: i64,
    rtp: i64,
    wtr: i64,
    wr: i64,
    ra: i64,
    wa: i64,
    refi: i64,
    pd: i64,
    xp: i64,
    xpdll: i64,
    ckesr: i64,
) -> SpeedEntry {
    SpeedEntry {
        rate,
        freq: (400.0 / 3.0) * mul as f64,
        t_ck: (3.0 / 0.4) / mul as f64,
        n_bl: 4,
        n_ccd: 4,
        n_rtrs: 2,
        n_cl: cl,
        n_rcd: rcd,
        n_rp: rp,
        n_pa: 1,
        n_cwl: cwl,
        n_ras: ras,
        n_rc: rc,
        n_rtp: rtp,
        n_wtr: wtr,
        n_wr: wr,
        n_ra: ra,
        n_wa: wa,
        n_refi: refi,
        n_pd: pd,
        n_xp: xp,
        n_xpdll: xpdll,
        n_ckesr: ckesr,
        n_xsdll: 512,
        n_scd: 1,
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "SALP_800D"  => bin(800,  3,  5,  5,  5,  5, 15, 20, 4, 4,  6, 3, 12, 3120, 3, 3, 10, 4),
        "SALP_800E"  => bin(800,  3,  6,  6,  6,  5, 15, 21, 4, 4,  6, 3, 12, 3120, 3, 3, 10, 4),
        "SALP_1066E" => bin(1066, 4,  6,  6,  6,  6, 20, 26, 4, 4,  8, 3, 14, 4160, 3, 4, 13, 4),
        "SALP_1066F" => bin(1066, 4,  7,  7,  7,  6, 20, 27, 4, 4,  8, 4, 14, 4160, 3, 4, 13, 4),
        "SALP_1066G" => bin(1066, 4,  8,  8,  8,  6, 20, 28, 4, 4,  8, 4, 14, 4160, 3, 4, 13, 4),
        "SALP_1333G" => bin(1333, 5,  8,  8,  8,  7, 24, 32, 5, 5, 10, 4, 16, 5200, 4, 4, 16, 5),
        "SALP_1333H" => bin(1333, 5,  9,  9,  9,  7, 24, 33, 5, 5, 10, 5, 16, 5200, 4, 4, 16, 5),
        "SALP_1600H" => bin(1600, 6,  9,  9,  9,  8, 28, 37, 6, 6, 12, 5, 18, 6240, 4, 5, 20, 5),
        "SALP_1600J" => bin(1600, 6, 10, 10, 10,  8, 28, 38, 6, 6, 12, 5, 18, 6240, 4, 5, 20, 5),
        "SALP_1600K" => bin(1600, 6, 11, 11, 11,  8, 28, 39, 6, 6, 12, 6, 18, 6240, 4, 5, 20, 5),
        "SALP_1866K" => bin(1866, 7, 11, 11, 11,  9, 32, 43, 7, 7, 14, 6, 20, 7280, 5, 6, 23, 6),
        "SALP_1866L" => bin(1866, 7, 12, 12, 12,  9, 32, 44, 7, 7, 14, 6, 20, 7280, 5, 6, 23, 6),
        "SALP_2133L" => bin(2133, 8, 12, 12, 12, 10, 36, 48, 8, 8, 16, 6, 22, 8320, 6, 7, 26, 7),
        "SALP_2133M" => bin(2133, 8, 13, 13, 13, 10, 36, 49, 8, 8, 16, 7, 22, 8320, 6, 7, 26, 7),
        _ => return None,
    })
}

fn kind_of(name: &str) -> Option<SalpKind> {
    match name {
        "SALP-1" => Some(SalpKind::Salp1),
        "SALP-2" => Some(SalpKind::Salp2),
        "SALP-MASA" => Some(SalpKind::Masa),
        _ => None,
    }
}

/// Builds a SALP spec. `subarrays` must be a power of two in [1, 128]; the
/// row count per subarray follows from it.
pub fn spec(org: &str, speed: &str, kind_name: &str, subarrays: u32) -> Result<Spec, ConfigError> {
    let kind = kind_of(kind_name)
        .ok_or_else(|| ConfigError::UnknownStandard(kind_name.to_string()))?;
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "SALP",
            org: org.to_string(),
        })?;
    if subarrays == 0 || subarrays > 128 || !subarrays.is_power_of_two() {
        return Err(ConfigError::BadSubarrays(subarrays));
    }

    let name = match kind {
        SalpKind::Salp1 => "SALP-1",
        SalpKind::Salp2 => "SALP-2",
        SalpKind::Masa => "SALP-MASA",
    };
    let mut s = Spec::blank(StandardKind::Salp, name, &LEVELS);
    let per_subarray = u64::from(row.dq) * u64::from(row.banks) * u64::from(subarrays)
        * u64::from(row.columns);
    let rows = (u64::from(row.size_mb) << 20) / per_subarray;
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: vec![0, 0, row.banks, subarrays, rows as u32, row.columns],
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "SALP",
        speed: speed.to_string(),
    })?;
    ddr3::derive_speed(&mut s.speed, &s.org, CO);

    s.prefetch_size = 8;
    s.channel_width = 64;
    s.read_latency = s.speed.n_cl + s.speed.n_bl;
    s.variant = Variant::Salp(kind);
    s.classify.closing = |cmd| {
        matches!(
            cmd,
            Command::Rda | Command::Wra | Command::Pre | Command::Prer | Command::PreOther
        )
    };

    s.start[RA] = Some(State::PowerUp);
    s.start[BA] = Some(State::Closed);
    s.start[SA] = Some(State::Closed);

    set_scopes(&mut s, kind);
    ddr3::set_translate(&mut s);
    set_prereqs(&mut s, kind);
    set_effects(&mut s, kind);
    set_timing(&mut s, kind);
    Ok(s)
}

fn set_scopes(s: &mut Spec, kind: SalpKind) {
    use Command::*;
    s.scope[Act.index()] = RO;
    s.scope[Sasel.index()] = SA;
    s.scope[Pre.index()] = if kind == SalpKind::Salp1 { BA } else { SA };
    s.scope[PreOther.index()] = SA;
    s.scope[Prer.index()] = RA;
    for cmd in [Rd, Wr, Rda, Wra] {
        s.scope[cmd.index()] = CO;
    }
    for cmd in [Ref, Pde, Pdx, Sre, Srx] {
        s.scope[cmd.index()] = RA;
    }
}

// SALP-1: a bank holds one open row; which subarray it lives in only matters
// for precharge overlap.
fn salp1_bank_gate(_spec: &Spec, node: &Node, _cmd: Command, _addr: &[i32]) -> Option<Command> {
    match node.state {
        Some(State::Closed) => Some(Command::Act),
        Some(State::Opened) => None, // decided at the subarray
        other => panic!("bank in unexpected state {:?}", other),
    }
}

fn salp1_subarray_gate(_spec: &Spec, node: &Node, cmd: Command, addr: &[i32]) -> Option<Command> {
    if node.row_state.contains_key(&addr_at(addr, RO)) {
        Some(cmd)
    } else if !node.row_state.is_empty() {
        Some(Command::Pre)
    } else {
        Some(Command::PreOther)
    }
}

// SALP-2: registered at the bank so the sibling subarrays are visible.
fn salp2_bank_gate(_spec: &Spec, node: &Node, cmd: Command, addr: &[i32]) -> Option<Command> {
    let sa_id = addr_at(addr, SA);
    let sa = &node.children[sa_id as usize];
    match sa.state {
        Some(State::Closed) => Some(Command::Act),
        Some(State::Opened) => {
            if sa.row_state.contains_key(&addr_at(addr, RO)) {
                let other_open = node
                    .children
                    .iter()
                    .any(|s| s.id as i32 != sa_id && s.state == Some(State::Opened));
                if other_open {
                    Some(Command::PreOther)
                } else {
                    Some(cmd)
                }
            } else {
                Some(Command::Pre)
            }
        }
        other => panic!("subarray in unexpected state {:?}", other),
    }
}

fn masa_subarray_gate(_spec: &Spec, node: &Node, cmd: Command, addr: &[i32]) -> Option<Command> {
    let hit = node.row_state.contains_key(&addr_at(addr, RO));
    match node.state {
        Some(State::Closed) => Some(Command::Act),
        Some(State::Opened) => {
            if hit {
                Some(Command::Sasel)
            } else {
                Some(Command::Pre)
            }
        }
        Some(State::Selected) => {
            if hit {
                Some(cmd)
            } else {
                Some(Command::Pre)
            }
        }
        other => panic!("subarray in unexpected state {:?}", other),
    }
}

fn set_prereqs(s: &mut Spec, kind: SalpKind) {
    use Command::*;
    for cmd in [Rd, Wr] {
        s.prereq.set(RA, cmd, rank_data_gate);
        match kind {
            SalpKind::Salp1 => {
                s.prereq.set(BA, cmd, salp1_bank_gate);
                s.prereq.set(SA, cmd, salp1_subarray_gate);
                s.row_open.set(BA, cmd, row_open);
            }
            SalpKind::Salp2 => {
                s.prereq.set(BA, cmd, salp2_bank_gate);
                s.row_open.set(SA, cmd, row_open);
            }
            SalpKind::Masa => {
                s.prereq.set(SA, cmd, masa_subarray_gate);
                s.row_open.set(SA, cmd, row_open);
            }
        }
        s.row_hit.set(SA, cmd, row_hit);
    }
    s.prereq.set(RA, Ref, ref_needs_prer);
    s.prereq.set(RA, Pde, rank_pde_gate);
    s.prereq.set(RA, Sre, rank_sre_gate);
}

// SALP-1 effects: the bank mirrors its single open subarray.

fn salp1_bank_open(_spec: &Spec, node: &mut Node, _addr: &[i32]) {
    node.state = Some(State::Opened);
}

fn salp1_bank_close(_spec: &Spec, node: &mut Node, addr: &[i32]) {
    node.state = Some(State::Closed);
    let sa = addr_at(addr, SA);
    let child = &mut node.children[sa as usize];
    child.state = Some(State::Closed);
    child.row_state.clear();
}

// MASA effects live at the bank, where sibling subarrays are reachable for
// the implicit deselect.

fn masa_bank_act(_spec: &Spec, node: &mut Node, addr: &[i32]) {
    let sa = addr_at(addr, SA) as usize;
    for sibling in &mut node.children {
        if sibling.id != sa && sibling.state == Some(State::Selected) {
            sibling.state = Some(State::Opened);
        }
    }
    let child = &mut node.children[sa];
    child.state = Some(State::Selected);
    let _ = child.row_state.insert(addr_at(addr, RO), State::Opened);
}

fn masa_bank_sasel(_spec: &Spec, node: &mut Node, addr: &[i32]) {
    let sa = addr_at(addr, SA) as usize;
    for sibling in &mut node.children {
        if sibling.id != sa && sibling.state == Some(State::Selected) {
            sibling.state = Some(State::Opened);
        }
    }
    node.children[sa].state = Some(State::Selected);
}

fn set_effects(s: &mut Spec, kind: SalpKind) {
    use Command::*;
    match kind {
        SalpKind::Salp1 => {
            s.effect.set(BA, Act, salp1_bank_open);
            s.effect.set(SA, Act, open_row);
            s.effect.set(BA, Pre, salp1_bank_close);
            s.effect.set(BA, PreOther, salp1_bank_close);
            s.effect.set(BA, Rda, salp1_bank_close);
            s.effect.set(BA, Wra, salp1_bank_close);
        }
        SalpKind::Salp2 => {
            s.effect.set(SA, Act, open_row);
            s.effect.set(SA, Pre, close_node);
            s.effect.set(SA, PreOther, close_node);
            s.effect.set(SA, Rda, close_node);
            s.effect.set(SA, Wra, close_node);
        }
        SalpKind::Masa => {
            s.effect.set(BA, Act, masa_bank_act);
            s.effect.set(BA, Sasel, masa_bank_sasel);
            s.effect.set(SA, Pre, close_node);
            s.effect.set(SA, Rda, close_node);
            s.effect.set(SA, Wra, close_node);
        }
    }
    s.effect.set(RA, Prer, close_subtree);
    s.effect.set(RA, Pde, rank_power_down);
    s.effect.set(RA, Pdx, rank_power_up);
    s.effect.set(RA, Sre, rank_self_refresh);
    s.effect.set(RA, Srx, rank_power_up);
}

fn set_timing(s: &mut Spec, kind: SalpKind) {
    use Command::*;
    let e = s.speed;
    let t = &mut s.timing;
    const CAS: [Command; 4] = [Rd, Rda, Wr, Wra];
    const RDS: [Command; 2] = [Rd, Rda];
    const WRS: [Command; 2] = [Wr, Wra];

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

    // Rank: CAS to PRER
    t.add(RA, Rd, Prer, e.n_rtp);
    t.add(RA, Wr, Prer, e.n_cwl + e.n_bl + e.n_wr);

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
    t.add(RA, Act, Prer, e.n_ras);
    t.add(RA, Prer, Act, e.n_rp);

    // Rank: RAS to REF
    t.add(RA, Pre, Ref, e.n_rp);
    t.add(RA, Prer, Ref, e.n_rp);
    t.add(RA, PreOther, Ref, e.n_rp);
    t.add(RA, Ref, Act, e.n_rfc);

    // Rank: RAS to PD
    t.add(RA, Act, Pde, 1);
    t.add(RA, Pdx, Act, e.n_xp);
    t.add(RA, Pdx, Pre, e.n_xp);
    t.add(RA, Pdx, Prer, e.n_xp);

    // Rank: RAS to SR
    t.add(RA, Pre, Sre, e.n_rp);
    t.add(RA, Prer, Sre, e.n_rp);
    t.add(RA, PreOther, Sre, e.n_rp);
    t.add(RA, Srx, Act, e.n_xs);

    // Rank: REF, PD, SR interactions
    t.add(RA, Ref, Ref, e.n_rfc);
    t.add(RA, Ref, Pde, 1);
    t.add(RA, Pdx, Ref, e.n_xp);
    t.add(RA, Srx, Ref, e.n_xs);
    t.add(RA, Pde, Pdx, e.n_pd);
    t.add(RA, Pdx, Pde, e.n_xp);
    t.add(RA, Pdx, Sre, e.n_xp);
    t.add(RA, Srx, Pde, e.n_xs);
    t.add(RA, Sre, Srx, e.n_ckesr);
    t.add(RA, Srx, Sre, e.n_xs);

    // Bank: SALP-1 precharges all subarrays together, so column and
    // activation activity in the whole bank gates the precharge.
    if kind == SalpKind::Salp1 {
        t.add(BA, Act, Pre, e.n_ras);
        t.add(BA, Rd, Pre, e.n_rtp);
        t.add(BA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
        t.add(BA, Act, PreOther, e.n_ras);
        t.add(BA, Rd, PreOther, e.n_rtp);
        t.add(BA, Wr, PreOther, e.n_cwl + e.n_bl + e.n_wr);
    }

    // SubArray: CAS to RAS
    for b in CAS {
        t.add(SA, Act, b, e.n_rcd);
    }
    t.add(SA, Rd, Pre, e.n_rtp);
    t.add(SA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
    t.add(SA, Rda, Act, e.n_rtp + e.n_rp);
    t.add(SA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_rp);

    // SubArray: RAS to RAS
    t.add(SA, Act, Act, e.n_rc);
    t.add(SA, Act, Pre, e.n_ras);
    t.add(SA, Pre, Act, e.n_rp);

    if kind == SalpKind::Masa {
        for b in CAS {
            t.add(SA, Sasel, b, e.n_scd);
        }
    }

    // SubArray: sibling constraints express what each flavor shares
    match kind {
        SalpKind::Salp1 => {
            t.add_sibling(SA, Pre, Act, e.n_pa);
            t.add_sibling(SA, PreOther, Act, e.n_pa);
            // auto-precharge forms
            t.add_sibling(SA, Act, Act, e.n_rc - e.n_rp + e.n_pa);
            t.add_sibling(SA, Rda, Act, e.n_rtp + e.n_pa);
            t.add_sibling(SA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_pa);
        }
        SalpKind::Salp2 => {
            t.add_sibling(SA, Act, Act, e.n_rcd + e.n_ra);
            t.add_sibling(SA, Rd, Act, e.n_ra);
            t.add_sibling(SA, Rda, Act, e.n_ra);
            t.add_sibling(SA, Wr, Act, e.n_wa);
            t.add_sibling(SA, Wra, Act, e.n_wa);
        }
        SalpKind::Masa => {
            t.add_sibling(SA, Rd, Act, e.n_ra);
            t.add_sibling(SA, Rda, Act, e.n_ra);
            t.add_sibling(SA, Wr, Act, e.n_wa);
            t.add_sibling(SA, Wra, Act, e.n_wa);

            t.add_sibling(SA, Rd, Sasel, e.n_ra);
            t.add_sibling(SA, Rda, Sasel, e.n_ra);
            t.add_sibling(SA, Wr, Sasel, e.n_wa);
            t.add_sibling(SA, Wra, Sasel, e.n_wa);

            t.add_sibling(SA, Rd, Rd, e.n_ra);
            t.add_sibling(SA, Rda, Rda, e.n_ra);
            t.add_sibling(SA, Wr, Wr, e.n_wa);
            t.add_sibling(SA, Wra, Wra, e.n_wa);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dram::Node;

    #[test]
    fn row_count_scales_with_subarrays() {
        let s = spec("SALP_2Gb_x8", "SALP_1600K", "SALP-MASA", 8).unwrap();
        // 2Gb / (8 dq * 8 banks * 8 subarrays * 1024 columns)
        assert_eq!(s.org.count[RO], 4096);
        assert_eq!(s.speed.n_rrd, 5);
        assert_eq!(s.speed.n_faw, 24);
    }

    #[test]
    fn subarray_count_validated() {
        assert!(spec("SALP_2Gb_x8", "SALP_1600K", "SALP-MASA", 3).is_err());
        assert!(spec("SALP_2Gb_x8", "SALP_1600K", "SALP-MASA", 256).is_err());
    }

    #[test]
    fn masa_requires_select_before_column() {
        let mut s = spec("SALP_2Gb_x8", "SALP_1600K", "SALP-MASA", 8).unwrap();
        s.org.count[CH] = 1;
        s.org.count[RA] = 1;
        let mut ch = Node::channel(&s, 0);
        let addr = [0, 0, 0, 2, 5, 0];

        assert_eq!(ch.decode(&s, Command::Rd, &addr), Command::Act);
        ch.update(&s, Command::Act, &addr, 0);
        // activation leaves the subarray selected, so the read is next
        assert_eq!(ch.decode(&s, Command::Rd, &addr), Command::Rd);

        // activating a sibling subarray deselects this one
        let other = [0, 0, 0, 3, 9, 0];
        ch.update(&s, Command::Act, &other, 50);
        assert_eq!(ch.decode(&s, Command::Rd, &addr), Command::Sasel);
        // both rows stay open
        assert!(ch.check_row_hit(&s, Command::Rd, &addr));
        assert!(ch.check_row_hit(&s, Command::Rd, &other));
    }

    #[test]
    fn salp1_precharge_scope_is_bank() {
        let s1 = spec("SALP_2Gb_x8", "SALP_1600K", "SALP-1", 8).unwrap();
        assert_eq!(s1.scope_of(Command::Pre), BA);
        let masa = spec("SALP_2Gb_x8", "SALP_1600K", "SALP-MASA", 8).unwrap();
        assert_eq!(masa.scope_of(Command::Pre), SA);
    }
}
