//! Tiered-latency DRAM.
//!
//! Each bank's rows are split by a segment ratio: every `ratio`-th row sits
//! in the near (fast) segment with its own activate/precharge/restore
//! timings (nRCDF/nRPF/nRASF/nRCF), the rest in the far (slow) segment. A
//! third timing set (the M parameters) covers migration, which copies a row
//! between segments with the MIG command; the controller reclassifies a
//! scheduled read into a migration request before issuing.

use super::*;
use crate::request::ReqKind;
use crate::spec::{
    Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State, TldramGeometry, Variant,
};

pub(crate) const CH: usize = 0;
pub(crate) const RA: usize = 1;
pub(crate) const BA: usize = 2;
pub(crate) const RO: usize = 3;
const CO: usize = 4;

/// Rows per fast-segment row; row ids divisible by this are fast.
pub const DEFAULT_SEGMENT_RATIO: u32 = 16;

const LEVELS: [Level; 5] = [
    Level::Channel,
    Level::Rank,
    Level::Bank,
    Level::Row,
    Level::Column,
];

struct OrgRow {
    name: &'static str,
    size_mb: u32,
    dq: u32,
    count: [u32; 5],
}

#[rustfmt::skip]
const ORGS: &[OrgRow] = &[
    OrgRow { name: "TLDRAM_512Mb_x4",  size_mb: 512,     dq: 4,  count: [0, 0, 8, 1 << 13, 1 << 11] },
    OrgRow { name: "TLDRAM_512Mb_x8",  size_mb: 512,     dq: 8,  count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "TLDRAM_512Mb_x16", size_mb: 512,     dq: 16, count: [0, 0, 8, 1 << 12, 1 << 10] },
    OrgRow { name: "TLDRAM_1Gb_x4",    size_mb: 1 << 10, dq: 4,  count: [0, 0, 8, 1 << 14, 1 << 11] },
    OrgRow { name: "TLDRAM_1Gb_x8",    size_mb: 1 << 10, dq: 8,  count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "TLDRAM_1Gb_x16",   size_mb: 1 << 10, dq: 16, count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "TLDRAM_2Gb_x4",    size_mb: 2 << 10, dq: 4,  count: [0, 0, 8, 1 << 15, 1 << 11] },
    OrgRow { name: "TLDRAM_2Gb_x8",    size_mb: 2 << 10, dq: 8,  count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "TLDRAM_2Gb_x16",   size_mb: 2 << 10, dq: 16, count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "TLDRAM_4Gb_x4",    size_mb: 4 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "TLDRAM_4Gb_x8",    size_mb: 4 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 10] },
    OrgRow { name: "TLDRAM_4Gb_x16",   size_mb: 4 << 10, dq: 16, count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "TLDRAM_8Gb_x4",    size_mb: 8 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 12] },
    OrgRow { name: "TLDRAM_8Gb_x8",    size_mb: 8 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "TLDRAM_8Gb_x16",   size_mb: 8 << 10, dq: 16, count: [0, 0, 8, 1 << 16, 1 << 10] },
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
        n_cwl: cwl,
        n_ras: ras,
        n_rc: rc,
        n_rtp: rtp,
        n_wtr: wtr,
        n_wr: wr,
        n_refi: refi,
        n_pd: pd,
        n_xp: xp,
        n_xpdll: xpdll,
        n_ckesr: ckesr,
        n_xsdll: 512,
        // near-segment and migration timing sets are rate-independent
        n_rcd_f: 3,
        n_rp_f: 3,
        n_ras_f: 10,
        n_rc_f: 13,
        n_rcd_m: 6,
        n_rp_m: 6,
        n_ras_m: 20,
        n_rc_m: 26,
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "TLDRAM_800D"  => bin(800,  3,  5,  5,  5,  5, 15, 20, 4, 4,  6, 3120, 3, 3, 10, 4),
        "TLDRAM_800E"  => bin(800,  3,  6,  6,  6,  5, 15, 21, 4, 4,  6, 3120, 3, 3, 10, 4),
        "TLDRAM_1066E" => bin(1066, 4,  6,  6,  6,  6, 20, 26, 4, 4,  8, 4160, 3, 4, 13, 4),
        "TLDRAM_1066F" => bin(1066, 4,  7,  7,  7,  6, 20, 27, 4, 4,  8, 4160, 3, 4, 13, 4),
        "TLDRAM_1066G" => bin(1066, 4,  8,  8,  8,  6, 20, 28, 4, 4,  8, 4160, 3, 4, 13, 4),
        "TLDRAM_1333G" => bin(1333, 5,  8,  8,  8,  7, 24, 32, 5, 5, 10, 5200, 4, 4, 16, 5),
        "TLDRAM_1333H" => bin(1333, 5,  9,  9,  9,  7, 24, 33, 5, 5, 10, 5200, 4, 4, 16, 5),
        "TLDRAM_1600H" => bin(1600, 6,  9,  9,  9,  8, 28, 37, 6, 6, 12, 6240, 4, 5, 20, 5),
        "TLDRAM_1600J" => bin(1600, 6, 10, 10, 10,  8, 28, 38, 6, 6, 12, 6240, 4, 5, 20, 5),
        "TLDRAM_1600K" => bin(1600, 6, 11, 11, 11,  8, 28, 39, 6, 6, 12, 6240, 4, 5, 20, 5),
        "TLDRAM_1866K" => bin(1866, 7, 11, 11, 11,  9, 32, 43, 7, 7, 14, 7280, 5, 6, 23, 6),
        "TLDRAM_1866L" => bin(1866, 7, 12, 12, 12,  9, 32, 44, 7, 7, 14, 7280, 5, 6, 23, 6),
        "TLDRAM_2133L" => bin(2133, 8, 12, 12, 12, 10, 36, 48, 8, 8, 16, 8320, 6, 7, 26, 7),
        "TLDRAM_2133M" => bin(2133, 8, 13, 13, 13, 10, 36, 49, 8, 8, 16, 8320, 6, 7, 26, 7),
        _ => return None,
    })
}

fn segment_ratio(spec: &Spec) -> i32 {
    match spec.variant {
        Variant::Tldram(geom) => geom.segment_ratio as i32,
        _ => unreachable!("TLDRAM gate on a non-TLDRAM spec"),
    }
}

/// True when the addressed row lives in the near (fast) segment.
fn is_fast_row(spec: &Spec, row: i32) -> bool {
    row % segment_ratio(spec) == 0
}

fn bank_rd_gate(spec: &Spec, node: &Node, cmd: Command, addr: &[i32]) -> Option<Command> {
    let row = addr_at(addr, RO);
    match node.state {
        Some(State::Closed) => Some(if is_fast_row(spec, row) {
            Command::ActF
        } else {
            Command::Act
        }),
        Some(State::Opened) => {
            if node.row_state.contains_key(&row) {
                Some(cmd)
            } else if is_fast_row(spec, row) {
                Some(Command::PreF)
            } else {
                Some(Command::Pre)
            }
        }
        other => panic!("bank in unexpected state {:?}", other),
    }
}

fn bank_mig_gate(_spec: &Spec, node: &Node, cmd: Command, addr: &[i32]) -> Option<Command> {
    match node.state {
        Some(State::Closed) => Some(Command::ActM),
        Some(State::Opened) => {
            if node.row_state.contains_key(&addr_at(addr, RO)) {
                Some(cmd)
            } else {
                Some(Command::PreM)
            }
        }
        other => panic!("bank in unexpected state {:?}", other),
    }
}

fn ref_gate(spec: &Spec, node: &Node, _cmd: Command, addr: &[i32]) -> Option<Command> {
    let any_open = node
        .children
        .iter()
        .any(|bank| bank.state == Some(State::Opened));
    if !any_open {
        return Some(Command::Ref);
    }
    Some(if is_fast_row(spec, addr_at(addr, BA)) {
        Command::PreaF
    } else {
        Command::Prea
    })
}

/// Builds the TLDRAM spec with the default segment ratio.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    spec_with_ratio(org, speed, DEFAULT_SEGMENT_RATIO)
}

/// Builds the TLDRAM spec with an explicit segment ratio.
pub fn spec_with_ratio(org: &str, speed: &str, ratio: u32) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "TLDRAM",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Tldram, "TLDRAM", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "TLDRAM",
        speed: speed.to_string(),
    })?;
    ddr3::derive_speed(&mut s.speed, &s.org, CO);

    s.prefetch_size = 8;
    s.channel_width = 64;
    s.read_latency = s.speed.n_cl + s.speed.n_bl;
    s.variant = Variant::Tldram(TldramGeometry {
        segment_ratio: ratio,
        fast_rows: s.org.count[RO] / ratio,
    });
    s.classify = crate::spec::Classifiers {
        opening: |cmd| matches!(cmd, Command::Act | Command::ActF | Command::ActM),
        accessing: |cmd| matches!(cmd, Command::Rd | Command::Wr | Command::Mig),
        closing: |cmd| {
            matches!(
                cmd,
                Command::Pre
                    | Command::PreF
                    | Command::PreM
                    | Command::Prea
                    | Command::PreaF
                    | Command::PreaM
            )
        },
        refreshing: |cmd| matches!(cmd, Command::Ref),
    };

    s.start[RA] = Some(State::PowerUp);
    s.start[BA] = Some(State::Closed);

    set_scopes(&mut s);
    set_translate(&mut s);
    set_prereqs(&mut s);
    set_effects(&mut s);
    set_timing(&mut s);
    Ok(s)
}

fn set_scopes(s: &mut Spec) {
    use Command::*;
    for cmd in [Act, ActF, ActM] {
        s.scope[cmd.index()] = RO;
    }
    for cmd in [Pre, PreF, PreM] {
        s.scope[cmd.index()] = BA;
    }
    for cmd in [Prea, PreaF, PreaM] {
        s.scope[cmd.index()] = RA;
    }
    for cmd in [Rd, Wr, Mig] {
        s.scope[cmd.index()] = CO;
    }
    for cmd in [Ref, Pde, Pdx, Sre, Srx] {
        s.scope[cmd.index()] = RA;
    }
}

fn set_translate(s: &mut Spec) {
    s.translate[ReqKind::Read.index()] = Some(Command::Rd);
    s.translate[ReqKind::Write.index()] = Some(Command::Wr);
    s.translate[ReqKind::Refresh.index()] = Some(Command::Ref);
    s.translate[ReqKind::PowerDown.index()] = Some(Command::Pde);
    s.translate[ReqKind::SelfRefresh.index()] = Some(Command::Sre);
    s.translate[ReqKind::Extension.index()] = Some(Command::Mig);
}

fn set_prereqs(s: &mut Spec) {
    use Command::*;
    for cmd in [Rd, Wr, Mig] {
        s.prereq.set(RA, cmd, rank_data_gate);
    }
    s.prereq.set(BA, Rd, bank_rd_gate);
    s.prereq.set(BA, Wr, bank_rd_gate);
    s.prereq.set(BA, Mig, bank_mig_gate);
    for cmd in [Rd, Wr] {
        s.row_hit.set(BA, cmd, row_hit);
        s.row_open.set(BA, cmd, row_open);
    }
    s.prereq.set(RA, Ref, ref_gate);
    s.prereq.set(RA, Pde, rank_pde_gate);
    s.prereq.set(RA, Sre, rank_sre_gate);
}

fn set_effects(s: &mut Spec) {
    use Command::*;
    for cmd in [Act, ActF, ActM] {
        s.effect.set(BA, cmd, open_row);
    }
    for cmd in [Pre, PreF, PreM] {
        s.effect.set(BA, cmd, close_node);
    }
    for cmd in [Prea, PreaF, PreaM] {
        s.effect.set(RA, cmd, close_subtree);
    }
    s.effect.set(RA, Pde, rank_power_down);
    s.effect.set(RA, Pdx, rank_power_up);
    s.effect.set(RA, Sre, rank_self_refresh);
    s.effect.set(RA, Srx, rank_power_up);
}

fn set_timing(s: &mut Spec) {
    use Command::*;
    let e = s.speed;
    let t = &mut s.timing;
    const ACTS: [Command; 3] = [Act, ActF, ActM];
    const PRES: [Command; 3] = [Pre, PreF, PreM];
    const PREAS: [Command; 3] = [Prea, PreaF, PreaM];

    // Channel: data bus
    t.add(CH, Rd, Rd, e.n_bl);
    t.add(CH, Rd, Mig, e.n_bl);
    t.add(CH, Mig, Rd, e.n_bl);
    t.add(CH, Mig, Mig, e.n_bl);
    t.add(CH, Wr, Wr, e.n_bl);

    // Rank: CAS to CAS
    t.add(RA, Rd, Rd, e.n_ccd);
    t.add(RA, Rd, Mig, e.n_ccd);
    t.add(RA, Mig, Rd, e.n_ccd);
    t.add(RA, Mig, Mig, e.n_ccd);
    t.add(RA, Rd, Wr, e.n_cl + e.n_ccd + 2 - e.n_cwl);
    t.add(RA, Mig, Wr, e.n_cl + e.n_ccd + 2 - e.n_cwl);
    t.add(RA, Wr, Rd, e.n_cwl + e.n_bl + e.n_wtr);
    t.add(RA, Wr, Mig, e.n_cwl + e.n_bl + e.n_wtr);
    t.add(RA, Wr, Wr, e.n_ccd);

    // Rank: CAS to CAS between sibling ranks, and CAS to PREA forms
    for cas in [Rd, Mig] {
        t.add_sibling(RA, cas, Rd, e.n_bl + e.n_rtrs);
        t.add_sibling(RA, cas, Mig, e.n_bl + e.n_rtrs);
        t.add_sibling(RA, cas, Wr, e.n_bl + e.n_rtrs);
        t.add_sibling(RA, cas, Wr, e.n_cl + e.n_bl + e.n_rtrs - e.n_cwl);
        for prea in PREAS {
            t.add(RA, cas, prea, e.n_rtp);
        }
    }
    t.add_sibling(RA, Wr, Rd, e.n_cwl + e.n_bl + e.n_rtrs - e.n_cl);
    t.add_sibling(RA, Wr, Mig, e.n_cwl + e.n_bl + e.n_rtrs - e.n_cl);
    for prea in PREAS {
        t.add(RA, Wr, prea, e.n_cwl + e.n_bl + e.n_wr);
    }

    // Rank: CAS to PD
    t.add(RA, Rd, Pde, e.n_cl + e.n_bl + 1);
    t.add(RA, Mig, Pde, e.n_cl + e.n_bl + 1);
    t.add(RA, Wr, Pde, e.n_cwl + e.n_bl + e.n_wr);
    for cas in [Rd, Mig, Wr] {
        t.add(RA, Pdx, cas, e.n_xp);
    }

    // Rank: RAS to RAS; tRAS and the precharge recovery depend on which
    // segment the prior activate hit
    for (act, ras) in [(Act, e.n_ras), (ActF, e.n_ras_f), (ActM, e.n_ras_m)] {
        for other in ACTS {
            t.add(RA, act, other, e.n_rrd);
            t.add_dist(RA, act, other, 4, e.n_faw);
        }
        for pre in PRES {
            t.add(RA, act, pre, ras);
        }
        for prea in PREAS {
            t.add(RA, act, prea, ras);
        }
    }
    for (pre, rp) in [(Pre, e.n_rp), (PreF, e.n_rp_f), (PreM, e.n_rp_m)] {
        for act in ACTS {
            t.add(RA, pre, act, rp);
        }
        t.add(RA, pre, Ref, rp);
        t.add(RA, pre, Sre, rp);
    }
    for (prea, rp) in [(Prea, e.n_rp), (PreaF, e.n_rp_f), (PreaM, e.n_rp_m)] {
        t.add(RA, prea, Ref, rp);
        t.add(RA, prea, Sre, rp);
    }
    for act in ACTS {
        t.add(RA, Ref, act, e.n_rfc);
        t.add(RA, act, Pde, 1);
        t.add(RA, Pdx, act, e.n_xp);
        t.add(RA, Srx, act, e.n_xs);
    }
    for pre in PRES {
        t.add(RA, Pdx, pre, e.n_xp);
    }

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

    // Bank: CAS to RAS per segment
    for (act, rcd) in [(Act, e.n_rcd), (ActF, e.n_rcd_f), (ActM, e.n_rcd_m)] {
        t.add(BA, act, Rd, rcd);
        t.add(BA, act, Mig, rcd);
        t.add(BA, act, Wr, rcd);
    }
    for pre in PRES {
        t.add(BA, Rd, pre, e.n_rtp);
        t.add(BA, Mig, pre, e.n_rtp);
    }
    t.add(BA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
    t.add(BA, Wr, PreF, e.n_cwl + e.n_bl + e.n_wr);

    // Bank: RAS to RAS per segment
    for (act, rc) in [(Act, e.n_rc), (ActF, e.n_rc_f), (ActM, e.n_rc_m)] {
        for other in ACTS {
            t.add(BA, act, other, rc);
        }
    }
    for (act, ras) in [(Act, e.n_ras), (ActF, e.n_ras_f), (ActM, e.n_ras_m)] {
        for pre in PRES {
            t.add(BA, act, pre, ras);
        }
    }
    for (pre, rp) in [(Pre, e.n_rp), (PreF, e.n_rp_f), (PreM, e.n_rp_m)] {
        for act in ACTS {
            t.add(BA, pre, act, rp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dram::Node;

    fn one_rank(s: &mut Spec) {
        s.org.count[CH] = 1;
        s.org.count[RA] = 1;
    }

    #[test]
    fn fast_rows_activate_with_actf() {
        let mut s = spec("TLDRAM_2Gb_x8", "TLDRAM_1600K").unwrap();
        one_rank(&mut s);
        let ch = Node::channel(&s, 0);
        // row 32 is in the near segment, row 33 is not
        assert_eq!(ch.decode(&s, Command::Rd, &[0, 0, 0, 32, 0]), Command::ActF);
        assert_eq!(ch.decode(&s, Command::Rd, &[0, 0, 0, 33, 0]), Command::Act);
    }

    #[test]
    fn near_segment_is_faster() {
        let s = spec("TLDRAM_2Gb_x8", "TLDRAM_1600K").unwrap();
        assert!(s.speed.n_rcd_f < s.speed.n_rcd);
        assert!(s.speed.n_rc_f < s.speed.n_rc);
        // migration timings sit between the two segments
        assert!(s.speed.n_rcd_m < s.speed.n_rcd);
        assert!(s.speed.n_rcd_f < s.speed.n_rcd_m);
    }

    #[test]
    fn migration_decodes_through_actm() {
        let mut s = spec("TLDRAM_2Gb_x8", "TLDRAM_1600K").unwrap();
        one_rank(&mut s);
        let mut ch = Node::channel(&s, 0);
        let addr = [0, 0, 0, 33, 0];
        assert_eq!(ch.decode(&s, Command::Mig, &addr), Command::ActM);
        ch.update(&s, Command::ActM, &addr, 0);
        assert_eq!(ch.decode(&s, Command::Mig, &addr), Command::Mig);
        // migration activates pay the migration RAS-to-CAS delay
        assert!(!ch.check(&s, Command::Mig, &addr, e_rcd_m(&s) - 1));
        assert!(ch.check(&s, Command::Mig, &addr, e_rcd_m(&s)));
    }

    fn e_rcd_m(s: &Spec) -> i64 {
        s.speed.n_rcd_m
    }
}
