//! DDR3 SDRAM.
//!
//! Five-level hierarchy (`Channel > Rank > Bank > Row > Column`), 8n
//! prefetch, 64-bit channel. The speed bins carry zero for nRRD, nFAW, nRFC
//! and nXS; those depend on page size and chip density and are derived in
//! [`derive_speed`].

use super::*;
use crate::spec::{Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State};

pub(crate) const CH: usize = 0;
pub(crate) const RA: usize = 1;
pub(crate) const BA: usize = 2;
pub(crate) const RO: usize = 3;

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
    OrgRow { name: "DDR3_512Mb_x4",  size_mb: 512,    dq: 4,  count: [0, 0, 8, 1 << 13, 1 << 11] },
    OrgRow { name: "DDR3_512Mb_x8",  size_mb: 512,    dq: 8,  count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "DDR3_512Mb_x16", size_mb: 512,    dq: 16, count: [0, 0, 8, 1 << 12, 1 << 10] },
    OrgRow { name: "DDR3_1Gb_x4",    size_mb: 1 << 10, dq: 4,  count: [0, 0, 8, 1 << 14, 1 << 11] },
    OrgRow { name: "DDR3_1Gb_x8",    size_mb: 1 << 10, dq: 8,  count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "DDR3_1Gb_x16",   size_mb: 1 << 10, dq: 16, count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "DDR3_2Gb_x4",    size_mb: 2 << 10, dq: 4,  count: [0, 0, 8, 1 << 15, 1 << 11] },
    OrgRow { name: "DDR3_2Gb_x8",    size_mb: 2 << 10, dq: 8,  count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "DDR3_2Gb_x16",   size_mb: 2 << 10, dq: 16, count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "DDR3_4Gb_x4",    size_mb: 4 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "DDR3_4Gb_x8",    size_mb: 4 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 10] },
    OrgRow { name: "DDR3_4Gb_x16",   size_mb: 4 << 10, dq: 16, count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "DDR3_8Gb_x4",    size_mb: 8 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 12] },
    OrgRow { name: "DDR3_8Gb_x8",    size_mb: 8 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "DDR3_8Gb_x16",   size_mb: 8 << 10, dq: 16, count: [0, 0, 8, 1 << 16, 1 << 10] },
    OrgRow { name: "DDR3_2Gb_x16_bank16",  size_mb: 2 << 10, dq: 16, count: [0, 0, 16,  1 << 13, 1 << 10] },
    OrgRow { name: "DDR3_2Gb_x16_bank32",  size_mb: 2 << 10, dq: 16, count: [0, 0, 32,  1 << 12, 1 << 10] },
    OrgRow { name: "DDR3_2Gb_x16_bank64",  size_mb: 2 << 10, dq: 16, count: [0, 0, 64,  1 << 11, 1 << 10] },
    OrgRow { name: "DDR3_2Gb_x16_bank128", size_mb: 2 << 10, dq: 16, count: [0, 0, 128, 1 << 10, 1 << 10] },
    OrgRow { name: "DDR3_2Gb_x16_bank256", size_mb: 2 << 10, dq: 16, count: [0, 0, 256, 1 << 9,  1 << 10] },
];

/// One DDR3 speed bin. `mul` scales the 133.33 MHz base clock.
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
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "DDR3_800D"  => bin(800,  3,  5,  5,  5,  5, 15, 20, 4, 4,  6, 3120, 3, 3, 10, 4),
        "DDR3_800E"  => bin(800,  3,  6,  6,  6,  5, 15, 21, 4, 4,  6, 3120, 3, 3, 10, 4),
        "DDR3_1066E" => bin(1066, 4,  6,  6,  6,  6, 20, 26, 4, 4,  8, 4160, 3, 4, 13, 4),
        "DDR3_1066F" => bin(1066, 4,  7,  7,  7,  6, 20, 27, 4, 4,  8, 4160, 3, 4, 13, 4),
        "DDR3_1066G" => bin(1066, 4,  8,  8,  8,  6, 20, 28, 4, 4,  8, 4160, 3, 4, 13, 4),
        "DDR3_1333G" => bin(1333, 5,  8,  8,  8,  7, 24, 32, 5, 5, 10, 5200, 4, 4, 16, 5),
        "DDR3_1333H" => bin(1333, 5,  9,  9,  9,  7, 24, 33, 5, 5, 10, 5200, 4, 4, 16, 5),
        "DDR3_1600H" => bin(1600, 6,  9,  9,  9,  8, 28, 37, 6, 6, 12, 6240, 4, 5, 20, 5),
        "DDR3_1600J" => bin(1600, 6, 10, 10, 10,  8, 28, 38, 6, 6, 12, 6240, 4, 5, 20, 5),
        "DDR3_1600K" => bin(1600, 6, 11, 11, 11,  8, 28, 39, 6, 6, 12, 6240, 4, 5, 20, 5),
        "DDR3_1866K" => bin(1866, 7, 11, 11, 11,  9, 32, 43, 7, 7, 14, 7280, 5, 6, 23, 6),
        "DDR3_1866L" => bin(1866, 7, 12, 12, 12,  9, 32, 44, 7, 7, 14, 7280, 5, 6, 23, 6),
        "DDR3_2133L" => bin(2133, 8, 12, 12, 12, 10, 36, 48, 8, 8, 16, 8320, 6, 7, 26, 7),
        "DDR3_2133M" => bin(2133, 8, 13, 13, 13, 10, 36, 49, 8, 8, 16, 8320, 6, 7, 26, 7),
        "DDR3_2133_14" => bin(2133, 8, 14, 14, 14, 13, 36, 50, 8, 8, 16, 8320, 6, 7, 26, 7),
        "DDR3_2133L_unlimit_bandwidth" => {
            let mut e = bin(2133, 8, 12, 12, 12, 10, 36, 48, 8, 8, 16, 8320, 6, 7, 26, 7);
            e.n_bl = 0;
            e.n_ccd = 1;
            e
        }
        "DDR3_2133_14_unlimit_bandwidth" => {
            let mut e = bin(2133, 8, 14, 14, 14, 13, 36, 50, 8, 8, 16, 8320, 6, 7, 26, 7);
            e.n_bl = 0;
            e.n_ccd = 1;
            e
        }
        _ => return None,
    })
}

/// Fills in the page-size- and density-dependent parameters the bin table
/// leaves at zero.
pub(crate) fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry, col_level: usize) {
    // page size in KB decides the activate window
    let page = (org.dq * org.count[col_level]) >> 13;
    let (rrd, faw) = match s.rate {
        800 => (4, if page == 1 { 16 } else { 20 }),
        1066 => (if page == 1 { 4 } else { 6 }, if page == 1 { 20 } else { 27 }),
        1333 => (if page == 1 { 4 } else { 5 }, if page == 1 { 20 } else { 30 }),
        1600 => (if page == 1 { 5 } else { 6 }, if page == 1 { 24 } else { 32 }),
        1866 => (if page == 1 { 5 } else { 6 }, if page == 1 { 26 } else { 33 }),
        2133 => (if page == 1 { 5 } else { 6 }, if page == 1 { 27 } else { 34 }),
        rate => panic!("no activate-window table for rate {}", rate),
    };
    s.n_rrd = rrd;
    s.n_faw = faw;

    let chip = org.size_mb;
    let density = |a, b, c, d, e| match chip {
        512 => a,
        1024 => b,
        2048 => c,
        4096 => d,
        _ => e,
    };
    s.n_rfc = match s.rate {
        800 => density(36, 44, 64, 104, 140),
        1066 => density(48, 59, 86, 139, 187),
        1333 => density(60, 74, 107, 174, 234),
        1600 => density(72, 88, 128, 208, 280),
        1866 => density(84, 103, 150, 243, 327),
        2133 => density(96, 118, 171, 278, 374),
        rate => panic!("no refresh-cycle table for rate {}", rate),
    };
    s.n_xs = match s.rate {
        800 => density(40, 48, 68, 108, 144),
        1066 => density(54, 64, 91, 144, 192),
        1333 => density(67, 80, 114, 180, 240),
        1600 => density(80, 96, 136, 216, 288),
        1866 => density(94, 112, 159, 252, 336),
        2133 => density(107, 128, 182, 288, 384),
        rate => panic!("no exit-self-refresh table for rate {}", rate),
    };
}

/// Builds the DDR3 spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "DDR3",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Ddr3, "DDR3", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "DDR3",
        speed: speed.to_string(),
    })?;
    derive_speed(&mut s.speed, &s.org, RO + 1);

    s.prefetch_size = 8;
    s.channel_width = 64;
    s.read_latency = s.speed.n_cl + s.speed.n_bl;

    s.start[RA] = Some(State::PowerUp);
    s.start[BA] = Some(State::Closed);

    set_scopes(&mut s);
    set_translate(&mut s);
    set_prereqs(&mut s);
    set_effects(&mut s);
    set_timing(&mut s);
    Ok(s)
}

pub(crate) fn set_scopes(s: &mut Spec) {
    use Command::*;
    let col = RO + 1;
    s.scope[Act.index()] = RO;
    s.scope[Pre.index()] = BA;
    s.scope[Prea.index()] = RA;
    for cmd in [Rd, Wr, Rda, Wra] {
        s.scope[cmd.index()] = col;
    }
    for cmd in [Ref, Pde, Pdx, Sre, Srx] {
        s.scope[cmd.index()] = RA;
    }
}

pub(crate) fn set_translate(s: &mut Spec) {
    use crate::request::ReqKind;
    s.translate[ReqKind::Read.index()] = Some(Command::Rd);
    s.translate[ReqKind::Write.index()] = Some(Command::Wr);
    s.translate[ReqKind::Refresh.index()] = Some(Command::Ref);
    s.translate[ReqKind::PowerDown.index()] = Some(Command::Pde);
    s.translate[ReqKind::SelfRefresh.index()] = Some(Command::Sre);
}

pub(crate) fn set_prereqs(s: &mut Spec) {
    use Command::*;
    for cmd in [Rd, Wr] {
        s.prereq.set(RA, cmd, rank_data_gate);
        s.prereq.set(BA, cmd, bank_row_gate);
        s.row_hit.set(BA, cmd, row_hit);
        s.row_open.set(BA, cmd, row_open);
    }
    s.prereq.set(RA, Ref, ref_needs_prea);
    s.prereq.set(RA, Pde, rank_pde_gate);
    s.prereq.set(RA, Sre, rank_sre_gate);
}

pub(crate) fn set_effects(s: &mut Spec) {
    use Command::*;
    s.effect.set(BA, Act, open_row);
    s.effect.set(BA, Pre, close_node);
    s.effect.set(BA, Rda, close_node);
    s.effect.set(BA, Wra, close_node);
    s.effect.set(RA, Prea, close_subtree);
    s.effect.set(RA, Pde, rank_power_down);
    s.effect.set(RA, Pdx, rank_power_up);
    s.effect.set(RA, Sre, rank_self_refresh);
    s.effect.set(RA, Srx, rank_power_up);
}

pub(crate) fn set_timing(s: &mut Spec) {
    use Command::*;
    let e = s.speed;
    let t = &mut s.timing;
    const CAS: [Command; 4] = [Rd, Rda, Wr, Wra];
    const RDS: [Command; 2] = [Rd, Rda];
    const WRS: [Command; 2] = [Wr, Wra];

    // Channel: the data bus is shared by everyone
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

    // Rank: CAS to CAS between sibling ranks (bus turnaround)
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
    t.add(RA, Prea, Act, e.n_rp);

    // Rank: RAS to REF
    t.add(RA, Pre, Ref, e.n_rp);
    t.add(RA, Prea, Ref, e.n_rp);
    t.add(RA, Ref, Act, e.n_rfc);

    // Rank: RAS to PD
    t.add(RA, Act, Pde, 1);
    t.add(RA, Pdx, Act, e.n_xp);
    t.add(RA, Pdx, Pre, e.n_xp);
    t.add(RA, Pdx, Prea, e.n_xp);

    // Rank: RAS to SR
    t.add(RA, Pre, Sre, e.n_rp);
    t.add(RA, Prea, Sre, e.n_rp);
    t.add(RA, Srx, Act, e.n_xs);

    // Rank: REF to REF
    t.add(RA, Ref, Ref, e.n_rfc);

    // Rank: REF to PD
    t.add(RA, Ref, Pde, 1);
    t.add(RA, Pdx, Ref, e.n_xp);

    // Rank: REF to SR
    t.add(RA, Srx, Ref, e.n_xs);

    // Rank: PD to PD
    t.add(RA, Pde, Pdx, e.n_pd);
    t.add(RA, Pdx, Pde, e.n_xp);

    // Rank: PD to SR
    t.add(RA, Pdx, Sre, e.n_xp);
    t.add(RA, Srx, Pde, e.n_xs);

    // Rank: SR to SR
    t.add(RA, Sre, Srx, e.n_ckesr);
    t.add(RA, Srx, Sre, e.n_xs);

    // Bank: CAS to RAS
    for b in CAS {
        t.add(BA, Act, b, e.n_rcd);
    }
    t.add(BA, Rd, Pre, e.n_rtp);
    t.add(BA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
    t.add(BA, Rda, Act, e.n_rtp + e.n_rp);
    t.add(BA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_rp);

    // Bank: RAS to RAS
    t.add(BA, Act, Act, e.n_rc);
    t.add(BA, Act, Pre, e.n_ras);
    t.add(BA, Pre, Act, e.n_rp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bin_numbers() {
        let s = spec("DDR3_2Gb_x8", "DDR3_1600K").unwrap();
        assert_eq!(s.speed.n_cl, 11);
        assert_eq!(s.speed.n_rcd, 11);
        assert_eq!(s.speed.n_bl, 4);
        assert_eq!(s.read_latency, 15);
        // 1KB page at 1600: five-cycle RRD, 24-cycle FAW
        assert_eq!(s.speed.n_rrd, 5);
        assert_eq!(s.speed.n_faw, 24);
        // 2Gb chip at 1600
        assert_eq!(s.speed.n_rfc, 128);
    }

    #[test]
    fn unknown_keys_are_config_errors() {
        assert!(spec("DDR3_9Gb_x8", "DDR3_1600K").is_err());
        assert!(spec("DDR3_2Gb_x8", "DDR3_9999Z").is_err());
    }

    #[test]
    fn faw_history_depth() {
        let s = spec("DDR3_2Gb_x8", "DDR3_1600K").unwrap();
        assert_eq!(s.timing.history_depth(RA, Command::Act), 4);
    }
}
