//! GDDR5 SGRAM.
//!
//! Single-rank graphics memory with bank groups, QDR data pins, separate
//! read/write RAS-to-CAS delays, precharge-to-precharge spacing, and a
//! 32-activate window on top of the usual four-activate one. The column
//! address space in the org table is pre-multiplied by eight because a burst
//! owns eight column addresses.

use super::*;
use crate::spec::{Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State};

const CH: usize = 0;
const RA: usize = 1;
const BG: usize = 2;
const BA: usize = 3;
const RO: usize = 4;
const CO: usize = 5;

const LEVELS: [Level; 6] = [
    Level::Channel,
    Level::Rank,
    Level::BankGroup,
    Level::Bank,
    Level::Row,
    Level::Column,
];

struct OrgRow {
    name: &'static str,
    size_mb: u32,
    dq: u32,
    count: [u32; 6],
}

#[rustfmt::skip]
const ORGS: &[OrgRow] = &[
    OrgRow { name: "GDDR5_512Mb_x16", size_mb: 512,     dq: 16, count: [0, 1, 4, 2, 1 << 12, 1 << 10] },
    OrgRow { name: "GDDR5_512Mb_x32", size_mb: 512,     dq: 32, count: [0, 1, 4, 2, 1 << 12, 1 << 9] },
    OrgRow { name: "GDDR5_1Gb_x16",   size_mb: 1 << 10, dq: 16, count: [0, 1, 4, 4, 1 << 12, 1 << 10] },
    OrgRow { name: "GDDR5_1Gb_x32",   size_mb: 1 << 10, dq: 32, count: [0, 1, 4, 4, 1 << 12, 1 << 9] },
    OrgRow { name: "GDDR5_2Gb_x16",   size_mb: 2 << 10, dq: 16, count: [0, 1, 4, 4, 1 << 13, 1 << 10] },
    OrgRow { name: "GDDR5_2Gb_x32",   size_mb: 2 << 10, dq: 32, count: [0, 1, 4, 4, 1 << 13, 1 << 9] },
    OrgRow { name: "GDDR5_4Gb_x16",   size_mb: 4 << 10, dq: 16, count: [0, 1, 4, 4, 1 << 14, 1 << 10] },
    OrgRow { name: "GDDR5_4Gb_x32",   size_mb: 2 << 10, dq: 32, count: [0, 1, 4, 4, 1 << 14, 1 << 9] },
    OrgRow { name: "GDDR5_8Gb_x16",   size_mb: 8 << 10, dq: 16, count: [0, 1, 4, 4, 1 << 14, 1 << 11] },
    OrgRow { name: "GDDR5_8Gb_x32",   size_mb: 8 << 10, dq: 32, count: [0, 1, 4, 4, 1 << 14, 1 << 10] },
    OrgRow { name: "GDDR5_2Gb_x16_bank32",  size_mb: 2 << 10, dq: 16, count: [0, 1, 4, 8,   1 << 12, 1 << 10] },
    OrgRow { name: "GDDR5_2Gb_x16_bank64",  size_mb: 2 << 10, dq: 16, count: [0, 1, 4, 16,  1 << 11, 1 << 10] },
    OrgRow { name: "GDDR5_2Gb_x16_bank128", size_mb: 2 << 10, dq: 16, count: [0, 1, 4, 32,  1 << 10, 1 << 10] },
    OrgRow { name: "GDDR5_2Gb_x16_bank256", size_mb: 2 << 10, dq: 16, count: [0, 1, 4, 64,  1 << 9,  1 << 10] },
    OrgRow { name: "GDDR5_2Gb_x16_bank512", size_mb: 2 << 10, dq: 16, count: [0, 1, 4, 128, 1 << 8,  1 << 10] },
];

#[allow(clippy::too_many_arguments)]
fn bin(
    rate: u32,
    mul: u32,
    ccd_l: i64,
    cl: i64,
    rcd_r: i64,
    rcd_w: i64,
    rp: i64,
    cwl: i64,
    ras: i64,
    rc: i64,
    ppd: i64,
    rtp: i64,
    wtr: i64,
    wr: i64,
    rrd: i64,
    faw: i64,
    n32aw: i64,
) -> SpeedEntry {
    SpeedEntry {
        rate,
        freq: (mul * 500) as f64 / 4.0,
        t_ck: 8.0 / mul as f64,
        n_bl: 2,
        n_ccd_s: 2,
        n_ccd_l: ccd_l,
        n_cl: cl,
        n_rcd_r: rcd_r,
        n_rcd_w: rcd_w,
        n_rp: rp,
        n_cwl: cwl,
        n_ras: ras,
        n_rc: rc,
        n_ppd: ppd,
        n_rtp: rtp,
        n_wtr: wtr,
        n_wr: wr,
        n_rrd: rrd,
        n_faw: faw,
        n_32aw: n32aw,
        n_pd: 10,
        n_xp: 10,
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "GDDR5_4000" => bin(4000,  8, 3, 12, 12, 10, 12, 3, 28, 40, 1, 2, 5, 12,  6, 23, 184),
        "GDDR5_4500" => bin(4500,  9, 3, 14, 14, 12, 14, 4, 32, 46, 2, 2, 6, 14,  7, 26, 207),
        "GDDR5_5000" => bin(5000, 10, 3, 15, 15, 13, 15, 4, 35, 50, 2, 2, 7, 15,  7, 29, 230),
        "GDDR5_5500" => bin(5500, 11, 3, 17, 17, 14, 17, 5, 39, 56, 2, 2, 7, 17,  8, 32, 253),
        "GDDR5_6000" => bin(6000, 12, 3, 18, 18, 15, 18, 5, 42, 60, 2, 2, 8, 18,  9, 35, 276),
        "GDDR5_6500" => bin(6500, 13, 3, 20, 20, 17, 20, 5, 46, 66, 2, 2, 9, 20,  9, 38, 299),
        "GDDR5_7000" => bin(7000, 14, 3, 21, 21, 18, 21, 6, 49, 70, 2, 2, 9, 21, 10, 41, 322),
        "GDDR5_7000_disable_bg" => bin(7000, 14, 2, 21, 21, 18, 21, 6, 49, 70, 2, 2, 9, 21, 10, 41, 322),
        "GDDR5_7000_larger_REFI" => {
            let mut e = bin(7000, 14, 3, 21, 21, 18, 21, 6, 49, 70, 2, 2, 9, 21, 10, 41, 322);
            e.n_refi = 13650;
            e
        }
        "GDDR5_7000_disable_bg_larger_REFI" => {
            let mut e = bin(7000, 14, 2, 21, 21, 18, 21, 6, 49, 70, 2, 2, 9, 21, 10, 41, 322);
            e.n_refi = 13650;
            e
        }
        "GDDR5_7000_unlimit_bandwidth" => {
            let mut e = bin(7000, 14, 1, 21, 21, 18, 21, 6, 49, 70, 2, 2, 9, 21, 10, 41, 322);
            e.n_bl = 0;
            e.n_ccd_s = 1;
            e
        }
        _ => return None,
    })
}

/// Density-dependent refresh parameters: low-density chips use the long
/// refresh interval, and tRFC scales with both density and data rate.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    let speed = match s.rate {
        4000 => 0,
        4500 => 1,
        5000 => 2,
        5500 => 3,
        6000 => 4,
        6500 => 5,
        7000 => 6,
        rate => panic!("no refresh table for rate {}", rate),
    };
    const REFI_LARGE: [i64; 7] = [3900, 4388, 4875, 5363, 5850, 6338, 6825];
    const REFI_SMALL: [i64; 7] = [1900, 2138, 2375, 2613, 2850, 3088, 3325];
    #[rustfmt::skip]
    const RFC: [[i64; 7]; 5] = [
        [90, 102, 113, 124, 135, 147, 158],
        [110, 124, 138, 152, 165, 179, 193],
        [160, 180, 200, 220, 240, 260, 280],
        [260, 293, 325, 358, 390, 423, 455],
        [350, 394, 438, 482, 525, 569, 613],
    ];
    let density = match org.size_mb >> 9 {
        1 => 0,
        2 => 1,
        4 => 2,
        8 => 3,
        16 => 4,
        _ => panic!("no refresh table for {}Mb chips", org.size_mb),
    };
    if s.n_refi == 0 {
        s.n_refi = if org.size_mb <= 1024 {
            REFI_LARGE[speed]
        } else {
            REFI_SMALL[speed]
        };
    }
    s.n_rfc = RFC[density][speed];
}

/// Builds the GDDR5 spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "GDDR5",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Gddr5, "GDDR5", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "GDDR5",
        speed: speed.to_string(),
    })?;
    derive_speed(&mut s.speed, &s.org);

    s.prefetch_size = 8;
    s.channel_width = 64;
    s.read_latency = s.speed.n_cl + s.speed.n_bl;

    s.start[RA] = Some(State::PowerUp);
    s.start[BA] = Some(State::Closed);

    set_scopes(&mut s);
    ddr3::set_translate(&mut s);
    set_prereqs(&mut s);
    set_effects(&mut s);
    set_timing(&mut s);
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
    for cmd in [Ref, Pde, Pdx, Sre, Srx] {
        s.scope[cmd.index()] = RA;
    }
}

fn set_prereqs(s: &mut Spec) {
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

fn set_effects(s: &mut Spec) {
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

fn set_timing(s: &mut Spec) {
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

    // Rank: CAS to CAS (cross-group spacing)
    for a in RDS {
        for b in RDS {
            t.add(RA, a, b, e.n_ccd_s);
        }
    }
    for a in WRS {
        for b in WRS {
            t.add(RA, a, b, e.n_ccd_s);
        }
    }
    for a in RDS {
        for b in WRS {
            t.add(RA, a, b, e.n_cl + e.n_ccd_s + 2 - e.n_cwl);
        }
    }
    for a in WRS {
        for b in RDS {
            t.add(RA, a, b, e.n_cwl + e.n_bl + e.n_wtr);
        }
    }

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

    // Rank: RAS to RAS, with both activate windows
    t.add(RA, Act, Act, e.n_rrd);
    t.add_dist(RA, Act, Act, 4, e.n_faw);
    t.add_dist(RA, Act, Act, 32, e.n_32aw);
    t.add(RA, Act, Prea, e.n_ras);
    t.add(RA, Prea, Act, e.n_rp);
    t.add(RA, Pre, Pre, e.n_ppd);

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

    // Bank group: long CAS spacing
    for a in RDS {
        for b in RDS {
            t.add(BG, a, b, e.n_ccd_l);
        }
    }
    for a in WRS {
        for b in WRS {
            t.add(BG, a, b, e.n_ccd_l);
        }
    }

    // Bank: read and write activates differ
    t.add(BA, Act, Rd, e.n_rcd_r);
    t.add(BA, Act, Rda, e.n_rcd_r);
    t.add(BA, Act, Wr, e.n_rcd_w);
    t.add(BA, Act, Wra, e.n_rcd_w);
    t.add(BA, Rd, Pre, e.n_rtp);
    t.add(BA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
    t.add(BA, Rda, Act, e.n_rtp + e.n_rp);
    t.add(BA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_rp);
    t.add(BA, Act, Act, e.n_rc);
    t.add(BA, Act, Pre, e.n_ras);
    t.add(BA, Pre, Act, e.n_rp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_two_activate_window_history() {
        let s = spec("GDDR5_2Gb_x32", "GDDR5_5000").unwrap();
        assert_eq!(s.timing.history_depth(RA, Command::Act), 32);
        assert_eq!(s.speed.n_32aw, 230);
        assert_eq!(s.speed.n_rfc, 200);
    }

    #[test]
    fn small_chips_use_long_refresh_interval() {
        let s = spec("GDDR5_512Mb_x16", "GDDR5_4000").unwrap();
        assert_eq!(s.speed.n_refi, 3900);
        let s = spec("GDDR5_2Gb_x16", "GDDR5_4000").unwrap();
        assert_eq!(s.speed.n_refi, 1900);
    }
}
