//! DDR4 SDRAM.
//!
//! Adds a bank-group level to the DDR3 hierarchy: column commands inside one
//! group are spaced by the long nCCD_L while cross-group commands use the
//! short nCCD_S, and likewise for activate spacing (nRRD_L / nRRD_S) and
//! write-to-read turnaround (nWTR_L / nWTR_S). Refresh cycle time, exit
//! self-refresh, refresh interval, and the activate-window parameters are
//! derived from chip density, page size, and the cycle time.

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
    OrgRow { name: "DDR4_2Gb_x4",  size_mb: 2 << 10, dq: 4,  count: [0, 0, 4, 4, 1 << 15, 1 << 10] },
    OrgRow { name: "DDR4_2Gb_x8",  size_mb: 2 << 10, dq: 8,  count: [0, 0, 4, 4, 1 << 14, 1 << 10] },
    OrgRow { name: "DDR4_2Gb_x16", size_mb: 2 << 10, dq: 16, count: [0, 0, 2, 4, 1 << 14, 1 << 10] },
    OrgRow { name: "DDR4_4Gb_x4",  size_mb: 4 << 10, dq: 4,  count: [0, 0, 4, 4, 1 << 16, 1 << 10] },
    OrgRow { name: "DDR4_4Gb_x8",  size_mb: 4 << 10, dq: 8,  count: [0, 0, 4, 4, 1 << 15, 1 << 10] },
    OrgRow { name: "DDR4_4Gb_x16", size_mb: 4 << 10, dq: 16, count: [0, 0, 2, 4, 1 << 15, 1 << 10] },
    OrgRow { name: "DDR4_8Gb_x4",  size_mb: 8 << 10, dq: 4,  count: [0, 0, 4, 4, 1 << 17, 1 << 10] },
    OrgRow { name: "DDR4_8Gb_x8",  size_mb: 8 << 10, dq: 8,  count: [0, 0, 4, 4, 1 << 16, 1 << 10] },
    OrgRow { name: "DDR4_8Gb_x16", size_mb: 8 << 10, dq: 16, count: [0, 0, 2, 4, 1 << 16, 1 << 10] },
];

fn bin(
    rate: u32,
    mul: u32,
    ccd_l: i64,
    cl: i64,
    rcd: i64,
    rp: i64,
    cwl: i64,
    ras: i64,
    rc: i64,
    rtp: i64,
    wtr_s: i64,
    wtr_l: i64,
    wr: i64,
    pd: i64,
    xp: i64,
    ckesr: i64,
) -> SpeedEntry {
    SpeedEntry {
        rate,
        freq: (400.0 / 3.0) * mul as f64,
        t_ck: (3.0 / 0.4) / mul as f64,
        n_bl: 4,
        n_ccd_s: 4,
        n_ccd_l: ccd_l,
        n_rtrs: 2,
        n_cl: cl,
        n_rcd: rcd,
        n_rp: rp,
        n_cwl: cwl,
        n_ras: ras,
        n_rc: rc,
        n_rtp: rtp,
        n_wtr_s: wtr_s,
        n_wtr_l: wtr_l,
        n_wr: wr,
        n_pd: pd,
        n_xp: xp,
        n_ckesr: ckesr,
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "DDR4_1600K" => bin(1600, 6, 5, 11, 11, 11,  9, 28, 39, 6, 2, 6, 12, 4, 5, 5),
        "DDR4_1600L" => bin(1600, 6, 5, 12, 12, 12,  9, 28, 40, 6, 2, 6, 12, 4, 5, 5),
        "DDR4_1866M" => bin(1866, 7, 5, 13, 13, 13, 10, 32, 45, 7, 3, 7, 14, 5, 6, 6),
        "DDR4_1866N" => bin(1866, 7, 5, 14, 14, 14, 10, 32, 46, 7, 3, 7, 14, 5, 6, 6),
        "DDR4_2133P" => bin(2133, 8, 6, 15, 15, 15, 11, 36, 51, 8, 3, 8, 16, 6, 7, 7),
        "DDR4_2133R" => bin(2133, 8, 6, 16, 16, 16, 11, 36, 52, 8, 3, 8, 16, 6, 7, 7),
        "DDR4_2400R" => bin(2400, 9, 6, 16, 16, 16, 12, 39, 55, 9, 3, 9, 18, 6, 8, 7),
        "DDR4_2400U" => bin(2400, 9, 6, 18, 18, 18, 12, 39, 57, 9, 3, 9, 18, 6, 8, 7),
        _ => return None,
    })
}

fn cycles(ns: f64, t_ck: f64) -> i64 {
    (ns / t_ck).ceil() as i64
}

/// Density- and page-dependent parameters: tRFC by chip size, tXS as
/// tRFC + 10ns, the 7.8us refresh interval, and the activate window.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    let rfc_ns = match org.size_mb {
        2048 => 160.0,
        4096 => 260.0,
        8192 => 350.0,
        other => panic!("no refresh-cycle time for {}Mb chips", other),
    };
    s.n_rfc = cycles(rfc_ns, s.t_ck);
    s.n_xs = cycles(rfc_ns + 10.0, s.t_ck);
    s.n_refi = cycles(7800.0, s.t_ck);

    // page size in KB: 0 is the half-kilobyte x4 page
    let page = (org.dq * org.count[CO]) >> 13;
    let (rrd_s_ns, rrd_l_ns) = if page >= 2 { (6.0, 7.5) } else { (5.0, 6.0) };
    s.n_rrd_s = cycles(rrd_s_ns, s.t_ck).max(4);
    s.n_rrd_l = cycles(rrd_l_ns, s.t_ck).max(4);
    let (faw_ck, faw_ns) = match page {
        0 => (16, 20.0),
        1 => (20, 25.0),
        _ => (28, 35.0),
    };
    s.n_faw = cycles(faw_ns, s.t_ck).max(faw_ck);
}

/// Builds the DDR4 spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "DDR4",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Ddr4, "DDR4", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "DDR4",
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

    // Rank: CAS to CAS uses the short (cross-group) spacing
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
            t.add(RA, a, b, e.n_cwl + e.n_bl + e.n_wtr_s);
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
    t.add(RA, Act, Act, e.n_rrd_s);
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

    // Bank group: the long spacings
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
    for a in WRS {
        for b in RDS {
            t.add(BG, a, b, e.n_cwl + e.n_bl + e.n_wtr_l);
        }
    }
    t.add(BG, Act, Act, e.n_rrd_l);

    // Bank
    for b in CAS {
        t.add(BA, Act, b, e.n_rcd);
    }
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
    fn derives_density_parameters() {
        let s = spec("DDR4_4Gb_x8", "DDR4_2400R").unwrap();
        // 260ns at 0.833ns per cycle
        assert_eq!(s.speed.n_rfc, 312);
        assert_eq!(s.speed.n_refi, 9360);
        assert!(s.speed.n_rrd_l > s.speed.n_rrd_s);
    }

    #[test]
    fn bank_group_spacing_is_longer() {
        let s = spec("DDR4_4Gb_x8", "DDR4_2400R").unwrap();
        assert!(s.speed.n_ccd_l > s.speed.n_ccd_s);
        assert_eq!(s.level_index(Level::BankGroup), Some(BG));
    }
}
