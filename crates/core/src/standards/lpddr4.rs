//! LPDDR4 mobile DRAM.
//!
//! 16n prefetch over a 32-bit channel (systems use at least two channels),
//! multiplexed command/address bus folded into the latency constants,
//! precharge-to-precharge spacing, and per-bank refresh. Refresh cycle
//! times, the refresh interval, and self-refresh exit are density-derived.

use super::*;
use crate::spec::{Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State};

const CH: usize = 0;
const RA: usize = 1;
const BA: usize = 2;
const RO: usize = 3;
const CO: usize = 4;

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
    OrgRow { name: "LPDDR4_2Gb_x16", size_mb: 2 << 10, dq: 16, count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "LPDDR4_3Gb_x16", size_mb: 3 << 10, dq: 16, count: [0, 0, 8, 3 << 13, 1 << 10] },
    OrgRow { name: "LPDDR4_4Gb_x16", size_mb: 4 << 10, dq: 16, count: [0, 0, 8, 1 << 15, 1 << 10] },
];

/// One LPDDR4 bin. The JESD209-4 core timings count from the end of each
/// multi-cycle command; they are folded here so every command takes one
/// cycle like the other standards.
#[allow(clippy::too_many_arguments)]
fn bin(
    rate: u32,
    mul: u32,
    dqsck: i64,
    cl: i64,
    rcd: i64,
    rp_pb: i64,
    rp_ab: i64,
    cwl: i64,
    ras: i64,
    rc: i64,
    rtp: i64,
    wtr: i64,
    wr: i64,
    rrd: i64,
    faw: i64,
    xp: i64,
    sr: i64,
) -> SpeedEntry {
    SpeedEntry {
        rate,
        freq: 400.0 * mul as f64,
        t_ck: 2.5 / mul as f64,
        n_bl: 8,
        n_ccd: 8,
        n_rtrs: 2,
        n_dqsck: dqsck,
        n_cl: cl,
        n_rcd: rcd,
        n_rp_pb: rp_pb,
        n_rp_ab: rp_ab,
        n_cwl: cwl,
        n_ras: ras,
        n_rc: rc,
        n_rtp: rtp,
        n_wtr: wtr,
        n_wr: wr,
        n_ppd: 4,
        n_rrd: rrd,
        n_faw: faw,
        n_xp: xp,
        n_ckesr: sr,
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "LPDDR4_1600" => bin(1600, 2, 1, 18, 15, 13, 15, 11, 34, 47, 10,  8, 14,  8, 32,  6, 12),
        "LPDDR4_2400" => bin(2400, 3, 2, 25, 22, 20, 24, 14, 51, 71, 11, 12, 21, 12, 48,  9, 18),
        "LPDDR4_3200" => bin(3200, 4, 3, 32, 29, 27, 32, 18, 68, 95, 14, 16, 28, 16, 64, 12, 24),
        _ => return None,
    })
}

/// Density-dependent refresh parameters.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    const RFC_PB: [[i64; 3]; 3] = [[48, 72, 96], [72, 108, 144], [72, 108, 144]];
    const RFC_AB: [[i64; 3]; 3] = [[104, 156, 208], [144, 216, 288], [144, 216, 288]];
    const REFI: [i64; 3] = [3124, 4685, 6247];
    const XSR: [[i64; 3]; 3] = [[110, 165, 220], [150, 225, 300], [150, 225, 300]];

    let speed = match s.rate {
        1600 => 0,
        2400 => 1,
        3200 => 2,
        rate => panic!("no refresh table for rate {}", rate),
    };
    let density = match org.size_mb >> 10 {
        2 => 0,
        3 => 1,
        4 => 2,
        gb => panic!("no refresh table for {}Gb chips", gb),
    };
    s.n_rfc_pb = RFC_PB[density][speed];
    s.n_rfc_ab = RFC_AB[density][speed];
    s.n_refi = REFI[speed];
    s.n_xsr = XSR[density][speed];
}

/// Builds the LPDDR4 spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "LPDDR4",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Lpddr4, "LPDDR4", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "LPDDR4",
        speed: speed.to_string(),
    })?;
    derive_speed(&mut s.speed, &s.org);

    s.prefetch_size = 16;
    s.channel_width = 32;
    s.read_latency = s.speed.n_cl + s.speed.n_dqsck + s.speed.n_bl;

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
    s.scope[RefPb.index()] = BA;
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
    s.prereq.set(BA, RefPb, refpb_needs_closed_bank);
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
            t.add(RA, a, b, e.n_cl + e.n_bl + e.n_dqsck + 1 - e.n_cwl);
        }
    }
    for a in WRS {
        for b in RDS {
            t.add(RA, a, b, e.n_cwl + e.n_bl + e.n_wtr + 1);
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
            t.add_sibling(RA, a, b, e.n_cl + e.n_bl + e.n_dqsck + 1 + e.n_rtrs - e.n_cwl);
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
    t.add(RA, Pre, Pre, e.n_ppd);

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
    t.add(RA, Srx, Act, e.n_xsr);

    // Rank: REF to REF
    t.add(RA, Ref, Ref, e.n_rfc_ab);
    t.add(RA, Ref, RefPb, e.n_rfc_ab);
    t.add(RA, RefPb, Ref, e.n_rfc_pb);

    // Rank: REF to PD
    t.add(RA, Ref, Pde, 1);
    t.add(RA, RefPb, Pde, 1);
    t.add(RA, Pdx, Ref, e.n_xp);
    t.add(RA, Pdx, RefPb, e.n_xp);

    // Rank: REF to SR
    t.add(RA, Srx, Ref, e.n_xsr);
    t.add(RA, Srx, RefPb, e.n_xsr);

    // Rank: PD to PD
    t.add(RA, Pde, Pdx, e.n_pd);
    t.add(RA, Pdx, Pde, e.n_xp);

    // Rank: PD to SR
    t.add(RA, Pdx, Sre, e.n_xp);
    t.add(RA, Srx, Pde, e.n_xsr);

    // Rank: SR to SR
    t.add(RA, Sre, Srx, e.n_ckesr);
    t.add(RA, Srx, Sre, e.n_xsr);

    // Bank: CAS to RAS
    for b in CAS {
        t.add(BA, Act, b, e.n_rcd);
    }
    t.add(BA, Rd, Pre, e.n_rtp);
    t.add(BA, Wr, Pre, e.n_cwl + e.n_bl + e.n_wr);
    t.add(BA, Rda, Act, e.n_rtp + e.n_rp_pb);
    t.add(BA, Wra, Act, e.n_cwl + e.n_bl + e.n_wr + e.n_rp_pb);

    // Bank: RAS to RAS
    t.add(BA, Act, Act, e.n_rc);
    t.add(BA, Act, Pre, e.n_ras);
    t.add(BA, Pre, Act, e.n_rp_pb);
    t.add(BA, Pre, RefPb, e.n_rp_pb);

    // Bank: per-bank refresh against activity in sibling banks
    t.add_sibling(BA, Act, RefPb, e.n_rrd);
    t.add_sibling(BA, RefPb, Act, e.n_rrd);
    t.add(BA, RefPb, RefPb, e.n_rfc_pb);
    t.add(BA, RefPb, Act, e.n_rfc_pb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_n_prefetch_over_narrow_channel() {
        let s = spec("LPDDR4_4Gb_x16", "LPDDR4_3200").unwrap();
        assert_eq!(s.prefetch_size, 16);
        assert_eq!(s.channel_width, 32);
        assert_eq!(s.transaction_bytes(), 64);
        assert_eq!(s.read_latency, 32 + 3 + 8);
        assert_eq!(s.speed.n_rfc_ab, 288);
        assert_eq!(s.speed.n_refi, 6247);
    }
}
