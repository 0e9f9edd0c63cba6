//! Wide I/O mobile DRAM.
//!
//! A 3D-stacked part with four fixed channels of one rank each, a 128-bit
//! SDR interface with 4n prefetch, a direct read-to-write turnaround
//! constant, and a two-activate window (nTAW) instead of the usual
//! four-activate one.

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
    count: [u32; 5],
}

#[rustfmt::skip]
const ORGS: &[OrgRow] = &[
    OrgRow { name: "WideIO_1Gb", size_mb: 256,  count: [0, 1, 4, 1 << 12, 1 << 7] },
    OrgRow { name: "WideIO_2Gb", size_mb: 512,  count: [0, 1, 4, 1 << 13, 1 << 7] },
    OrgRow { name: "WideIO_4Gb", size_mb: 1024, count: [0, 1, 4, 1 << 14, 1 << 7] },
    OrgRow { name: "WideIO_8Gb", size_mb: 2048, count: [0, 1, 4, 1 << 15, 1 << 7] },
];

#[allow(clippy::too_many_arguments)]
fn bin(
    rate: u32,
    mul: u32,
    cl: i64,
    rcd: i64,
    rp: i64,
    ras: i64,
    rc: i64,
    rtw: i64,
    wtr: i64,
    wr: i64,
    rrd: i64,
    taw: i64,
    cke: i64,
    xp: i64,
    ckesr: i64,
) -> SpeedEntry {
    SpeedEntry {
        rate,
        freq: 200.0 / 3.0 * mul as f64,
        t_ck: 5.0 * 3.0 / mul as f64,
        n_bl: 4,
        n_ccd: 4,
        n_dqsck: 1,
        n_cl: cl,
        n_rcd: rcd,
        n_rp: rp,
        n_cwl: 1,
        n_ras: ras,
        n_rc: rc,
        n_rtp: 4,
        n_rtw: rtw,
        n_wtr: wtr,
        n_wr: wr,
        n_rrd: rrd,
        n_faw: taw,
        n_pd: cke,
        n_xp: xp,
        n_ckesr: ckesr,
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "WideIO_200" => bin(200, 3, 3, 4, 4,  9, 12, 8, 3, 3, 2, 10, 3, 2, 3),
        "WideIO_266" => bin(266, 4, 3, 5, 5, 12, 16, 8, 4, 4, 3, 14, 3, 3, 4),
        _ => return None,
    })
}

/// Refresh timing by density and rate.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    const RFC: [[i64; 4]; 2] = [[18, 26, 26, 42], [24, 35, 35, 56]];
    const REFI: [[i64; 4]; 2] = [[3120, 1560, 780, 780], [4160, 2080, 1040, 520]];
    let speed = match s.rate {
        200 => 0,
        266 => 1,
        rate => panic!("no refresh table for rate {}", rate),
    };
    let density = match org.size_mb >> 8 {
        1 => 0,
        2 => 1,
        4 => 2,
        8 => 3,
        _ => panic!("no refresh table for {}Mb channels", org.size_mb),
    };
    s.n_rfc = RFC[speed][density];
    s.n_refi = REFI[speed][density];
    s.n_xsr = s.n_rfc + 2; // tXSR is tRFC plus 10ns
}

/// Builds the WideIO spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "WideIO",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::WideIo, "WideIO", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: 128,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "WideIO",
        speed: speed.to_string(),
    })?;
    derive_speed(&mut s.speed, &s.org);

    s.prefetch_size = 4;
    s.channel_width = 128;
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
            t.add(RA, a, b, e.n_rtw);
        }
    }
    for a in WRS {
        for b in RDS {
            t.add(RA, a, b, e.n_cwl + e.n_bl + e.n_wtr);
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

    // Rank: RAS to RAS, with the two-activate window
    t.add(RA, Act, Act, e.n_rrd);
    t.add_dist(RA, Act, Act, 2, e.n_faw);
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
    t.add(RA, Srx, Act, e.n_xsr);

    // Rank: REF, PD, SR interactions
    t.add(RA, Ref, Ref, e.n_rfc);
    t.add(RA, Ref, Pde, 1);
    t.add(RA, Pdx, Ref, e.n_xp);
    t.add(RA, Srx, Ref, e.n_xsr);
    t.add(RA, Pde, Pdx, e.n_pd);
    t.add(RA, Pdx, Pde, e.n_xp);
    t.add(RA, Pdx, Sre, e.n_xp);
    t.add(RA, Srx, Pde, e.n_xsr);
    t.add(RA, Sre, Srx, e.n_ckesr);
    t.add(RA, Srx, Sre, e.n_xsr);

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
    fn two_activate_window() {
        let s = spec("WideIO_4Gb", "WideIO_266").unwrap();
        assert_eq!(s.timing.history_depth(RA, Command::Act), 2);
        assert_eq!(s.speed.n_rfc, 35);
        assert_eq!(s.speed.n_refi, 1040);
        assert_eq!(s.channel_width, 128);
    }
}
