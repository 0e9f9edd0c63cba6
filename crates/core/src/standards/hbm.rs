//! High Bandwidth Memory.
//!
//! An eight-channel stack: each channel is 128 bits wide with bank groups
//! and separate read/write RAS-to-CAS delays. The refresh cycle time scales
//! with per-channel density.

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
    count: [u32; 6],
}

#[rustfmt::skip]
const ORGS: &[OrgRow] = &[
    OrgRow { name: "HBM_1Gb", size_mb: 1 << 10, count: [0, 0, 4, 2, 1 << 13, 1 << 7] },
    OrgRow { name: "HBM_2Gb", size_mb: 2 << 10, count: [0, 0, 4, 2, 1 << 14, 1 << 7] },
    OrgRow { name: "HBM_4Gb", size_mb: 4 << 10, count: [0, 0, 4, 4, 1 << 14, 1 << 7] },
];

fn speed_bin(name: &str) -> Option<SpeedEntry> {
    match name {
        "HBM_1Gbps" => Some(SpeedEntry {
            rate: 1000,
            freq: 500.0,
            t_ck: 2.0,
            n_bl: 2,
            n_ccd_s: 2,
            n_ccd_l: 3,
            n_cl: 7,
            n_rcd_r: 7,
            n_rcd_w: 6,
            n_rp: 7,
            n_cwl: 4,
            n_ras: 17,
            n_rc: 24,
            n_rtp: 7,
            n_wtr_s: 2,
            n_wtr_l: 4,
            n_wr: 8,
            n_rrd_s: 4,
            n_rrd_l: 5,
            n_faw: 20,
            n_refi: 1950,
            n_pd: 5,
            n_xp: 5,
            n_ckesr: 5,
            ..SpeedEntry::default()
        }),
        _ => None,
    }
}

/// Per-channel-density refresh cycle time; exit self-refresh adds 10ns.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    s.n_rfc = match org.size_mb {
        1024 => 55,
        2048 => 80,
        4096 => 130,
        other => panic!("no refresh-cycle time for {}Mb channels", other),
    };
    s.n_xs = s.n_rfc + 5;
}

/// Builds the HBM spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "HBM",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Hbm, "HBM", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: 128,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "HBM",
        speed: speed.to_string(),
    })?;
    derive_speed(&mut s.speed, &s.org);

    s.prefetch_size = 4;
    s.channel_width = 128;
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

    // Rank: CAS to CAS at the short spacing
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

    // Rank: RAS to PD and SR
    t.add(RA, Act, Pde, 1);
    t.add(RA, Pdx, Act, e.n_xp);
    t.add(RA, Pdx, Pre, e.n_xp);
    t.add(RA, Pdx, Prea, e.n_xp);
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

    // Bank group: long spacings
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
    fn wide_channel_short_bursts() {
        let s = spec("HBM_2Gb", "HBM_1Gbps").unwrap();
        assert_eq!(s.channel_width, 128);
        assert_eq!(s.transaction_bytes(), 64);
        assert_eq!(s.speed.n_rfc, 80);
        assert!(s.speed.n_rcd_w < s.speed.n_rcd_r);
    }
}
