//! Wide I/O 2 mobile DRAM.
//!
//! The per-channel organization depends on how the 8Gb die is partitioned:
//! four channels of eight banks or eight channels of four banks. The
//! all-bank precharge time also depends on that split (nRP8b vs nRPpb), and
//! per-bank refresh is part of the command set.

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

#[allow(clippy::too_many_arguments)]
fn bin(
    rate: u32,
    mul: u32,
    dqsck: i64,
    cl: i64,
    rcd: i64,
    rp_pb: i64,
    rp_8b: i64,
    cwl: i64,
    ras: i64,
    rc: i64,
    rtp: i64,
    wtr: i64,
    wr: i64,
    rrd: i64,
    faw: i64,
    rfc_ab: i64,
    rfc_pb: i64,
    refi: i64,
    cke: i64,
    xp: i64,
    ckesr: i64,
    xsr: i64,
) -> SpeedEntry {
    SpeedEntry {
        rate,
        freq: 800.0 / 3.0 * mul as f64,
        t_ck: 2.5 * 3.0 / mul as f64,
        n_bl: 2,
        n_ccd: 2,
        n_dqsck: dqsck,
        n_rtrs: 2,
        n_cl: cl,
        n_rcd: rcd,
        n_rp_pb: rp_pb,
        // nRPab is selected from this per the channel split
        n_rp_ab: rp_8b,
        n_cwl: cwl,
        n_ras: ras,
        n_rc: rc,
        n_rtp: rtp,
        n_wtr: wtr,
        n_wr: wr,
        n_rrd: rrd,
        n_faw: faw,
        n_rfc_ab: rfc_ab,
        n_rfc_pb: rfc_pb,
        n_refi: refi,
        n_pd: cke,
        n_xp: xp,
        n_ckesr: ckesr,
        n_xsr: xsr,
        ..SpeedEntry::default()
    }
}

#[rustfmt::skip]
fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "WideIO2_800"  => bin(800,  3, 1, 7,  8,  8,  9, 5, 17, 25, 3, 4,  8, 4, 24, 72, 36, 1560, 3, 3, 6,  76),
        "WideIO2_1066" => bin(1066, 4, 1, 9, 10, 10, 12, 7, 23, 33, 4, 6, 11, 6, 32, 96, 48, 2080, 3, 4, 8, 102),
        _ => return None,
    })
}

/// Builds the WideIO2 spec: the organization comes from the channel split,
/// not from a fixed table.
pub fn spec(org: &str, speed: &str, channels: u32) -> Result<Spec, ConfigError> {
    if org != "WideIO2_8Gb" {
        return Err(ConfigError::UnknownOrg {
            standard: "WideIO2",
            org: org.to_string(),
        });
    }
    let mut s = Spec::blank(StandardKind::WideIo2, "WideIO2", &LEVELS);
    s.org = match channels {
        4 => OrgEntry {
            size_mb: 2 << 10,
            dq: 64,
            count: vec![0, 0, 8, 1 << 13, 1 << 9],
        },
        8 => OrgEntry {
            size_mb: 1 << 10,
            dq: 64,
            count: vec![0, 0, 4, 1 << 14, 1 << 8],
        },
        got => {
            return Err(ConfigError::ChannelConstraint {
                standard: "WideIO2",
                requirement: "4 or 8 channels",
                got,
            })
        }
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "WideIO2",
        speed: speed.to_string(),
    })?;
    // all-bank precharge covers eight banks on the four-channel split
    if channels != 4 {
        s.speed.n_rp_ab = s.speed.n_rp_pb;
    }

    s.prefetch_size = 4;
    s.channel_width = 64;
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

    // Rank: CAS to CAS; the multiplexed command bus costs one extra cycle on
    // write-involved turnarounds
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
            t.add(RA, a, b, e.n_cl + e.n_dqsck + e.n_bl + 1 - e.n_cwl);
        }
    }
    for a in WRS {
        for b in RDS {
            t.add(RA, a, b, e.n_cwl + 1 + e.n_bl + e.n_wtr);
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
    t.add(RA, Wr, Prea, e.n_cwl + 1 + e.n_bl + e.n_wr);

    // Rank: CAS to PD
    t.add(RA, Rd, Pde, e.n_cl + e.n_dqsck + e.n_bl + 1);
    t.add(RA, Rda, Pde, e.n_cl + e.n_dqsck + e.n_bl + 1);
    t.add(RA, Wr, Pde, e.n_cwl + 1 + e.n_bl + e.n_wr);
    t.add(RA, Wra, Pde, e.n_cwl + 1 + e.n_bl + e.n_wr + 1); // one extra for the precharge
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

    // Bank
    for b in CAS {
        t.add(BA, Act, b, e.n_rcd);
    }
    t.add(BA, Rd, Pre, e.n_rtp);
    t.add(BA, Wr, Pre, e.n_cwl + 1 + e.n_bl + e.n_wr);
    t.add(BA, Rda, Act, e.n_rtp + e.n_rp_pb);
    t.add(BA, Wra, Act, e.n_cwl + 1 + e.n_bl + e.n_wr + e.n_rp_pb);
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
    fn channel_split_shapes_organization() {
        let four = spec("WideIO2_8Gb", "WideIO2_800", 4).unwrap();
        assert_eq!(four.org.count[BA], 8);
        assert_eq!(four.org.size_mb, 2 << 10);
        // eight-bank split uses the eight-bank precharge-all time
        assert_eq!(four.speed.n_rp_ab, 9);

        let eight = spec("WideIO2_8Gb", "WideIO2_800", 8).unwrap();
        assert_eq!(eight.org.count[BA], 4);
        assert_eq!(eight.speed.n_rp_ab, eight.speed.n_rp_pb);
    }

    #[test]
    fn other_splits_rejected() {
        assert!(spec("WideIO2_8Gb", "WideIO2_800", 2).is_err());
    }

    #[test]
    fn dqs_turnaround_is_one_cycle() {
        let s = spec("WideIO2_8Gb", "WideIO2_800", 4).unwrap();
        assert_eq!(s.speed.n_dqsck, 1);
        // read latency is nCL + nDQSCK + nBL
        assert_eq!(s.read_latency, 7 + 1 + 2);
        // and the read-to-write turnaround carries the same single cycle:
        // nCL + nDQSCK + nBL + 1 - nCWL
        let rd_to_wr = s
            .timing
            .entries(RA, Command::Rd)
            .iter()
            .find(|t| t.cmd == Command::Wr && !t.sibling)
            .unwrap();
        assert_eq!(rd_to_wr.val, 7 + 1 + 2 + 1 - 5);

        let s = spec("WideIO2_8Gb", "WideIO2_1066", 8).unwrap();
        assert_eq!(s.speed.n_dqsck, 1);
        assert_eq!(s.read_latency, 9 + 1 + 2);
    }
}
