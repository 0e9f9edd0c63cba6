//! Phase-change memory behind a DDR3-style interface.
//!
//! Reads are fast but activates are slow (long nRCD) and writes dominate the
//! restore path (nRP far above DRAM). Activate and precharge issue rates are
//! limited by a shared charge pump, modeled as an activate-to-activate and
//! precharge-to-precharge spacing.

use super::*;
use crate::spec::{Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State};

const CH: usize = 0;
const RA: usize = 1;
const BA: usize = 2;
const RO: usize = 3;

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
    OrgRow { name: "PCM_512Mb_x4",  size_mb: 512,     dq: 4,  count: [0, 0, 8, 1 << 13, 1 << 11] },
    OrgRow { name: "PCM_512Mb_x8",  size_mb: 512,     dq: 8,  count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "PCM_512Mb_x16", size_mb: 512,     dq: 16, count: [0, 0, 8, 1 << 12, 1 << 10] },
    OrgRow { name: "PCM_1Gb_x4",    size_mb: 1 << 10, dq: 4,  count: [0, 0, 8, 1 << 14, 1 << 11] },
    OrgRow { name: "PCM_1Gb_x8",    size_mb: 1 << 10, dq: 8,  count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "PCM_1Gb_x16",   size_mb: 1 << 10, dq: 16, count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "PCM_2Gb_x4",    size_mb: 2 << 10, dq: 4,  count: [0, 0, 8, 1 << 15, 1 << 11] },
    OrgRow { name: "PCM_2Gb_x8",    size_mb: 2 << 10, dq: 8,  count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "PCM_2Gb_x16",   size_mb: 2 << 10, dq: 16, count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "PCM_4Gb_x4",    size_mb: 4 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "PCM_4Gb_x8",    size_mb: 4 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 10] },
    OrgRow { name: "PCM_4Gb_x16",   size_mb: 4 << 10, dq: 16, count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "PCM_8Gb_x4",    size_mb: 8 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 12] },
    OrgRow { name: "PCM_8Gb_x8",    size_mb: 8 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "PCM_8Gb_x16",   size_mb: 8 << 10, dq: 16, count: [0, 0, 8, 1 << 16, 1 << 10] },
];

fn speed_bin(name: &str) -> Option<SpeedEntry> {
    match name {
        "PCM_800D" => Some(SpeedEntry {
            rate: 800,
            freq: (400.0 / 3.0) * 3.0,
            t_ck: 2.5,
            n_bl: 4,
            n_ccd: 4,
            n_rtrs: 2,
            n_cl: 5,
            n_rcd: 22,
            n_rp: 60,
            n_cwl: 5,
            n_ras: 22,
            n_rc: 60,
            n_rtp: 3,
            n_wtr: 3,
            n_wr: 6,
            // charge-pump limited issue rates
            n_rrd: 2,
            n_ppd: 11,
            n_refi: 3900,
            n_xp: 3,
            n_xpdll: 10,
            n_ckesr: 4,
            n_xsdll: 512,
            ..SpeedEntry::default()
        }),
        _ => None,
    }
}

/// Page- and density-dependent parameters. PCM cells do not leak, so the
/// refresh cycle time is zero.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    let page = (org.dq * org.count[RO + 1]) >> 13;
    s.n_faw = if page == 1 { 16 } else { 20 };
    s.n_rfc = 0;
    s.n_xs = match org.size_mb {
        512 => 40,
        1024 => 48,
        2048 => 68,
        4096 => 108,
        _ => 144,
    };
}

/// Builds the PCM spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "PCM",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Pcm, "PCM", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "PCM",
        speed: speed.to_string(),
    })?;
    derive_speed(&mut s.speed, &s.org);

    s.prefetch_size = 8;
    s.channel_width = 64;
    s.read_latency = s.speed.n_cl + s.speed.n_bl;

    s.start[RA] = Some(State::PowerUp);
    s.start[BA] = Some(State::Closed);

    ddr3::set_scopes(&mut s);
    ddr3::set_translate(&mut s);
    ddr3::set_prereqs(&mut s);
    ddr3::set_effects(&mut s);
    set_timing(&mut s);
    Ok(s)
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

    // Rank: RAS to RAS, issue rates bounded by the charge pump
    t.add(RA, Act, Act, e.n_rrd);
    t.add(RA, Pre, Pre, e.n_ppd);
    t.add(RA, Act, Prea, e.n_ras);
    t.add_dist(RA, Act, Act, 4, e.n_faw);
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
    fn slow_restore_path() {
        let s = spec("PCM_2Gb_x8", "PCM_800D").unwrap();
        assert_eq!(s.speed.n_rp, 60);
        assert_eq!(s.speed.n_rcd, 22);
        // non-volatile cells: refresh costs nothing
        assert_eq!(s.speed.n_rfc, 0);
        assert_eq!(s.read_latency, 5 + 4);
    }
}
