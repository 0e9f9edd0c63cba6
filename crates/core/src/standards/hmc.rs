//! HMC vault DRAM.
//!
//! The stacked DRAM behind one Hybrid Memory Cube vault: the hierarchy is
//! rooted at the vault (no rank level) with bank groups below it, and every
//! command that a planar standard scopes at the rank lands at the vault. The
//! published timing sheet pins only the core array parameters; the remaining
//! entries are filled with DDR3-class values at the 2500 MT/s cycle time,
//! since the cube's own sheet leaves them unspecified.

use super::*;
use crate::spec::{Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State, Variant};

const VA: usize = 0;
const BG: usize = 1;
const BA: usize = 2;
const RO: usize = 3;
const CO: usize = 4;

const LEVELS: [Level; 5] = [
    Level::Vault,
    Level::BankGroup,
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
    OrgRow { name: "HMC_4GB", size_mb: 32 << 10, count: [32, 4, 2, 1 << 11, 1 << 16] },
    OrgRow { name: "HMC_8GB", size_mb: 32 << 10, count: [32, 8, 2, 1 << 11, 1 << 16] },
];

fn speed_bin(name: &str) -> Option<SpeedEntry> {
    match name {
        "HMC_2500" => Some(SpeedEntry {
            rate: 2500,
            freq: 1250.0,
            t_ck: 0.8,
            n_bl: 4,
            n_ccd_s: 4,
            n_ccd_l: 5,
            n_cl: 11,
            n_rcd: 11,
            n_rp: 11,
            n_cwl: 9,
            n_ras: 22,
            n_rc: 33,
            n_rtp: 6,
            n_wtr_s: 3,
            n_wtr_l: 8,
            n_wr: 12,
            n_rrd_s: 5,
            n_rrd_l: 6,
            n_faw: 24,
            n_rfc: 200,
            n_refi: 9750,
            n_pd: 5,
            n_xp: 6,
            n_ckesr: 6,
            n_xs: 214,
            ..SpeedEntry::default()
        }),
        _ => None,
    }
}

/// Builds the per-vault HMC spec.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "HMC",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Hmc, "HMC", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: 32,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "HMC",
        speed: speed.to_string(),
    })?;

    s.prefetch_size = 8;
    s.channel_width = 32; // 32 TSVs per vault
    s.read_latency = s.speed.n_cl + s.speed.n_bl;
    s.variant = Variant::Hmc;

    s.start[VA] = Some(State::PowerUp);
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
    s.scope[Prea.index()] = VA;
    for cmd in [Rd, Wr, Rda, Wra] {
        s.scope[cmd.index()] = CO;
    }
    for cmd in [Ref, Pde, Pdx, Sre, Srx] {
        s.scope[cmd.index()] = VA;
    }
}

fn set_prereqs(s: &mut Spec) {
    use Command::*;
    for cmd in [Rd, Wr] {
        s.prereq.set(VA, cmd, rank_data_gate);
        s.prereq.set(BA, cmd, bank_row_gate);
        s.row_hit.set(BA, cmd, row_hit);
        s.row_open.set(BA, cmd, row_open);
    }
    s.prereq.set(VA, Ref, ref_needs_prea);
    s.prereq.set(VA, Pde, rank_pde_gate);
    s.prereq.set(VA, Sre, rank_sre_gate);
}

fn set_effects(s: &mut Spec) {
    use Command::*;
    s.effect.set(BA, Act, open_row);
    s.effect.set(BA, Pre, close_node);
    s.effect.set(BA, Rda, close_node);
    s.effect.set(BA, Wra, close_node);
    s.effect.set(VA, Prea, close_subtree);
    s.effect.set(VA, Pde, rank_power_down);
    s.effect.set(VA, Pdx, rank_power_up);
    s.effect.set(VA, Sre, rank_self_refresh);
    s.effect.set(VA, Srx, rank_power_up);
}

fn set_timing(s: &mut Spec) {
    use Command::*;
    let e = s.speed;
    let t = &mut s.timing;
    const CAS: [Command; 4] = [Rd, Rda, Wr, Wra];
    const RDS: [Command; 2] = [Rd, Rda];
    const WRS: [Command; 2] = [Wr, Wra];

    // Vault: TSV data bus, then CAS spacing at the short (cross-group) rate
    for a in RDS {
        for b in RDS {
            t.add(VA, a, b, e.n_bl);
        }
    }
    for a in WRS {
        for b in WRS {
            t.add(VA, a, b, e.n_bl);
        }
    }
    for a in RDS {
        for b in RDS {
            t.add(VA, a, b, e.n_ccd_s);
        }
    }
    for a in WRS {
        for b in WRS {
            t.add(VA, a, b, e.n_ccd_s);
        }
    }
    for a in RDS {
        for b in WRS {
            t.add(VA, a, b, e.n_cl + e.n_ccd_s + 2 - e.n_cwl);
        }
    }
    for a in WRS {
        for b in RDS {
            t.add(VA, a, b, e.n_cwl + e.n_bl + e.n_wtr_s);
        }
    }

    t.add(VA, Rd, Prea, e.n_rtp);
    t.add(VA, Wr, Prea, e.n_cwl + e.n_bl + e.n_wr);

    // Vault: CAS to PD
    t.add(VA, Rd, Pde, e.n_cl + e.n_bl + 1);
    t.add(VA, Rda, Pde, e.n_cl + e.n_bl + 1);
    t.add(VA, Wr, Pde, e.n_cwl + e.n_bl + e.n_wr);
    t.add(VA, Wra, Pde, e.n_cwl + e.n_bl + e.n_wr + 1); // one extra for the precharge
    for b in CAS {
        t.add(VA, Pdx, b, e.n_xp);
    }

    // Vault: RAS to RAS
    t.add(VA, Act, Act, e.n_rrd_s);
    t.add_dist(VA, Act, Act, 4, e.n_faw);
    t.add(VA, Act, Prea, e.n_ras);
    t.add(VA, Prea, Act, e.n_rp);

    // Vault: RAS to REF
    t.add(VA, Pre, Ref, e.n_rp);
    t.add(VA, Prea, Ref, e.n_rp);
    t.add(VA, Ref, Act, e.n_rfc);

    // Vault: RAS to PD and SR
    t.add(VA, Act, Pde, 1);
    t.add(VA, Pdx, Act, e.n_xp);
    t.add(VA, Pdx, Pre, e.n_xp);
    t.add(VA, Pdx, Prea, e.n_xp);
    t.add(VA, Pre, Sre, e.n_rp);
    t.add(VA, Prea, Sre, e.n_rp);
    t.add(VA, Srx, Act, e.n_xs);

    // Vault: REF, PD, SR interactions
    t.add(VA, Ref, Ref, e.n_rfc);
    t.add(VA, Ref, Pde, 1);
    t.add(VA, Pdx, Ref, e.n_xp);
    t.add(VA, Srx, Ref, e.n_xs);
    t.add(VA, Pde, Pdx, e.n_pd);
    t.add(VA, Pdx, Pde, e.n_xp);
    t.add(VA, Pdx, Sre, e.n_xp);
    t.add(VA, Srx, Pde, e.n_xs);
    t.add(VA, Sre, Srx, e.n_ckesr);
    t.add(VA, Srx, Sre, e.n_xs);

    // Bank group: long CAS spacing and activate spacing
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
    fn vault_rooted_hierarchy() {
        let s = spec("HMC_4GB", "HMC_2500").unwrap();
        assert_eq!(s.levels[0], Level::Vault);
        assert_eq!(s.level_index(Level::Rank), None);
        assert_eq!(s.scope_of(Command::Ref), VA);
        assert_eq!(s.org.count[VA], 32);
    }
}
