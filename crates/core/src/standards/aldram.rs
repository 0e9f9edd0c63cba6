//! Adaptive-latency DRAM.
//!
//! A DDR3 part whose core timings shrink when the module runs cold: tRCD,
//! tRP, tRAS and tRC carry substantial guardbands at high temperature, and
//! the controller can reclaim them. The spec starts with hot timings and
//! re-derives the whole timing table through [`Spec::refresh_timing`], which
//! the refresh engine invokes; retiming is channel-local because every
//! controller owns its spec copy.

use super::*;
use crate::spec::{Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State, Temp, Variant};

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
    OrgRow { name: "ALDRAM_512Mb_x4",  size_mb: 512,     dq: 4,  count: [0, 0, 8, 1 << 13, 1 << 11] },
    OrgRow { name: "ALDRAM_512Mb_x8",  size_mb: 512,     dq: 8,  count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "ALDRAM_512Mb_x16", size_mb: 512,     dq: 16, count: [0, 0, 8, 1 << 12, 1 << 10] },
    OrgRow { name: "ALDRAM_1Gb_x4",    size_mb: 1 << 10, dq: 4,  count: [0, 0, 8, 1 << 14, 1 << 11] },
    OrgRow { name: "ALDRAM_1Gb_x8",    size_mb: 1 << 10, dq: 8,  count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "ALDRAM_1Gb_x16",   size_mb: 1 << 10, dq: 16, count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "ALDRAM_2Gb_x4",    size_mb: 2 << 10, dq: 4,  count: [0, 0, 8, 1 << 15, 1 << 11] },
    OrgRow { name: "ALDRAM_2Gb_x8",    size_mb: 2 << 10, dq: 8,  count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "ALDRAM_2Gb_x16",   size_mb: 2 << 10, dq: 16, count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "ALDRAM_4Gb_x4",    size_mb: 4 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "ALDRAM_4Gb_x8",    size_mb: 4 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 10] },
    OrgRow { name: "ALDRAM_4Gb_x16",   size_mb: 4 << 10, dq: 16, count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "ALDRAM_8Gb_x4",    size_mb: 8 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 12] },
    OrgRow { name: "ALDRAM_8Gb_x8",    size_mb: 8 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "ALDRAM_8Gb_x16",   size_mb: 8 << 10, dq: 16, count: [0, 0, 8, 1 << 16, 1 << 10] },
];

/// Guardband reclaimed when cold: (tRCD, tRP, tRAS, tRC) deltas in cycles.
fn cold_deltas(name: &str) -> (i64, i64, i64, i64) {
    match name {
        "ALDRAM_800D" | "ALDRAM_800E" | "ALDRAM_1066E" | "ALDRAM_1066F" | "ALDRAM_1066G"
        | "ALDRAM_1333G" | "ALDRAM_1333H" => (1, 1, 5, 6),
        "ALDRAM_1600H" | "ALDRAM_1600J" | "ALDRAM_1600K" | "ALDRAM_1866K" => (2, 2, 10, 12),
        _ => (2, 3, 10, 13),
    }
}

#[rustfmt::skip]
fn hot_bin(name: &str) -> Option<SpeedEntry> {
    let bin = |rate, mul, cl, rcd, rp, cwl, ras, rc, rtp, wtr, wr, refi, pd, xp, xpdll, ckesr| SpeedEntry {
        rate,
        freq: (400.0 / 3.0) * mul as f64,
        t_ck: (3.0 / 0.4) / mul as f64,
        n_bl: 4, n_ccd: 4, n_rtrs: 2,
        n_cl: cl, n_rcd: rcd, n_rp: rp, n_cwl: cwl,
        n_ras: ras, n_rc: rc,
        n_rtp: rtp, n_wtr: wtr, n_wr: wr,
        n_refi: refi,
        n_pd: pd, n_xp: xp, n_xpdll: xpdll,
        n_ckesr: ckesr, n_xsdll: 512,
        ..SpeedEntry::default()
    };
    Some(match name {
        "ALDRAM_800D"  => bin(800,  3u32,  5,  5,  5,  5, 15, 20, 4, 4,  6, 3120, 3, 3, 10, 4),
        "ALDRAM_800E"  => bin(800,  3,  6,  6,  6,  5, 15, 21, 4, 4,  6, 3120, 3, 3, 10, 4),
        "ALDRAM_1066E" => bin(1066, 4,  6,  6,  6,  6, 20, 26, 4, 4,  8, 4160, 3, 4, 13, 4),
        "ALDRAM_1066F" => bin(1066, 4,  7,  7,  7,  6, 20, 27, 4, 4,  8, 4160, 3, 4, 13, 4),
        "ALDRAM_1066G" => bin(1066, 4,  8,  8,  8,  6, 20, 28, 4, 4,  8, 4160, 3, 4, 13, 4),
        "ALDRAM_1333G" => bin(1333, 5,  8,  8,  8,  7, 24, 32, 5, 5, 10, 5200, 4, 4, 16, 5),
        "ALDRAM_1333H" => bin(1333, 5,  9,  9,  9,  7, 24, 33, 5, 5, 10, 5200, 4, 4, 16, 5),
        "ALDRAM_1600H" => bin(1600, 6,  9,  9,  9,  8, 28, 37, 6, 6, 12, 6240, 4, 5, 20, 5),
        "ALDRAM_1600J" => bin(1600, 6, 10, 10, 10,  8, 28, 38, 6, 6, 12, 6240, 4, 5, 20, 5),
        "ALDRAM_1600K" => bin(1600, 6, 11, 11, 11,  8, 28, 39, 6, 6, 12, 6240, 4, 5, 20, 5),
        "ALDRAM_1866K" => bin(1866, 7, 11, 11, 11,  9, 32, 43, 7, 7, 14, 7280, 5, 6, 23, 6),
        "ALDRAM_1866L" => bin(1866, 7, 12, 12, 12,  9, 32, 44, 7, 7, 14, 7280, 5, 6, 23, 6),
        "ALDRAM_2133L" => bin(2133, 8, 12, 12, 12, 10, 36, 48, 8, 8, 16, 8320, 6, 7, 26, 7),
        "ALDRAM_2133M" => bin(2133, 8, 13, 13, 13, 10, 36, 49, 8, 8, 16, 8320, 6, 7, 26, 7),
        _ => return None,
    })
}

/// Speed names in `cold_deltas`/`hot_bin` order, for the retime hook.
const BIN_NAMES: &[&str] = &[
    "ALDRAM_800D",
    "ALDRAM_800E",
    "ALDRAM_1066E",
    "ALDRAM_1066F",
    "ALDRAM_1066G",
    "ALDRAM_1333G",
    "ALDRAM_1333H",
    "ALDRAM_1600H",
    "ALDRAM_1600J",
    "ALDRAM_1600K",
    "ALDRAM_1866K",
    "ALDRAM_1866L",
    "ALDRAM_2133L",
    "ALDRAM_2133M",
];

fn entry_for(name: &str, temp: Temp) -> Option<SpeedEntry> {
    let mut e = hot_bin(name)?;
    if temp == Temp::Cold {
        let (rcd, rp, ras, rc) = cold_deltas(name);
        e.n_rcd -= rcd;
        e.n_rp -= rp;
        e.n_ras -= ras;
        e.n_rc -= rc;
    }
    Some(e)
}

/// Re-derives the timing table for a new temperature. Registered as the
/// spec's `retime` hook.
fn retime(s: &mut Spec, env: Temp) {
    let Variant::Aldram = s.variant else {
        unreachable!("ALDRAM retime hook on a non-ALDRAM spec");
    };
    let bin = BIN_NAMES
        .iter()
        .copied()
        .find(|&name| {
            entry_for(name, Temp::Hot)
                .map(|e| e.rate == s.speed.rate && e.n_cl == s.speed.n_cl)
                .unwrap_or(false)
        })
        .expect("speed bin vanished");
    s.speed = entry_for(bin, env).expect("speed bin vanished");
    ddr3::derive_speed(&mut s.speed, &s.org, RO + 1);
    s.read_latency = s.speed.n_cl + s.speed.n_bl;
    s.timing = crate::spec::TimingTable::new(s.level_count());
    ddr3::set_timing(s);
}

/// Builds the ALDRAM spec at the hot (guardbanded) operating point.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "ALDRAM",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::Aldram, "ALDRAM", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = entry_for(speed, Temp::Hot).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "ALDRAM",
        speed: speed.to_string(),
    })?;
    ddr3::derive_speed(&mut s.speed, &s.org, RO + 1);

    s.prefetch_size = 8;
    s.channel_width = 64;
    s.read_latency = s.speed.n_cl + s.speed.n_bl;
    s.variant = Variant::Aldram;
    s.retime = Some(retime);

    s.start[RA] = Some(State::PowerUp);
    s.start[BA] = Some(State::Closed);

    ddr3::set_scopes(&mut s);
    ddr3::set_translate(&mut s);
    ddr3::set_prereqs(&mut s);
    ddr3::set_effects(&mut s);
    ddr3::set_timing(&mut s);
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_reclaims_guardbands() {
        let mut s = spec("ALDRAM_2Gb_x8", "ALDRAM_1600K").unwrap();
        assert_eq!(s.speed.n_rcd, 11);
        assert_eq!(s.speed.n_ras, 28);

        s.refresh_timing(Temp::Cold);
        assert_eq!(s.speed.n_rcd, 9);
        assert_eq!(s.speed.n_rp, 9);
        assert_eq!(s.speed.n_ras, 18);
        assert_eq!(s.speed.n_rc, 27);
        // derived parameters survive the retime
        assert_eq!(s.speed.n_rfc, 128);
        // ACT->RD in the rebuilt table reflects the shorter tRCD
        let entries = s.timing.entries(BA, Command::Act);
        let rd_gate = entries
            .iter()
            .find(|t| t.cmd == Command::Rd && !t.sibling)
            .unwrap();
        assert_eq!(rd_gate.val, 9);
    }

    #[test]
    fn hot_retime_restores_baseline() {
        let mut s = spec("ALDRAM_2Gb_x8", "ALDRAM_1600K").unwrap();
        s.refresh_timing(Temp::Cold);
        s.refresh_timing(Temp::Hot);
        assert_eq!(s.speed.n_rcd, 11);
    }
}
