//! STT-MRAM behind a DDR3-style interface.
//!
//! Spin-transfer-torque cells trade activate/restore speed against DDR3 at
//! three write-latency scale points (1.2x, 1.5x, 2.0x of DDR3-1600). The
//! activate-window parameters carry the same scale, encoded in the table as
//! tenths.
//!
//! The refresh cycle time is pinned to a single cycle: a non-volatile array
//! has nothing to refresh, but the engine's cadence (nREFI) is left in place
//! from the DDR3 lineage. That mismatch is inherited deliberately.

use super::*;
use crate::spec::{Command, Level, OrgEntry, SpeedEntry, Spec, StandardKind, State};

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
    OrgRow { name: "STTMRAM_512Mb_x4",  size_mb: 512,     dq: 4,  count: [0, 0, 8, 1 << 13, 1 << 11] },
    OrgRow { name: "STTMRAM_512Mb_x8",  size_mb: 512,     dq: 8,  count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "STTMRAM_512Mb_x16", size_mb: 512,     dq: 16, count: [0, 0, 8, 1 << 12, 1 << 10] },
    OrgRow { name: "STTMRAM_1Gb_x4",    size_mb: 1 << 10, dq: 4,  count: [0, 0, 8, 1 << 14, 1 << 11] },
    OrgRow { name: "STTMRAM_1Gb_x8",    size_mb: 1 << 10, dq: 8,  count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "STTMRAM_1Gb_x16",   size_mb: 1 << 10, dq: 16, count: [0, 0, 8, 1 << 13, 1 << 10] },
    OrgRow { name: "STTMRAM_2Gb_x4",    size_mb: 2 << 10, dq: 4,  count: [0, 0, 8, 1 << 15, 1 << 11] },
    OrgRow { name: "STTMRAM_2Gb_x8",    size_mb: 2 << 10, dq: 8,  count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "STTMRAM_2Gb_x16",   size_mb: 2 << 10, dq: 16, count: [0, 0, 8, 1 << 14, 1 << 10] },
    OrgRow { name: "STTMRAM_4Gb_x4",    size_mb: 4 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "STTMRAM_4Gb_x8",    size_mb: 4 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 10] },
    OrgRow { name: "STTMRAM_4Gb_x16",   size_mb: 4 << 10, dq: 16, count: [0, 0, 8, 1 << 15, 1 << 10] },
    OrgRow { name: "STTMRAM_8Gb_x4",    size_mb: 8 << 10, dq: 4,  count: [0, 0, 8, 1 << 16, 1 << 12] },
    OrgRow { name: "STTMRAM_8Gb_x8",    size_mb: 8 << 10, dq: 8,  count: [0, 0, 8, 1 << 16, 1 << 11] },
    OrgRow { name: "STTMRAM_8Gb_x16",   size_mb: 8 << 10, dq: 16, count: [0, 0, 8, 1 << 16, 1 << 10] },
];

/// One 1600-rate point at a cell-latency scale. `scale10` is tenths of the
/// DDR3 baseline (12 for 1.2x).
fn point(rcd: i64, rp: i64, ras: i64, rc: i64, scale10: i64) -> SpeedEntry {
    SpeedEntry {
        rate: 1600,
        freq: (400.0 / 3.0) * 6.0,
        t_ck: 1.25,
        n_bl: 4,
        n_ccd: 4,
        n_rtrs: 2,
        n_cl: 11,
        n_rcd: rcd,
        n_rp: rp,
        n_cwl: 8,
        n_ras: ras,
        n_rc: rc,
        n_rtp: 6,
        n_wtr: 6,
        n_wr: 12,
        // scale carried through to the activate window in derive_speed
        n_rrd: scale10,
        n_faw: scale10,
        n_refi: 6240,
        n_pd: 4,
        n_xp: 5,
        n_xpdll: 20,
        n_ckesr: 5,
        n_xsdll: 512,
        ..SpeedEntry::default()
    }
}

fn speed_bin(name: &str) -> Option<SpeedEntry> {
    Some(match name {
        "STT_1600_1_2" => point(14, 14, 20, 34, 12),
        "STT_1600_1_5" => point(17, 17, 23, 40, 15),
        "STT_1600_2_0" => point(22, 22, 28, 50, 20),
        _ => return None,
    })
}

/// Scales the activate-window parameters by the cell-latency factor and pins
/// the refresh-free approximation.
fn derive_speed(s: &mut SpeedEntry, org: &OrgEntry) {
    let page = (org.dq * org.count[RO + 1]) >> 13;
    let scale = s.n_rrd as f64 / 10.0;
    let (rrd, faw) = if page == 1 { (5.0, 24.0) } else { (6.0, 32.0) };
    s.n_rrd = (rrd * scale).ceil() as i64;
    s.n_faw = (faw * scale).ceil() as i64;
    // nothing leaks, so a refresh completes immediately; nREFI still ticks
    s.n_rfc = 1;
    s.n_xs = 0;
}

/// Builds the STT-MRAM spec for the given organization and speed keys.
pub fn spec(org: &str, speed: &str) -> Result<Spec, ConfigError> {
    let row = ORGS
        .iter()
        .find(|o| o.name == org)
        .ok_or_else(|| ConfigError::UnknownOrg {
            standard: "STTMRAM",
            org: org.to_string(),
        })?;
    let mut s = Spec::blank(StandardKind::SttMram, "STTMRAM", &LEVELS);
    s.org = OrgEntry {
        size_mb: row.size_mb,
        dq: row.dq,
        count: row.count.to_vec(),
    };
    s.speed = speed_bin(speed).ok_or_else(|| ConfigError::UnknownSpeed {
        standard: "STTMRAM",
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
    ddr3::set_timing(&mut s);
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_free_approximation() {
        let s = spec("STTMRAM_2Gb_x8", "STT_1600_1_2").unwrap();
        assert_eq!(s.speed.n_rfc, 1);
        assert_eq!(s.speed.n_refi, 6240);
    }

    #[test]
    fn activate_window_scales_with_cell_latency() {
        // x8 page is 1KB: base RRD 5, FAW 24
        let s12 = spec("STTMRAM_2Gb_x8", "STT_1600_1_2").unwrap();
        assert_eq!(s12.speed.n_rrd, 6); // 5 * 1.2
        assert_eq!(s12.speed.n_faw, 29); // ceil(24 * 1.2)
        let s20 = spec("STTMRAM_2Gb_x8", "STT_1600_2_0").unwrap();
        assert_eq!(s20.speed.n_rrd, 10);
        assert_eq!(s20.speed.n_faw, 48);
    }
}
