//! Declarative per-standard DRAM descriptors.
//!
//! A [`Spec`] is spec-as-data: the whole behavior of one DRAM standard is a
//! value holding
//! 1. **Organization:** the ordered hierarchy levels and per-level counts.
//! 2. **Commands:** scopes, the request translation table, and classifiers.
//! 3. **Semantics:** per-(level, command) tables of plain function pointers
//!    for prerequisites, state effects, and row-hit/row-open predicates.
//! 4. **Timing:** the [`TimingTable`] of inter-command constraints and the
//!    selected organization/speed entries.
//!
//! The generic node tree ([`crate::dram`]) interprets these tables; each
//! standard under [`crate::standards`] is one file of declarations.

pub mod command;
pub mod level;
pub mod state;
pub mod timing;

pub use command::{Command, ALL_COMMANDS, COMMAND_COUNT};
pub use level::Level;
pub use state::State;
pub use timing::{History, TimingEntry, TimingTable};

use crate::dram::Node;
use crate::request::ReqKind;

/// Prerequisite lookup for one `(level, command)` cell.
///
/// `None` means "no prerequisite at this level, keep walking down";
/// `Some(c)` stops the walk and names the command that must issue first
/// (`c` may equal the requested command, meaning it is ready here).
pub type PrereqFn = fn(&Spec, &Node, Command, &[i32]) -> Option<Command>;

/// State mutation applied when a command reaches a node during an update walk.
pub type EffectFn = fn(&Spec, &mut Node, &[i32]);

/// Row predicate for one `(level, command)` cell (row hit or row open).
pub type RowFn = fn(&Spec, &Node, Command, &[i32]) -> bool;

/// Command classifier (opening/accessing/closing/refreshing).
pub type ClassifyFn = fn(Command) -> bool;

/// Per-(level, command) table of optional function pointers.
pub struct FuncTable<T: Copy> {
    cells: Vec<[Option<T>; COMMAND_COUNT]>,
}

impl<T: Copy> FuncTable<T> {
    /// Empty table for `levels` hierarchy levels.
    pub fn new(levels: usize) -> Self {
        Self {
            cells: vec![[None; COMMAND_COUNT]; levels],
        }
    }

    /// Registers `f` for `cmd` at `level`.
    pub fn set(&mut self, level: usize, cmd: Command, f: T) {
        self.cells[level][cmd.index()] = Some(f);
    }

    /// The function registered for `cmd` at `level`, if any.
    #[inline(always)]
    pub fn get(&self, level: usize, cmd: Command) -> Option<T> {
        self.cells[level][cmd.index()]
    }
}

/// Which standard a [`Spec`] models.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StandardKind {
    Ddr3,
    Ddr4,
    Lpddr3,
    Lpddr4,
    Gddr5,
    WideIo,
    WideIo2,
    Hbm,
    Hmc,
    Salp,
    Dsarp,
    Aldram,
    Tldram,
    Pcm,
    SttMram,
}

/// SALP flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SalpKind {
    Salp1,
    Salp2,
    Masa,
}

/// Refresh mechanism of the DSARP family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DsarpKind {
    /// All-bank refresh.
    RefAb,
    /// Per-bank refresh.
    RefPb,
    /// Dynamic access-refresh parallelization (skip/pull-in).
    Darp,
    /// Subarray access-refresh parallelization.
    Sarp,
    /// DARP + SARP combined.
    Dsarp,
}

/// TLDRAM segment geometry: every `segment_ratio`-th row of a bank lives in
/// the near (fast) segment, `fast_rows` of them per bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TldramGeometry {
    pub segment_ratio: u32,
    pub fast_rows: u32,
}

/// Standard-specific payload consulted by prereq/effect functions and by the
/// controller and refresh specializations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Standard,
    Salp(SalpKind),
    Dsarp(DsarpKind),
    Tldram(TldramGeometry),
    Aldram,
    Hmc,
}

/// Operating temperature environment for standards with thermal retiming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Temp {
    Cold,
    Hot,
}

/// Selected organization entry: chip density, DQ width, and the node count at
/// each hierarchy level (0 = set at system-build time, as for channels/ranks).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrgEntry {
    /// Chip density in megabits.
    pub size_mb: u32,
    /// Data pins per chip.
    pub dq: u32,
    /// Node count per level, parallel to `Spec::levels`.
    pub count: Vec<u32>,
}

/// Selected speed entry. One superset struct serves every standard; fields a
/// standard does not define stay zero. All values are in DRAM cycles except
/// `rate` (MT/s), `freq` (MHz) and `t_ck` (ns).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpeedEntry {
    pub rate: u32,
    pub freq: f64,
    pub t_ck: f64,
    pub n_bl: i64,
    pub n_ccd: i64,
    pub n_ccd_s: i64,
    pub n_ccd_l: i64,
    pub n_rtrs: i64,
    pub n_cl: i64,
    pub n_rcd: i64,
    pub n_rcd_r: i64,
    pub n_rcd_w: i64,
    pub n_rp: i64,
    pub n_rp_ab: i64,
    pub n_rp_pb: i64,
    pub n_cwl: i64,
    pub n_ras: i64,
    pub n_rc: i64,
    pub n_rtp: i64,
    /// WideIO: direct read-to-write turnaround.
    pub n_rtw: i64,
    pub n_wtr: i64,
    pub n_wtr_s: i64,
    pub n_wtr_l: i64,
    pub n_wr: i64,
    pub n_rrd: i64,
    pub n_rrd_s: i64,
    pub n_rrd_l: i64,
    pub n_faw: i64,
    pub n_32aw: i64,
    pub n_ppd: i64,
    pub n_rfc: i64,
    pub n_rfc_ab: i64,
    pub n_rfc_pb: i64,
    pub n_refi: i64,
    pub n_refi_pb: i64,
    pub n_pd: i64,
    pub n_xp: i64,
    pub n_xpdll: i64,
    pub n_ckesr: i64,
    pub n_xs: i64,
    pub n_xsdll: i64,
    pub n_xsr: i64,
    pub n_dqsck: i64,
    /// SALP: precharge-to-activate across subarrays.
    pub n_pa: i64,
    /// SALP: read-to-activate on sibling subarrays.
    pub n_ra: i64,
    /// SALP: write-to-activate on sibling subarrays.
    pub n_wa: i64,
    /// SALP-MASA: subarray-select to column command.
    pub n_scd: i64,
    pub n_rcd_f: i64,
    pub n_rp_f: i64,
    pub n_ras_f: i64,
    pub n_rc_f: i64,
    pub n_rcd_m: i64,
    pub n_rp_m: i64,
    pub n_ras_m: i64,
    pub n_rc_m: i64,
}

/// Command classifiers for one standard.
#[derive(Clone, Copy)]
pub struct Classifiers {
    pub opening: ClassifyFn,
    pub accessing: ClassifyFn,
    pub closing: ClassifyFn,
    pub refreshing: ClassifyFn,
}

impl Default for Classifiers {
    fn default() -> Self {
        Self {
            opening: command::is_opening_default,
            accessing: command::is_accessing_default,
            closing: command::is_closing_default,
            refreshing: command::is_refreshing_default,
        }
    }
}

/// The complete declarative descriptor of one DRAM standard.
pub struct Spec {
    pub standard: StandardKind,
    /// Display name as configured (e.g. "DDR4", "SALP-MASA").
    pub name: &'static str,
    /// Ordered hierarchy, ending in `Row, Column`.
    pub levels: Vec<Level>,
    /// Deepest level at which each command's checks apply (index into `levels`).
    pub scope: [usize; COMMAND_COUNT],
    /// Initial state per level (`None` for stateless levels).
    pub start: Vec<Option<State>>,
    /// First-preference command realizing each request kind.
    pub translate: [Option<Command>; ReqKind::COUNT],
    pub prereq: FuncTable<PrereqFn>,
    pub row_hit: FuncTable<RowFn>,
    pub row_open: FuncTable<RowFn>,
    pub effect: FuncTable<EffectFn>,
    pub timing: TimingTable,
    pub org: OrgEntry,
    pub speed: SpeedEntry,
    /// Burst length on the chip interface (n-prefetch).
    pub prefetch_size: u32,
    /// Channel width in bits.
    pub channel_width: u32,
    /// Cycles from the completing CAS issue to data return.
    pub read_latency: i64,
    /// Rank-level refresh (`true`) or per-bank refresh (`false`).
    pub ref_rank: bool,
    pub classify: Classifiers,
    pub variant: Variant,
    /// Thermal retiming hook; `None` everywhere except ALDRAM.
    pub retime: Option<fn(&mut Spec, Temp)>,
}

impl Spec {
    /// A blank spec for `standard` over `levels`; the standard's constructor
    /// fills in every table before returning it.
    pub fn blank(standard: StandardKind, name: &'static str, levels: &[Level]) -> Self {
        let n = levels.len();
        Self {
            standard,
            name,
            levels: levels.to_vec(),
            scope: [0; COMMAND_COUNT],
            start: vec![None; n],
            translate: [None; ReqKind::COUNT],
            prereq: FuncTable::new(n),
            row_hit: FuncTable::new(n),
            row_open: FuncTable::new(n),
            effect: FuncTable::new(n),
            timing: TimingTable::new(n),
            org: OrgEntry {
                size_mb: 0,
                dq: 0,
                count: vec![0; n],
            },
            speed: SpeedEntry::default(),
            prefetch_size: 0,
            channel_width: 0,
            read_latency: 0,
            ref_rank: true,
            classify: Classifiers::default(),
            variant: Variant::Standard,
            retime: None,
        }
    }

    /// Number of hierarchy levels.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Index of `level` in this spec's hierarchy.
    pub fn level_index(&self, level: Level) -> Option<usize> {
        self.levels.iter().position(|&l| l == level)
    }

    /// Index of the Row level.
    #[inline]
    pub fn row_level(&self) -> usize {
        self.level_count() - 2
    }

    /// First-preference command for a request kind.
    ///
    /// # Panics
    ///
    /// Panics if the standard defines no command for `kind`.
    pub fn translate(&self, kind: ReqKind) -> Command {
        self.translate[kind.index()]
            .unwrap_or_else(|| panic!("{}: no command for request kind {:?}", self.name, kind))
    }

    /// Scope level index of `cmd`.
    #[inline(always)]
    pub fn scope_of(&self, cmd: Command) -> usize {
        self.scope[cmd.index()]
    }

    pub fn is_opening(&self, cmd: Command) -> bool {
        (self.classify.opening)(cmd)
    }

    pub fn is_accessing(&self, cmd: Command) -> bool {
        (self.classify.accessing)(cmd)
    }

    pub fn is_closing(&self, cmd: Command) -> bool {
        (self.classify.closing)(cmd)
    }

    pub fn is_refreshing(&self, cmd: Command) -> bool {
        (self.classify.refreshing)(cmd)
    }

    /// Re-derives timing for a new thermal environment (ALDRAM only; a no-op
    /// for every other standard).
    pub fn refresh_timing(&mut self, env: Temp) {
        if let Some(f) = self.retime {
            f(self, env);
        }
    }

    /// Bytes moved by one transaction (one full burst across the channel).
    pub fn transaction_bytes(&self) -> u64 {
        u64::from(self.prefetch_size) * u64::from(self.channel_width) / 8
    }
}

impl Clone for Spec {
    fn clone(&self) -> Self {
        let n = self.level_count();
        let mut prereq = FuncTable::new(n);
        let mut row_hit = FuncTable::new(n);
        let mut row_open = FuncTable::new(n);
        let mut effect = FuncTable::new(n);
        let mut timing = TimingTable::new(n);
        for lev in 0..n {
            for cmd in ALL_COMMANDS {
                if let Some(f) = self.prereq.get(lev, cmd) {
                    prereq.set(lev, cmd, f);
                }
                if let Some(f) = self.row_hit.get(lev, cmd) {
                    row_hit.set(lev, cmd, f);
                }
                if let Some(f) = self.row_open.get(lev, cmd) {
                    row_open.set(lev, cmd, f);
                }
                if let Some(f) = self.effect.get(lev, cmd) {
                    effect.set(lev, cmd, f);
                }
                for t in self.timing.entries(lev, cmd) {
                    if t.sibling {
                        timing.add_sibling(lev, cmd, t.cmd, t.val);
                    } else {
                        timing.add_dist(lev, cmd, t.cmd, t.dist, t.val);
                    }
                }
            }
        }
        Self {
            standard: self.standard,
            name: self.name,
            levels: self.levels.clone(),
            scope: self.scope,
            start: self.start.clone(),
            translate: self.translate,
            prereq,
            row_hit,
            row_open,
            effect,
            timing,
            org: self.org.clone(),
            speed: self.speed,
            prefetch_size: self.prefetch_size,
            channel_width: self.channel_width,
            read_latency: self.read_latency,
            ref_rank: self.ref_rank,
            classify: self.classify,
            variant: self.variant,
            retime: self.retime,
        }
    }
}

impl std::fmt::Debug for Spec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spec")
            .field("standard", &self.standard)
            .field("name", &self.name)
            .field("levels", &self.levels)
            .field("org", &self.org)
            .field("rate", &self.speed.rate)
            .finish_non_exhaustive()
    }
}
