//! Hierarchy levels of the DRAM organization tree.

use std::fmt;

/// One level of the organization hierarchy.
///
/// Each standard declares an ordered subset of these: plain DDR is
/// `Channel > Rank > Bank > Row > Column`, DDR4/GDDR5 insert `BankGroup`,
/// SALP/DSARP insert `SubArray`, and HMC replaces the channel/rank pair with
/// a `Vault`. `Row` and `Column` terminate every hierarchy and are never
/// instantiated as tree nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Channel,
    Vault,
    Rank,
    BankGroup,
    Bank,
    SubArray,
    Row,
    Column,
}

impl Level {
    /// Two-letter tag used by the stdout command trace.
    pub fn tag(self) -> &'static str {
        match self {
            Level::Channel => "Ch",
            Level::Vault => "Va",
            Level::Rank => "Ra",
            Level::BankGroup => "Bg",
            Level::Bank => "Ba",
            Level::SubArray => "Sa",
            Level::Row => "Ro",
            Level::Column => "Co",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
