//! DRAM command kinds.
//!
//! One enum covers the union of every standard's command set; a [`Spec`](super::Spec)
//! only ever references the subset its standard defines. Keeping a single enum lets
//! the node tree index per-command tables with plain arrays instead of per-standard
//! generics.

use std::fmt;

/// A DRAM command, as issued on the command bus.
///
/// The first twelve variants are common to every supported standard; the rest
/// are standard-specific (SALP subarray ops, per-bank refresh, TLDRAM
/// fast/slow-segment ops and migration).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Activate a row into a bank's row buffer.
    Act,
    /// Precharge one bank.
    Pre,
    /// Precharge all banks in a rank.
    Prea,
    /// Precharge every subarray in a rank (SALP).
    Prer,
    /// Precharge the other open subarray in the same bank (SALP).
    PreOther,
    /// Select a subarray for column access (SALP-MASA).
    Sasel,
    /// Column read.
    Rd,
    /// Column write.
    Wr,
    /// Column read with auto-precharge.
    Rda,
    /// Column write with auto-precharge.
    Wra,
    /// Rank-level (all-bank) refresh.
    Ref,
    /// Per-bank refresh (LPDDR, DSARP).
    RefPb,
    /// Enter power-down.
    Pde,
    /// Exit power-down.
    Pdx,
    /// Enter self-refresh.
    Sre,
    /// Exit self-refresh.
    Srx,
    /// Activate a row in the fast segment (TLDRAM).
    ActF,
    /// Precharge a fast-segment bank (TLDRAM).
    PreF,
    /// Precharge all fast-segment banks in a rank (TLDRAM).
    PreaF,
    /// Migrate a row between slow and fast segments (TLDRAM).
    Mig,
    /// Activate for migration (TLDRAM).
    ActM,
    /// Precharge after migration (TLDRAM).
    PreM,
    /// Precharge all after migration (TLDRAM).
    PreaM,
}

/// Number of distinct command kinds; sizes every per-command table.
pub const COMMAND_COUNT: usize = 23;

/// All commands, in table order.
pub const ALL_COMMANDS: [Command; COMMAND_COUNT] = [
    Command::Act,
    Command::Pre,
    Command::Prea,
    Command::Prer,
    Command::PreOther,
    Command::Sasel,
    Command::Rd,
    Command::Wr,
    Command::Rda,
    Command::Wra,
    Command::Ref,
    Command::RefPb,
    Command::Pde,
    Command::Pdx,
    Command::Sre,
    Command::Srx,
    Command::ActF,
    Command::PreF,
    Command::PreaF,
    Command::Mig,
    Command::ActM,
    Command::PreM,
    Command::PreaM,
];

impl Command {
    /// Table index of this command.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Command mnemonic as it appears in command traces.
    pub fn name(self) -> &'static str {
        match self {
            Command::Act => "ACT",
            Command::Pre => "PRE",
            Command::Prea => "PREA",
            Command::Prer => "PRER",
            Command::PreOther => "PRE_OTHER",
            Command::Sasel => "SASEL",
            Command::Rd => "RD",
            Command::Wr => "WR",
            Command::Rda => "RDA",
            Command::Wra => "WRA",
            Command::Ref => "REF",
            Command::RefPb => "REFPB",
            Command::Pde => "PDE",
            Command::Pdx => "PDX",
            Command::Sre => "SRE",
            Command::Srx => "SRX",
            Command::ActF => "ACTF",
            Command::PreF => "PREF",
            Command::PreaF => "PREAF",
            Command::Mig => "MIG",
            Command::ActM => "ACTM",
            Command::PreM => "PREM",
            Command::PreaM => "PREAM",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default opening classifier: commands that open a row.
pub fn is_opening_default(cmd: Command) -> bool {
    matches!(cmd, Command::Act)
}

/// Default accessing classifier: column commands that touch the open row.
pub fn is_accessing_default(cmd: Command) -> bool {
    matches!(cmd, Command::Rd | Command::Wr | Command::Rda | Command::Wra)
}

/// Default closing classifier: commands that restore a bank to Closed.
pub fn is_closing_default(cmd: Command) -> bool {
    matches!(
        cmd,
        Command::Rda | Command::Wra | Command::Pre | Command::Prea
    )
}

/// Default refreshing classifier.
pub fn is_refreshing_default(cmd: Command) -> bool {
    matches!(cmd, Command::Ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense() {
        for (i, cmd) in ALL_COMMANDS.iter().enumerate() {
            assert_eq!(cmd.index(), i);
        }
    }

    #[test]
    fn default_classifiers() {
        assert!(is_opening_default(Command::Act));
        assert!(!is_opening_default(Command::Rd));
        assert!(is_accessing_default(Command::Wra));
        assert!(is_closing_default(Command::Wra));
        assert!(is_closing_default(Command::Prea));
        assert!(!is_closing_default(Command::Ref));
        assert!(is_refreshing_default(Command::Ref));
    }
}
