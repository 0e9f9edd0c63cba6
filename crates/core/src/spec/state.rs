//! Node and row states.

/// State of a tree node (rank, bank group, bank, subarray) or of a row.
///
/// `Selected` exists only under SALP-MASA, where a subarray must be selected
/// before it accepts column commands. The power states apply at rank (or
/// vault) level only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// A row is open (bank/subarray), or the row itself is open.
    Opened,
    /// No row open.
    Closed,
    /// Subarray is open and selected for column access (SALP-MASA).
    Selected,
    /// Rank is powered up and accepting commands.
    PowerUp,
    /// Rank is powered down with at least one bank open.
    ActPowerDown,
    /// Rank is powered down with all banks precharged.
    PrePowerDown,
    /// Rank is refreshing itself; data commands need SRX first.
    SelfRefresh,
}
