//! Command trace output.
//!
//! Two forms, both optional:
//! 1. **File trace** for external power tools: one file per (channel, rank)
//!    named `<prefix>chan-<c>-rank-<r>.cmdtrace`, one line per command:
//!    `<clk>,<CMD>[,<bank>]`. The bank field is omitted for rank-scoped
//!    commands; standards with bank groups emit the flat bank index
//!    `group * banks_per_group + bank`.
//! 2. **Stdout trace** for debugging: `<CMD> <clk>: <v0> <v1> ...`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::dram::addr_at;
use crate::spec::{Command, Level, Spec};

/// Per-rank command trace files for one channel.
pub struct CmdTrace {
    files: Vec<BufWriter<File>>,
}

impl CmdTrace {
    /// Opens one trace file per rank under `prefix`.
    pub fn create(prefix: &str, channel_id: usize, ranks: usize) -> io::Result<Self> {
        let mut files = Vec::with_capacity(ranks);
        for rank in 0..ranks {
            let name = format!("{prefix}chan-{channel_id}-rank-{rank}.cmdtrace");
            if let Some(dir) = Path::new(&name).parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)?;
                }
            }
            files.push(BufWriter::new(File::create(name)?));
        }
        Ok(Self { files })
    }

    /// Appends one issued command to the owning rank's file.
    pub fn record(&mut self, spec: &Spec, clk: i64, cmd: Command, addr: &[i32]) -> io::Result<()> {
        let rank_level = spec
            .level_index(Level::Rank)
            .or_else(|| spec.level_index(Level::Vault))
            .unwrap_or(0);
        let rank = addr_at(addr, rank_level).max(0) as usize;
        let Some(file) = self.files.get_mut(rank) else {
            return Ok(());
        };

        match flat_bank(spec, cmd, addr) {
            Some(bank) => writeln!(file, "{},{},{}", clk, cmd.name(), bank),
            None => writeln!(file, "{},{}", clk, cmd.name()),
        }
    }

    /// Flushes all rank files.
    pub fn flush(&mut self) -> io::Result<()> {
        for f in &mut self.files {
            f.flush()?;
        }
        Ok(())
    }
}

/// Flat bank index for the trace line, or `None` for rank-scoped commands.
fn flat_bank(spec: &Spec, cmd: Command, addr: &[i32]) -> Option<i32> {
    if matches!(cmd, Command::Ref | Command::Prea) {
        return None;
    }
    let bank_level = spec.level_index(Level::Bank)?;
    let bank = addr_at(addr, bank_level);
    if bank < 0 {
        return None;
    }
    match spec.level_index(Level::BankGroup) {
        Some(group_level) => {
            let group = addr_at(addr, group_level);
            let banks_per_group = spec.org.count[bank_level] as i32;
            Some(group * banks_per_group + bank)
        }
        None => Some(bank),
    }
}

/// Prints one issued command to stdout.
pub fn print_command(spec: &Spec, clk: i64, cmd: Command, addr: &[i32]) {
    let mut line = format!("{:>5} {:>10}:", cmd.name(), clk);
    for level in 0..spec.level_count() {
        line.push_str(&format!(" {:>5}", addr_at(addr, level)));
    }
    println!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standards::{ddr3, ddr4};

    #[test]
    fn flat_bank_includes_bank_group() {
        let spec = ddr4::spec("DDR4_4Gb_x8", "DDR4_2400R").unwrap();
        // bank group 2, bank 3 of 4 per group
        let addr = [0, 0, 2, 3, 0, 0];
        assert_eq!(flat_bank(&spec, Command::Act, &addr), Some(11));
    }

    #[test]
    fn rank_scoped_commands_have_no_bank_field() {
        let spec = ddr3::spec("DDR3_2Gb_x8", "DDR3_1600K").unwrap();
        assert_eq!(flat_bank(&spec, Command::Ref, &[0, 0, -1, -1, -1]), None);
        assert_eq!(flat_bank(&spec, Command::Prea, &[0, 0, -1, -1, -1]), None);
        assert_eq!(flat_bank(&spec, Command::Act, &[0, 0, 5, 1, 0]), Some(5));
    }
}
